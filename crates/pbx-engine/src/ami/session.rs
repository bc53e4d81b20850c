//! One authenticated management protocol connection

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;
use tracing::{debug, trace};

use super::AmiConfig;
use super::message::AmiMessage;
use crate::error::{Error, Result};

const BANNER_PREFIX: &str = "Asterisk Call Manager";

pub(crate) struct AmiSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    timeout: Duration,
    next_id: u64,
}

impl AmiSession {
    /// Connect, check the banner and log in.
    pub(crate) async fn open(config: &AmiConfig) -> Result<Self> {
        let target = config.address();
        let limit = config.timeout();

        let stream = timeout(limit, TcpStream::connect(&target))
            .await
            .map_err(|_| Error::timeout(format!("connect to {}", target), limit))?
            .map_err(|source| Error::Unreachable {
                target: target.clone(),
                source,
            })?;

        let (read, writer) = stream.into_split();
        let mut session = Self {
            reader: BufReader::new(read),
            writer,
            timeout: limit,
            next_id: 0,
        };

        let banner = session.read_line().await?;
        if !banner.starts_with(BANNER_PREFIX) {
            return Err(Error::Protocol(format!("unexpected banner '{}'", banner)));
        }
        debug!(target = %target, banner = %banner, "connected to management interface");

        let login = AmiMessage::action("Login")
            .with("Username", config.username.as_str())
            .with("Secret", config.secret.as_str())
            .with("Events", "off");
        let response = session.request(login).await?;
        if !response.is_success() {
            return Err(Error::AuthFailed(response.message().to_string()));
        }
        Ok(session)
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = timeout(self.timeout, self.reader.read_line(&mut line))
            .await
            .map_err(|_| Error::timeout("read from management interface", self.timeout))??;
        if read == 0 {
            return Err(Error::Protocol("connection closed by engine".to_string()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read the next complete message.
    pub(crate) async fn read_message(&mut self) -> Result<AmiMessage> {
        let mut block = String::new();
        loop {
            let line = self.read_line().await?;
            if line.is_empty() {
                if block.is_empty() {
                    continue;
                }
                break;
            }
            block.push_str(&line);
            block.push('\n');
        }
        trace!(message = %block, "received management message");
        Ok(AmiMessage::parse(&block))
    }

    /// Tag `action` with a fresh ActionID and send it.
    async fn send(&mut self, action: AmiMessage) -> Result<String> {
        self.next_id += 1;
        let action_id = format!("pbx-{}", self.next_id);
        let wire = action.with("ActionID", action_id.as_str()).to_wire();
        let limit = self.timeout;
        let writer = &mut self.writer;
        timeout(limit, async {
            writer.write_all(wire.as_bytes()).await?;
            writer.flush().await
        })
        .await
        .map_err(|_| Error::timeout("write to management interface", limit))??;
        Ok(action_id)
    }

    /// Send `action` and wait for the response carrying its ActionID.
    ///
    /// Unrelated events arriving in between are skipped.
    pub(crate) async fn request(&mut self, action: AmiMessage) -> Result<AmiMessage> {
        let action_id = self.send(action).await?;
        loop {
            let message = self.read_message().await?;
            if message.response().is_some() && message.action_id() == Some(action_id.as_str()) {
                return Ok(message);
            }
            trace!(?message, "skipping unrelated message");
        }
    }

    /// Send a list action and gather its events up to `complete_event`.
    ///
    /// Returns the initial response and the events. An error response ends
    /// the exchange with no events.
    pub(crate) async fn collect(
        &mut self,
        action: AmiMessage,
        complete_event: &str,
    ) -> Result<(AmiMessage, Vec<AmiMessage>)> {
        let action_id = self.send(action).await?;
        let mut response = None;
        let mut events = Vec::new();
        loop {
            let message = self.read_message().await?;
            if message.action_id() != Some(action_id.as_str()) {
                continue;
            }
            if message.response().is_some() {
                let failed = !message.is_success();
                response = Some(message);
                if failed {
                    break;
                }
                continue;
            }
            if message
                .event()
                .is_some_and(|e| e.eq_ignore_ascii_case(complete_event))
            {
                break;
            }
            events.push(message);
        }
        let response =
            response.ok_or_else(|| Error::Protocol(format!("no response before {}", complete_event)))?;
        Ok((response, events))
    }

    /// Log off, ignoring failures; the connection is closed either way.
    pub(crate) async fn logoff(mut self) {
        if let Err(e) = self.request(AmiMessage::action("Logoff")).await {
            debug!(error = %e, "logoff failed");
        }
    }
}
