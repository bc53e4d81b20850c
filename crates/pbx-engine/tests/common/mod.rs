//! In-process management interface simulator.
//!
//! Listens on an ephemeral local port, answers the subset of actions the
//! client uses and records every action it receives.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use pbx_engine::{AmiConfig, AmiMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Clone)]
pub struct SimEndpoint {
    pub name: &'static str,
    pub state: &'static str,
    pub contacts: Vec<&'static str>,
    pub context: &'static str,
}

#[derive(Clone)]
pub struct Behavior {
    pub accept_login: bool,
    pub reload_ok: bool,
    pub endpoints: Vec<SimEndpoint>,
    /// Send an unsolicited event before each response.
    pub noisy: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            accept_login: true,
            reload_ok: true,
            endpoints: Vec::new(),
            noisy: true,
        }
    }
}

pub struct AmiSimulator {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<AmiMessage>>>,
}

impl AmiSimulator {
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&received);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let behavior = behavior.clone();
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let _ = serve(stream, behavior, log).await;
                });
            }
        });

        Self { addr, received }
    }

    pub fn config(&self) -> AmiConfig {
        AmiConfig {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            username: "reconciler".to_string(),
            secret: "letmein".to_string(),
            timeout_secs: 2,
        }
    }

    /// Action names received so far, in order.
    pub fn actions(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| m.get("Action").map(str::to_string))
            .collect()
    }

    pub fn received(&self) -> Vec<AmiMessage> {
        self.received.lock().unwrap().clone()
    }
}

fn reply(action_id: &str, response: &str, message: &str) -> String {
    AmiMessage::new()
        .with("Response", response)
        .with("ActionID", action_id)
        .with("Message", message)
        .to_wire()
}

async fn serve(
    stream: TcpStream,
    behavior: Behavior,
    log: Arc<Mutex<Vec<AmiMessage>>>,
) -> std::io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    write.write_all(b"Asterisk Call Manager/5.0.1\r\n").await?;

    loop {
        let mut block = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            if line.trim().is_empty() {
                break;
            }
            block.push_str(&line);
        }

        let action = AmiMessage::parse(&block);
        log.lock().unwrap().push(action.clone());
        let id = action.action_id().unwrap_or_default().to_string();

        if behavior.noisy {
            write
                .write_all(b"Event: PeerStatus\r\nPrivilege: system,all\r\nPeer: PJSIP/9999\r\n\r\n")
                .await?;
        }

        let out = match action.get("Action").unwrap_or_default() {
            "Login" if behavior.accept_login => reply(&id, "Success", "Authentication accepted"),
            "Login" => reply(&id, "Error", "Authentication failed"),
            "Reload" if behavior.reload_ok => reply(&id, "Success", "Module Reloaded"),
            "Reload" => reply(&id, "Error", "No such module"),
            "Logoff" => {
                let bye = AmiMessage::new()
                    .with("Response", "Goodbye")
                    .with("ActionID", id.as_str())
                    .with("Message", "Thanks for all the fish.")
                    .to_wire();
                write.write_all(bye.as_bytes()).await?;
                return Ok(());
            }
            "PJSIPShowEndpoints" if behavior.endpoints.is_empty() => {
                reply(&id, "Error", "No endpoints found")
            }
            "PJSIPShowEndpoints" => {
                let mut out = AmiMessage::new()
                    .with("Response", "Success")
                    .with("ActionID", id.as_str())
                    .with("EventList", "start")
                    .with("Message", "Following are Events for each object")
                    .to_wire();
                for endpoint in &behavior.endpoints {
                    let contacts: String = endpoint
                        .contacts
                        .iter()
                        .map(|c| format!("{}/{},", endpoint.name, c))
                        .collect();
                    out.push_str(
                        &AmiMessage::new()
                            .with("Event", "EndpointList")
                            .with("ActionID", id.as_str())
                            .with("ObjectType", "endpoint")
                            .with("ObjectName", endpoint.name)
                            .with("Transport", "transport-udp")
                            .with("Contacts", contacts)
                            .with("DeviceState", endpoint.state)
                            .to_wire(),
                    );
                }
                out.push_str(
                    &AmiMessage::new()
                        .with("Event", "EndpointListComplete")
                        .with("ActionID", id.as_str())
                        .with("EventList", "Complete")
                        .with("ListItems", behavior.endpoints.len().to_string())
                        .to_wire(),
                );
                out
            }
            "PJSIPShowEndpoint" => {
                let wanted = action.get("Endpoint").unwrap_or_default();
                match behavior.endpoints.iter().find(|e| e.name == wanted) {
                    None => reply(&id, "Error", "Unable to retrieve endpoint"),
                    Some(endpoint) => {
                        let mut out = reply(&id, "Success", "Following are Events for each object");
                        out.push_str(
                            &AmiMessage::new()
                                .with("Event", "EndpointDetail")
                                .with("ActionID", id.as_str())
                                .with("ObjectName", endpoint.name)
                                .with("Context", endpoint.context)
                                .with("Allow", "(ulaw|alaw|g722)")
                                .with("DeviceState", endpoint.state)
                                .to_wire(),
                        );
                        for contact in &endpoint.contacts {
                            out.push_str(
                                &AmiMessage::new()
                                    .with("Event", "ContactStatusDetail")
                                    .with("ActionID", id.as_str())
                                    .with("URI", *contact)
                                    .with("Status", "Reachable")
                                    .to_wire(),
                            );
                        }
                        out.push_str(
                            &AmiMessage::new()
                                .with("Event", "EndpointDetailComplete")
                                .with("ActionID", id.as_str())
                                .to_wire(),
                        );
                        out
                    }
                }
            }
            other => reply(&id, "Error", &format!("Invalid/unknown command: {}", other)),
        };
        write.write_all(out.as_bytes()).await?;

        if action.get("Action") == Some("Login") && !behavior.accept_login {
            return Ok(());
        }
    }
}
