//! Management protocol client against the in-process simulator.

mod common;

use std::sync::Arc;

use common::{AmiSimulator, Behavior, SimEndpoint};
use pbx_engine::{
    AmiClient, AmiConfig, Availability, EngineControl, EngineQuery, Error, ReloadCoordinator,
    ReloadScope, StatusMonitor,
};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;

fn endpoint_1001() -> SimEndpoint {
    SimEndpoint {
        name: "1001",
        state: "Not in use",
        contacts: vec!["sip:1001@10.0.0.5:5060"],
        context: "from-internal",
    }
}

#[tokio::test]
async fn test_scoped_reload_sends_module() {
    let sim = AmiSimulator::start(Behavior::default()).await;
    let client = AmiClient::new(sim.config());

    let output = client.reload(ReloadScope::Endpoints).await.unwrap();

    assert_eq!(output, "Module Reloaded");
    assert_eq!(sim.actions(), vec!["Login", "Reload", "Logoff"]);
    let reload = &sim.received()[1];
    assert_eq!(reload.get("Module"), Some("res_pjsip.so"));
    assert!(reload.action_id().is_some());
}

#[tokio::test]
async fn test_full_reload_has_no_module() {
    let sim = AmiSimulator::start(Behavior::default()).await;
    let client = AmiClient::new(sim.config());

    client.reload(ReloadScope::Full).await.unwrap();

    assert_eq!(sim.received()[1].get("Module"), None);
}

#[tokio::test]
async fn test_login_rejected() {
    let sim = AmiSimulator::start(Behavior {
        accept_login: false,
        ..Behavior::default()
    })
    .await;

    let result = AmiClient::new(sim.config()).reload(ReloadScope::Dialplan).await;

    assert!(matches!(result, Err(Error::AuthFailed(_))));
}

#[tokio::test]
async fn test_reload_error_response() {
    let sim = AmiSimulator::start(Behavior {
        reload_ok: false,
        ..Behavior::default()
    })
    .await;

    let result = AmiClient::new(sim.config()).reload(ReloadScope::Dialplan).await;

    match result {
        Err(Error::CommandFailed { command, message }) => {
            assert_eq!(command, "Reload pbx_config.so");
            assert_eq!(message, "No such module");
        }
        other => panic!("expected CommandFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut config = AmiConfig::new("reconciler", "letmein");
    config.port = port;
    let result = AmiClient::new(config).reload(ReloadScope::Full).await;

    assert!(matches!(result, Err(Error::Unreachable { .. })));
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    });

    let mut config = AmiConfig::new("reconciler", "letmein");
    config.port = port;
    config.timeout_secs = 1;
    let result = AmiClient::new(config).reload(ReloadScope::Full).await;

    assert!(matches!(result, Err(Error::Timeout { .. })));
}

#[tokio::test]
async fn test_list_endpoints() {
    let sim = AmiSimulator::start(Behavior {
        endpoints: vec![
            endpoint_1001(),
            SimEndpoint {
                name: "carrier",
                state: "Unavailable",
                contacts: vec![],
                context: "from-trunk",
            },
        ],
        ..Behavior::default()
    })
    .await;

    let endpoints = AmiClient::new(sim.config()).list_endpoints().await.unwrap();

    assert_eq!(endpoints.len(), 2);
    assert_eq!(endpoints[0].name, "1001");
    assert_eq!(endpoints[0].state, "Not in use");
    assert_eq!(endpoints[0].contacts, vec!["1001/sip:1001@10.0.0.5:5060"]);
    assert_eq!(endpoints[1].name, "carrier");
    assert!(endpoints[1].contacts.is_empty());
}

#[tokio::test]
async fn test_empty_endpoint_list() {
    let sim = AmiSimulator::start(Behavior::default()).await;
    let endpoints = AmiClient::new(sim.config()).list_endpoints().await.unwrap();
    assert!(endpoints.is_empty());
}

#[tokio::test]
async fn test_endpoint_detail() {
    let sim = AmiSimulator::start(Behavior {
        endpoints: vec![endpoint_1001()],
        ..Behavior::default()
    })
    .await;
    let client = AmiClient::new(sim.config());

    let detail = client.endpoint_detail("1001").await.unwrap().unwrap();
    assert_eq!(detail.get("Context"), Some("from-internal"));
    assert_eq!(detail.contacts, vec!["sip:1001@10.0.0.5:5060"]);

    assert!(client.endpoint_detail("1002").await.unwrap().is_none());
}

#[tokio::test]
async fn test_coordinator_with_real_client() {
    let sim = AmiSimulator::start(Behavior::default()).await;
    let coordinator = ReloadCoordinator::new(vec![Arc::new(AmiClient::new(sim.config())) as Arc<dyn EngineControl>]);

    let outcome = coordinator.reload(ReloadScope::Dialplan).await;

    assert!(outcome.success);
    assert_eq!(outcome.via.as_deref(), Some("ami"));
}

#[tokio::test]
async fn test_monitor_serves_cache_after_engine_goes_away() {
    let sim = AmiSimulator::start(Behavior {
        endpoints: vec![endpoint_1001()],
        ..Behavior::default()
    })
    .await;
    let live_config = sim.config();

    // Point a second client at a closed port to simulate the outage
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut dead_config = live_config.clone();
    dead_config.port = listener.local_addr().unwrap().port();
    drop(listener);

    let live = StatusMonitor::new(Some(Arc::new(AmiClient::new(live_config)) as Arc<dyn EngineQuery>));
    let report = live.list_endpoints().await;
    assert_eq!(report.availability, Availability::Live);
    assert_eq!(report.endpoints.len(), 1);

    let dead = StatusMonitor::new(Some(Arc::new(AmiClient::new(dead_config)) as Arc<dyn EngineQuery>));
    let report = dead.list_endpoints().await;
    assert!(matches!(report.availability, Availability::Unreachable { .. }));
}
