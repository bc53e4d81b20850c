//! End-to-end lifecycle tests
//!
//! These tests build the engine the way the binary does: from a configuration
//! file, over a file-backed inventory, reloading through the command-line
//! backend (`true` or `false` standing in for the engine executable).

use pbx_core::{EntityRef, EntityStore, ReconcilerConfig, SyncEngine};
use pbx_model::{DialplanRule, Extension, Trunk};
use pbx_test_utils::pbx::{TestPbx, assert_occurs};
use pbx_test_utils::{ADMIN_DIALPLAN, ADMIN_ENDPOINTS};
use pretty_assertions::assert_eq;

fn engine(pbx: &TestPbx) -> SyncEngine {
    let config = ReconcilerConfig::load(&pbx.config_path()).unwrap();
    SyncEngine::from_config(&config)
}

fn setup() -> TestPbx {
    let pbx = TestPbx::with_admin_files();
    pbx.write_config("true");
    pbx
}

fn carrier() -> Trunk {
    let mut trunk = Trunk::new("carrier", "sip.example.net").with_credentials("acct", "trunkpass");
    trunk.dial_prefix = "9".to_string();
    trunk.strip_digits = 1;
    trunk
}

#[tokio::test]
async fn test_full_lifecycle_preserves_admin_edits() {
    let pbx = setup();
    let engine = engine(&pbx);

    assert!(engine.create_extension(Extension::new("1001", "Ann"), Some("s3cretpass")).await.success());
    assert!(engine.create_extension(Extension::new("1002", "Bob"), None).await.success());
    assert!(engine.create_trunk(carrier()).await.success());
    let rule = DialplanRule::new("Voicemail", "from-internal", "*97", "VoiceMailMain", "");
    assert!(engine.create_rule(rule.clone()).await.success());

    // Administrator edits outside the managed blocks
    let edited_endpoints = pbx
        .endpoints()
        .replace("user_agent=Office PBX", "user_agent=Head Office PBX")
        + "\n[transport-tcp]\ntype=transport\nprotocol=tcp\nbind=0.0.0.0:5060\n";
    pbx.write_endpoints(&edited_endpoints);

    let mut ann = engine.store().extension("1001").unwrap().unwrap();
    ann.name = "Ann Smith".to_string();
    let outcome = engine.update_extension(ann, None).await;
    assert!(outcome.success(), "{:?}", outcome.errors);

    let endpoints = pbx.endpoints();
    assert!(endpoints.contains("callerid=\"Ann Smith\" <1001>"));
    assert!(endpoints.contains("user_agent=Head Office PBX"));
    assert!(endpoints.ends_with("[transport-tcp]\ntype=transport\nprotocol=tcp\nbind=0.0.0.0:5060\n"));
    assert!(engine.diff().unwrap().is_clean());

    for number in ["1001", "1002"] {
        assert!(engine.delete_extension(number).await.success());
    }
    assert!(engine.delete_trunk("carrier").await.success());
    assert!(engine.delete_rule(rule.id).await.success());

    assert_eq!(
        pbx.endpoints(),
        ADMIN_ENDPOINTS.replace("user_agent=Office PBX", "user_agent=Head Office PBX")
            + "\n[transport-tcp]\ntype=transport\nprotocol=tcp\nbind=0.0.0.0:5060\n"
    );
    assert_eq!(pbx.dialplan(), ADMIN_DIALPLAN);
}

#[tokio::test]
async fn test_state_survives_a_restart() {
    let pbx = setup();
    {
        let first = engine(&pbx);
        let outcome = first
            .create_extension(Extension::new("1001", "Ann"), Some("s3cretpass"))
            .await;
        assert!(outcome.success(), "{:?}", outcome.errors);
    }
    let inventory = std::fs::read_to_string(pbx.inventory_path()).unwrap();
    assert!(!inventory.contains("s3cretpass"));
    let endpoints = pbx.endpoints();

    let second = engine(&pbx);
    assert!(second.diff().unwrap().is_clean());
    let report = second.sync_all_to_external().await;

    assert!(report.success(), "{:?}", report.errors);
    assert!(!report.file_changed);
    assert_eq!(pbx.endpoints(), endpoints);
}

#[tokio::test]
async fn test_regeneration_is_deterministic() {
    let pbx = setup();
    let engine = engine(&pbx);
    let store = engine.store();
    store.upsert_extension(Extension::new("1002", "Bob")).unwrap();
    store.upsert_extension(Extension::new("1001", "Ann")).unwrap();
    store.upsert_trunk(carrier()).unwrap();
    store
        .upsert_rule(DialplanRule::new("Echo", "from-internal", "*43", "Echo", ""))
        .unwrap();

    let first = engine.sync_all_to_external().await;
    let (endpoints, dialplan) = (pbx.endpoints(), pbx.dialplan());
    let second = engine.sync_all_to_external().await;

    assert!(first.success() && first.file_changed, "{:?}", first.errors);
    assert!(second.success());
    assert!(!second.file_changed);
    assert_eq!(pbx.endpoints(), endpoints);
    assert_eq!(pbx.dialplan(), dialplan);
    assert_occurs(&endpoints, "; BEGIN MANAGED - ", 3);
    assert_occurs(&dialplan, "; BEGIN MANAGED - ", 3);
    let ann = dialplan.find("exten => 1001,").unwrap();
    let bob = dialplan.find("exten => 1002,").unwrap();
    assert!(ann < bob);
}

#[tokio::test]
async fn test_hand_edit_inside_block_is_overwritten_by_push() {
    let pbx = setup();
    let engine = engine(&pbx);
    engine.create_extension(Extension::new("1001", "Ann"), None).await;
    let generated = pbx.endpoints();
    pbx.write_endpoints(&generated.replace("context=from-internal", "context=sales"));

    let reconcile = engine.auto_reconcile().await;
    assert_eq!(reconcile.conflicts.len(), 1);
    assert!(pbx.endpoints().contains("context=sales"));

    let push = engine
        .sync_one_to_external(&EntityRef::Extension("1001".to_string()))
        .await;

    assert!(push.success(), "{:?}", push.errors);
    assert_eq!(pbx.endpoints(), generated);
    assert!(engine.diff().unwrap().is_clean());
}

#[tokio::test]
async fn test_reload_falls_back_to_command_line() {
    let pbx = setup();
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = closed.local_addr().unwrap().port();
    drop(closed);
    let config = std::fs::read_to_string(pbx.config_path()).unwrap()
        + &format!(
            "\n[engine.ami]\nusername = \"reconciler\"\nsecret = \"letmein\"\nport = {}\ntimeout_secs = 1\n",
            port
        );
    std::fs::write(pbx.config_path(), config).unwrap();

    let engine = engine(&pbx);
    let outcome = engine
        .create_extension(Extension::new("1001", "Ann"), None)
        .await;

    assert!(outcome.success(), "{:?}", outcome.errors);
    assert!(!outcome.reloads.is_empty());
    assert!(outcome.reloads.iter().all(|r| r.via.as_deref() == Some("cli")));
}

#[tokio::test]
async fn test_failing_engine_never_rolls_back() {
    let pbx = TestPbx::with_admin_files();
    pbx.write_config("false");
    let engine = engine(&pbx);

    let outcome = engine.create_trunk(carrier()).await;

    assert!(outcome.database_changed);
    assert!(outcome.file_changed);
    assert!(!outcome.reload_success);
    assert!(engine.store().trunk("carrier").unwrap().is_some());
    assert!(pbx.endpoints().contains("; BEGIN MANAGED - Trunk carrier"));
}
