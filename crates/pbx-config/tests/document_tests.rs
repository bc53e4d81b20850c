//! Integration tests for the configuration document model.

use pbx_config::{Document, Error, Node, Op};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

const PJSIP: &str = "\
; Site transports, maintained by hand
#include pjsip_site.conf

[transport-udp]
type=transport
protocol=udp ; default
bind=0.0.0.0

[endpoint-base](!)
disallow=all

; BEGIN MANAGED - Extension 1001
[1001]
type=endpoint
context=from-internal
allow=ulaw
allow=alaw

[1001-auth]
type=auth
; END MANAGED - Extension 1001

[2000]
  context = lab
this line is not a pair
";

const DIALPLAN: &str = "\
[globals]
TRUNK=carrier

; BEGIN MANAGED - Dialplan from-internal
[from-internal]
; Echo test [test] - echo
exten => *43,1,Echo()

; Disabled [test] - gone (disabled)
;exten => *44,1,Playback(demo)
; END MANAGED - Dialplan from-internal
";

#[rstest]
#[case::endpoints(PJSIP)]
#[case::dialplan(DIALPLAN)]
#[case::empty("")]
#[case::no_final_newline("[a]\nx=1")]
#[case::crlf("[a]\r\nx=1\r\n")]
fn test_render_reproduces_source(#[case] text: &str) {
    let doc = Document::parse(text).unwrap();
    assert_eq!(doc.render(), text);
}

#[test]
fn test_sections_include_managed_ones() {
    let doc = Document::parse(PJSIP).unwrap();
    let names: Vec<_> = doc.sections().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["transport-udp", "endpoint-base", "1001", "1001-auth", "2000"]
    );
}

#[test]
fn test_find_section_values() {
    let doc = Document::parse(PJSIP).unwrap();

    let endpoint = doc.find_section("1001").unwrap();
    assert_eq!(endpoint.get("context"), Some("from-internal"));
    assert_eq!(endpoint.get_all("allow"), vec!["ulaw", "alaw"]);

    let transport = doc.find_section("transport-udp").unwrap();
    assert_eq!(transport.get("protocol"), Some("udp"));

    let admin = doc.find_section("2000").unwrap();
    assert_eq!(admin.get("context"), Some("lab"));

    let template = doc.find_section("endpoint-base").unwrap();
    assert_eq!(template.options.as_deref(), Some("!"));
}

#[test]
fn test_arrow_entries() {
    let doc = Document::parse(DIALPLAN).unwrap();
    let context = doc.find_section("from-internal").unwrap();
    let pairs: Vec<_> = context.pairs().collect();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].op, Op::Arrow);
    assert_eq!(pairs[0].value, "*43,1,Echo()");
}

#[test]
fn test_managed_blocks_listed() {
    let doc = Document::parse(PJSIP).unwrap();
    let labels: Vec<_> = doc.managed_blocks().iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["Extension 1001"]);
    let block = doc.block("Extension 1001").unwrap();
    assert_eq!(block.sections().count(), 2);
    assert!(doc.block("Extension 1002").is_none());
}

#[test]
fn test_preamble_is_preserved_as_nodes() {
    let doc = Document::parse(PJSIP).unwrap();
    assert!(matches!(&doc.nodes[0], Node::Comment(c) if c.starts_with("; Site")));
    assert!(matches!(&doc.nodes[1], Node::Raw(r) if r == "#include pjsip_site.conf"));
}

#[test]
fn test_malformed_sentinels_are_fatal() {
    let text = "; BEGIN MANAGED - A\n[a]\n; BEGIN MANAGED - B\n";
    assert!(matches!(Document::parse(text), Err(Error::Block(_))));
}

#[test]
fn test_replace_block_keeps_admin_sections() {
    let mut doc = Document::parse(PJSIP).unwrap();
    doc.replace_managed_block("Extension 1001", "[1001]\ntype=endpoint\ncontext=sales")
        .unwrap();

    assert_eq!(doc.find_section("1001").unwrap().get("context"), Some("sales"));
    assert!(doc.find_section("1001-auth").is_none());
    assert_eq!(doc.find_section("2000").unwrap().get("context"), Some("lab"));
    assert!(doc.render().contains("this line is not a pair\n"));
}

#[test]
fn test_insert_and_remove_block() {
    let mut doc = Document::parse(PJSIP).unwrap();
    doc.replace_managed_block("Trunk carrier", "[carrier]\ntype=endpoint")
        .unwrap();
    assert!(doc.block("Trunk carrier").is_some());

    assert!(doc.remove_managed_block("Trunk carrier"));
    assert!(!doc.remove_managed_block("Trunk carrier"));
    assert_eq!(doc.render(), PJSIP);
}

fn config_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "; [a-z ]{0,12}",
        "\\[[a-z0-9-]{1,8}\\]",
        "[a-z_]{1,8}=[a-z0-9,]{0,8}",
        "exten => [0-9]{1,4},1,[A-Z][a-z]{1,6}\\(\\)",
        "[a-z ]{1,12}",
    ]
}

proptest! {
    #[test]
    fn prop_render_parse_is_idempotent(lines in prop::collection::vec(config_line(), 0..20)) {
        let text = lines.join("\n");
        let once = Document::parse(&text).unwrap().render();
        let twice = Document::parse(&once).unwrap().render();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once, text);
    }
}
