//! Integration tests for sentinel scanning.

use pbx_blocks::Error;
use pbx_blocks::parser::{find_block, has_block, scan_blocks};
use pretty_assertions::assert_eq;
use rstest::rstest;

const PJSIP: &str = "\
[transport-udp]
type=transport
protocol=udp

; BEGIN MANAGED - Extension 1001
[1001]
type=endpoint
; END MANAGED - Extension 1001

; BEGIN MANAGED - Trunk carrier
[carrier]
type=endpoint
; END MANAGED - Trunk carrier
";

#[test]
fn test_multiple_blocks_in_order() {
    let blocks = scan_blocks(PJSIP).unwrap();
    let labels: Vec<_> = blocks.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["Extension 1001", "Trunk carrier"]);
    assert_eq!(blocks[0].start_line, 5);
    assert_eq!(blocks[0].end_line, 8);
}

#[test]
fn test_find_block_content() {
    let block = find_block(PJSIP, "Trunk carrier").unwrap().unwrap();
    assert_eq!(block.content_of(PJSIP), "[carrier]\ntype=endpoint\n");
}

#[test]
fn test_has_block() {
    assert!(has_block(PJSIP, "Extension 1001").unwrap());
    assert!(!has_block(PJSIP, "Extension 1002").unwrap());
}

#[test]
fn test_indented_sentinels_match_on_trimmed_line() {
    let text = "  ; BEGIN MANAGED - A\nx=1\n\t; END MANAGED - A  \n";
    let blocks = scan_blocks(text).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].label, "A");
}

#[test]
fn test_lookalike_comments_are_not_sentinels() {
    let text = ";BEGIN MANAGED - A\n; begin managed - A\n; BEGIN MANAGED-A\n";
    assert!(scan_blocks(text).unwrap().is_empty());
}

#[rstest]
#[case::nested(
    "; BEGIN MANAGED - A\n; BEGIN MANAGED - B\n; END MANAGED - B\n; END MANAGED - A\n"
)]
#[case::unmatched_end("x=1\n; END MANAGED - A\n")]
#[case::overlapping(
    "; BEGIN MANAGED - A\n; END MANAGED - B\n; BEGIN MANAGED - B\n; END MANAGED - A\n"
)]
#[case::unterminated("; BEGIN MANAGED - A\n[a]\n")]
#[case::duplicate(
    "; BEGIN MANAGED - A\n; END MANAGED - A\n; BEGIN MANAGED - A\n; END MANAGED - A\n"
)]
fn test_structural_errors_are_fatal(#[case] text: &str) {
    assert!(scan_blocks(text).is_err());
}

#[test]
fn test_nested_error_reports_both_labels() {
    let text = "; BEGIN MANAGED - Outer\n; BEGIN MANAGED - Inner\n";
    match scan_blocks(text) {
        Err(Error::NestedBlock { outer, inner, line }) => {
            assert_eq!(outer, "Outer");
            assert_eq!(inner, "Inner");
            assert_eq!(line, 2);
        }
        other => panic!("expected NestedBlock, got {:?}", other),
    }
}

#[test]
fn test_unterminated_error_reports_opening_line() {
    let text = "[general]\n; BEGIN MANAGED - Dialplan from-internal\nexten => 1,1,NoOp()\n";
    match scan_blocks(text) {
        Err(Error::Unterminated { label, line }) => {
            assert_eq!(label, "Dialplan from-internal");
            assert_eq!(line, 2);
        }
        other => panic!("expected Unterminated, got {:?}", other),
    }
}
