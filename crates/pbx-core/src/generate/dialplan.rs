use std::collections::BTreeMap;

use pbx_config::Section;
use pbx_model::{DialplanRule, Extension, Trunk, defaults};

/// Seconds a local extension rings before the call moves on.
const LOCAL_RING_SECS: u32 = 30;

/// Seconds an outbound attempt waits on one trunk.
const OUTBOUND_RING_SECS: u32 = 60;

/// One `(context, text)` pair per context with at least one rule.
///
/// Contexts come out in ascending name order; rules within a context are
/// ordered by `(sort_order, pattern, priority)`. Disabled rules are kept as
/// commented-out lines so they survive a round trip unchanged.
pub fn render_dialplan(rules: &[DialplanRule]) -> Vec<(String, String)> {
    let mut by_context: BTreeMap<&str, Vec<&DialplanRule>> = BTreeMap::new();
    for rule in rules {
        by_context.entry(rule.context.as_str()).or_default().push(rule);
    }

    by_context
        .into_iter()
        .map(|(context, mut rules)| {
            rules.sort_by(|a, b| {
                (a.sort_order, &a.pattern, a.priority).cmp(&(b.sort_order, &b.pattern, b.priority))
            });

            let mut section = Section::new(context);
            for (i, rule) in rules.iter().enumerate() {
                if i > 0 {
                    section.push_blank();
                }
                section.push_comment(rule_comment(rule));
                let line = format!(
                    "{},{},{}({})",
                    rule.pattern, rule.priority, rule.application, rule.arguments
                );
                if rule.enabled {
                    section.push_arrow("exten", line);
                } else {
                    section.push_raw(format!(";exten => {}", line));
                }
            }
            (context.to_string(), section.render())
        })
        .collect()
}

fn rule_comment(rule: &DialplanRule) -> String {
    let mut comment = format!("; {}", rule.name);
    if !rule.rule_type.is_empty() {
        comment.push_str(&format!(" [{}]", rule.rule_type));
    }
    if !rule.description.is_empty() {
        comment.push_str(&format!(" - {}", rule.description));
    }
    if !rule.enabled {
        comment.push_str(" (disabled)");
    }
    comment
}

/// Dial targets for every enabled extension, grouped by context.
///
/// Returns `None` when no extension is enabled.
pub fn render_local_extensions(extensions: &[Extension]) -> Option<String> {
    let mut by_context: BTreeMap<&str, Vec<&Extension>> = BTreeMap::new();
    for ext in extensions.iter().filter(|e| e.enabled) {
        by_context.entry(ext.context.as_str()).or_default().push(ext);
    }
    if by_context.is_empty() {
        return None;
    }

    let sections: Vec<Section> = by_context
        .into_iter()
        .map(|(context, mut exts)| {
            exts.sort_by(|a, b| (a.number.len(), &a.number).cmp(&(b.number.len(), &b.number)));
            let mut section = Section::new(context);
            for (i, ext) in exts.iter().enumerate() {
                if i > 0 {
                    section.push_blank();
                }
                section.push_arrow(
                    "exten",
                    format!("{n},1,Dial(PJSIP/{n},{})", LOCAL_RING_SECS, n = ext.number),
                );
                section.push_arrow("same", "n,Hangup()");
            }
            section
        })
        .collect();

    Some(super::join_sections(&sections))
}

/// Outbound patterns for every enabled trunk.
///
/// Trunks sharing a dial prefix become one pattern that tries them in
/// `(priority, name)` order. Returns `None` when no trunk is enabled.
pub fn render_outbound_routes(trunks: &[Trunk]) -> Option<String> {
    let mut enabled: Vec<&Trunk> = trunks.iter().filter(|t| t.enabled).collect();
    if enabled.is_empty() {
        return None;
    }
    enabled.sort_by(|a, b| (a.priority, &a.name).cmp(&(b.priority, &b.name)));

    // Group by prefix, keeping the position of each prefix's best trunk
    let mut routes: Vec<(&str, Vec<&Trunk>)> = Vec::new();
    for trunk in enabled {
        match routes.iter_mut().find(|(prefix, _)| *prefix == trunk.dial_prefix) {
            Some((_, group)) => group.push(trunk),
            None => routes.push((trunk.dial_prefix.as_str(), vec![trunk])),
        }
    }

    let mut section = Section::new(defaults::OUTBOUND_CONTEXT);
    for (i, (prefix, group)) in routes.iter().enumerate() {
        if i > 0 {
            section.push_blank();
        }
        let via: Vec<&str> = group.iter().map(|t| t.name.as_str()).collect();
        section.push_comment(format!("; prefix '{}' via {}", prefix, via.join(", ")));
        let label = if prefix.is_empty() {
            "Outbound route".to_string()
        } else {
            format!("Outbound via prefix {}", prefix)
        };
        section.push_arrow("exten", format!("_{}X.,1,NoOp({})", prefix, label));
        for trunk in group {
            let number = if trunk.strip_digits == 0 {
                "${EXTEN}".to_string()
            } else {
                format!("${{EXTEN:{}}}", trunk.strip_digits)
            };
            section.push_arrow(
                "same",
                format!("n,Dial(PJSIP/{}@{},{})", number, trunk.name, OUTBOUND_RING_SECS),
            );
        }
        section.push_arrow("same", "n,Hangup()");
    }

    Some(section.render())
}
