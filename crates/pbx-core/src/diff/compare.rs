use std::collections::BTreeMap;
use std::fmt;

use pbx_model::{EntityKind, Extension, Trunk, secret_matches};

use super::record::{Classification, FieldDiff, SyncRecord};
use crate::parse::{ExternalExtension, ExternalTrunk};

const REDACTED: &str = "<redacted>";
const UNSET: &str = "(none)";

/// A database entity that can be compared with its parsed counterpart.
pub trait Comparable<E> {
    const KIND: EntityKind;

    fn enabled(&self) -> bool;

    /// Fields that differ. Empty when the pair agrees.
    fn compare(&self, external: &E) -> Vec<FieldDiff>;
}

/// Classify one identity. `None` when neither side has it.
pub fn classify<D, E>(key: &str, database: Option<&D>, external: Option<&E>) -> Option<SyncRecord>
where
    D: Comparable<E>,
{
    let (classification, differences) = match (database, external) {
        (None, None) => return None,
        (Some(db), None) if !db.enabled() => (Classification::Match, Vec::new()),
        (Some(_), None) => (Classification::DatabaseOnly, Vec::new()),
        (None, Some(_)) => (Classification::ExternalOnly, Vec::new()),
        (Some(db), Some(ext)) => {
            let mut differences = db.compare(ext);
            if !db.enabled() {
                differences.insert(0, FieldDiff::new("enabled", "no", "yes"));
            }
            if differences.is_empty() {
                (Classification::Match, differences)
            } else {
                (Classification::Mismatch, differences)
            }
        }
    };

    Some(SyncRecord {
        kind: D::KIND,
        key: key.to_string(),
        classification,
        differences,
    })
}

fn diff_by_key<'a, D, E>(
    database: impl IntoIterator<Item = (&'a str, &'a D)>,
    external: impl IntoIterator<Item = (&'a str, &'a E)>,
) -> Vec<SyncRecord>
where
    D: Comparable<E> + 'a,
    E: 'a,
{
    let mut pairs: BTreeMap<&str, (Option<&D>, Option<&E>)> = BTreeMap::new();
    for (key, db) in database {
        pairs.entry(key).or_default().0 = Some(db);
    }
    for (key, ext) in external {
        pairs.entry(key).or_default().1 = Some(ext);
    }
    pairs
        .into_iter()
        .filter_map(|(key, (db, ext))| classify(key, db, ext))
        .collect()
}

/// One record per extension number on either side, ordered by number.
pub fn diff_extensions(database: &[Extension], external: &[ExternalExtension]) -> Vec<SyncRecord> {
    diff_by_key(
        database.iter().map(|e| (e.number.as_str(), e)),
        external.iter().map(|e| (e.number.as_str(), e)),
    )
}

/// One record per trunk name on either side, ordered by name.
pub fn diff_trunks(database: &[Trunk], external: &[ExternalTrunk]) -> Vec<SyncRecord> {
    diff_by_key(
        database.iter().map(|t| (t.name.as_str(), t)),
        external.iter().map(|t| (t.name.as_str(), t)),
    )
}

fn check<T: PartialEq + fmt::Display>(out: &mut Vec<FieldDiff>, field: &str, db: &T, ext: &T) {
    if db != ext {
        out.push(FieldDiff::new(field, db, ext));
    }
}

fn show(value: Option<&str>) -> &str {
    value.unwrap_or(UNSET)
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

impl Comparable<ExternalExtension> for Extension {
    const KIND: EntityKind = EntityKind::Extension;

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn compare(&self, external: &ExternalExtension) -> Vec<FieldDiff> {
        let mut out = Vec::new();
        if let Some(name) = &external.name {
            check(&mut out, "name", &self.name, name);
        }
        check(&mut out, "context", &self.context, &external.context);
        check(&mut out, "transport", &self.transport, &external.transport);
        check(&mut out, "codecs", &self.codecs, &external.codecs);
        check(&mut out, "max_contacts", &self.max_contacts, &external.max_contacts);
        check(
            &mut out,
            "qualify_frequency",
            &self.qualify_frequency,
            &external.qualify_frequency,
        );
        if self.direct_media != external.direct_media {
            out.push(FieldDiff::new(
                "direct_media",
                yes_no(self.direct_media),
                yes_no(external.direct_media),
            ));
        }
        // Only comparable when the database has a hash and the file a password
        if let (Some(hash), Some(password)) = (&self.secret_hash, &external.password)
            && !secret_matches(password, hash)
        {
            out.push(FieldDiff::new("secret", REDACTED, REDACTED));
        }
        out
    }
}

impl Comparable<ExternalTrunk> for Trunk {
    const KIND: EntityKind = EntityKind::Trunk;

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn compare(&self, external: &ExternalTrunk) -> Vec<FieldDiff> {
        let mut out = Vec::new();
        check(&mut out, "host", &self.host, &external.host);
        check(&mut out, "port", &self.port, &external.port);
        check(&mut out, "context", &self.context, &external.context);
        check(&mut out, "transport", &self.transport, &external.transport);
        check(&mut out, "codecs", &self.codecs, &external.codecs);

        // Credentials only reach the file when a username is set
        let db_username = self.username.as_deref().filter(|u| !u.is_empty());
        if db_username != external.username.as_deref() {
            out.push(FieldDiff::new(
                "username",
                show(db_username),
                show(external.username.as_deref()),
            ));
        }
        let db_password = db_username.and(self.password.as_deref());
        if db_password != external.password.as_deref() {
            let redact = |p: Option<&str>| if p.is_some() { REDACTED } else { UNSET };
            out.push(FieldDiff::new(
                "password",
                redact(db_password),
                redact(external.password.as_deref()),
            ));
        }

        if self.max_channels != external.max_channels {
            out.push(FieldDiff::new(
                "max_channels",
                self.max_channels.map_or(UNSET.to_string(), |m| m.to_string()),
                external.max_channels.map_or(UNSET.to_string(), |m| m.to_string()),
            ));
        }
        if self.match_inbound != external.match_inbound {
            out.push(FieldDiff::new(
                "match_inbound",
                yes_no(self.match_inbound),
                yes_no(external.match_inbound),
            ));
        }
        out
    }
}
