//! Orchestration between the entity store and the engine files
//!
//! Every operation here is built from three steps: read one side, write the
//! other, then ask the engine to reload. Each step reports separately into a
//! [`SyncReport`]; a failed reload never undoes a write.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use pbx_blocks::{read_blocks, remove_block_from_file, remove_managed_block, replace_block_in_file, replace_managed_block};
use pbx_config::unified_diff;
use pbx_engine::{ReloadCoordinator, ReloadOutcome, ReloadScope};
use pbx_fs::{backup_file, read_text_or_empty};
use pbx_model::{Extension, Trunk, Validate, hash_secret, secret_matches};
use tracing::{debug, info, warn};

use super::report::{DiffReport, EntityRef, ReconcileReport, SyncReport};
use super::throttle::ReconcileThrottle;
use crate::config::{FilesConfig, ReconcilerConfig};
use crate::diff::{Classification, diff_extensions, diff_trunks};
use crate::error::{Error, Result};
use crate::generate::{
    BlockOwner, LOCAL_EXTENSIONS_LABEL, OUTBOUND_ROUTES_LABEL, dialplan_label, extension_label,
    render_dialplan, render_extension, render_local_extensions, render_outbound_routes,
    render_trunk, trunk_label,
};
use crate::parse::{ExternalExtension, ExternalState, ExternalTrunk, parse_endpoints};
use crate::store::{EntityStore, InventoryFile};

/// Which engine files an operation changed.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Touched {
    pub endpoints: bool,
    pub dialplan: bool,
}

impl Touched {
    pub fn any(&self) -> bool {
        self.endpoints || self.dialplan
    }
}

/// Engine for reconciling the entity store with the engine files
///
/// The SyncEngine provides four groups of operations:
/// - **push**: render database entities into managed blocks
/// - **pull**: import hand-edited engine sections into the database
/// - **diff**: classify every identity without changing anything
/// - **reconcile**: throttled import/export of one-sided entities, leaving
///   mismatches for an operator
pub struct SyncEngine {
    store: Arc<dyn EntityStore>,
    coordinator: Arc<ReloadCoordinator>,
    files: FilesConfig,
    throttle: Arc<ReconcileThrottle>,
    /// Plaintext secrets set during this process, keyed by extension number.
    /// Never persisted; the store only holds hashes.
    secrets: Mutex<HashMap<String, String>>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn EntityStore>, coordinator: Arc<ReloadCoordinator>, files: FilesConfig) -> Self {
        Self {
            store,
            coordinator,
            files,
            throttle: Arc::new(ReconcileThrottle::default()),
            secrets: Mutex::new(HashMap::new()),
        }
    }

    /// Engine over the configured inventory file and reload backends.
    pub fn from_config(config: &ReconcilerConfig) -> Self {
        Self::new(
            Arc::new(InventoryFile::new(&config.store.path)),
            Arc::new(config.coordinator()),
            config.files.clone(),
        )
        .with_throttle(Arc::new(ReconcileThrottle::new(config.reconcile.cooldown())))
    }

    /// Share a throttle with other engines.
    pub fn with_throttle(mut self, throttle: Arc<ReconcileThrottle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub fn files(&self) -> &FilesConfig {
        &self.files
    }

    pub fn throttle(&self) -> &Arc<ReconcileThrottle> {
        &self.throttle
    }

    // ---- secrets ----

    pub(crate) fn remember_secret(&self, number: &str, plaintext: &str) {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(number.to_string(), plaintext.to_string());
    }

    pub(crate) fn forget_secret(&self, number: &str) {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(number);
    }

    /// Plaintext for the extension's stored hash.
    ///
    /// Tries the secret set in this process first, then the password already
    /// in the engine file. Either must hash to the stored value.
    fn resolve_secret(&self, ext: &Extension, external: Option<&ExternalExtension>) -> Result<Option<String>> {
        let Some(hash) = ext.secret_hash.as_deref() else {
            return Ok(None);
        };
        let pending = self
            .secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ext.number)
            .cloned();
        let candidates = pending
            .into_iter()
            .chain(external.and_then(|e| e.password.clone()));
        for candidate in candidates {
            if secret_matches(&candidate, hash) {
                return Ok(Some(candidate));
            }
        }
        Err(Error::SecretUnavailable {
            number: ext.number.clone(),
        })
    }

    // ---- reading ----

    /// Parse the endpoints file. A missing file parses as empty.
    pub fn parse_all(&self) -> Result<ExternalState> {
        let text = read_text_or_empty(&self.files.endpoints)?;
        Ok(parse_endpoints(&text))
    }

    /// Classify every extension and trunk on either side.
    pub fn diff(&self) -> Result<DiffReport> {
        let external = self.parse_all()?;
        Ok(DiffReport {
            extensions: diff_extensions(&self.store.extensions()?, &external.extensions),
            trunks: diff_trunks(&self.store.trunks()?, &external.trunks),
        })
    }

    /// Block content for one entity as it would be written now.
    pub fn generate(&self, entity: &EntityRef) -> Result<String> {
        match self.desired_block(entity)? {
            (_, _, Some(content)) => Ok(content),
            (_, _, None) => Err(not_found(entity)),
        }
    }

    /// Unified diff of the file change a push of `entity` would make.
    ///
    /// Empty when the file is already up to date.
    pub fn preview_to_external(&self, entity: &EntityRef) -> Result<String> {
        let (path, label, content) = self.desired_block(entity)?;
        let current = read_text_or_empty(path)?;
        let proposed = match content {
            Some(content) => replace_managed_block(&current, &label, &content)?,
            None => remove_managed_block(&current, &label)?,
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(unified_diff(&current, &proposed, &name))
    }

    /// Target file, label and content for an entity. `None` content means
    /// the block should not exist.
    fn desired_block(&self, entity: &EntityRef) -> Result<(&Path, String, Option<String>)> {
        match entity {
            EntityRef::Extension(number) => {
                let content = match self.store.extension(number)? {
                    Some(ext) if ext.enabled => {
                        let external = self.parse_all()?;
                        Some(self.render_extension_block(&ext, external.extension(number))?)
                    }
                    _ => None,
                };
                Ok((self.files.endpoints.as_path(), extension_label(number), content))
            }
            EntityRef::Trunk(name) => {
                let content = match self.store.trunk(name)? {
                    Some(trunk) if trunk.enabled => {
                        trunk.validate()?;
                        Some(render_trunk(&trunk))
                    }
                    _ => None,
                };
                Ok((self.files.endpoints.as_path(), trunk_label(name), content))
            }
            EntityRef::Dialplan(context) => {
                let rules: Vec<_> = self
                    .store
                    .rules()?
                    .into_iter()
                    .filter(|r| &r.context == context)
                    .collect();
                for rule in &rules {
                    rule.validate()?;
                }
                let content = render_dialplan(&rules).into_iter().next().map(|(_, text)| text);
                Ok((self.files.dialplan.as_path(), dialplan_label(context), content))
            }
        }
    }

    fn render_extension_block(&self, ext: &Extension, external: Option<&ExternalExtension>) -> Result<String> {
        ext.validate()?;
        let password = self.resolve_secret(ext, external)?;
        Ok(render_extension(ext, password.as_deref()))
    }

    // ---- writing ----

    /// Replace (or insert) one managed block.
    pub fn write(&self, path: &Path, label: &str, content: &str) -> Result<crate::WriteOutcome> {
        Ok(replace_block_in_file(path, label, content)?)
    }

    fn put_block(&self, path: &Path, label: &str, content: Option<&str>, report: &mut SyncReport) -> Result<bool> {
        let changed = match content {
            Some(content) => replace_block_in_file(path, label, content)?.changed,
            None => remove_block_from_file(path, label)?.changed,
        };
        if changed {
            let verb = if content.is_some() { "Wrote" } else { "Removed" };
            info!(file = %path.display(), label, "{} managed block", verb.to_lowercase());
            report.action(format!("{} block '{}' in {}", verb, label, path.display()));
        }
        Ok(changed)
    }

    /// Write or remove one extension's block to match the database.
    fn export_extension(&self, ext: &Extension, external: &ExternalState, report: &mut SyncReport) -> Result<bool> {
        let content = if ext.enabled {
            Some(self.render_extension_block(ext, external.extension(&ext.number))?)
        } else {
            None
        };
        self.put_block(&self.files.endpoints, &extension_label(&ext.number), content.as_deref(), report)
    }

    fn export_trunk(&self, trunk: &Trunk, report: &mut SyncReport) -> Result<bool> {
        let content = if trunk.enabled {
            trunk.validate()?;
            Some(render_trunk(trunk))
        } else {
            None
        };
        self.put_block(&self.files.endpoints, &trunk_label(&trunk.name), content.as_deref(), report)
    }

    fn write_local_extensions(&self, report: &mut SyncReport) -> Result<bool> {
        let content = render_local_extensions(&self.store.extensions()?);
        self.put_block(&self.files.dialplan, LOCAL_EXTENSIONS_LABEL, content.as_deref(), report)
    }

    fn write_outbound_routes(&self, report: &mut SyncReport) -> Result<bool> {
        let content = render_outbound_routes(&self.store.trunks()?);
        self.put_block(&self.files.dialplan, OUTBOUND_ROUTES_LABEL, content.as_deref(), report)
    }

    fn write_context(&self, context: &str, report: &mut SyncReport) -> Result<bool> {
        let (path, label, content) = self.desired_block(&EntityRef::Dialplan(context.to_string()))?;
        self.put_block(path, &label, content.as_deref(), report)
    }

    /// Rewrite every generated dialplan block and drop those for contexts
    /// that no longer have rules.
    pub(crate) fn regenerate_dialplan(&self, report: &mut SyncReport) -> Result<bool> {
        let rules = self.store.rules()?;
        let mut changed = false;

        let mut valid = Vec::with_capacity(rules.len());
        for rule in rules {
            match rule.validate() {
                Ok(()) => valid.push(rule),
                Err(e) => report.error(format!("rule '{}' in {}: {}", rule.name, rule.context, e)),
            }
        }

        let rendered = render_dialplan(&valid);
        let live: HashSet<&str> = rendered.iter().map(|(context, _)| context.as_str()).collect();
        for (label, _) in read_blocks(&self.files.dialplan)? {
            if let BlockOwner::Dialplan(context) = BlockOwner::from_label(&label)
                && !live.contains(context.as_str())
            {
                changed |= self.put_block(&self.files.dialplan, &label, None, report)?;
            }
        }
        for (context, text) in &rendered {
            changed |= self.put_block(&self.files.dialplan, &dialplan_label(context), Some(text.as_str()), report)?;
        }

        changed |= self.write_local_extensions(report)?;
        changed |= self.write_outbound_routes(report)?;
        Ok(changed)
    }

    // ---- reloading ----

    pub async fn reload(&self, scope: ReloadScope) -> ReloadOutcome {
        self.coordinator.reload(scope).await
    }

    /// Reload the scopes whose files changed.
    pub(crate) async fn reload_touched(&self, touched: Touched, report: &mut SyncReport) {
        if touched.endpoints {
            report.record_reload(self.reload(ReloadScope::Endpoints).await);
        }
        if touched.dialplan {
            report.record_reload(self.reload(ReloadScope::Dialplan).await);
        }
    }

    // ---- push ----

    /// Bring one entity's managed block in line with the database.
    ///
    /// An entity missing from the database has its block removed. Only the
    /// scopes whose file changed are reloaded.
    pub async fn sync_one_to_external(&self, entity: &EntityRef) -> SyncReport {
        let mut report = SyncReport::new();
        match self.push_one(entity, &mut report) {
            Ok(touched) => {
                report.file_changed = touched.any();
                self.reload_touched(touched, &mut report).await;
            }
            Err(e) => {
                warn!(%entity, error = %e, "push failed");
                report.error(format!("{}: {}", entity, e));
            }
        }
        report
    }

    fn push_one(&self, entity: &EntityRef, report: &mut SyncReport) -> Result<Touched> {
        let mut touched = Touched::default();
        match entity {
            EntityRef::Extension(number) => {
                touched.endpoints = match self.store.extension(number)? {
                    Some(ext) => self.export_extension(&ext, &self.parse_all()?, report)?,
                    None => self.put_block(&self.files.endpoints, &extension_label(number), None, report)?,
                };
                touched.dialplan = self.write_local_extensions(report)?;
            }
            EntityRef::Trunk(name) => {
                touched.endpoints = match self.store.trunk(name)? {
                    Some(trunk) => self.export_trunk(&trunk, report)?,
                    None => self.put_block(&self.files.endpoints, &trunk_label(name), None, report)?,
                };
                touched.dialplan = self.write_outbound_routes(report)?;
            }
            EntityRef::Dialplan(context) => {
                touched.dialplan = self.write_context(context, report)?;
            }
        }
        Ok(touched)
    }

    /// Rewrite every managed block from the database.
    ///
    /// Both files are backed up first. Blocks for entities that no longer
    /// exist are removed. Endpoints and dialplan are each reloaded once.
    pub async fn sync_all_to_external(&self) -> SyncReport {
        let mut report = SyncReport::new();
        match self.push_all(&mut report) {
            Ok(touched) => report.file_changed = touched.any(),
            Err(e) => {
                warn!(error = %e, "bulk push failed");
                report.error(e);
            }
        }
        self.reload_touched(
            Touched {
                endpoints: true,
                dialplan: true,
            },
            &mut report,
        )
        .await;
        report
    }

    fn push_all(&self, report: &mut SyncReport) -> Result<Touched> {
        for path in [&self.files.endpoints, &self.files.dialplan] {
            if let Some(backup) = backup_file(path, &self.files.backup_dir)? {
                report.action(format!("Backed up {} to {}", path.display(), backup.display()));
            }
        }

        let external = self.parse_all()?;
        let extensions = self.store.extensions()?;
        let trunks = self.store.trunks()?;
        let mut touched = Touched::default();

        for ext in &extensions {
            match self.export_extension(ext, &external, report) {
                Ok(changed) => touched.endpoints |= changed,
                Err(e) => report.error(format!("extension {}: {}", ext.number, e)),
            }
        }
        for trunk in &trunks {
            match self.export_trunk(trunk, report) {
                Ok(changed) => touched.endpoints |= changed,
                Err(e) => report.error(format!("trunk {}: {}", trunk.name, e)),
            }
        }

        let numbers: HashSet<&str> = extensions.iter().map(|e| e.number.as_str()).collect();
        let names: HashSet<&str> = trunks.iter().map(|t| t.name.as_str()).collect();
        for (label, _) in read_blocks(&self.files.endpoints)? {
            let orphan = match BlockOwner::from_label(&label) {
                BlockOwner::Extension(number) => !numbers.contains(number.as_str()),
                BlockOwner::Trunk(name) => !names.contains(name.as_str()),
                _ => false,
            };
            if orphan {
                touched.endpoints |= self.put_block(&self.files.endpoints, &label, None, report)?;
            }
        }

        touched.dialplan = self.regenerate_dialplan(report)?;
        Ok(touched)
    }

    // ---- pull ----

    /// Create or update one database entity from the engine file.
    pub async fn sync_one_from_external(&self, entity: &EntityRef) -> SyncReport {
        let mut report = SyncReport::new();
        let result = self.parse_all().and_then(|external| match entity {
            EntityRef::Extension(number) => {
                let ext = external.extension(number).ok_or_else(|| not_found(entity))?;
                self.import_extension(ext, &mut report)
            }
            EntityRef::Trunk(name) => {
                let trunk = external.trunk(name).ok_or_else(|| not_found(entity))?;
                self.import_trunk(trunk, &mut report)
            }
            EntityRef::Dialplan(_) => Err(Error::Unsupported(
                "dialplan rules are pushed from the database, never imported".to_string(),
            )),
        });
        match result {
            Ok(changed) => report.database_changed = changed,
            Err(e) => report.error(format!("{}: {}", entity, e)),
        }
        report
    }

    /// Import every extension and trunk found in the engine file.
    pub async fn sync_all_from_external(&self) -> SyncReport {
        let mut report = SyncReport::new();
        let external = match self.parse_all() {
            Ok(external) => external,
            Err(e) => {
                report.error(e);
                return report;
            }
        };
        for ext in &external.extensions {
            match self.import_extension(ext, &mut report) {
                Ok(changed) => report.database_changed |= changed,
                Err(e) => report.error(format!("extension {}: {}", ext.number, e)),
            }
        }
        for trunk in &external.trunks {
            match self.import_trunk(trunk, &mut report) {
                Ok(changed) => report.database_changed |= changed,
                Err(e) => report.error(format!("trunk {}: {}", trunk.name, e)),
            }
        }
        report
    }

    /// Returns whether the store changed.
    fn import_extension(&self, external: &ExternalExtension, report: &mut SyncReport) -> Result<bool> {
        let existing = self.store.extension(&external.number)?;
        let mut ext = existing
            .clone()
            .unwrap_or_else(|| Extension::new(&external.number, ""));
        if let Some(name) = &external.name {
            ext.name = name.clone();
        }
        ext.context = external.context.clone();
        ext.transport = external.transport;
        ext.codecs = external.codecs.clone();
        ext.max_contacts = external.max_contacts;
        ext.qualify_frequency = external.qualify_frequency;
        ext.direct_media = external.direct_media;
        ext.enabled = true;
        if let Some(password) = &external.password
            && !ext
                .secret_hash
                .as_deref()
                .is_some_and(|hash| secret_matches(password, hash))
        {
            ext.secret_hash = Some(hash_secret(password));
        }

        if existing.as_ref() == Some(&ext) {
            debug!(number = %ext.number, "extension already up to date");
            return Ok(false);
        }
        ext.validate()?;
        let verb = if existing.is_some() { "Updated" } else { "Imported" };
        self.store.upsert_extension(ext)?;
        info!(number = %external.number, "{} extension from engine file", verb.to_lowercase());
        report.action(format!("{} extension {}", verb, external.number));
        Ok(true)
    }

    fn import_trunk(&self, external: &ExternalTrunk, report: &mut SyncReport) -> Result<bool> {
        let existing = self.store.trunk(&external.name)?;
        let mut trunk = existing
            .clone()
            .unwrap_or_else(|| Trunk::new(&external.name, &external.host));
        trunk.host = external.host.clone();
        trunk.port = external.port;
        trunk.username = external.username.clone();
        trunk.password = external.password.clone();
        trunk.transport = external.transport;
        trunk.codecs = external.codecs.clone();
        trunk.context = external.context.clone();
        trunk.max_channels = external.max_channels;
        trunk.match_inbound = external.match_inbound;
        trunk.enabled = true;

        if existing.as_ref() == Some(&trunk) {
            debug!(name = %trunk.name, "trunk already up to date");
            return Ok(false);
        }
        trunk.validate()?;
        let verb = if existing.is_some() { "Updated" } else { "Imported" };
        self.store.upsert_trunk(trunk)?;
        info!(name = %external.name, "{} trunk from engine file", verb.to_lowercase());
        report.action(format!("{} trunk {}", verb, external.name));
        Ok(true)
    }

    // ---- reconcile ----

    /// One throttled reconciliation pass.
    ///
    /// Entities only in the file are imported, entities only in the
    /// database are exported, and mismatched pairs are logged as conflicts
    /// and left alone. Returns with `ran == false` inside the cooldown.
    pub async fn auto_reconcile(&self) -> ReconcileReport {
        if !self.throttle.try_acquire() {
            debug!("reconcile skipped, cooldown running");
            return ReconcileReport::skipped();
        }

        let mut report = ReconcileReport::started();
        if let Err(e) = self.reconcile_pass(&mut report) {
            warn!(error = %e, "reconcile pass failed");
            report.sync.error(e);
        }
        if !report.exported.is_empty() || !report.imported.is_empty() {
            let outcome = self.reload(ReloadScope::Full).await;
            report.sync.record_reload(outcome);
        }
        info!(
            imported = report.imported.len(),
            exported = report.exported.len(),
            conflicts = report.conflicts.len(),
            "reconcile pass finished"
        );
        report
    }

    fn reconcile_pass(&self, report: &mut ReconcileReport) -> Result<()> {
        let external = self.parse_all()?;
        let extensions = self.store.extensions()?;
        let trunks = self.store.trunks()?;

        for record in diff_extensions(&extensions, &external.extensions) {
            let entity = EntityRef::Extension(record.key.clone());
            let step = match record.classification {
                Classification::Match => continue,
                Classification::Mismatch => {
                    log_conflict(&entity, &record.differences);
                    report.conflicts.push(record);
                    continue;
                }
                Classification::ExternalOnly => match external.extension(&record.key) {
                    Some(ext) => Step::Import(self.import_extension(ext, &mut report.sync)),
                    None => continue,
                },
                Classification::DatabaseOnly => match extensions.iter().find(|e| e.number == record.key) {
                    Some(ext) => Step::Export(self.export_extension(ext, &external, &mut report.sync)),
                    None => continue,
                },
            };
            report.apply(entity, step);
        }

        for record in diff_trunks(&trunks, &external.trunks) {
            let entity = EntityRef::Trunk(record.key.clone());
            let step = match record.classification {
                Classification::Match => continue,
                Classification::Mismatch => {
                    log_conflict(&entity, &record.differences);
                    report.conflicts.push(record);
                    continue;
                }
                Classification::ExternalOnly => match external.trunk(&record.key) {
                    Some(trunk) => Step::Import(self.import_trunk(trunk, &mut report.sync)),
                    None => continue,
                },
                Classification::DatabaseOnly => match trunks.iter().find(|t| t.name == record.key) {
                    Some(trunk) => Step::Export(self.export_trunk(trunk, &mut report.sync)),
                    None => continue,
                },
            };
            report.apply(entity, step);
        }

        if !report.imported.is_empty() || !report.exported.is_empty() {
            let dialplan = self.regenerate_dialplan(&mut report.sync)?;
            report.sync.file_changed |= dialplan;
        }
        Ok(())
    }
}

/// Outcome of moving one entity across during a reconcile pass.
enum Step {
    Import(Result<bool>),
    Export(Result<bool>),
}

impl ReconcileReport {
    /// Record `step` for `entity`; entities are listed only when something
    /// actually changed.
    fn apply(&mut self, entity: EntityRef, step: Step) {
        match step {
            Step::Import(Ok(changed)) => {
                self.sync.database_changed |= changed;
                if changed {
                    self.imported.push(entity.to_string());
                }
            }
            Step::Export(Ok(changed)) => {
                self.sync.file_changed |= changed;
                if changed {
                    self.exported.push(entity.to_string());
                }
            }
            Step::Import(Err(e)) | Step::Export(Err(e)) => {
                self.sync.error(format!("{}: {}", entity, e));
            }
        }
    }
}

/// Run [`SyncEngine::auto_reconcile`] once per cooldown until the task is
/// aborted.
pub fn spawn_auto_reconcile(engine: Arc<SyncEngine>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let period = engine.throttle().cooldown().max(Duration::from_secs(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let report = engine.auto_reconcile().await;
            for error in &report.sync.errors {
                warn!(error = %error, "reconcile error");
            }
        }
    })
}

fn not_found(entity: &EntityRef) -> Error {
    let (kind, key) = match entity {
        EntityRef::Extension(key) => ("Extension", key),
        EntityRef::Trunk(key) => ("Trunk", key),
        EntityRef::Dialplan(key) => ("Dialplan context", key),
    };
    Error::not_found(kind, key.clone())
}

fn log_conflict(entity: &EntityRef, differences: &[crate::diff::FieldDiff]) {
    let fields: Vec<String> = differences.iter().map(ToString::to_string).collect();
    warn!(
        target: "pbx::conflict",
        %entity,
        differences = %fields.join("; "),
        "database and engine file disagree"
    );
}
