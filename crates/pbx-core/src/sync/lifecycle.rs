//! Create, update and delete with immediate propagation
//!
//! Each mutation writes the store, regenerates the affected blocks and
//! reloads the engine. The three effects are reported independently in a
//! [`MutationOutcome`].

use pbx_model::{DialplanRule, Extension, Trunk, Validate, hash_secret, validate_secret};
use tracing::info;
use uuid::Uuid;

use super::engine::SyncEngine;
use super::report::{EntityRef, MutationOutcome, SyncReport};
use crate::error::{Error, Result};

impl SyncEngine {
    /// Store `secret` as a hash and keep the plaintext for rendering.
    fn apply_secret(&self, ext: &mut Extension, secret: Option<&str>) -> Result<()> {
        if let Some(secret) = secret {
            validate_secret(secret)?;
            ext.secret_hash = Some(hash_secret(secret));
            self.remember_secret(&ext.number, secret);
        }
        Ok(())
    }

    /// Run a store mutation, then push the affected entities.
    async fn mutate<F>(&self, f: F) -> MutationOutcome
    where
        F: FnOnce(&mut SyncReport) -> Result<Vec<EntityRef>>,
    {
        let mut outcome = SyncReport::new();
        let targets = match f(&mut outcome) {
            Ok(targets) => targets,
            Err(e) => {
                outcome.error(e);
                return outcome;
            }
        };
        outcome.database_changed = true;
        for target in &targets {
            outcome.merge(self.sync_one_to_external(target).await);
        }
        outcome
    }

    // ---- extensions ----

    pub async fn create_extension(&self, mut ext: Extension, secret: Option<&str>) -> MutationOutcome {
        self.mutate(|outcome| {
            ext.validate()?;
            if self.store().extension(&ext.number)?.is_some() {
                return Err(Error::AlreadyExists {
                    kind: "Extension",
                    key: ext.number.clone(),
                });
            }
            self.apply_secret(&mut ext, secret)?;
            let ext = self.store().upsert_extension(ext)?;
            info!(number = %ext.number, "created extension");
            outcome.action(format!("Created extension {}", ext.number));
            Ok(vec![EntityRef::Extension(ext.number)])
        })
        .await
    }

    /// Replace a stored extension. Without `secret` the stored hash is kept.
    pub async fn update_extension(&self, mut ext: Extension, secret: Option<&str>) -> MutationOutcome {
        self.mutate(|outcome| {
            ext.validate()?;
            let existing = self
                .store()
                .extension(&ext.number)?
                .ok_or_else(|| Error::not_found("Extension", ext.number.clone()))?;
            ext.secret_hash = existing.secret_hash;
            self.apply_secret(&mut ext, secret)?;
            let ext = self.store().upsert_extension(ext)?;
            info!(number = %ext.number, "updated extension");
            outcome.action(format!("Updated extension {}", ext.number));
            Ok(vec![EntityRef::Extension(ext.number)])
        })
        .await
    }

    pub async fn delete_extension(&self, number: &str) -> MutationOutcome {
        self.mutate(|outcome| {
            self.store()
                .delete_extension(number)?
                .ok_or_else(|| Error::not_found("Extension", number))?;
            self.forget_secret(number);
            info!(number, "deleted extension");
            outcome.action(format!("Deleted extension {}", number));
            Ok(vec![EntityRef::Extension(number.to_string())])
        })
        .await
    }

    // ---- trunks ----

    pub async fn create_trunk(&self, trunk: Trunk) -> MutationOutcome {
        self.mutate(|outcome| {
            trunk.validate()?;
            if self.store().trunk(&trunk.name)?.is_some() {
                return Err(Error::AlreadyExists {
                    kind: "Trunk",
                    key: trunk.name.clone(),
                });
            }
            let trunk = self.store().upsert_trunk(trunk)?;
            info!(name = %trunk.name, "created trunk");
            outcome.action(format!("Created trunk {}", trunk.name));
            Ok(vec![EntityRef::Trunk(trunk.name)])
        })
        .await
    }

    pub async fn update_trunk(&self, trunk: Trunk) -> MutationOutcome {
        self.mutate(|outcome| {
            trunk.validate()?;
            if self.store().trunk(&trunk.name)?.is_none() {
                return Err(Error::not_found("Trunk", trunk.name.clone()));
            }
            let trunk = self.store().upsert_trunk(trunk)?;
            info!(name = %trunk.name, "updated trunk");
            outcome.action(format!("Updated trunk {}", trunk.name));
            Ok(vec![EntityRef::Trunk(trunk.name)])
        })
        .await
    }

    pub async fn delete_trunk(&self, name: &str) -> MutationOutcome {
        self.mutate(|outcome| {
            self.store()
                .delete_trunk(name)?
                .ok_or_else(|| Error::not_found("Trunk", name))?;
            info!(name, "deleted trunk");
            outcome.action(format!("Deleted trunk {}", name));
            Ok(vec![EntityRef::Trunk(name.to_string())])
        })
        .await
    }

    // ---- dialplan rules ----

    pub async fn create_rule(&self, rule: DialplanRule) -> MutationOutcome {
        self.mutate(|outcome| {
            rule.validate()?;
            if self.store().rule(rule.id)?.is_some() {
                return Err(Error::AlreadyExists {
                    kind: "Dialplan rule",
                    key: rule.id.to_string(),
                });
            }
            let rule = self.store().upsert_rule(rule)?;
            info!(id = %rule.id, context = %rule.context, "created dialplan rule");
            outcome.action(format!("Created rule '{}' in {}", rule.name, rule.context));
            Ok(vec![EntityRef::Dialplan(rule.context)])
        })
        .await
    }

    /// Replace a stored rule. Moving it to another context rewrites both.
    pub async fn update_rule(&self, rule: DialplanRule) -> MutationOutcome {
        self.mutate(|outcome| {
            rule.validate()?;
            let existing = self
                .store()
                .rule(rule.id)?
                .ok_or_else(|| Error::not_found("Dialplan rule", rule.id.to_string()))?;
            let rule = self.store().upsert_rule(rule)?;
            info!(id = %rule.id, context = %rule.context, "updated dialplan rule");
            outcome.action(format!("Updated rule '{}' in {}", rule.name, rule.context));

            let moved = existing.context != rule.context;
            let mut targets = vec![EntityRef::Dialplan(rule.context)];
            if moved {
                targets.push(EntityRef::Dialplan(existing.context));
            }
            Ok(targets)
        })
        .await
    }

    pub async fn delete_rule(&self, id: Uuid) -> MutationOutcome {
        self.mutate(|outcome| {
            let rule = self
                .store()
                .delete_rule(id)?
                .ok_or_else(|| Error::not_found("Dialplan rule", id.to_string()))?;
            info!(%id, context = %rule.context, "deleted dialplan rule");
            outcome.action(format!("Deleted rule '{}' from {}", rule.name, rule.context));
            Ok(vec![EntityRef::Dialplan(rule.context)])
        })
        .await
    }
}
