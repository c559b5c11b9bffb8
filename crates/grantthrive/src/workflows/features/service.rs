use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::catalog::{Configuration, FeatureDefinition, FeatureKey, CATALOG};
use super::domain::{FeatureCheck, FeatureToggle, FeatureUpdate};
use super::templates::{ComplianceTemplate, TemplateDescription};
use crate::access::{self, Caller, OrganizationId};
use crate::clock::Clock;
use crate::store::{Store, StoreTransaction};
use crate::workflows::error::{Entity, WorkflowError};

/// Every catalog feature for one organization, keyed for stable ordering.
pub type FeatureMap = BTreeMap<FeatureKey, FeatureToggle>;

/// Service owning the per-organization feature toggles and the gate other
/// community features consult.
pub struct FeatureToggleService<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> FeatureToggleService<S, C>
where
    S: Store + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    pub fn catalog(&self) -> &'static [FeatureDefinition] {
        &CATALOG
    }

    pub fn templates(&self) -> Vec<TemplateDescription> {
        ComplianceTemplate::ALL
            .into_iter()
            .map(ComplianceTemplate::describe)
            .collect()
    }

    /// Full feature map, seeding defaults on first access.
    pub fn get_features(
        &self,
        caller: &Caller,
        organization: OrganizationId,
    ) -> Result<FeatureMap, WorkflowError> {
        authorize_read(caller, organization)?;
        let now = self.clock.now();
        self.store
            .transaction(|tx| seeded_features(tx, organization, now))
    }

    pub fn set_feature(
        &self,
        caller: &Caller,
        organization: OrganizationId,
        feature: &str,
        update: FeatureUpdate,
    ) -> Result<FeatureToggle, WorkflowError> {
        authorize_write(caller, organization)?;
        let key = known_feature(feature)?;
        if let Some(configuration) = &update.configuration {
            validate(key, configuration)?;
        }

        let now = self.clock.now();
        let toggle = self.store.transaction(|tx| {
            let mut features = seeded_features(tx, organization, now)?;
            let toggle = apply_update(&mut features, key, update, now)?;
            tx.put_feature_toggle(toggle.clone())?;
            Ok::<_, WorkflowError>(toggle)
        })?;

        info!(
            organization_id = %organization,
            feature = %key,
            enabled = toggle.is_enabled,
            user_id = %caller.user_id,
            "feature toggled"
        );
        Ok(toggle)
    }

    /// Replace a feature's configuration without touching its enabled flag.
    pub fn update_configuration(
        &self,
        caller: &Caller,
        organization: OrganizationId,
        feature: &str,
        configuration: Configuration,
    ) -> Result<FeatureToggle, WorkflowError> {
        authorize_write(caller, organization)?;
        let key = known_feature(feature)?;
        validate(key, &configuration)?;

        let now = self.clock.now();
        let toggle = self.store.transaction(|tx| {
            let mut features = seeded_features(tx, organization, now)?;
            let toggle = features
                .get_mut(&key)
                .ok_or_else(|| WorkflowError::not_found(Entity::Feature, key))?;
            toggle.configuration = configuration;
            toggle.updated_at = now;
            tx.put_feature_toggle(toggle.clone())?;
            Ok::<_, WorkflowError>(toggle.clone())
        })?;

        info!(organization_id = %organization, feature = %key, "feature configuration replaced");
        Ok(toggle)
    }

    /// Apply several toggles at once. Any unknown key or invalid configuration
    /// rejects the whole batch.
    pub fn bulk_update(
        &self,
        caller: &Caller,
        organization: OrganizationId,
        updates: BTreeMap<String, FeatureUpdate>,
    ) -> Result<FeatureMap, WorkflowError> {
        authorize_write(caller, organization)?;
        let mut parsed = Vec::with_capacity(updates.len());
        for (feature, update) in updates {
            let key = known_feature(&feature)?;
            if let Some(configuration) = &update.configuration {
                validate(key, configuration)?;
            }
            parsed.push((key, update));
        }

        let now = self.clock.now();
        let count = parsed.len();
        let features = self.store.transaction(|tx| {
            let mut features = seeded_features(tx, organization, now)?;
            for (key, update) in parsed {
                let toggle = apply_update(&mut features, key, update, now)?;
                tx.put_feature_toggle(toggle)?;
            }
            Ok::<_, WorkflowError>(features)
        })?;

        info!(organization_id = %organization, updated = count, "feature toggles updated");
        Ok(features)
    }

    /// Overwrite every feature the template names, atomically.
    pub fn apply_template(
        &self,
        caller: &Caller,
        organization: OrganizationId,
        template: &str,
    ) -> Result<FeatureMap, WorkflowError> {
        authorize_write(caller, organization)?;
        let template = template.parse::<ComplianceTemplate>().map_err(|err| {
            warn!(organization_id = %organization, template = %err.0, "unknown compliance template");
            WorkflowError::not_found(Entity::Template, err.0)
        })?;

        let now = self.clock.now();
        let features = self.store.transaction(|tx| {
            let mut features = seeded_features(tx, organization, now)?;
            let described = template.describe();
            for (key, setting) in described.features {
                let toggle = features
                    .get_mut(&key)
                    .ok_or_else(|| WorkflowError::not_found(Entity::Feature, key))?;
                toggle.is_enabled = setting.is_enabled;
                toggle.configuration = setting.configuration;
                toggle.updated_at = now;
                tx.put_feature_toggle(toggle.clone())?;
            }
            Ok::<_, WorkflowError>(features)
        })?;

        info!(organization_id = %organization, template = %template, user_id = %caller.user_id, "compliance template applied");
        Ok(features)
    }

    /// Enabled flag and configuration for one feature. Unknown keys read as
    /// disabled.
    pub fn check(
        &self,
        caller: &Caller,
        organization: OrganizationId,
        feature: &str,
    ) -> Result<FeatureCheck, WorkflowError> {
        authorize_read(caller, organization)?;
        let Ok(key) = feature.parse::<FeatureKey>() else {
            debug!(organization_id = %organization, feature, "check on unknown feature");
            return Ok(FeatureCheck {
                feature_key: feature.to_string(),
                enabled: false,
                configuration: Configuration::new(),
            });
        };

        let now = self.clock.now();
        let features = self
            .store
            .transaction(|tx| seeded_features(tx, organization, now))?;
        let (enabled, configuration) = features
            .get(&key)
            .map(|toggle| (toggle.is_enabled, toggle.configuration.clone()))
            .unwrap_or_default();
        Ok(FeatureCheck {
            feature_key: key.to_string(),
            enabled,
            configuration,
        })
    }

    /// Pure read: a missing row counts as disabled.
    pub fn is_enabled(
        &self,
        organization: OrganizationId,
        key: FeatureKey,
    ) -> Result<bool, WorkflowError> {
        let toggles = self
            .store
            .transaction(|tx| tx.feature_toggles(organization))?;
        Ok(toggles
            .iter()
            .any(|toggle| toggle.feature_key == key && toggle.is_enabled))
    }

    /// Gate for community features: `Forbidden` unless the feature is on.
    pub fn ensure_enabled(
        &self,
        organization: OrganizationId,
        key: FeatureKey,
    ) -> Result<(), WorkflowError> {
        if self.is_enabled(organization, key)? {
            Ok(())
        } else {
            debug!(organization_id = %organization, feature = %key, "feature gate closed");
            Err(WorkflowError::Forbidden(
                "feature is not enabled for this organization",
            ))
        }
    }
}

fn authorize_read(caller: &Caller, organization: OrganizationId) -> Result<(), WorkflowError> {
    if access::can_read_features(caller, organization) {
        Ok(())
    } else {
        Err(WorkflowError::Forbidden(
            "can only view features for your own organization",
        ))
    }
}

fn authorize_write(caller: &Caller, organization: OrganizationId) -> Result<(), WorkflowError> {
    if access::can_manage_features(caller, organization) {
        Ok(())
    } else {
        warn!(user_id = %caller.user_id, organization_id = %organization, "feature change refused");
        Err(WorkflowError::Forbidden(
            "only organization administrators can change features",
        ))
    }
}

fn known_feature(raw: &str) -> Result<FeatureKey, WorkflowError> {
    raw.parse::<FeatureKey>()
        .map_err(|err| WorkflowError::not_found(Entity::Feature, err.0))
}

fn validate(key: FeatureKey, configuration: &Configuration) -> Result<(), WorkflowError> {
    key.definition()
        .validate(configuration)
        .map_err(WorkflowError::Validation)
}

/// Loads an organization's toggles, writing the default set when it has none.
fn seeded_features(
    tx: &mut dyn StoreTransaction,
    organization: OrganizationId,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<FeatureMap, WorkflowError> {
    let existing = tx.feature_toggles(organization)?;
    if !existing.is_empty() {
        return Ok(existing
            .into_iter()
            .map(|toggle| (toggle.feature_key, toggle))
            .collect());
    }

    let mut features = FeatureMap::new();
    for definition in &CATALOG {
        let toggle = FeatureToggle::seeded(organization, definition, now);
        tx.put_feature_toggle(toggle.clone())?;
        features.insert(definition.key, toggle);
    }
    info!(organization_id = %organization, "default feature set seeded");
    Ok(features)
}

fn apply_update(
    features: &mut FeatureMap,
    key: FeatureKey,
    update: FeatureUpdate,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<FeatureToggle, WorkflowError> {
    let toggle = features
        .get_mut(&key)
        .ok_or_else(|| WorkflowError::not_found(Entity::Feature, key))?;
    toggle.is_enabled = update.is_enabled;
    if let Some(configuration) = update.configuration {
        toggle.configuration = configuration;
    }
    toggle.updated_at = now;
    Ok(toggle.clone())
}
