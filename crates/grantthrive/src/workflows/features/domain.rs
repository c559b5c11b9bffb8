use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{Configuration, FeatureDefinition, FeatureKey, RiskLevel};
use crate::access::OrganizationId;

/// Per-organization state of one catalog feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureToggle {
    pub organization_id: OrganizationId,
    pub feature_key: FeatureKey,
    pub is_enabled: bool,
    pub configuration: Configuration,
    pub risk_level: RiskLevel,
    pub tier: u8,
    pub updated_at: DateTime<Utc>,
}

impl FeatureToggle {
    /// Default row materialized the first time an organization is read.
    pub fn seeded(
        organization_id: OrganizationId,
        definition: &FeatureDefinition,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            organization_id,
            feature_key: definition.key,
            is_enabled: definition.enabled_by_default(),
            configuration: definition.default_configuration(),
            risk_level: definition.risk_level,
            tier: definition.tier,
            updated_at: now,
        }
    }
}

/// Toggle payload. Omitting `configuration` keeps the stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureUpdate {
    pub is_enabled: bool,
    #[serde(default)]
    pub configuration: Option<Configuration>,
}

/// Answer to "may this organization use the feature right now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCheck {
    pub feature_key: String,
    pub enabled: bool,
    pub configuration: Configuration,
}
