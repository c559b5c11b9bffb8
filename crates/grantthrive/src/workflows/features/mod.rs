//! Per-organization feature toggles and compliance templates.

pub mod catalog;
pub mod domain;
pub mod router;
pub mod service;
pub mod templates;


pub use catalog::{
    Configuration, FeatureDefinition, FeatureKey, RiskLevel, Setting, SettingKind, SettingSpec,
    CATALOG,
};
pub use domain::{FeatureCheck, FeatureToggle, FeatureUpdate};
pub use router::feature_router;
pub use service::{FeatureMap, FeatureToggleService};
pub use templates::{ComplianceTemplate, FeatureSetting, TemplateDescription};
