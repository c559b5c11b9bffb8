//! Fixed catalog of optional community features and the configuration keys
//! each one accepts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Feature-specific settings stored alongside a toggle.
pub type Configuration = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    ResourceLibrary,
    GrantStatistics,
    GrantCalendar,
    QaPlatform,
    SuccessStories,
    Forums,
    ProfessionalMarketplace,
    Networking,
    Gamification,
}

impl FeatureKey {
    pub const ALL: [FeatureKey; 9] = [
        FeatureKey::ResourceLibrary,
        FeatureKey::GrantStatistics,
        FeatureKey::GrantCalendar,
        FeatureKey::QaPlatform,
        FeatureKey::SuccessStories,
        FeatureKey::Forums,
        FeatureKey::ProfessionalMarketplace,
        FeatureKey::Networking,
        FeatureKey::Gamification,
    ];
    pub const FIRST: FeatureKey = FeatureKey::ResourceLibrary;
    pub const LAST: FeatureKey = FeatureKey::Gamification;

    pub const fn as_str(self) -> &'static str {
        match self {
            FeatureKey::ResourceLibrary => "resource_library",
            FeatureKey::GrantStatistics => "grant_statistics",
            FeatureKey::GrantCalendar => "grant_calendar",
            FeatureKey::QaPlatform => "qa_platform",
            FeatureKey::SuccessStories => "success_stories",
            FeatureKey::Forums => "forums",
            FeatureKey::ProfessionalMarketplace => "professional_marketplace",
            FeatureKey::Networking => "networking",
            FeatureKey::Gamification => "gamification",
        }
    }

    pub fn definition(self) -> &'static FeatureDefinition {
        &CATALOG[self as usize]
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature '{0}'")]
pub struct UnknownFeature(pub String);

impl FromStr for FeatureKey {
    type Err = UnknownFeature;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        FeatureKey::ALL
            .into_iter()
            .find(|key| key.as_str() == raw)
            .ok_or_else(|| UnknownFeature(raw.to_string()))
    }
}

/// Descriptive compliance rating; does not gate anything on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Value a setting may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "options")]
pub enum SettingKind {
    Flag,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingSpec {
    pub key: &'static str,
    pub kind: SettingKind,
}

/// Literal setting value used by defaults and templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Setting {
    Flag(bool),
    Choice(&'static str),
}

impl Setting {
    fn to_value(self) -> Value {
        match self {
            Setting::Flag(flag) => Value::Bool(flag),
            Setting::Choice(choice) => Value::String(choice.to_string()),
        }
    }
}

pub(crate) fn configuration_from(settings: &[(&'static str, Setting)]) -> Configuration {
    settings
        .iter()
        .map(|(key, setting)| (key.to_string(), setting.to_value()))
        .collect()
}

const MODERATION: &[&str] = &["pre_approval", "post_approval", "community"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureDefinition {
    pub key: FeatureKey,
    pub name: &'static str,
    pub description: &'static str,
    pub tier: u8,
    pub risk_level: RiskLevel,
    pub moderation_required: bool,
    pub allowed_settings: &'static [SettingSpec],
    pub default_settings: &'static [(&'static str, Setting)],
}

impl FeatureDefinition {
    /// Tier 1 features start enabled for a new organization.
    pub const fn enabled_by_default(&self) -> bool {
        self.tier == 1
    }

    pub fn default_configuration(&self) -> Configuration {
        configuration_from(self.default_settings)
    }

    /// Checks every key and value against the allowed settings.
    pub fn validate(&self, configuration: &Configuration) -> Result<(), String> {
        for (key, value) in configuration {
            let spec = self
                .allowed_settings
                .iter()
                .find(|spec| spec.key == key.as_str())
                .ok_or_else(|| format!("{} does not accept setting '{key}'", self.key))?;
            match spec.kind {
                SettingKind::Flag if value.is_boolean() => {}
                SettingKind::Flag => {
                    return Err(format!("{}.{key} must be true or false", self.key));
                }
                SettingKind::Choice(options) => {
                    if !value.as_str().is_some_and(|choice| options.contains(&choice)) {
                        return Err(format!(
                            "{}.{key} must be one of: {}",
                            self.key,
                            options.join(", ")
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

const fn flag(key: &'static str) -> SettingSpec {
    SettingSpec {
        key,
        kind: SettingKind::Flag,
    }
}

const fn moderation() -> SettingSpec {
    SettingSpec {
        key: "moderation",
        kind: SettingKind::Choice(MODERATION),
    }
}

/// Indexed by `FeatureKey` discriminant.
pub static CATALOG: [FeatureDefinition; 9] = [
    FeatureDefinition {
        key: FeatureKey::ResourceLibrary,
        name: "Resource Library",
        description: "Document and template sharing",
        tier: 1,
        risk_level: RiskLevel::Low,
        moderation_required: false,
        allowed_settings: &[flag("allow_uploads"), moderation()],
        default_settings: &[
            ("allow_uploads", Setting::Flag(false)),
            ("moderation", Setting::Choice("pre_approval")),
        ],
    },
    FeatureDefinition {
        key: FeatureKey::GrantStatistics,
        name: "Grant Statistics",
        description: "Anonymized grant data and analytics",
        tier: 1,
        risk_level: RiskLevel::Low,
        moderation_required: false,
        allowed_settings: &[flag("anonymized_only")],
        default_settings: &[("anonymized_only", Setting::Flag(true))],
    },
    FeatureDefinition {
        key: FeatureKey::GrantCalendar,
        name: "Grant Calendar",
        description: "Grant deadlines and events calendar",
        tier: 1,
        risk_level: RiskLevel::Low,
        moderation_required: false,
        allowed_settings: &[flag("public_events_only")],
        default_settings: &[("public_events_only", Setting::Flag(true))],
    },
    FeatureDefinition {
        key: FeatureKey::QaPlatform,
        name: "Q&A Platform",
        description: "Community questions and answers",
        tier: 2,
        risk_level: RiskLevel::Medium,
        moderation_required: true,
        allowed_settings: &[moderation()],
        default_settings: &[("moderation", Setting::Choice("pre_approval"))],
    },
    FeatureDefinition {
        key: FeatureKey::SuccessStories,
        name: "Success Stories",
        description: "Grant success showcases",
        tier: 2,
        risk_level: RiskLevel::Medium,
        moderation_required: true,
        allowed_settings: &[flag("council_curated")],
        default_settings: &[("council_curated", Setting::Flag(true))],
    },
    FeatureDefinition {
        key: FeatureKey::Forums,
        name: "Discussion Forums",
        description: "Open community discussions",
        tier: 3,
        risk_level: RiskLevel::High,
        moderation_required: true,
        allowed_settings: &[moderation(), flag("categories_limited")],
        default_settings: &[
            ("moderation", Setting::Choice("pre_approval")),
            ("categories_limited", Setting::Flag(true)),
        ],
    },
    FeatureDefinition {
        key: FeatureKey::ProfessionalMarketplace,
        name: "Professional Marketplace",
        description: "Professional services booking",
        tier: 3,
        risk_level: RiskLevel::High,
        moderation_required: true,
        allowed_settings: &[flag("verification_required")],
        default_settings: &[("verification_required", Setting::Flag(true))],
    },
    FeatureDefinition {
        key: FeatureKey::Networking,
        name: "User Networking",
        description: "Direct user connections",
        tier: 3,
        risk_level: RiskLevel::High,
        moderation_required: false,
        allowed_settings: &[flag("events_only")],
        default_settings: &[("events_only", Setting::Flag(true))],
    },
    FeatureDefinition {
        key: FeatureKey::Gamification,
        name: "Gamification",
        description: "Points, badges, and achievements",
        tier: 3,
        risk_level: RiskLevel::Medium,
        moderation_required: false,
        allowed_settings: &[
            flag("basic_points"),
            flag("achievements"),
            flag("leaderboards"),
        ],
        default_settings: &[("basic_points", Setting::Flag(true))],
    },
];
