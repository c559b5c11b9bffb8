//! Pre-vetted compliance bundles. Each template names every catalog feature;
//! disabled entries carry an empty configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::catalog::{configuration_from, Configuration, FeatureKey, Setting};
use FeatureKey::*;
use Setting::{Choice, Flag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceTemplate {
    Conservative,
    Standard,
    Progressive,
    Innovation,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown template '{0}'")]
pub struct UnknownTemplate(pub String);

/// One feature's target state inside a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateEntry {
    pub key: FeatureKey,
    pub enabled: bool,
    pub settings: &'static [(&'static str, Setting)],
}

/// Serializable view of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSetting {
    pub is_enabled: bool,
    pub configuration: Configuration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDescription {
    pub name: ComplianceTemplate,
    pub features: BTreeMap<FeatureKey, FeatureSetting>,
}

const fn on(key: FeatureKey, settings: &'static [(&'static str, Setting)]) -> TemplateEntry {
    TemplateEntry {
        key,
        enabled: true,
        settings,
    }
}

const fn off(key: FeatureKey) -> TemplateEntry {
    TemplateEntry {
        key,
        enabled: false,
        settings: &[],
    }
}

const CONSERVATIVE: [TemplateEntry; 9] = [
    on(
        ResourceLibrary,
        &[("allow_uploads", Flag(false)), ("moderation", Choice("pre_approval"))],
    ),
    on(GrantStatistics, &[("anonymized_only", Flag(true))]),
    on(GrantCalendar, &[("public_events_only", Flag(true))]),
    off(QaPlatform),
    off(SuccessStories),
    off(Forums),
    off(ProfessionalMarketplace),
    off(Networking),
    off(Gamification),
];

const STANDARD: [TemplateEntry; 9] = [
    on(
        ResourceLibrary,
        &[("allow_uploads", Flag(true)), ("moderation", Choice("post_approval"))],
    ),
    on(GrantStatistics, &[("anonymized_only", Flag(false))]),
    on(GrantCalendar, &[("public_events_only", Flag(false))]),
    on(QaPlatform, &[("moderation", Choice("pre_approval"))]),
    on(SuccessStories, &[("council_curated", Flag(true))]),
    off(Forums),
    off(ProfessionalMarketplace),
    on(Networking, &[("events_only", Flag(true))]),
    on(Gamification, &[("basic_points", Flag(true))]),
];

const PROGRESSIVE: [TemplateEntry; 9] = [
    on(
        ResourceLibrary,
        &[("allow_uploads", Flag(true)), ("moderation", Choice("post_approval"))],
    ),
    on(GrantStatistics, &[("anonymized_only", Flag(false))]),
    on(GrantCalendar, &[("public_events_only", Flag(false))]),
    on(QaPlatform, &[("moderation", Choice("post_approval"))]),
    on(SuccessStories, &[("council_curated", Flag(false))]),
    on(
        Forums,
        &[("moderation", Choice("post_approval")), ("categories_limited", Flag(true))],
    ),
    on(ProfessionalMarketplace, &[("verification_required", Flag(true))]),
    on(Networking, &[("events_only", Flag(false))]),
    on(
        Gamification,
        &[("basic_points", Flag(true)), ("achievements", Flag(true))],
    ),
];

const INNOVATION: [TemplateEntry; 9] = [
    on(
        ResourceLibrary,
        &[("allow_uploads", Flag(true)), ("moderation", Choice("post_approval"))],
    ),
    on(GrantStatistics, &[("anonymized_only", Flag(false))]),
    on(GrantCalendar, &[("public_events_only", Flag(false))]),
    on(QaPlatform, &[("moderation", Choice("community"))]),
    on(SuccessStories, &[("council_curated", Flag(false))]),
    on(
        Forums,
        &[("moderation", Choice("community")), ("categories_limited", Flag(false))],
    ),
    on(ProfessionalMarketplace, &[("verification_required", Flag(true))]),
    on(Networking, &[("events_only", Flag(false))]),
    on(
        Gamification,
        &[
            ("basic_points", Flag(true)),
            ("achievements", Flag(true)),
            ("leaderboards", Flag(true)),
        ],
    ),
];

impl ComplianceTemplate {
    pub const ALL: [ComplianceTemplate; 4] = [
        ComplianceTemplate::Conservative,
        ComplianceTemplate::Standard,
        ComplianceTemplate::Progressive,
        ComplianceTemplate::Innovation,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ComplianceTemplate::Conservative => "conservative",
            ComplianceTemplate::Standard => "standard",
            ComplianceTemplate::Progressive => "progressive",
            ComplianceTemplate::Innovation => "innovation",
        }
    }

    pub fn entries(self) -> &'static [TemplateEntry] {
        match self {
            ComplianceTemplate::Conservative => &CONSERVATIVE,
            ComplianceTemplate::Standard => &STANDARD,
            ComplianceTemplate::Progressive => &PROGRESSIVE,
            ComplianceTemplate::Innovation => &INNOVATION,
        }
    }

    pub fn describe(self) -> TemplateDescription {
        let features = self
            .entries()
            .iter()
            .map(|entry| {
                (
                    entry.key,
                    FeatureSetting {
                        is_enabled: entry.enabled,
                        configuration: configuration_from(entry.settings),
                    },
                )
            })
            .collect();
        TemplateDescription {
            name: self,
            features,
        }
    }
}

impl fmt::Display for ComplianceTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComplianceTemplate {
    type Err = UnknownTemplate;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        ComplianceTemplate::ALL
            .into_iter()
            .find(|template| template.name() == wanted)
            .ok_or_else(|| UnknownTemplate(raw.to_string()))
    }
}
