use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::access::{OrganizationId, UserId};
use crate::money::Amount;
use crate::workflows::error::{ConflictReason, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantId(pub u64);

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Publication status of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Draft,
    Published,
    Closed,
    Archived,
}

impl GrantStatus {
    pub const ALL: [GrantStatus; 4] = [
        GrantStatus::Draft,
        GrantStatus::Published,
        GrantStatus::Closed,
        GrantStatus::Archived,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            GrantStatus::Draft => "draft",
            GrantStatus::Published => "published",
            GrantStatus::Closed => "closed",
            GrantStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantCategory {
    Community,
    Environment,
    ArtsCulture,
    SportsRecreation,
    Education,
    Health,
    Infrastructure,
    EconomicDevelopment,
    Youth,
    Seniors,
    Other,
}

/// Funding opportunity published by an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: GrantId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub status: GrantStatus,
    pub category: GrantCategory,
    pub tags: Vec<String>,
    pub is_featured: bool,
    pub total_funding: Amount,
    pub min_amount: Option<Amount>,
    pub max_amount: Option<Amount>,
    pub application_open_date: DateTime<Utc>,
    pub application_close_date: DateTime<Utc>,
    pub organization_id: OrganizationId,
    pub created_by: UserId,
    pub view_count: u64,
    /// Incremented once per created application; never decremented.
    pub application_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Grant {
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        super::lifecycle::is_open(self, now)
    }

    /// Checks a requested amount against the bounds set on this grant.
    pub fn check_requested_amount(&self, requested: Amount) -> Result<(), ConflictReason> {
        if let Some(minimum) = self.min_amount {
            if requested < minimum {
                return Err(ConflictReason::BelowMinimum { requested, minimum });
            }
        }
        if let Some(maximum) = self.max_amount {
            if requested > maximum {
                return Err(ConflictReason::AboveMaximum { requested, maximum });
            }
        }
        Ok(())
    }
}

/// Payload for creating a draft grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGrant {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: GrantCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub total_funding: Amount,
    #[serde(default)]
    pub min_amount: Option<Amount>,
    #[serde(default)]
    pub max_amount: Option<Amount>,
    pub application_open_date: DateTime<Utc>,
    pub application_close_date: DateTime<Utc>,
    pub organization_id: OrganizationId,
}

/// Metadata edits. Status has no field here; it only moves through the
/// lifecycle operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<GrantCategory>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub total_funding: Option<Amount>,
    /// Absent keeps the bound, `null` clears it.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_amount: Option<Option<Amount>>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_amount: Option<Option<Amount>>,
    pub application_open_date: Option<DateTime<Utc>>,
    pub application_close_date: Option<DateTime<Utc>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl GrantUpdate {
    pub(crate) fn apply_to(self, grant: &mut Grant) {
        if let Some(title) = self.title {
            grant.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            grant.description = description;
        }
        if let Some(category) = self.category {
            grant.category = category;
        }
        if let Some(tags) = self.tags {
            grant.tags = tags;
        }
        if let Some(is_featured) = self.is_featured {
            grant.is_featured = is_featured;
        }
        if let Some(total_funding) = self.total_funding {
            grant.total_funding = total_funding;
        }
        if let Some(min_amount) = self.min_amount {
            grant.min_amount = min_amount;
        }
        if let Some(max_amount) = self.max_amount {
            grant.max_amount = max_amount;
        }
        if let Some(open) = self.application_open_date {
            grant.application_open_date = open;
        }
        if let Some(close) = self.application_close_date {
            grant.application_close_date = close;
        }
    }
}

/// Validates the funding and window invariants shared by create and update.
pub(crate) fn validate_terms(
    title: &str,
    total_funding: Amount,
    min_amount: Option<Amount>,
    max_amount: Option<Amount>,
    open: DateTime<Utc>,
    close: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if title.trim().is_empty() {
        return Err(WorkflowError::validation("title must not be empty"));
    }
    if close <= open {
        return Err(WorkflowError::validation(
            "application_close_date must be after application_open_date",
        ));
    }
    if let (Some(min), Some(max)) = (min_amount, max_amount) {
        if max < min {
            return Err(WorkflowError::validation(
                "max_amount must be greater than or equal to min_amount",
            ));
        }
    }
    if let Some(max) = max_amount {
        if max > total_funding {
            return Err(WorkflowError::validation(
                "max_amount cannot exceed total_funding",
            ));
        }
    }
    if let Some(min) = min_amount {
        if min > total_funding {
            return Err(WorkflowError::validation(
                "min_amount cannot exceed total_funding",
            ));
        }
    }
    Ok(())
}

/// Lowercases, drops punctuation, and joins words with hyphens.
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    let slug = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    if slug.is_empty() {
        "grant".to_string()
    } else {
        slug
    }
}
