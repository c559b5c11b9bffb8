use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Grant, GrantStatus};
use crate::access::{self, Caller};
use crate::workflows::error::{ConflictReason, Entity, WorkflowError};

/// Status-changing operations on a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantAction {
    Publish,
    Close,
    Archive,
}

impl GrantAction {
    pub const fn label(self) -> &'static str {
        match self {
            GrantAction::Publish => "publish",
            GrantAction::Close => "close",
            GrantAction::Archive => "archive",
        }
    }

    /// Authorization predicate guarding this action.
    pub fn permission(self) -> fn(&Caller, &Grant) -> bool {
        match self {
            GrantAction::Publish => access::can_publish,
            GrantAction::Close => access::can_close,
            GrantAction::Archive => access::can_archive,
        }
    }
}

impl GrantStatus {
    /// Target status for `action`, or `None` when the move is illegal.
    pub const fn apply(self, action: GrantAction) -> Option<GrantStatus> {
        match (self, action) {
            (GrantStatus::Draft, GrantAction::Publish) => Some(GrantStatus::Published),
            (GrantStatus::Published, GrantAction::Close) => Some(GrantStatus::Closed),
            (_, GrantAction::Archive) => Some(GrantStatus::Archived),
            _ => None,
        }
    }
}

/// Moves `grant` through `action`, returning the status it left.
pub fn transition(grant: &mut Grant, action: GrantAction) -> Result<GrantStatus, WorkflowError> {
    let from = grant.status;
    let to = from
        .apply(action)
        .ok_or(WorkflowError::InvalidTransition {
            entity: Entity::Grant,
            action: action.label(),
            status: from.label(),
        })?;
    grant.status = to;
    Ok(from)
}

/// Hard deletion is refused once a published grant has received applications.
pub fn ensure_deletable(grant: &Grant) -> Result<(), ConflictReason> {
    if grant.status == GrantStatus::Published && grant.application_count > 0 {
        return Err(ConflictReason::GrantHasApplications {
            grant_id: grant.id,
            count: grant.application_count,
        });
    }
    Ok(())
}

/// Published and `now` inside the inclusive application window.
pub fn is_open(grant: &Grant, now: DateTime<Utc>) -> bool {
    grant.status == GrantStatus::Published
        && grant.application_open_date <= now
        && now <= grant.application_close_date
}
