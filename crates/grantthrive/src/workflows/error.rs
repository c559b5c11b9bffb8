use serde::Serialize;
use std::fmt;

use super::grants::GrantId;
use crate::money::Amount;
use crate::store::RepositoryError;

/// Stable error categories surfaced to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    Forbidden,
    Conflict,
    Validation,
    Unavailable,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Validation => "validation",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Grant,
    Application,
    Feature,
    Template,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Entity::Grant => "grant",
            Entity::Application => "application",
            Entity::Feature => "feature",
            Entity::Template => "template",
        };
        f.write_str(label)
    }
}

/// Business-rule violations that are not about state-machine shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictReason {
    #[error("applicant already has an application for grant {grant_id}")]
    DuplicateApplication { grant_id: GrantId },
    #[error("requested amount {requested} is below the grant minimum of {minimum}")]
    BelowMinimum { requested: Amount, minimum: Amount },
    #[error("requested amount {requested} exceeds the grant maximum of {maximum}")]
    AboveMaximum { requested: Amount, maximum: Amount },
    #[error("grant {grant_id} has {count} application(s) and can only be archived")]
    GrantHasApplications { grant_id: GrantId, count: u32 },
}

/// Error raised by the grant, application, and feature-toggle services.
///
/// Every variant is produced before the surrounding transaction commits, so a
/// failed operation never leaves a partial write behind.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: Entity, key: String },
    #[error("cannot {action} {entity} in status '{status}'")]
    InvalidTransition {
        entity: Entity,
        action: &'static str,
        status: &'static str,
    },
    #[error("grant {grant_id} is not accepting applications")]
    ApplicationWindowClosed { grant_id: GrantId },
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Conflict(#[from] ConflictReason),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl WorkflowError {
    pub fn not_found(entity: Entity, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::NotFound { .. } => ErrorKind::NotFound,
            WorkflowError::InvalidTransition { .. }
            | WorkflowError::ApplicationWindowClosed { .. } => ErrorKind::InvalidTransition,
            WorkflowError::Forbidden(_) => ErrorKind::Forbidden,
            WorkflowError::Conflict(_) => ErrorKind::Conflict,
            WorkflowError::Validation(_) => ErrorKind::Validation,
            WorkflowError::Repository(RepositoryError::NotFound) => ErrorKind::NotFound,
            WorkflowError::Repository(RepositoryError::Conflict) => ErrorKind::Conflict,
            WorkflowError::Repository(RepositoryError::Unavailable(_)) => ErrorKind::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        let window = WorkflowError::ApplicationWindowClosed {
            grant_id: GrantId(3),
        };
        assert_eq!(window.kind(), ErrorKind::InvalidTransition);

        let duplicate = WorkflowError::from(ConflictReason::DuplicateApplication {
            grant_id: GrantId(3),
        });
        assert_eq!(duplicate.kind(), ErrorKind::Conflict);
        assert!(duplicate.to_string().contains("grant 3"));

        let offline = WorkflowError::from(RepositoryError::Unavailable("down".to_string()));
        assert_eq!(offline.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn messages_name_the_entity_and_status() {
        let err = WorkflowError::InvalidTransition {
            entity: Entity::Grant,
            action: "publish",
            status: "closed",
        };
        assert_eq!(err.to_string(), "cannot publish grant in status 'closed'");
        assert_eq!(
            WorkflowError::not_found(Entity::Template, "bold").to_string(),
            "template 'bold' not found"
        );
    }
}
