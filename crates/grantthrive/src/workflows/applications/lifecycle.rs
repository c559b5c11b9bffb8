use chrono::{DateTime, Utc};

use super::domain::{Application, ApplicationReview, ApplicationStatus};
use crate::access::Caller;
use crate::money::Amount;
use crate::workflows::error::{Entity, WorkflowError};
use crate::workflows::grants::{Grant, GrantStatus};

const MAX_SCORE: u8 = 100;

fn rejected(application: &Application, action: &'static str) -> WorkflowError {
    WorkflowError::InvalidTransition {
        entity: Entity::Application,
        action,
        status: application.status.label(),
    }
}

/// Validates a requested amount: positive, and inside the grant's bounds.
pub fn check_requested_amount(grant: &Grant, requested: Amount) -> Result<(), WorkflowError> {
    if requested.is_zero() {
        return Err(WorkflowError::validation(
            "requested_amount must be greater than zero",
        ));
    }
    grant.check_requested_amount(requested)?;
    Ok(())
}

/// Draft → Submitted, by the owner, while the grant still accepts applications.
pub fn submit(
    application: &mut Application,
    grant: &Grant,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if caller.user_id != application.applicant_id {
        return Err(WorkflowError::Forbidden(
            "can only submit your own applications",
        ));
    }
    if application.status != ApplicationStatus::Draft {
        return Err(rejected(application, "submit"));
    }
    if grant.status != GrantStatus::Published || now > grant.application_close_date {
        return Err(WorkflowError::ApplicationWindowClosed { grant_id: grant.id });
    }

    application.status = ApplicationStatus::Submitted;
    application.submitted_at = Some(now);
    application.updated_at = now;
    Ok(())
}

/// Submitted/Under Review → Under Review/Approved/Rejected. Authority over the
/// grant's organization is checked by the caller of this function.
pub fn review(
    application: &mut Application,
    reviewer: &Caller,
    review: ApplicationReview,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if !matches!(
        review.status,
        ApplicationStatus::UnderReview | ApplicationStatus::Approved | ApplicationStatus::Rejected
    ) {
        return Err(WorkflowError::validation(
            "review decision must be under_review, approved, or rejected",
        ));
    }
    if review.score.is_some_and(|score| score > MAX_SCORE) {
        return Err(WorkflowError::validation("score must be between 0 and 100"));
    }
    if !matches!(
        application.status,
        ApplicationStatus::Submitted | ApplicationStatus::UnderReview
    ) {
        return Err(rejected(application, "review"));
    }

    application.status = review.status;
    application.reviewer_notes = review.reviewer_notes;
    application.feedback = review.feedback;
    application.score = review.score;
    application.reviewed_by = Some(reviewer.user_id);
    application.reviewed_at = Some(now);
    application.updated_at = now;
    Ok(())
}

/// Any non-terminal status → Withdrawn, by the owner.
pub fn withdraw(
    application: &mut Application,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if caller.user_id != application.applicant_id {
        return Err(WorkflowError::Forbidden(
            "can only withdraw your own applications",
        ));
    }
    if application.status.is_terminal() {
        return Err(rejected(application, "withdraw"));
    }

    application.status = ApplicationStatus::Withdrawn;
    application.withdrawn_at = Some(now);
    application.updated_at = now;
    Ok(())
}

pub fn ensure_editable(application: &Application, caller: &Caller) -> Result<(), WorkflowError> {
    if caller.user_id != application.applicant_id {
        return Err(WorkflowError::Forbidden(
            "can only update your own applications",
        ));
    }
    if application.status != ApplicationStatus::Draft {
        return Err(rejected(application, "update"));
    }
    Ok(())
}
