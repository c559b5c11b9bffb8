use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationStatus};
use crate::access::{OrganizationId, UserId};
use crate::money::Amount;
use crate::workflows::grants::GrantId;

/// Listing parameters accepted from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationQuery {
    pub status: Option<ApplicationStatus>,
    pub grant_id: Option<GrantId>,
    #[serde(default)]
    pub skip: usize,
    pub limit: Option<usize>,
}

/// Row predicate evaluated by the store. `organization_id` matches against
/// the organization owning the application's grant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub grant_id: Option<GrantId>,
    pub applicant_id: Option<UserId>,
    pub organization_id: Option<OrganizationId>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &Application, owner: Option<OrganizationId>) -> bool {
        if self.status.is_some_and(|status| application.status != status) {
            return false;
        }
        if self
            .grant_id
            .is_some_and(|grant_id| application.grant_id != grant_id)
        {
            return false;
        }
        if self
            .applicant_id
            .is_some_and(|applicant| application.applicant_id != applicant)
        {
            return false;
        }
        match self.organization_id {
            Some(organization) => owner == Some(organization),
            None => true,
        }
    }
}

/// Aggregate counts over the applications visible to an administrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub total_applications: usize,
    pub draft_applications: usize,
    pub submitted_applications: usize,
    pub under_review_applications: usize,
    pub approved_applications: usize,
    pub rejected_applications: usize,
    pub withdrawn_applications: usize,
    pub total_requested: Amount,
    pub total_approved: Amount,
    /// Percentage of all applications that were approved, two decimals.
    pub approval_rate: f64,
}

impl ApplicationStats {
    pub fn tally<'a>(applications: impl IntoIterator<Item = &'a Application>) -> Self {
        let mut stats = Self::default();
        for application in applications {
            stats.total_applications += 1;
            stats.total_requested = stats
                .total_requested
                .saturating_add(application.requested_amount);
            match application.status {
                ApplicationStatus::Draft => stats.draft_applications += 1,
                ApplicationStatus::Submitted => stats.submitted_applications += 1,
                ApplicationStatus::UnderReview => stats.under_review_applications += 1,
                ApplicationStatus::Approved => {
                    stats.approved_applications += 1;
                    stats.total_approved = stats
                        .total_approved
                        .saturating_add(application.requested_amount);
                }
                ApplicationStatus::Rejected => stats.rejected_applications += 1,
                ApplicationStatus::Withdrawn => stats.withdrawn_applications += 1,
            }
        }

        if stats.total_applications > 0 {
            let rate =
                stats.approved_applications as f64 / stats.total_applications as f64 * 100.0;
            stats.approval_rate = (rate * 100.0).round() / 100.0;
        }
        stats
    }
}
