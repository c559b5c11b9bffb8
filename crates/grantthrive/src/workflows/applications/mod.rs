//! Grant applications: Draft → Submitted → Under Review → Approved/Rejected,
//! with withdrawal by the applicant before a decision.

pub mod domain;
pub mod lifecycle;
pub mod query;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationId, ApplicationReview, ApplicationStatus, ApplicationUpdate,
    NewApplication, ReferenceNumber,
};
pub use query::{ApplicationFilter, ApplicationQuery, ApplicationStats};
pub use router::application_router;
pub use service::ApplicationService;
