//! Shared HTTP plumbing for the workflow routers: caller identity headers and
//! the mapping from [`WorkflowError`] to status codes.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use super::error::{ErrorKind, WorkflowError};
use crate::access::{Caller, OrganizationId, Role, UserId};

/// Headers populated by the upstream authentication layer.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Reads the caller from trusted identity headers. No `x-user-id` means the
/// request is anonymous.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Option<Caller>, WorkflowError> {
    let Some(user_id) = header_value(headers, USER_ID_HEADER)? else {
        return Ok(None);
    };
    let user_id = user_id
        .parse::<u64>()
        .map(UserId)
        .map_err(|_| WorkflowError::validation(format!("{USER_ID_HEADER} must be numeric")))?;

    let role = match header_value(headers, ROLE_HEADER)? {
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|err| WorkflowError::validation(err.to_string()))?,
        None => Role::Applicant,
    };

    let organization_id = header_value(headers, ORGANIZATION_HEADER)?
        .map(|raw| {
            raw.parse::<u64>().map(OrganizationId).map_err(|_| {
                WorkflowError::validation(format!("{ORGANIZATION_HEADER} must be numeric"))
            })
        })
        .transpose()?;

    Ok(Some(Caller::new(user_id, role, organization_id)))
}

pub fn require_caller(headers: &HeaderMap) -> Result<Caller, WorkflowError> {
    caller_from_headers(headers)?.ok_or(WorkflowError::Forbidden("authentication required"))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, WorkflowError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| WorkflowError::validation(format!("{name} is not valid text")))
        })
        .transpose()
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidTransition | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        if kind == ErrorKind::Unavailable {
            error!(error = %self, "persistence failure");
        }

        let body = Json(json!({ "error": self.to_string(), "kind": kind.label() }));
        (status, body).into_response()
    }
}
