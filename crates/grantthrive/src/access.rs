//! Caller identity and the authorization predicates guarding every mutation.
//!
//! Identity is issued elsewhere; this module only decides what an already
//! authenticated (or anonymous) caller may do with a given row.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::workflows::applications::Application;
use crate::workflows::grants::{Grant, GrantStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(pub u64);

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform roles. Client roles are staff of a council or NFP tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    ClientAdmin,
    ClientUser,
    Applicant,
    Professional,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::ClientAdmin => "client_admin",
            Role::ClientUser => "client_user",
            Role::Applicant => "applicant",
            Role::Professional => "professional",
        }
    }

    pub const fn is_client_user(self) -> bool {
        matches!(self, Role::ClientAdmin | Role::ClientUser)
    }

    pub const fn is_admin(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::ClientAdmin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "super_admin" => Ok(Role::SuperAdmin),
            "client_admin" => Ok(Role::ClientAdmin),
            "client_user" => Ok(Role::ClientUser),
            "applicant" => Ok(Role::Applicant),
            "professional" => Ok(Role::Professional),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Authenticated principal attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
}

impl Caller {
    pub fn new(user_id: UserId, role: Role, organization_id: Option<OrganizationId>) -> Self {
        Self {
            user_id,
            role,
            organization_id,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn is_member_of(&self, organization: OrganizationId) -> bool {
        self.organization_id == Some(organization)
    }

    fn is_staff_of(&self, organization: OrganizationId) -> bool {
        self.role.is_client_user() && self.is_member_of(organization)
    }
}

/// Outcome of the read-side visibility rule for grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantVisibility {
    Visible,
    /// Reported as missing so unpublished grants do not leak to the public.
    Hidden,
    Denied,
}

pub fn can_manage_grants(caller: &Caller, organization: OrganizationId) -> bool {
    caller.is_super_admin() || caller.is_staff_of(organization)
}

pub fn can_publish(caller: &Caller, grant: &Grant) -> bool {
    can_manage_grants(caller, grant.organization_id)
}

pub fn can_close(caller: &Caller, grant: &Grant) -> bool {
    can_manage_grants(caller, grant.organization_id)
}

pub fn can_archive(caller: &Caller, grant: &Grant) -> bool {
    can_manage_grants(caller, grant.organization_id)
}

pub fn can_view_grant(caller: Option<&Caller>, grant: &Grant) -> bool {
    grant_visibility(caller, grant) == GrantVisibility::Visible
}

pub fn can_review(caller: &Caller, grant: &Grant) -> bool {
    can_manage_grants(caller, grant.organization_id)
}

pub fn grant_visibility(caller: Option<&Caller>, grant: &Grant) -> GrantVisibility {
    if grant.status == GrantStatus::Published {
        return GrantVisibility::Visible;
    }

    match caller {
        None => GrantVisibility::Hidden,
        Some(caller) if caller.is_super_admin() || caller.is_staff_of(grant.organization_id) => {
            GrantVisibility::Visible
        }
        Some(_) => GrantVisibility::Denied,
    }
}

/// Whether listings for this caller must be pinned to published grants.
pub fn sees_only_published(caller: Option<&Caller>) -> bool {
    match caller {
        None => true,
        Some(caller) => matches!(caller.role, Role::Applicant | Role::Professional),
    }
}

pub fn can_view_application(caller: &Caller, application: &Application, grant: &Grant) -> bool {
    caller.user_id == application.applicant_id
        || caller.is_super_admin()
        || caller.is_staff_of(grant.organization_id)
}

pub fn can_read_features(caller: &Caller, organization: OrganizationId) -> bool {
    caller.is_super_admin() || caller.is_member_of(organization)
}

pub fn can_manage_features(caller: &Caller, organization: OrganizationId) -> bool {
    caller.is_super_admin()
        || (caller.role == Role::ClientAdmin && caller.is_member_of(organization))
}

pub fn can_view_statistics(caller: &Caller) -> bool {
    caller.role.is_admin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::testing::{applicant, client_admin, draft_grant, outsider_staff, super_admin};

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("CLIENT_ADMIN".parse::<Role>(), Ok(Role::ClientAdmin));
        assert!("auditor".parse::<Role>().is_err());
    }

    #[test]
    fn grant_management_is_scoped_to_staff_of_the_organization() {
        let grant = draft_grant();
        assert!(can_publish(&client_admin(), &grant));
        assert!(can_publish(&super_admin(), &grant));
        assert!(!can_publish(&outsider_staff(), &grant));
        assert!(!can_publish(&applicant(41), &grant));
        assert!(can_close(&client_admin(), &grant));
        assert!(!can_close(&outsider_staff(), &grant));
        assert!(can_archive(&super_admin(), &grant));
        assert!(!can_archive(&applicant(41), &grant));
    }

    #[test]
    fn unpublished_grants_are_hidden_from_the_public() {
        let grant = draft_grant();
        assert_eq!(grant_visibility(None, &grant), GrantVisibility::Hidden);
        assert_eq!(
            grant_visibility(Some(&applicant(41)), &grant),
            GrantVisibility::Denied
        );
        assert_eq!(
            grant_visibility(Some(&outsider_staff()), &grant),
            GrantVisibility::Denied
        );
        assert_eq!(
            grant_visibility(Some(&client_admin()), &grant),
            GrantVisibility::Visible
        );
        assert!(can_view_grant(Some(&super_admin()), &grant));

        let applicant_in_council =
            Caller::new(UserId(77), Role::Applicant, Some(grant.organization_id));
        assert_eq!(
            grant_visibility(Some(&applicant_in_council), &grant),
            GrantVisibility::Denied
        );
        let professional_in_council =
            Caller::new(UserId(78), Role::Professional, Some(grant.organization_id));
        assert!(!can_view_grant(Some(&professional_in_council), &grant));
        assert!(!can_view_grant(None, &grant));

        let mut published = draft_grant();
        published.status = GrantStatus::Published;
        assert!(can_view_grant(None, &published));
    }

    #[test]
    fn feature_management_requires_admin_of_the_tenant() {
        let org = client_admin().organization_id.expect("admin has org");
        assert!(can_manage_features(&client_admin(), org));
        assert!(can_manage_features(&super_admin(), org));
        assert!(!can_manage_features(&outsider_staff(), org));
        assert!(!can_read_features(&outsider_staff(), org));
    }
}
