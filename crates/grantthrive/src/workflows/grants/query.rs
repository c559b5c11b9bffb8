use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Grant, GrantCategory, GrantStatus};
use super::lifecycle::is_open;
use crate::access::OrganizationId;

/// Listing parameters accepted from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantQuery {
    pub status: Option<GrantStatus>,
    pub category: Option<GrantCategory>,
    pub organization_id: Option<OrganizationId>,
    pub search: Option<String>,
    pub is_featured: Option<bool>,
    pub is_open: Option<bool>,
    #[serde(default)]
    pub skip: usize,
    pub limit: Option<usize>,
}

/// Row predicate evaluated by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantFilter {
    pub status: Option<GrantStatus>,
    pub category: Option<GrantCategory>,
    pub organization_id: Option<OrganizationId>,
    pub search: Option<String>,
    pub is_featured: Option<bool>,
    pub is_open: Option<bool>,
    pub now: DateTime<Utc>,
}

impl GrantFilter {
    pub fn from_query(query: &GrantQuery, now: DateTime<Utc>) -> Self {
        Self {
            status: query.status,
            category: query.category,
            organization_id: query.organization_id,
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_lowercase),
            is_featured: query.is_featured,
            is_open: query.is_open,
            now,
        }
    }

    pub fn matches(&self, grant: &Grant) -> bool {
        if self.status.is_some_and(|status| grant.status != status) {
            return false;
        }
        if self.category.is_some_and(|category| grant.category != category) {
            return false;
        }
        if self
            .organization_id
            .is_some_and(|organization| grant.organization_id != organization)
        {
            return false;
        }
        if self
            .is_featured
            .is_some_and(|featured| grant.is_featured != featured)
        {
            return false;
        }
        if self
            .is_open
            .is_some_and(|open| is_open(grant, self.now) != open)
        {
            return false;
        }
        match &self.search {
            Some(term) => {
                grant.title.to_lowercase().contains(term)
                    || grant.description.to_lowercase().contains(term)
            }
            None => true,
        }
    }
}
