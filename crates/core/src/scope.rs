//! Scope key - identity of one study record
//!
//! Format: `{tenant}{project_id}.{record_id}`
//! Example: `prod2525.1043`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// (tenant, project, record) identity
///
/// Every ledger fact and every lock is scoped by this key. Two keys are equal
/// only when all three parts are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey {
    /// Tenant / server tag (e.g. "prod", "sand")
    pub tenant: String,

    /// Project identifier within the tenant
    pub project_id: String,

    /// Record identifier within the project
    pub record_id: String,
}

impl ScopeKey {
    /// Create a new scope key, rejecting blank parts
    pub fn new(
        tenant: impl Into<String>,
        project_id: impl Into<String>,
        record_id: impl Into<String>,
    ) -> CoreResult<Self> {
        let key = Self {
            tenant: tenant.into().trim().to_string(),
            project_id: project_id.into().trim().to_string(),
            record_id: record_id.into().trim().to_string(),
        };

        if key.tenant.is_empty() {
            return Err(CoreError::MissingField("tenant"));
        }
        if key.project_id.is_empty() {
            return Err(CoreError::MissingField("project_id"));
        }
        if key.record_id.is_empty() {
            return Err(CoreError::MissingField("record_id"));
        }

        Ok(key)
    }

    /// Handler tag: tenant followed by project id (e.g. `prod2525`)
    pub fn handler_tag(&self) -> String {
        format!("{}{}", self.tenant, self.project_id)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}.{}", self.tenant, self.project_id, self.record_id)
    }
}
