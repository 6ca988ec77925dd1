//! Audit trail records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Where an interaction came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkOrigin {
    pub ip_address: String,
    pub user_agent: String,
}

impl NetworkOrigin {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// Compliance properties asserted by the caller for one interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFlags {
    pub gdpr_compliant: bool,
    pub retention_applied: bool,
    pub consent_recorded: bool,
}

impl Default for ComplianceFlags {
    fn default() -> Self {
        Self {
            gdpr_compliant: true,
            retention_applied: true,
            consent_recorded: true,
        }
    }
}

/// An interaction to audit, before it is assigned an id and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: String,
    pub action: String,
    pub resource_id: String,
    pub details: BTreeMap<String, Value>,
    pub origin: NetworkOrigin,
    pub flags: ComplianceFlags,
}

impl AuditEvent {
    pub fn new(
        user_id: impl Into<String>,
        action: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            action: action.into(),
            resource_id: resource_id.into(),
            details: BTreeMap::new(),
            origin: NetworkOrigin::default(),
            flags: ComplianceFlags::default(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_origin(mut self, origin: NetworkOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_flags(mut self, flags: ComplianceFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// A recorded audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub action: String,
    pub resource_id: String,
    pub details: BTreeMap<String, Value>,
    pub origin: NetworkOrigin,
    pub flags: ComplianceFlags,
}

impl AuditLogEntry {
    pub(crate) fn from_event(event: AuditEvent, id: String, timestamp: DateTime<Utc>) -> Self {
        let AuditEvent {
            user_id,
            action,
            resource_id,
            details,
            origin,
            flags,
        } = event;

        Self {
            id,
            timestamp,
            user_id,
            action,
            resource_id,
            details,
            origin,
            flags,
        }
    }
}
