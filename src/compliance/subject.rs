//! Data-subject requests and their responses

use crate::compliance::audit::AuditLogEntry;
use crate::error::{Result, ServiceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Export format of portability responses
pub const EXPORT_FORMAT: &str = "json";

/// What the data subject asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectRequestKind {
    Access,
    Delete,
    Portability,
}

impl fmt::Display for SubjectRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectRequestKind::Access => write!(f, "access"),
            SubjectRequestKind::Delete => write!(f, "delete"),
            SubjectRequestKind::Portability => write!(f, "portability"),
        }
    }
}

impl FromStr for SubjectRequestKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "access" => Ok(SubjectRequestKind::Access),
            "delete" | "erasure" => Ok(SubjectRequestKind::Delete),
            "portability" | "export" => Ok(SubjectRequestKind::Portability),
            other => Err(ServiceError::Other(format!(
                "unknown subject request kind: {}",
                other
            ))),
        }
    }
}

/// Response to a data-subject request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubjectResponse {
    Access {
        personal_data: Vec<AuditLogEntry>,
        /// Distinct actions, in first-seen order
        processing_activities: Vec<String>,
        retention_days: u32,
        legal_basis: String,
    },
    Deleted {
        removed: usize,
        /// Nothing was left to remove
        already_deleted: bool,
        confirmed_at: DateTime<Utc>,
    },
    Portability {
        format: String,
        data: Vec<AuditLogEntry>,
        exported_at: DateTime<Utc>,
    },
}

impl SubjectResponse {
    /// Audit entries carried by the response, empty for deletions
    pub fn entries(&self) -> &[AuditLogEntry] {
        match self {
            SubjectResponse::Access { personal_data, .. } => personal_data,
            SubjectResponse::Portability { data, .. } => data,
            SubjectResponse::Deleted { .. } => &[],
        }
    }

    /// Serialize for hand-over to the data subject
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A handled subject request, kept apart from the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRequestRecord {
    pub user_id: String,
    pub kind: SubjectRequestKind,
    pub timestamp: DateTime<Utc>,
}

/// Distinct actions in first-seen order
pub(crate) fn distinct_actions<'a, I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a AuditLogEntry>,
{
    let mut actions: Vec<String> = Vec::new();
    for entry in entries {
        if !actions.contains(&entry.action) {
            actions.push(entry.action.clone());
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::audit::AuditEvent;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("access".parse::<SubjectRequestKind>().unwrap(), SubjectRequestKind::Access);
        assert_eq!(" Delete ".parse::<SubjectRequestKind>().unwrap(), SubjectRequestKind::Delete);
        assert_eq!(
            "portability".parse::<SubjectRequestKind>().unwrap(),
            SubjectRequestKind::Portability
        );
        assert!("rectify".parse::<SubjectRequestKind>().is_err());
        assert_eq!(SubjectRequestKind::Delete.to_string(), "delete");
    }

    #[test]
    fn test_distinct_actions_keep_first_seen_order() {
        let now = Utc::now();
        let entries: Vec<AuditLogEntry> = ["generate", "login", "generate", "download"]
            .iter()
            .enumerate()
            .map(|(i, action)| {
                AuditLogEntry::from_event(AuditEvent::new("u", *action, "r"), i.to_string(), now)
            })
            .collect();

        assert_eq!(distinct_actions(&entries), vec!["generate", "login", "download"]);
    }

    #[test]
    fn test_portability_export_is_tagged_json() {
        let response = SubjectResponse::Portability {
            format: EXPORT_FORMAT.to_string(),
            data: Vec::new(),
            exported_at: Utc::now(),
        };

        let json = response.to_json_pretty().unwrap();
        assert!(json.contains("\"kind\": \"portability\""));
        assert!(json.contains("\"format\": \"json\""));
        assert!(response.entries().is_empty());
    }
}
