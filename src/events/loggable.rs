use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity levels for audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Privilege and tenant changes; never trimmed
    Critical,
    #[default]
    Important,
    /// High-volume events such as logins
    Noise,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Important => "important",
            Severity::Noise => "noise",
        }
    }
}

/// Trait for entities that can be recorded in the audit log.
pub trait Loggable: Serialize + Send + Sync {
    /// Prefix of event names, e.g. "user" in "user.created"
    fn entity_type() -> &'static str;

    fn subject_id(&self) -> Uuid;

    /// Tenant the entity belongs to, if any
    fn tenant_id(&self) -> Option<Uuid> {
        None
    }

    fn severity(&self) -> Severity {
        Severity::Important
    }

    fn severity_for_action(&self, action: &str) -> Severity {
        match action {
            "deleted" | "deactivated" | "role_changed" => Severity::Critical,
            "created" | "updated" => self.severity(),
            _ => Severity::Important,
        }
    }
}
