//! DispatchPayload - the unit of side-effect work
//!
//! One payload type covers all three dispatchers; the kind tag carries the
//! fields that differ between audit entries, notifications and error records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject identifier (user id)
pub type SubjectId = u64;

/// Kind-specific part of a payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadKind {
    /// Audit trail entry (e.g. `CREATE`, `GET_USER_NOT_FOUND`)
    Audit { action: String },
    /// User notification (e.g. `WELCOME`)
    Notification { category: String },
    /// Error record for a failed operation
    Error {
        operation: String,
        error: Option<String>,
    },
}

impl PayloadKind {
    /// Short label used in log fields and metric labels
    pub fn label(&self) -> &'static str {
        match self {
            Self::Audit { .. } => "audit",
            Self::Notification { .. } => "notification",
            Self::Error { .. } => "error",
        }
    }
}

/// Immutable side-effect record submitted to a dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPayload {
    /// Kind tag
    #[serde(flatten)]
    pub kind: PayloadKind,

    /// Subject user id (None for collection-level actions)
    pub subject_id: Option<SubjectId>,

    /// Free-form context (details / message / error context)
    pub context: String,

    /// Capture timestamp, assigned at submission
    pub captured_at: DateTime<Utc>,
}

impl DispatchPayload {
    /// Audit entry captured now
    pub fn audit(
        action: impl Into<String>,
        subject_id: Option<SubjectId>,
        details: impl Into<String>,
    ) -> Self {
        Self::captured_now(
            PayloadKind::Audit {
                action: action.into(),
            },
            subject_id,
            details.into(),
        )
    }

    /// Notification captured now
    pub fn notification(
        subject_id: SubjectId,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::captured_now(
            PayloadKind::Notification {
                category: category.into(),
            },
            Some(subject_id),
            message.into(),
        )
    }

    /// Error record captured now
    pub fn error(
        operation: impl Into<String>,
        error: Option<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::captured_now(
            PayloadKind::Error {
                operation: operation.into(),
                error,
            },
            None,
            context.into(),
        )
    }

    fn captured_now(kind: PayloadKind, subject_id: Option<SubjectId>, context: String) -> Self {
        Self {
            kind,
            subject_id,
            context,
            captured_at: Utc::now(),
        }
    }

    /// Render as one structured text line (no trailing newline)
    ///
    /// The timestamp is the capture time, so a backlog shows up as a gap
    /// between this value and the time the line reaches the sink.
    pub fn render(&self) -> String {
        let time = self.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        let subject = SubjectDisplay(self.subject_id);
        match &self.kind {
            PayloadKind::Audit { action } => format!(
                "action={action} | user_id={subject} | details={} | time={time}",
                self.context
            ),
            PayloadKind::Notification { category } => format!(
                "type={category} | user_id={subject} | message={} | time={time}",
                self.context
            ),
            PayloadKind::Error { operation, error } => format!(
                "operation={operation} | error={} | context={} | time={time}",
                error.as_deref().unwrap_or("<nil>"),
                self.context
            ),
        }
    }
}

struct SubjectDisplay(Option<SubjectId>);

impl fmt::Display for SubjectDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{id}"),
            None => f.write_str("-"),
        }
    }
}

/// Why a payload took the synchronous fallback path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowReason {
    /// The bounded queue was at capacity
    QueueFull,
    /// The dispatcher had already been closed
    Closed,
}

impl OverflowReason {
    /// Tag prefixed to fallback lines
    pub fn tag(self) -> &'static str {
        match self {
            Self::QueueFull => "OVERFLOW",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for OverflowReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
