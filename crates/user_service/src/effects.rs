//! Fire-and-forget side effects of request handling

use contracts::{DispatchPayload, DispatchSnapshot, SubjectId};
use dispatcher::DispatchHandle;

/// Producer handles for the audit, notification and error dispatchers
#[derive(Clone, Debug)]
pub struct SideEffects {
    audit: DispatchHandle,
    notifications: DispatchHandle,
    errors: DispatchHandle,
}

impl SideEffects {
    pub fn new(audit: DispatchHandle, notifications: DispatchHandle, errors: DispatchHandle) -> Self {
        Self {
            audit,
            notifications,
            errors,
        }
    }

    pub fn audit(&self, action: &str, subject: Option<SubjectId>, details: impl Into<String>) {
        self.audit
            .submit(DispatchPayload::audit(action, subject, details));
    }

    pub fn notify(&self, subject: SubjectId, category: &str, message: &str) {
        self.notifications
            .submit(DispatchPayload::notification(subject, category, message));
    }

    pub fn report_error(&self, operation: &str, error: Option<String>, context: impl Into<String>) {
        self.errors
            .submit(DispatchPayload::error(operation, error, context));
    }

    /// `(name, counters)` for each dispatcher
    pub fn snapshots(&self) -> [(&str, DispatchSnapshot); 3] {
        [&self.audit, &self.notifications, &self.errors].map(|h| (h.name(), h.snapshot()))
    }
}
