//! Notification surface used to report the outcome of user actions.

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: Option<String>,
    pub status: ToastStatus,
}

impl Toast {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: ToastStatus::Success,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: ToastStatus::Error,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub trait Toaster: Send + Sync {
    fn toast(&self, toast: Toast);
}

/// Writes toasts to the log. Used by headless front ends.
pub struct TracingToaster;

impl Toaster for TracingToaster {
    fn toast(&self, toast: Toast) {
        let description = toast.description.as_deref().unwrap_or_default();
        match toast.status {
            ToastStatus::Error => error!(title = %toast.title, %description, "toast"),
            ToastStatus::Success => info!(title = %toast.title, %description, "toast"),
        }
    }
}

#[cfg(test)]
#[path = "tests/toast_tests.rs"]
mod tests;
