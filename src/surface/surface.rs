use std::fmt;

use crate::form::request::FieldValue;
use crate::notify::notification::{Notification, NotificationId};

/// Identity of a control that can trigger a submission (a button id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(String);

impl ControlId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ControlId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ControlId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Visible state of a control, captured before it goes busy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub label: String,
    pub disabled: bool,
}

impl ControlState {
    pub fn enabled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Full navigation to a URL (absolute or relative to the current page).
    Url(String),
    /// Reload of the current page.
    Reload,
}

/// Everything the pipeline needs from the page it runs in.
///
/// A browser binding maps these onto the DOM; the CLI prints to the
/// terminal; tests record the calls. All methods are synchronous: they
/// only touch local UI state.
pub trait Surface: Send + Sync {
    /// Current value of the named field, None if the page has no such field.
    fn read_field(&self, name: &str) -> Option<FieldValue>;

    /// Disable the control and swap in the busy label. Returns the state
    /// to restore later.
    fn set_busy(&self, control: &ControlId, busy_label: &str) -> ControlState;

    /// Put the control back into the captured state.
    fn clear_busy(&self, control: &ControlId, prior: ControlState);

    fn render_notification(&self, id: NotificationId, notification: &Notification);

    fn remove_notification(&self, id: NotificationId);

    fn navigate(&self, target: &Navigation);

    /// Ask the user to confirm a destructive action.
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }

    /// Replace the text content of a display element.
    fn set_text(&self, _element: &str, _text: &str) {}
}
