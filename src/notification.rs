use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zbus::zvariant::OwnedValue;

/// Hint key carrying the urgency byte.
///
/// Spec: <https://specifications.freedesktop.org/notification-spec/latest/ar01s08.html>
pub const HINT_URGENCY: &str = "urgency";

/// Content of one outbound notification.
///
/// Spec: Table 6. Notify Parameters
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Notification {
    /// May be displayed to the user. Can be blank.
    pub app_name: String,
    /// Spec: <http://standards.freedesktop.org/icon-naming-spec/icon-naming-spec-latest.html>
    pub app_icon: String,
    pub summary: String,
    /// Some servers display the whole body in addition to, or instead of,
    /// the summary.
    pub body: String,
    /// A previously returned id to atomically replace; 0 opens a new
    /// notification.
    pub replaces_id: u32,
    /// A user may invoke these on the notification. Ordering is preserved
    /// on the wire.
    pub actions: Vec<Action>,
    /// Extension mechanism for notification metadata.
    pub hints: HashMap<String, OwnedValue>,
    pub expiry: Expiry,
}

impl Notification {
    /// Sets the urgency hint.
    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.hints
            .insert(HINT_URGENCY.into(), OwnedValue::from(urgency as u8));
        self
    }

    /// Sets an arbitrary hint entry.
    pub fn hint(mut self, key: impl Into<String>, value: OwnedValue) -> Self {
        self.hints.insert(key.into(), value);
        self
    }

    /// Flattens the action pairs for the wire; even elements are
    /// identifiers, odd elements are the localized labels.
    pub(crate) fn wire_actions(&self) -> Vec<String> {
        let mut flat = Vec::with_capacity(self.actions.len() * 2);
        for action in &self.actions {
            flat.push(action.key.clone());
            flat.push(action.label.clone());
        }
        flat
    }
}

/// One possible reaction to a notification.
///
/// Not a map entry; the order in which actions are listed may be relevant
/// to the server.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Action {
    /// Identifier handed back through action-invoked events.
    pub key: String,
    /// String displayed to the user.
    pub label: String,
}

impl Action {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Strategy for automatic notification expiry.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Expiry {
    /// Defer to the server's default expiry behaviour.
    #[default]
    ServerDefault,
    /// Expire after the given duration.
    Timeout(Duration),
    /// Never expire automatically.
    Never,
}

impl Expiry {
    /// Wire value of the `expire_timeout` parameter, in milliseconds.
    pub(crate) fn wire_timeout(self) -> i32 {
        match self {
            Expiry::ServerDefault => -1,
            Expiry::Never => 0,
            Expiry::Timeout(timeout) => timeout.as_millis() as i32,
        }
    }
}

/// How insistently the server should present a notification.
///
/// Spec: <https://specifications.freedesktop.org/notification-spec/latest/ar01s07.html>
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Urgency {
    Low = 0,
    Normal = 1,
    Critical = 2,
}

/// Server-side reason a notification went away.
///
/// Spec: Table 8. NotificationClosed Parameters
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum CloseReason {
    /// The notification reached its timeout and expired.
    Expired,
    /// A user dismissed the notification.
    DismissedByUser,
    /// Caused by a `CloseNotification` call.
    #[strum(serialize = "ClosedByCall")]
    DismissedByCall,
    /// Undefined or reserved reason.
    Unknown,
    /// Any wire value outside the reserved range, preserved as received.
    #[strum(serialize = "Other")]
    Other(u32),
}

impl From<u32> for CloseReason {
    fn from(raw: u32) -> Self {
        match raw {
            1 => Self::Expired,
            2 => Self::DismissedByUser,
            3 => Self::DismissedByCall,
            4 => Self::Unknown,
            other => Self::Other(other),
        }
    }
}

/// Static server identity.
///
/// Spec: Table 7. GetServerInformation Return Values
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    /// For example "KDE" or "GNOME".
    pub vendor: String,
    pub version: String,
    /// Version of the notification spec the server complies with.
    pub spec_version: String,
}
