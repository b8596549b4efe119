//! Client bindings for the freedesktop.org Desktop Notifications D-Bus
//! service.
//!
//! [`send`] and the other free functions cover one-shot calls over an
//! existing [`zbus::Connection`]. [`Notifier`] additionally subscribes to
//! the service's `NotificationClosed`/`ActionInvoked` signals and hands
//! them to callbacks.
//!
//! See: <https://specifications.freedesktop.org/notification-spec/latest/>

pub mod calls;
pub mod errors;
pub mod notification;
pub mod notifier;
pub mod wire;

pub use calls::{capabilities, dismiss, send, server_info};
pub use errors::{NotifyError, NotifyErrorKind};
pub use notification::{Action, CloseReason, Expiry, Notification, ServerInfo, Urgency};
pub use notifier::{Notifier, NotifierBuilder};
