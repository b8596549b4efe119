/// D-Bus names of the `org.freedesktop.Notifications` service, kept in one
/// place so the wire contract is readable at a glance.
///
/// Method and signal tables:
/// <https://specifications.freedesktop.org/notification-spec/latest/ar01s09.html>
pub struct Wire;

impl Wire {
    pub const DESTINATION: &'static str = "org.freedesktop.Notifications";
    pub const PATH: &'static str = "/org/freedesktop/Notifications";
    pub const INTERFACE: &'static str = "org.freedesktop.Notifications";

    pub const CALL_NOTIFY: &'static str = "Notify";
    pub const CALL_CLOSE_NOTIFICATION: &'static str = "CloseNotification";
    pub const CALL_GET_CAPABILITIES: &'static str = "GetCapabilities";
    pub const CALL_GET_SERVER_INFORMATION: &'static str = "GetServerInformation";

    pub const SIGNAL_NOTIFICATION_CLOSED: &'static str = "NotificationClosed";
    pub const SIGNAL_ACTION_INVOKED: &'static str = "ActionInvoked";
}
