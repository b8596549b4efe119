use zbus::{Connection, Proxy};

use crate::errors::{NotifyError, NotifyErrorKind};
use crate::notification::{Notification, ServerInfo};
use crate::notify_err;
use crate::wire::Wire;

async fn service_proxy(conn: &Connection) -> Result<Proxy<'static>, NotifyError> {
    Proxy::new(conn, Wire::DESTINATION, Wire::PATH, Wire::INTERFACE)
        .await
        .map_err(|e| notify_err!(NotifyErrorKind::Transport, e.to_string()))
}

/// Sends a notification and returns the server-assigned id, which is
/// always greater than zero.
///
/// A non-zero `replaces_id` makes the server atomically replace that
/// notification and return the same id.
///
/// Spec: org.freedesktop.Notifications.Notify
pub async fn send(conn: &Connection, note: &Notification) -> Result<u32, NotifyError> {
    let proxy = service_proxy(conn).await?;
    let reply = proxy
        .call_method(
            Wire::CALL_NOTIFY,
            &(
                &note.app_name,
                note.replaces_id,
                &note.app_icon,
                &note.summary,
                &note.body,
                note.wire_actions(),
                &note.hints,
                note.expiry.wire_timeout(),
            ),
        )
        .await
        .map_err(|e| notify_err!(NotifyErrorKind::Transport, e.to_string()))?;

    let body = reply.body();
    body.deserialize::<u32>()
        .map_err(|e| notify_err!(NotifyErrorKind::Decode, e.to_string()))
}

/// Forcefully closes a notification, for example because what it pertains
/// to is no longer relevant, or to cancel one that never expires.
///
/// The server does not treat closing an already-gone notification as an
/// error, and neither does this call.
///
/// Spec: org.freedesktop.Notifications.CloseNotification
pub async fn dismiss(conn: &Connection, id: u32) -> Result<(), NotifyError> {
    if id == 0 {
        return Err(notify_err!(
            NotifyErrorKind::InvalidArgument,
            "notification ids are always greater than zero"
        ));
    }

    let proxy = service_proxy(conn).await?;
    proxy
        .call_method(Wire::CALL_CLOSE_NOTIFICATION, &id)
        .await
        .map_err(|e| notify_err!(NotifyErrorKind::Transport, e.to_string()))?;
    Ok(())
}

/// Lists the optional capabilities the server supports, one capability per
/// string.
///
/// Spec: org.freedesktop.Notifications.GetCapabilities
pub async fn capabilities(conn: &Connection) -> Result<Vec<String>, NotifyError> {
    let proxy = service_proxy(conn).await?;
    let reply = proxy
        .call_method(Wire::CALL_GET_CAPABILITIES, &())
        .await
        .map_err(|e| notify_err!(NotifyErrorKind::Transport, e.to_string()))?;

    let body = reply.body();
    body.deserialize::<Vec<String>>()
        .map_err(|e| notify_err!(NotifyErrorKind::Decode, e.to_string()))
}

/// Fetches the server's identity fields. All four are mandatory in the
/// reply; a short read is a decode error.
///
/// Spec: org.freedesktop.Notifications.GetServerInformation
pub async fn server_info(conn: &Connection) -> Result<ServerInfo, NotifyError> {
    let proxy = service_proxy(conn).await?;
    let reply = proxy
        .call_method(Wire::CALL_GET_SERVER_INFORMATION, &())
        .await
        .map_err(|e| notify_err!(NotifyErrorKind::Transport, e.to_string()))?;

    let body = reply.body();
    let (name, vendor, version, spec_version) = body
        .deserialize::<(String, String, String, String)>()
        .map_err(|e| notify_err!(NotifyErrorKind::Decode, e.to_string()))?;

    Ok(ServerInfo {
        name,
        vendor,
        version,
        spec_version,
    })
}
