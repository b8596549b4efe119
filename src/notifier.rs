use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use zbus::{Connection, MatchRule, MessageStream, fdo, message};

use crate::calls;
use crate::errors::{NotifyError, NotifyErrorKind};
use crate::notification::{CloseReason, Notification, ServerInfo};
use crate::notify_err;
use crate::wire::Wire;

/// Called on receipt of a notification close event.
pub type ClosedHandler = dyn Fn(u32, CloseReason) + Send + Sync;

/// Called when the user invokes one of a notification's actions.
///
/// Many servers dismiss a notification around action invocation, so a
/// close event about the same id often arrives in close temporal
/// proximity.
pub type ActionHandler = dyn Fn(u32, String) + Send + Sync;

#[derive(Clone, Default)]
struct Handlers {
    on_closed: Option<Arc<ClosedHandler>>,
    on_action: Option<Arc<ActionHandler>>,
}

/// Configuration for a [`Notifier`]. Both callbacks are independently
/// optional; signals without a matching callback are decoded and dropped.
#[derive(Default)]
pub struct NotifierBuilder {
    handlers: Handlers,
}

impl NotifierBuilder {
    pub fn on_closed(
        mut self,
        handler: impl Fn(u32, CloseReason) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.on_closed = Some(Arc::new(handler));
        self
    }

    pub fn on_action(mut self, handler: impl Fn(u32, String) + Send + Sync + 'static) -> Self {
        self.handlers.on_action = Some(Arc::new(handler));
        self
    }

    /// Registers the signal match rule on `conn` and starts the delivery
    /// loop.
    pub async fn connect(self, conn: &Connection) -> Result<Notifier, NotifyError> {
        Notifier::subscribe(conn.clone(), self.handlers).await
    }
}

/// One handle over a bus connection: the one-shot calls plus the signal
/// subscription, with a single shutdown path.
///
/// The subscription is scoped by object path and interface only, so the
/// delivery loop also observes signals about notifications sent by other
/// processes sharing the bus. Compare delivered ids against the ones
/// [`Notifier::send`] returned to tell which ones are yours.
pub struct Notifier {
    conn: Connection,
    bus: fdo::DBusProxy<'static>,
    rule: MatchRule<'static>,
    cancel: CancellationToken,
    torn_down: AtomicBool,
}

impl Notifier {
    pub fn builder() -> NotifierBuilder {
        NotifierBuilder::default()
    }

    async fn subscribe(conn: Connection, handlers: Handlers) -> Result<Self, NotifyError> {
        let rule = signal_match_rule()
            .map_err(|e| notify_err!(NotifyErrorKind::Subscription, e.to_string()))?;

        let bus = fdo::DBusProxy::new(&conn)
            .await
            .map_err(|e| notify_err!(NotifyErrorKind::Subscription, e.to_string()))?;
        bus.add_match_rule(rule.clone())
            .await
            .map_err(|e| notify_err!(NotifyErrorKind::Subscription, e.to_string()))?;

        // The stream must exist before the loop task first runs so frames
        // arriving in between are queued rather than lost.
        let stream = MessageStream::from(&conn);
        let cancel = CancellationToken::new();
        tokio::spawn(receive_loop(stream, handlers, cancel.clone()));
        debug!("subscribed to notification signals");

        Ok(Self {
            conn,
            bus,
            rule,
            cancel,
            torn_down: AtomicBool::new(false),
        })
    }

    /// See [`calls::send`].
    pub async fn send(&self, note: &Notification) -> Result<u32, NotifyError> {
        calls::send(&self.conn, note).await
    }

    /// See [`calls::dismiss`].
    pub async fn dismiss(&self, id: u32) -> Result<(), NotifyError> {
        calls::dismiss(&self.conn, id).await
    }

    /// See [`calls::capabilities`].
    pub async fn capabilities(&self) -> Result<Vec<String>, NotifyError> {
        calls::capabilities(&self.conn).await
    }

    /// See [`calls::server_info`].
    pub async fn server_info(&self) -> Result<ServerInfo, NotifyError> {
        calls::server_info(&self.conn).await
    }

    /// Stops the delivery loop and removes the bus-side match rule.
    ///
    /// Safe to call repeatedly and concurrently; only the first call
    /// touches the bus. Callbacks already in flight are not waited for,
    /// but no further frames are dispatched once this returns.
    pub async fn shutdown(&self) -> Result<(), NotifyError> {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Local delivery stops even when rule removal fails below.
        self.cancel.cancel();

        self.bus
            .remove_match_rule(self.rule.clone())
            .await
            .map_err(|e| notify_err!(NotifyErrorKind::Unsubscribe, e.to_string()))?;
        debug!("notification signal subscription removed");
        Ok(())
    }

    /// True once the delivery loop has stopped, whether through
    /// [`Notifier::shutdown`] or loss of the connection. Terminal; build a
    /// fresh `Notifier` to resubscribe.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        // Stops the local loop; bus-side cleanup needs shutdown().
        self.cancel.cancel();
    }
}

fn signal_match_rule() -> zbus::Result<MatchRule<'static>> {
    Ok(MatchRule::builder()
        .msg_type(message::Type::Signal)
        .path(Wire::PATH)?
        .interface(Wire::INTERFACE)?
        .build())
}

/// Pulls frames until cancelled or the connection goes away. Queued frames
/// left behind on cancellation are discarded, not drained.
async fn receive_loop(mut stream: MessageStream, handlers: Handlers, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            frame = stream.next() => match frame {
                Some(Ok(msg)) => dispatch(&msg, &handlers),
                Some(Err(e)) => warn!("skipping undecodable bus frame: {e}"),
                None => {
                    debug!("bus connection closed, stopping signal delivery");
                    cancel.cancel();
                    break;
                }
            },
        }
    }
    debug!("notification signal loop exited");
}

/// Discriminates one inbound frame and fans the decoded event out to its
/// callback on a fresh task, so a slow callback never stalls the loop and
/// a callback calling back into the facade cannot deadlock against it.
fn dispatch(msg: &message::Message, handlers: &Handlers) {
    if msg.message_type() != message::Type::Signal {
        return;
    }
    let header = msg.header();
    let (Some(path), Some(interface), Some(member)) =
        (header.path(), header.interface(), header.member())
    else {
        return;
    };
    if path.as_str() != Wire::PATH || interface.as_str() != Wire::INTERFACE {
        return;
    }

    match member.as_str() {
        Wire::SIGNAL_NOTIFICATION_CLOSED => {
            let Ok((id, reason)) = msg.body().deserialize::<(u32, u32)>() else {
                debug!("skipping NotificationClosed frame with unexpected body");
                return;
            };
            if let Some(on_closed) = &handlers.on_closed {
                let on_closed = Arc::clone(on_closed);
                tokio::spawn(async move { on_closed(id, CloseReason::from(reason)) });
            }
        }
        Wire::SIGNAL_ACTION_INVOKED => {
            let Ok((id, action)) = msg.body().deserialize::<(u32, String)>() else {
                debug!("skipping ActionInvoked frame with unexpected body");
                return;
            };
            if let Some(on_action) = &handlers.on_action {
                let on_action = Arc::clone(on_action);
                tokio::spawn(async move { on_action(id, action) });
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn closed_signal(id: u32, reason: u32) -> message::Message {
        message::Message::signal(Wire::PATH, Wire::INTERFACE, Wire::SIGNAL_NOTIFICATION_CLOSED)
            .unwrap()
            .build(&(id, reason))
            .unwrap()
    }

    fn action_signal(id: u32, key: &str) -> message::Message {
        message::Message::signal(Wire::PATH, Wire::INTERFACE, Wire::SIGNAL_ACTION_INVOKED)
            .unwrap()
            .build(&(id, key))
            .unwrap()
    }

    fn collecting_handlers() -> (
        Handlers,
        mpsc::UnboundedReceiver<(u32, CloseReason)>,
        mpsc::UnboundedReceiver<(u32, String)>,
    ) {
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let handlers = Handlers {
            on_closed: Some(Arc::new(move |id, reason| {
                let _ = closed_tx.send((id, reason));
            })),
            on_action: Some(Arc::new(move |id, key| {
                let _ = action_tx.send((id, key));
            })),
        };
        (handlers, closed_rx, action_rx)
    }

    #[tokio::test]
    async fn closed_signal_reaches_on_closed() {
        let (handlers, mut closed_rx, _action_rx) = collecting_handlers();
        dispatch(&closed_signal(42, 1), &handlers);
        assert_eq!(closed_rx.recv().await, Some((42, CloseReason::Expired)));
    }

    #[tokio::test]
    async fn out_of_range_reason_maps_to_the_catch_all() {
        let (handlers, mut closed_rx, _action_rx) = collecting_handlers();
        dispatch(&closed_signal(42, 99), &handlers);
        let (id, reason) = closed_rx.recv().await.unwrap();
        assert_eq!(id, 42);
        assert_eq!(reason, CloseReason::Other(99));
        assert_eq!(reason.to_string(), "Other");
    }

    #[tokio::test]
    async fn action_signal_reaches_on_action_only() {
        let (handlers, mut closed_rx, mut action_rx) = collecting_handlers();
        dispatch(&action_signal(7, "cancel"), &handlers);
        assert_eq!(action_rx.recv().await, Some((7, "cancel".to_string())));
        assert!(closed_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_bodies_are_skipped() {
        let (handlers, mut closed_rx, mut action_rx) = collecting_handlers();
        let msg =
            message::Message::signal(Wire::PATH, Wire::INTERFACE, Wire::SIGNAL_NOTIFICATION_CLOSED)
                .unwrap()
                .build(&("no", "ids", "here"))
                .unwrap();
        dispatch(&msg, &handlers);
        tokio::task::yield_now().await;
        assert!(closed_rx.try_recv().is_err());
        assert!(action_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn foreign_interfaces_are_ignored() {
        let (handlers, mut closed_rx, _action_rx) = collecting_handlers();
        let msg = message::Message::signal(
            Wire::PATH,
            "org.freedesktop.PowerManagement",
            Wire::SIGNAL_NOTIFICATION_CLOSED,
        )
        .unwrap()
        .build(&(42u32, 1u32))
        .unwrap();
        dispatch(&msg, &handlers);
        tokio::task::yield_now().await;
        assert!(closed_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn handlerless_dispatch_discards_frames() {
        let handlers = Handlers::default();
        dispatch(&closed_signal(1, 2), &handlers);
        dispatch(&action_signal(1, "ok"), &handlers);
    }
}
