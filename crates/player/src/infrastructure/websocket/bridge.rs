//! WebSocket Bridge - connects CommandBus/EventBus to the connection manager.
//!
//! This module provides the `create_connection` function that sets up:
//! - A CommandBus for connect/send/close
//! - An EventBus for decoded server events
//! - A background task that owns the [`ConnectionManager`] and drives it from
//!   bus messages, transport notifications and the reconnect timer
//!
//! The task is the only place the manager lives, which makes it the single
//! writer of the socket and the outbound buffer.

use std::sync::atomic::AtomicU8;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use url::Url;

use super::core::ReconnectPolicy;
use super::desktop::DesktopTransport;
use super::manager::ConnectionManager;
use crate::infrastructure::messaging::{
    set_connection_state, BusMessage, CommandBus, ConnectionHandle, ConnectionState,
    ConnectionStateObserver, EventBus,
};
use crate::ports::outbound::{TransportEvent, TransportPort};

/// Result of creating a connection.
///
/// Contains all the pieces needed to use the connection:
/// - `command_bus`: connect, send commands, close
/// - `event_bus`: subscribe to decoded server events
/// - `handle`: stop the connection task
/// - `state_observer`: observe connection state (connectivity indicator)
pub struct Connection {
    pub command_bus: CommandBus,
    pub event_bus: EventBus,
    pub handle: ConnectionHandle,
    pub state_observer: ConnectionStateObserver,
}

/// Spawn the connection task with the tokio-tungstenite transport.
///
/// Must be called from within a tokio runtime. Nothing is opened until a
/// token arrives through [`CommandBus::connect`].
pub fn create_connection(ws_url: Url, policy: ReconnectPolicy) -> Connection {
    create_connection_with(ws_url, policy, DesktopTransport::new)
}

/// Spawn the connection task with a custom transport.
pub fn create_connection_with<T, F>(ws_url: Url, policy: ReconnectPolicy, make_transport: F) -> Connection
where
    T: TransportPort + 'static,
    F: FnOnce(mpsc::UnboundedSender<TransportEvent>) -> T,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<BusMessage>(64);
    let (transport_tx, transport_rx) = mpsc::unbounded_channel::<TransportEvent>();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let state = Arc::new(AtomicU8::new(ConnectionState::Idle.to_u8()));

    let command_bus = CommandBus::new(cmd_tx);
    let event_bus = EventBus::new();
    let state_observer = ConnectionStateObserver::new(Arc::clone(&state));

    let manager = ConnectionManager::new(make_transport(transport_tx), ws_url, policy);
    tokio::spawn(bridge_task(
        manager,
        cmd_rx,
        transport_rx,
        shutdown_rx,
        event_bus.clone(),
        Arc::clone(&state),
    ));

    let handle = ConnectionHandle::new(state, shutdown_tx);

    Connection {
        command_bus,
        event_bus,
        handle,
        state_observer,
    }
}

async fn bridge_task<T: TransportPort>(
    mut manager: ConnectionManager<T>,
    mut cmd_rx: mpsc::Receiver<BusMessage>,
    mut transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
    event_bus: EventBus,
    state: Arc<AtomicU8>,
) {
    let mut handle_dropped = false;

    loop {
        let reconnect_at = manager.next_reconnect_at();

        tokio::select! {
            result = &mut shutdown_rx, if !handle_dropped => match result {
                Ok(()) => {
                    tracing::info!("Connection shutdown requested");
                    manager.close();
                    set_connection_state(&state, manager.state());
                    break;
                }
                Err(_) => {
                    // Dropping the handle does not stop the task.
                    handle_dropped = true;
                }
            },

            msg = cmd_rx.recv() => match msg {
                Some(BusMessage::Connect(token)) => manager.connect(token, Instant::now()),
                Some(BusMessage::Send(command)) => {
                    manager.send(command, Instant::now());
                }
                Some(BusMessage::Close) => manager.close(),
                None => {
                    tracing::info!("Command bus dropped, stopping connection task");
                    manager.close();
                    set_connection_state(&state, manager.state());
                    break;
                }
            },

            Some(event) = transport_rx.recv() => {
                for server_event in manager.handle_transport_event(event, Instant::now()) {
                    event_bus.dispatch(server_event).await;
                }
            }

            _ = sleep_until_due(reconnect_at) => {
                manager.poll_reconnect(Instant::now());
            }
        }

        set_connection_state(&state, manager.state());
    }
}

async fn sleep_until_due(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::{AttemptId, TransportError};
    use argonvale_shared::{ClientCommand, Direction, ServerEvent, ZoneId};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Opens instantly and records what it was asked to do.
    struct LoopbackTransport {
        events: mpsc::UnboundedSender<TransportEvent>,
        opened: Arc<Mutex<Vec<AttemptId>>>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl TransportPort for LoopbackTransport {
        fn open(&mut self, _url: &Url, attempt: AttemptId) -> Result<(), TransportError> {
            self.opened.lock().unwrap().push(attempt);
            let _ = self.events.send(TransportEvent::opened(attempt));
            Ok(())
        }

        fn send(&mut self, _attempt: AttemptId, text: &str) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn close(&mut self, attempt: AttemptId) {
            let _ = self.events.send(TransportEvent::closed(attempt, "client close"));
        }
    }

    struct Harness {
        connection: Connection,
        opened: Arc<Mutex<Vec<AttemptId>>>,
        sent: Arc<Mutex<Vec<String>>>,
        injector: mpsc::UnboundedSender<TransportEvent>,
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    fn start() -> Harness {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let injector = Arc::new(Mutex::new(None));

        let opened_for_transport = Arc::clone(&opened);
        let sent_for_transport = Arc::clone(&sent);
        let injector_for_transport = Arc::clone(&injector);
        let connection = create_connection_with(
            Url::parse("ws://localhost:8000/ws").unwrap(),
            ReconnectPolicy::fixed(Duration::from_millis(20)),
            move |events| {
                *injector_for_transport.lock().unwrap() = Some(events.clone());
                LoopbackTransport {
                    events,
                    opened: opened_for_transport,
                    sent: sent_for_transport,
                }
            },
        );
        let injector = injector.lock().unwrap().take().unwrap();

        Harness {
            connection,
            opened,
            sent,
            injector,
        }
    }

    #[tokio::test]
    async fn buffered_command_goes_out_once_connected() {
        let h = start();

        h.connection
            .command_bus
            .send(ClientCommand::Move {
                x: 1,
                y: 0,
                direction: Direction::RIGHT,
                zone_id: ZoneId::from("town"),
            })
            .unwrap();
        h.connection.command_bus.connect("tok").unwrap();

        wait_for(|| h.sent.lock().unwrap().len() == 1).await;
        let observer = h.connection.state_observer.clone();
        wait_for(|| observer.is_open()).await;
    }

    #[tokio::test]
    async fn inbound_frames_reach_event_bus_subscribers() {
        let h = start();
        let received: Arc<Mutex<Vec<ServerEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        h.connection
            .event_bus
            .subscribe(move |event| sink.lock().unwrap().push(event))
            .await;

        h.connection.command_bus.connect("tok").unwrap();
        let observer = h.connection.state_observer.clone();
        wait_for(|| observer.is_open()).await;

        h.injector
            .send(TransportEvent::text(
                AttemptId::new(1),
                r#"[{"type":"PlayerDisconnected","player_id":3},{"type":"PlayerDisconnected","player_id":4}]"#,
            ))
            .unwrap();

        wait_for(|| received.lock().unwrap().len() == 2).await;
    }

    #[tokio::test]
    async fn server_close_triggers_reconnect() {
        let h = start();
        h.connection.command_bus.connect("tok").unwrap();
        let observer = h.connection.state_observer.clone();
        wait_for(|| observer.is_open()).await;

        h.injector
            .send(TransportEvent::closed(AttemptId::new(1), "server restart"))
            .unwrap();

        wait_for(|| h.opened.lock().unwrap().len() == 2).await;
        wait_for(|| observer.is_open()).await;
        assert_eq!(h.opened.lock().unwrap()[1], AttemptId::new(2));
    }

    #[tokio::test]
    async fn shutdown_closes_the_connection() {
        let h = start();
        h.connection.command_bus.connect("tok").unwrap();
        let observer = h.connection.state_observer.clone();
        wait_for(|| observer.is_open()).await;

        h.connection.handle.shutdown();
        wait_for(|| observer.state() == ConnectionState::Closed).await;
    }
}
