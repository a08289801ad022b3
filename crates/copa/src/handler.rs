//! Per-connection handler: wires a transport connection to a dispatcher.
//!
//! Each accepted connection gets its own task running this handler plus a
//! writer task draining the seat channel. The split matters: rooms push
//! broadcasts into the (unbounded) channel without ever waiting on the
//! socket, and the writer applies the send timeout so one slow peer can
//! only stall itself.

use std::sync::Arc;

use copa_protocol::Codec;
use copa_room::Rules;
use copa_transport::Connection;
use tokio::sync::{mpsc, Notify};

use crate::dispatcher::Dispatcher;
use crate::server::ServerState;
use crate::CopaError;

/// Handles a single connection from accept to close.
///
/// Generic over [`Connection`] so the lifecycle — including the
/// unreachable-peer teardown — is testable without a socket.
pub(crate) async fn handle_connection<R, C, T>(
    conn: T,
    state: Arc<ServerState<R, C>>,
) -> Result<(), CopaError>
where
    R: Rules,
    C: Codec + Clone,
    T: Connection + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    // When the writer gives up on the peer it raises this; the reader must
    // not stay parked in recv() waiting for a peer that will never speak.
    let shutdown = Arc::new(Notify::new());

    // Writer task: drains the seat channel onto the socket. A failed or
    // timed-out send means the peer is unreachable; the reader is signalled
    // so the disconnect path always runs, and the close itself is bounded
    // by the same timeout (against a stalled peer it can block too).
    let writer = {
        let conn = conn.clone();
        let codec = state.codec.clone();
        let send_timeout = state.send_timeout;
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let frame = match codec.encode(&msg) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::error!(%conn_id, error = %e, "encode failed");
                        continue;
                    }
                };
                match tokio::time::timeout(send_timeout, conn.send(&frame))
                    .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(%conn_id, error = %e, "send failed");
                        break;
                    }
                    Err(_) => {
                        tracing::warn!(%conn_id, "send timed out");
                        break;
                    }
                }
            }
            shutdown.notify_one();
            let _ = tokio::time::timeout(send_timeout, conn.close()).await;
        })
    };

    let mut dispatcher = Dispatcher::new(
        Arc::clone(&state.registry),
        state.codec.clone(),
        outbound_tx,
    );

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                tracing::debug!(%conn_id, "writer gave up on the peer");
                break;
            }
            result = conn.recv() => match result {
                Ok(Some(frame)) => dispatcher.dispatch(&frame).await,
                Ok(None) => {
                    tracing::debug!(%conn_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
        }
    }

    // Disconnect path: vacate the seat (notifying the peer) and stop the
    // writer. Dropping the dispatcher closes the seat channel.
    dispatcher.close().await;
    drop(dispatcher);
    let _ = writer.await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use copa_protocol::{
        GameState, JsonCodec, OpaquePayload, SeatId,
    };
    use copa_room::{RegistryConfig, RoomRegistry};
    use copa_transport::{ConnectionId, TransportError};
    use tokio::sync::Mutex;

    use super::*;

    struct NoopRules;

    impl Rules for NoopRules {
        fn initial_payload() -> OpaquePayload {
            OpaquePayload::new()
        }

        fn apply_move(
            state: &GameState,
            seat: SeatId,
            _payload: &OpaquePayload,
        ) -> GameState {
            let mut next = state.clone();
            next.current_turn = seat.other();
            next
        }
    }

    /// A connection whose peer has stopped draining its socket: inbound
    /// frames arrive from a channel, but every send (and even the close
    /// handshake) blocks forever.
    #[derive(Clone)]
    struct StalledConn {
        inbox: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    }

    impl Connection for StalledConn {
        type Error = TransportError;

        async fn send(&self, _frame: &str) -> Result<(), Self::Error> {
            std::future::pending().await
        }

        async fn recv(&self) -> Result<Option<String>, Self::Error> {
            Ok(self.inbox.lock().await.recv().await)
        }

        async fn close(&self) -> Result<(), Self::Error> {
            std::future::pending().await
        }

        fn id(&self) -> ConnectionId {
            ConnectionId::new(99)
        }
    }

    #[tokio::test]
    async fn test_send_timeout_tears_the_connection_down() {
        let state = Arc::new(ServerState {
            registry: Arc::new(RoomRegistry::<NoopRules>::new(
                RegistryConfig::default(),
            )),
            codec: JsonCodec,
            send_timeout: Duration::from_millis(50),
        });

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let conn = StalledConn {
            inbox: Arc::new(Mutex::new(frames_rx)),
        };

        // The create_room reply heads for a peer that never reads; the
        // send times out and the whole handler must unwind on its own.
        frames_tx.send(r#"{"type":"create_room"}"#.to_string()).unwrap();

        let handler = handle_connection(conn, Arc::clone(&state));
        tokio::time::timeout(Duration::from_secs(2), handler)
            .await
            .expect("handler should tear down after the send timeout")
            .expect("handler should exit cleanly");

        // The seat was vacated, so the empty room was reaped.
        assert_eq!(state.registry.room_count().await, 0);
    }
}
