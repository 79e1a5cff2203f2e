//! Per-connection handler.
//!
//! Each accepted connection gets its own task running this handler:
//!   1. Register a user in the lobby (or refuse when the server is full)
//!   2. Spawn a writer that drains the user's outbound queue
//!   3. Loop: receive frames → decode → dispatch to the session layer
//!
//! When the loop ends, a guard runs the disconnect policy.

use std::sync::Arc;

use cantstop_lobby::{User, session};
use cantstop_protocol::{ClientMessage, Codec, ServerMessage};
use cantstop_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::CantStopError;
use crate::server::ServerState;

/// Runs the disconnect policy when the handler exits.
///
/// `Drop` is synchronous, so the async cleanup is spawned as its own task.
struct DisconnectGuard<C: Codec> {
    user: Arc<User>,
    state: Arc<ServerState<C>>,
    writer: JoinHandle<()>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        self.writer.abort();
        let user = Arc::clone(&self.user);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            session::disconnect(&state.lobby, &user).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec + Clone>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), CantStopError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (outbound, queue) = mpsc::channel(state.lobby.config().outbound_queue_size);
    let user = match session::connect(&state.lobby, outbound).await {
        Ok(user) => user,
        Err(e) => {
            tracing::info!(%conn_id, error = %e, "connection refused");
            let bytes = state.codec.encode(&ServerMessage::error(e.to_string()))?;
            conn.send(&bytes).await?;
            conn.close().await?;
            return Err(e.into());
        }
    };
    tracing::info!(%conn_id, user = %user.id(), "user connected");

    let writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        queue,
        state.codec.clone(),
    ));
    let _guard = DisconnectGuard {
        user: Arc::clone(&user),
        state: Arc::clone(&state),
        writer,
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, user = %user.id(), "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode message");
                continue;
            }
        };

        tracing::trace!(%conn_id, kind = msg.kind(), "message received");
        session::handle_message(&state.lobby, &user, msg).await;
    }

    // _guard drops here → disconnect fires.
    Ok(())
}

/// Encodes queued messages and writes them to the socket, in order.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut queue: mpsc::Receiver<ServerMessage>,
    codec: C,
) {
    while let Some(msg) = queue.recv().await {
        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), error = %e, "failed to encode message");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}
