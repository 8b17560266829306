use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use mystery_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::{ConnectionId, Dispatcher};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Drive one WebSocket connection until either side goes away.
///
/// The connection is registered with the dispatcher for its whole lifetime;
/// channel memberships it picks up through `joinSession` are dropped with it.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut conn_rx) = dispatcher.register_connection().await;
    info!("connection {} opened", conn_id);

    let ready = GatewayEvent::Ready { connection_id: conn_id };
    if let Err(e) = send_event(&mut sender, &ready).await {
        warn!("connection {} closed before ready: {}", conn_id, e);
        dispatcher.unregister_connection(conn_id).await;
        return;
    }

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward queued events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                event = conn_rx.recv() => {
                    let Some(event) = event else { break };
                    if send_event(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let dispatcher_recv = dispatcher.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => handle_command(&dispatcher_recv, conn_id, cmd).await,
                    Err(e) => {
                        warn!(
                            "connection {} bad command: {} -- raw: {}",
                            conn_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.unregister_connection(conn_id).await;
    info!("connection {} closed", conn_id);
}

async fn handle_command(dispatcher: &Dispatcher, conn_id: ConnectionId, cmd: GatewayCommand) {
    match cmd {
        GatewayCommand::JoinSession(session_id) => {
            if dispatcher.join(conn_id, session_id).await {
                info!("connection {} joined session {}", conn_id, session_id);
                dispatcher
                    .send_to_connection(conn_id, GatewayEvent::SessionJoined(session_id))
                    .await;
            }
        }

        // Broadcast only: the stored session's current_phase is left alone.
        GatewayCommand::PhaseChange { session_id, phase } => {
            let delivered = dispatcher.publish_phase_change(session_id, phase).await;
            debug!(
                "connection {} set phase {} in session {} ({} subscribers)",
                conn_id, phase, session_id, delivered
            );
        }
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &GatewayEvent,
) -> anyhow::Result<()> {
    let text = serde_json::to_string(event)?;
    sender.send(Message::Text(text.into())).await?;
    Ok(())
}
