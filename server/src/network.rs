//! Server network layer: accepts WebSocket sessions and wires them to the hub

use crate::config::HubConfig;
use crate::hub::BroadcastHub;
use crate::registry::{Frame, SessionRegistry};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::ProtocolError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;

pub type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Listening hub server
///
/// Every accepted connection gets two tasks: a reader that hands inbound
/// frames to the hub one at a time, and a writer that drains the session's
/// outbound queue into the socket.
pub struct Server {
    listener: TcpListener,
    hub: Arc<BroadcastHub>,
    outbound_capacity: usize,
}

impl Server {
    pub async fn bind(config: &HubConfig) -> ServerResult<Self> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let registry = Arc::new(RwLock::new(SessionRegistry::new(config.max_sessions)));
        let hub = Arc::new(BroadcastHub::new(registry, config.echo));

        Ok(Server {
            listener,
            hub,
            outbound_capacity: config.outbound_capacity,
        })
    }

    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn hub(&self) -> Arc<BroadcastHub> {
        Arc::clone(&self.hub)
    }

    /// Accept loop; runs until the task is dropped
    pub async fn run(self) -> ServerResult<()> {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let hub = Arc::clone(&self.hub);
                    let capacity = self.outbound_capacity;
                    tokio::spawn(async move {
                        handle_connection(hub, stream, addr, capacity).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

async fn handle_connection(
    hub: Arc<BroadcastHub>,
    stream: TcpStream,
    addr: SocketAddr,
    outbound_capacity: usize,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (mut sink, mut inbound) = ws.split();

    let (tx, mut rx) = mpsc::channel::<Frame>(outbound_capacity);
    let handle = {
        let mut registry = hub.registry().write().await;
        registry.register(addr, tx)
    };

    let Some(handle) = handle else {
        warn!("Rejecting {}: session capacity reached", addr);
        let _ = sink.send(Message::Close(None)).await;
        return;
    };

    // The queue closes once the registry drops the session's sender.
    let writer_handle = handle.clone();
    let writer_hub = Arc::clone(&hub);
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = sink.send(Message::text(frame.to_string())).await {
                debug!("Send to session {} failed: {}", writer_handle.id, e);
                break;
            }
        }
        writer_handle.mark_dead();
        writer_hub.registry().write().await.deregister(writer_handle.id);
        if let Err(e) = sink.close().await {
            debug!("Closing session {} failed: {}", writer_handle.id, e);
        }
    });

    while let Some(message) = inbound.next().await {
        match message {
            Ok(Message::Text(text)) => {
                hub.on_frame(handle.id, text.as_str()).await;
            }
            Ok(Message::Binary(_)) => {
                let error = ProtocolError::Malformed("binary frames are not supported".to_string());
                warn!("Rejected frame from session {}: {}", handle.id, error);
                hub.report_protocol_error(handle.id, &error).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Session {} read error: {}", handle.id, e);
                break;
            }
        }

        if !handle.is_alive() {
            break;
        }
    }

    handle.mark_dead();
    let mut registry = hub.registry().write().await;
    registry.deregister(handle.id);
}
