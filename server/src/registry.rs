//! Connection registry for the broadcast hub
//!
//! This module tracks every live session attached to the hub, including:
//! - Session lifecycle (register on connect, deregister on close or fault)
//! - A shared liveness flag per session, visible to the transport tasks
//! - A bounded outbound queue per session that never blocks the sender
//! - Capacity limits on the number of concurrent sessions
//!
//! The registry performs no I/O. Pushing a frame onto a session queue is the
//! only delivery it knows about; the transport layer drains the queues.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;

pub type SessionId = u64;

/// An encoded text frame, shared across every queue it is pushed onto.
pub type Frame = Arc<str>;

/// Why a frame could not be queued for a session
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("session {0} is no longer alive")]
    Dead(SessionId),
    #[error("session {0} has a full outbound queue")]
    Backlogged(SessionId),
    #[error("session {0} has closed its outbound queue")]
    Closed(SessionId),
}

/// A live duplex channel between one client and the hub
///
/// Each session keeps:
/// - Connection metadata (ID, peer address, connect time)
/// - The sending half of its outbound frame queue
/// - A liveness flag shared with its connection tasks
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier assigned by the registry
    pub id: SessionId,
    /// Peer address, for logging
    pub addr: SocketAddr,
    /// When the session was registered
    pub connected_at: Instant,
    sender: mpsc::Sender<Frame>,
    alive: Arc<AtomicBool>,
}

impl Session {
    /// Creates a live session around the sending half of its outbound queue
    pub fn new(id: SessionId, addr: SocketAddr, sender: mpsc::Sender<Frame>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Flags the session dead
    ///
    /// The session stays registered until the next fan-out, register or
    /// connection teardown removes it.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Queues a frame without waiting
    ///
    /// A full queue means the peer is not keeping up. Both a full and a
    /// closed queue are terminal for this session; nothing is retried.
    pub fn deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        if !self.is_alive() {
            return Err(DeliveryError::Dead(self.id));
        }

        self.sender.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Backlogged(self.id),
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed(self.id),
        })
    }

    fn handle(&self) -> SessionHandle {
        SessionHandle {
            id: self.id,
            alive: Arc::clone(&self.alive),
        }
    }
}

/// What the transport keeps for its own session after registering
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    alive: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

/// Tracks all sessions currently attached to the hub
///
/// The registry itself is not synchronized; the hub shares it behind a
/// `tokio::sync::RwLock` so fan-out walks take a read guard while
/// connect and close take a write guard.
pub struct SessionRegistry {
    /// Registered sessions indexed by their ID
    sessions: HashMap<SessionId, Session>,
    /// Next ID handed out on register
    next_session_id: SessionId,
    /// Maximum number of concurrent sessions allowed
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            next_session_id: 1,
            max_sessions,
        }
    }

    /// Adds a new live session
    ///
    /// Sessions already marked dead are swept first so they never hold a
    /// slot. Returns None only when the live sessions fill the registry.
    pub fn register(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::Sender<Frame>,
    ) -> Option<SessionHandle> {
        if self.sessions.len() >= self.max_sessions {
            for session_id in self.dead_sessions() {
                self.deregister(session_id);
            }
        }

        if self.sessions.len() >= self.max_sessions {
            return None;
        }

        let session_id = self.next_session_id;
        self.next_session_id += 1;

        let session = Session::new(session_id, addr, sender);
        let handle = session.handle();
        info!("Session {} connected from {}", session_id, addr);
        self.sessions.insert(session_id, session);

        Some(handle)
    }

    /// Removes a session
    ///
    /// Idempotent: returns false when the session was already gone, which
    /// happens whenever a close races a fan-out that dropped it first.
    pub fn deregister(&mut self, session_id: SessionId) -> bool {
        if let Some(session) = self.sessions.remove(&session_id) {
            session.mark_dead();
            info!(
                "Session {} from {} disconnected after {:.1}s",
                session.id,
                session.addr,
                session.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    /// Visits every session that is still alive
    ///
    /// Liveness is re-checked right before each visit, so a session that
    /// dies part-way through the walk is skipped rather than visited.
    pub fn for_each_live<F>(&self, mut visit: F)
    where
        F: FnMut(&Session),
    {
        for session in self.sessions.values() {
            if session.is_alive() {
                visit(session);
            }
        }
    }

    /// Gets a registered session, dead or alive
    pub fn get(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.get(&session_id)
    }

    /// IDs of sessions whose liveness flag has flipped but are still registered
    pub fn dead_sessions(&self) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|session| !session.is_alive())
            .map(|session| session.id)
            .collect()
    }

    /// Returns the number of registered sessions still alive
    pub fn live_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_alive()).count()
    }

    /// Returns the number of registered sessions, dead or alive
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
