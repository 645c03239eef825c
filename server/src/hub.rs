//! Broadcast hub: relays validated score updates to every registered session.
//!
//! The hub is a pure relay. It keeps no grid, no history and no
//! per-competition routing table, so `SCORES_UPDATED` reaches every session
//! regardless of which competition it has open; clients filter by
//! competition id on their side. Running one hub per competition is the way
//! to get isolation on the server.

use crate::registry::{Frame, SessionId, SessionRegistry};
use log::{debug, warn};
use shared::{Envelope, ProtocolError};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Whether the session that sent an update also receives the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoPolicy {
    #[default]
    SkipSource,
    IncludeSource,
}

/// Result of one fan-out walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanoutReport {
    /// Sessions the frame was queued for
    pub delivered: usize,
    /// Sessions found dead or faulted during the walk, now deregistered
    pub dropped: Vec<SessionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubOutcome {
    Relayed(FanoutReport),
    Rejected(ProtocolError),
}

/// Relays score updates between sessions
///
/// The hub owns no connections. It validates what one session sends and
/// pushes the relay onto the queues of the sessions in the shared registry.
pub struct BroadcastHub {
    registry: Arc<RwLock<SessionRegistry>>,
    echo: EchoPolicy,
}

impl BroadcastHub {
    /// Creates a hub relaying across `registry`
    ///
    /// The transport registers and deregisters sessions through the same
    /// registry handle, see [`BroadcastHub::registry`].
    pub fn new(registry: Arc<RwLock<SessionRegistry>>, echo: EchoPolicy) -> Self {
        Self { registry, echo }
    }

    /// Shared session registry, for connect and close handling
    pub fn registry(&self) -> &Arc<RwLock<SessionRegistry>> {
        &self.registry
    }

    /// Returns whether senders receive their own updates back
    pub fn echo_policy(&self) -> EchoPolicy {
        self.echo
    }

    /// Decodes one inbound text frame and handles it.
    pub async fn on_frame(&self, source: SessionId, text: &str) -> HubOutcome {
        match Envelope::decode(text) {
            Ok(envelope) => self.on_envelope(source, envelope).await,
            Err(error) => {
                warn!("Rejected frame from session {}: {}", source, error);
                self.report_protocol_error(source, &error).await;
                HubOutcome::Rejected(error)
            }
        }
    }

    /// Relays an `UPDATE_SCORES` as `SCORES_UPDATED`.
    ///
    /// Any other kind is a hub → client message and is rejected back to the
    /// source without reaching anyone else.
    pub async fn on_envelope(&self, source: SessionId, envelope: Envelope) -> HubOutcome {
        let (competition_id, scores) = match envelope {
            Envelope::UpdateScores {
                competition_id,
                scores,
            } => (competition_id, scores),
            other => {
                let error = ProtocolError::UnexpectedKind(other.kind());
                warn!("Rejected envelope from session {}: {}", source, error);
                self.report_protocol_error(source, &error).await;
                return HubOutcome::Rejected(error);
            }
        };

        debug!(
            "Session {} updated {} cells of competition {}",
            source,
            scores.cell_count(),
            competition_id
        );

        let outbound = Envelope::ScoresUpdated {
            competition_id,
            scores,
        };

        match outbound.encode() {
            Ok(text) => HubOutcome::Relayed(self.fan_out(Some(source), Frame::from(text)).await),
            Err(error) => {
                warn!("Failed to encode relay for session {}: {}", source, error);
                self.report_protocol_error(source, &error).await;
                HubOutcome::Rejected(error)
            }
        }
    }

    /// Queues `frame` for every live session, honouring the echo policy.
    ///
    /// Each delivery is independent: a dead or backlogged session is marked
    /// dead and dropped from the registry after the walk, and the remaining
    /// sessions still receive the frame.
    pub async fn fan_out(&self, source: Option<SessionId>, frame: Frame) -> FanoutReport {
        let mut report = FanoutReport::default();

        let dead = {
            let registry = self.registry.read().await;

            registry.for_each_live(|session| {
                if self.echo == EchoPolicy::SkipSource && Some(session.id) == source {
                    return;
                }

                match session.deliver(Arc::clone(&frame)) {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        warn!("Dropping session {}: {}", session.id, e);
                        session.mark_dead();
                    }
                }
            });

            registry.dead_sessions()
        };

        if !dead.is_empty() {
            let mut registry = self.registry.write().await;
            for session_id in &dead {
                registry.deregister(*session_id);
            }
        }

        report.dropped = dead;
        report
    }

    /// Sends a `PROTOCOL_ERROR` envelope to `source` only.
    pub async fn report_protocol_error(&self, source: SessionId, error: &ProtocolError) {
        let envelope = Envelope::ProtocolError {
            reason: error.to_string(),
        };

        let frame = match envelope.encode() {
            Ok(text) => Frame::from(text),
            Err(e) => {
                warn!("Failed to encode protocol error for session {}: {}", source, e);
                return;
            }
        };

        let registry = self.registry.read().await;
        if let Some(session) = registry.get(source) {
            if let Err(e) = session.deliver(frame) {
                debug!("Could not report protocol error: {}", e);
                session.mark_dead();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SessionHandle;
    use shared::{CompetitionId, EnvelopeKind, Score, ScoreGrid};
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    const UPDATE_C1: &str =
        r#"{"type":"UPDATE_SCORES","competitionId":"c1","scores":{"LakeX":{"Alice":"12"}}}"#;

    struct TestSession {
        handle: SessionHandle,
        rx: mpsc::Receiver<Frame>,
    }

    impl TestSession {
        fn id(&self) -> SessionId {
            self.handle.id
        }

        fn received(&mut self) -> Vec<Envelope> {
            let mut envelopes = Vec::new();
            while let Ok(frame) = self.rx.try_recv() {
                envelopes.push(Envelope::decode(&frame).unwrap());
            }
            envelopes
        }
    }

    fn test_addr() -> SocketAddr {
        "127.0.0.1:3000".parse().unwrap()
    }

    async fn hub_with_sessions(
        count: usize,
        capacity: usize,
        echo: EchoPolicy,
    ) -> (BroadcastHub, Vec<TestSession>) {
        let registry = Arc::new(RwLock::new(SessionRegistry::new(64)));
        let mut sessions = Vec::new();
        {
            let mut guard = registry.write().await;
            for _ in 0..count {
                let (tx, rx) = mpsc::channel(capacity);
                let handle = guard.register(test_addr(), tx).unwrap();
                sessions.push(TestSession { handle, rx });
            }
        }
        (BroadcastHub::new(registry, echo), sessions)
    }

    fn lake_x_alice(score: u32) -> Envelope {
        let mut scores = ScoreGrid::new();
        scores.set("LakeX", "Alice", Score::new(score));
        Envelope::ScoresUpdated {
            competition_id: CompetitionId::new("c1").unwrap(),
            scores,
        }
    }

    #[tokio::test]
    async fn test_relays_to_every_other_session() {
        let (hub, mut sessions) = hub_with_sessions(3, 8, EchoPolicy::SkipSource).await;
        let source = sessions[0].id();

        let outcome = hub.on_frame(source, UPDATE_C1).await;

        assert_eq!(
            outcome,
            HubOutcome::Relayed(FanoutReport {
                delivered: 2,
                dropped: vec![],
            })
        );
        assert!(sessions[0].received().is_empty());
        assert_eq!(sessions[1].received(), vec![lake_x_alice(12)]);
        assert_eq!(sessions[2].received(), vec![lake_x_alice(12)]);
    }

    #[tokio::test]
    async fn test_include_source_echoes_back() {
        let (hub, mut sessions) = hub_with_sessions(2, 8, EchoPolicy::IncludeSource).await;
        let source = sessions[0].id();

        hub.on_frame(source, UPDATE_C1).await;

        assert_eq!(sessions[0].received(), vec![lake_x_alice(12)]);
        assert_eq!(sessions[1].received(), vec![lake_x_alice(12)]);
    }

    #[tokio::test]
    async fn test_single_session_relays_to_nobody() {
        let (hub, mut sessions) = hub_with_sessions(1, 8, EchoPolicy::SkipSource).await;
        let source = sessions[0].id();

        let outcome = hub.on_frame(source, UPDATE_C1).await;

        assert_eq!(outcome, HubOutcome::Relayed(FanoutReport::default()));
        assert!(sessions[0].received().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_cell_is_reported_to_source_only() {
        let (hub, mut sessions) = hub_with_sessions(3, 8, EchoPolicy::SkipSource).await;
        let source = sessions[0].id();
        let frame = r#"{"type":"UPDATE_SCORES","competitionId":"c1","scores":{"LakeX":{"Alice":"12x"}}}"#;

        let outcome = hub.on_frame(source, frame).await;

        assert!(matches!(
            outcome,
            HubOutcome::Rejected(ProtocolError::InvalidScore { .. })
        ));
        let to_source = sessions[0].received();
        assert_eq!(to_source.len(), 1);
        assert_eq!(to_source[0].kind(), EnvelopeKind::ProtocolError);
        assert!(sessions[1].received().is_empty());
        assert!(sessions[2].received().is_empty());
    }

    #[tokio::test]
    async fn test_bad_json_is_reported_to_source_only() {
        let (hub, mut sessions) = hub_with_sessions(2, 8, EchoPolicy::IncludeSource).await;
        let source = sessions[1].id();

        let outcome = hub.on_frame(source, "{not json").await;

        assert!(matches!(outcome, HubOutcome::Rejected(ProtocolError::Malformed(_))));
        assert!(sessions[0].received().is_empty());
        match sessions[1].received().as_slice() {
            [Envelope::ProtocolError { reason }] => assert!(reason.starts_with("malformed")),
            other => panic!("Unexpected envelopes: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_may_not_send_scores_updated() {
        let (hub, mut sessions) = hub_with_sessions(2, 8, EchoPolicy::SkipSource).await;
        let source = sessions[0].id();

        let outcome = hub.on_envelope(source, lake_x_alice(5)).await;

        assert_eq!(
            outcome,
            HubOutcome::Rejected(ProtocolError::UnexpectedKind(EnvelopeKind::ScoresUpdated))
        );
        assert!(sessions[1].received().is_empty());
        assert_eq!(sessions[0].received().len(), 1);
    }

    #[tokio::test]
    async fn test_dead_session_is_dropped_without_affecting_others() {
        let (hub, mut sessions) = hub_with_sessions(4, 8, EchoPolicy::SkipSource).await;
        let source = sessions[0].id();
        let dead = sessions[2].id();
        sessions[2].handle.mark_dead();

        let outcome = hub.on_frame(source, UPDATE_C1).await;

        assert_eq!(
            outcome,
            HubOutcome::Relayed(FanoutReport {
                delivered: 2,
                dropped: vec![dead],
            })
        );
        assert_eq!(sessions[1].received().len(), 1);
        assert!(sessions[2].received().is_empty());
        assert_eq!(sessions[3].received().len(), 1);

        let registry = hub.registry().read().await;
        assert!(registry.get(dead).is_none());
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_closed_queue_is_dropped() {
        let (hub, mut sessions) = hub_with_sessions(3, 8, EchoPolicy::SkipSource).await;
        let source = sessions[0].id();
        let closed = sessions.remove(1);
        let closed_id = closed.id();
        drop(closed);

        let outcome = hub.on_frame(source, UPDATE_C1).await;

        assert_eq!(
            outcome,
            HubOutcome::Relayed(FanoutReport {
                delivered: 1,
                dropped: vec![closed_id],
            })
        );
        assert_eq!(sessions[1].received().len(), 1);
        assert!(hub.registry().read().await.get(closed_id).is_none());
    }

    #[tokio::test]
    async fn test_backlogged_session_degrades_only_itself() {
        let (hub, mut sessions) = hub_with_sessions(3, 1, EchoPolicy::SkipSource).await;
        let source = sessions[0].id();
        let slow = sessions[1].id();

        // Session 2 drains its queue, session 1 never does.
        hub.on_frame(source, UPDATE_C1).await;
        assert_eq!(sessions[2].received().len(), 1);

        let outcome = hub.on_frame(source, UPDATE_C1).await;

        assert_eq!(
            outcome,
            HubOutcome::Relayed(FanoutReport {
                delivered: 1,
                dropped: vec![slow],
            })
        );
        assert_eq!(sessions[2].received().len(), 1);
        assert_eq!(sessions[1].received().len(), 1);
        assert!(hub.registry().read().await.get(slow).is_none());
    }

    #[tokio::test]
    async fn test_updates_from_one_source_arrive_in_order() {
        let (hub, mut sessions) = hub_with_sessions(3, 32, EchoPolicy::SkipSource).await;
        let source = sessions[0].id();

        for score in 1..=10u32 {
            let frame = format!(
                r#"{{"type":"UPDATE_SCORES","competitionId":"c1","scores":{{"LakeX":{{"Alice":"{}"}}}}}}"#,
                score
            );
            hub.on_frame(source, &frame).await;
        }

        let expected: Vec<Envelope> = (1..=10).map(lake_x_alice).collect();
        assert_eq!(sessions[1].received(), expected);
        assert_eq!(sessions[2].received(), expected);
    }

    #[tokio::test]
    async fn test_competitions_are_not_filtered_by_the_hub() {
        let (hub, mut sessions) = hub_with_sessions(2, 8, EchoPolicy::SkipSource).await;
        let source = sessions[0].id();
        let frame = r#"{"type":"UPDATE_SCORES","competitionId":"other","scores":{}}"#;

        hub.on_frame(source, frame).await;

        match sessions[1].received().as_slice() {
            [Envelope::ScoresUpdated { competition_id, .. }] => {
                assert_eq!(competition_id.as_str(), "other")
            }
            other => panic!("Unexpected envelopes: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_protocol_error_for_unknown_source_is_a_no_op() {
        let (hub, mut sessions) = hub_with_sessions(1, 8, EchoPolicy::SkipSource).await;

        hub.report_protocol_error(999, &ProtocolError::EmptyCompetitionId)
            .await;

        assert!(sessions[0].received().is_empty());
    }
}
