//! Envelope wire protocol between clients and the broadcast hub.
//!
//! Envelopes are JSON objects tagged by `"type"`:
//!
//! ```text
//! client → hub:    { "type": "UPDATE_SCORES",  "competitionId": "...", "scores": { lake: { player: "12" } } }
//! hub → clients:   { "type": "SCORES_UPDATED", "competitionId": "...", "scores": { ... } }
//! hub → sender:    { "type": "PROTOCOL_ERROR", "reason": "..." }
//! ```
//!
//! Scores always carry the full grid the sender holds. There is no delta mode.

use crate::grid::{ScoreGrid, WireGrid};
use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-empty competition identity used to route score updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompetitionId(String);

impl CompetitionId {
    pub fn new(id: impl Into<String>) -> Result<Self, ProtocolError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ProtocolError::EmptyCompetitionId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompetitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    UpdateScores,
    ScoresUpdated,
    ProtocolError,
}

impl EnvelopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeKind::UpdateScores => "UPDATE_SCORES",
            EnvelopeKind::ScoresUpdated => "SCORES_UPDATED",
            EnvelopeKind::ProtocolError => "PROTOCOL_ERROR",
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded and validated envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    UpdateScores {
        competition_id: CompetitionId,
        scores: ScoreGrid,
    },
    ScoresUpdated {
        competition_id: CompetitionId,
        scores: ScoreGrid,
    },
    ProtocolError {
        reason: String,
    },
}

/// Raw JSON shape, before any validation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum WireEnvelope {
    UpdateScores {
        #[serde(rename = "competitionId")]
        competition_id: String,
        scores: WireGrid,
    },
    ScoresUpdated {
        #[serde(rename = "competitionId")]
        competition_id: String,
        scores: WireGrid,
    },
    ProtocolError {
        reason: String,
    },
}

impl Envelope {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Envelope::UpdateScores { .. } => EnvelopeKind::UpdateScores,
            Envelope::ScoresUpdated { .. } => EnvelopeKind::ScoresUpdated,
            Envelope::ProtocolError { .. } => EnvelopeKind::ProtocolError,
        }
    }

    /// Decodes and validates one text frame.
    ///
    /// Validation is all-or-nothing: bad JSON, an unknown `type`, an empty
    /// `competitionId` or any non-digit score rejects the whole envelope.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let wire: WireEnvelope =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        let envelope = match wire {
            WireEnvelope::UpdateScores {
                competition_id,
                scores,
            } => Envelope::UpdateScores {
                competition_id: CompetitionId::new(competition_id)?,
                scores: ScoreGrid::from_wire(scores)?,
            },
            WireEnvelope::ScoresUpdated {
                competition_id,
                scores,
            } => Envelope::ScoresUpdated {
                competition_id: CompetitionId::new(competition_id)?,
                scores: ScoreGrid::from_wire(scores)?,
            },
            WireEnvelope::ProtocolError { reason } => Envelope::ProtocolError { reason },
        };

        Ok(envelope)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        let wire = match self {
            Envelope::UpdateScores {
                competition_id,
                scores,
            } => WireEnvelope::UpdateScores {
                competition_id: competition_id.as_str().to_string(),
                scores: scores.to_wire(),
            },
            Envelope::ScoresUpdated {
                competition_id,
                scores,
            } => WireEnvelope::ScoresUpdated {
                competition_id: competition_id.as_str().to_string(),
                scores: scores.to_wire(),
            },
            Envelope::ProtocolError { reason } => WireEnvelope::ProtocolError {
                reason: reason.clone(),
            },
        };

        serde_json::to_string(&wire).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Score;
    use serde_json::{json, Value};

    fn lake_x_alice(score: u32) -> ScoreGrid {
        let mut grid = ScoreGrid::new();
        grid.set("LakeX", "Alice", Score::new(score));
        grid
    }

    #[test]
    fn test_competition_id_rejects_empty() {
        assert_eq!(CompetitionId::new(""), Err(ProtocolError::EmptyCompetitionId));
        assert_eq!(CompetitionId::new("c1").unwrap().as_str(), "c1");
    }

    #[test]
    fn test_decode_update_scores() {
        let text = r#"{"type":"UPDATE_SCORES","competitionId":"c1","scores":{"LakeX":{"Alice":"12"}}}"#;

        let envelope = Envelope::decode(text).unwrap();
        assert_eq!(
            envelope,
            Envelope::UpdateScores {
                competition_id: CompetitionId::new("c1").unwrap(),
                scores: lake_x_alice(12),
            }
        );
        assert_eq!(envelope.kind(), EnvelopeKind::UpdateScores);
    }

    #[test]
    fn test_encode_scores_updated_matches_wire_shape() {
        let envelope = Envelope::ScoresUpdated {
            competition_id: CompetitionId::new("c1").unwrap(),
            scores: lake_x_alice(12),
        };

        let encoded: Value = serde_json::from_str(&envelope.encode().unwrap()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "SCORES_UPDATED",
                "competitionId": "c1",
                "scores": { "LakeX": { "Alice": "12" } }
            })
        );
    }

    #[test]
    fn test_encode_protocol_error() {
        let envelope = Envelope::ProtocolError {
            reason: "bad cell".to_string(),
        };

        let encoded: Value = serde_json::from_str(&envelope.encode().unwrap()).unwrap();
        assert_eq!(encoded, json!({ "type": "PROTOCOL_ERROR", "reason": "bad cell" }));
    }

    #[test]
    fn test_decode_rejects_invalid_score() {
        let text = r#"{"type":"UPDATE_SCORES","competitionId":"c1","scores":{"LakeX":{"Alice":"12","Bob":"12x"}}}"#;

        let result = Envelope::decode(text);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidScore { ref player, .. }) if player == "Bob"
        ));
    }

    #[test]
    fn test_decode_rejects_empty_competition_id() {
        let text = r#"{"type":"UPDATE_SCORES","competitionId":"","scores":{}}"#;
        assert_eq!(Envelope::decode(text), Err(ProtocolError::EmptyCompetitionId));
    }

    #[test]
    fn test_decode_rejects_bad_json_and_unknown_kinds() {
        let inputs = [
            "not json",
            r#"{"type":"DELETE_SCORES","competitionId":"c1","scores":{}}"#,
            r#"{"competitionId":"c1","scores":{}}"#,
            r#"{"type":"UPDATE_SCORES","scores":{}}"#,
            r#"{"type":"UPDATE_SCORES","competitionId":"c1"}"#,
            r#"{"type":"UPDATE_SCORES","competitionId":"c1","scores":{"LakeX":{"Alice":12}}}"#,
            r#"{"type":"UPDATE_SCORES","competitionId":"c1","scores":{"LakeX":"12"}}"#,
        ];

        for input in inputs {
            assert!(
                matches!(Envelope::decode(input), Err(ProtocolError::Malformed(_))),
                "accepted {}",
                input
            );
        }
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let text = r#"{"type":"SCORES_UPDATED","competitionId":"c1","scores":{},"sentAt":12345}"#;
        let envelope = Envelope::decode(text).unwrap();
        assert_eq!(envelope.kind(), EnvelopeKind::ScoresUpdated);
    }

    #[test]
    fn test_encoded_envelope_decodes_to_itself() {
        let envelope = Envelope::UpdateScores {
            competition_id: CompetitionId::new("tournament-7").unwrap(),
            scores: lake_x_alice(40),
        };

        let decoded = Envelope::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }
}
