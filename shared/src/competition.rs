//! Read-only competition snapshot, in the JSON shape the persistence service
//! hands out. The hub never sees these; clients use them to seed a score
//! sheet and to know which competition id to listen for.

use crate::envelope::CompetitionId;
use crate::ProtocolError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionStatus {
    Active,
    Completed,
}

/// Fishing time allowed on a lake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LakeDuration {
    #[serde(rename = "15")]
    Fifteen,
    #[serde(rename = "30")]
    Thirty,
}

impl LakeDuration {
    pub fn minutes(self) -> u32 {
        match self {
            LakeDuration::Fifteen => 15,
            LakeDuration::Thirty => 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lake {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub lake_name: String,
    pub comp_type: String,
    pub duration: LakeDuration,
    /// Player who caught the biggest fish on this lake, if decided yet.
    #[serde(default)]
    pub biggest_fish_owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub player_name: String,
    #[serde(default)]
    pub tournament_wins: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub date: String,
    pub lakes: Vec<Lake>,
    pub players: Vec<Player>,
    pub status: CompetitionStatus,
}

impl Competition {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Identity used to match incoming score updates to this competition.
    pub fn competition_id(&self) -> Result<CompetitionId, ProtocolError> {
        CompetitionId::new(self.id.clone())
    }

    pub fn lake_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.lakes.iter().map(|lake| lake.lake_name.as_str())
    }

    pub fn player_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.players.iter().map(|player| player.player_name.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.status == CompetitionStatus::Active
    }
}
