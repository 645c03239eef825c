//! Loads the competition snapshot a client starts from.

use shared::Competition;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid competition snapshot in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub async fn load_competition(path: &Path) -> Result<Competition, SnapshotError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    Competition::from_json(&text).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scoreboard-{}-{}.json", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_load_competition() {
        let path = temp_path("ok");
        let json = r#"{
            "_id": "c1",
            "name": "Cup",
            "date": "01.06.2024",
            "lakes": [{ "lakeName": "LakeX", "compType": "pilkki", "duration": "15" }],
            "players": [{ "playerName": "Alice" }],
            "status": "active"
        }"#;
        tokio::fs::write(&path, json).await.unwrap();

        let competition = assert_ok!(load_competition(&path).await);
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(competition.id, "c1");
        assert_eq!(competition.lakes[0].lake_name, "LakeX");
        assert_eq!(competition.players[0].player_name, "Alice");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = load_competition(&temp_path("missing")).await;
        assert!(matches!(result, Err(SnapshotError::Io { .. })));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let path = temp_path("bad");
        tokio::fs::write(&path, "{\"_id\": 5}").await.unwrap();

        let result = load_competition(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();

        assert!(matches!(result, Err(SnapshotError::Parse { .. })));
    }
}
