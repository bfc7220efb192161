//! Database row models.

use crate::error::{MetadataError, MetadataResult};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    /// Encoded password credential, never the plaintext.
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// Sample record.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SampleRow {
    pub sample_id: Uuid,
    pub sample_name: String,
    pub sample_url: String,
    pub object_key: String,
    pub bpm: Option<i32>,
    pub musical_key: Option<String>,
    pub tags: String, // JSON array
    pub uploader_id: Option<Uuid>,
    pub upload_date: OffsetDateTime,
}

impl SampleRow {
    /// Decode the stored tag list.
    pub fn tags(&self) -> MetadataResult<Vec<String>> {
        serde_json::from_str(&self.tags).map_err(|e| {
            MetadataError::Serialization(format!(
                "invalid tags for sample {}: {e}",
                self.sample_id
            ))
        })
    }
}

/// Values for a sample insert. The timestamp is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSample {
    pub sample_id: Uuid,
    pub sample_name: String,
    pub sample_url: String,
    pub object_key: String,
    pub bpm: Option<i32>,
    pub musical_key: Option<String>,
    pub tags: Vec<String>,
    pub uploader_id: Option<Uuid>,
}

impl NewSample {
    pub(crate) fn tags_json(&self) -> MetadataResult<String> {
        serde_json::to_string(&self.tags).map_err(|e| MetadataError::Serialization(e.to_string()))
    }
}

/// Saved-sample link between a user and a sample.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SavedSampleRow {
    pub user_id: Uuid,
    pub sample_id: Uuid,
    pub save_date: OffsetDateTime,
}

/// Token record.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: Option<OffsetDateTime>,
    pub revoked_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub last_used_at: Option<OffsetDateTime>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tags: &str) -> SampleRow {
        SampleRow {
            sample_id: Uuid::new_v4(),
            sample_name: "track.wav".to_string(),
            sample_url: "/files/samples/x-track.wav".to_string(),
            object_key: "samples/x-track.wav".to_string(),
            bpm: None,
            musical_key: None,
            tags: tags.to_string(),
            uploader_id: None,
            upload_date: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_sample_tags_decode() {
        assert_eq!(
            row(r#"["chill","lofi"]"#).tags().unwrap(),
            vec!["chill".to_string(), "lofi".to_string()]
        );
        assert!(row("[]").tags().unwrap().is_empty());
        assert!(matches!(
            row("chill").tags(),
            Err(MetadataError::Serialization(_))
        ));
    }
}
