//! Sample identifiers and upload payload helpers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a sample.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleId(Uuid);

impl SampleId {
    /// Generate a new random sample ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from a string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| crate::Error::InvalidId(format!("invalid sample ID: {e}")))
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SampleId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SampleId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Debug for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SampleId({})", self.0)
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse the `tags` form field of an upload.
///
/// The payload must be a JSON array of strings. Tags are kept in submission
/// order; each must be at most [`crate::MAX_TAG_LEN`] characters.
pub fn parse_tags(raw: &str) -> crate::Result<Vec<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let tags: Vec<String> = serde_json::from_str(raw).map_err(|e| {
        crate::Error::InvalidTags(format!("expected a JSON array of strings: {e}"))
    })?;

    if let Some(tag) = tags
        .iter()
        .find(|tag| tag.chars().count() > crate::MAX_TAG_LEN)
    {
        return Err(crate::Error::InvalidTags(format!(
            "tag exceeds {} characters: {tag}",
            crate::MAX_TAG_LEN
        )));
    }

    Ok(tags)
}

/// Derive a file extension: the text after the last `.`, or empty if none.
pub fn file_extension(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_id_roundtrip() {
        let id = SampleId::new();
        let parsed = SampleId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(SampleId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            parse_tags(r#"["chill","lofi"]"#).unwrap(),
            vec!["chill".to_string(), "lofi".to_string()]
        );
        assert!(parse_tags("[]").unwrap().is_empty());
        assert!(parse_tags("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_tags_rejects_malformed() {
        assert!(parse_tags("chill,lofi").is_err());
        assert!(parse_tags(r#"{"tags":["chill"]}"#).is_err());
        assert!(parse_tags(r#"["chill", 3]"#).is_err());
        assert!(parse_tags(r#""chill""#).is_err());
        assert!(parse_tags("[").is_err());
    }

    #[test]
    fn test_parse_tags_length_limit() {
        let ok = format!(r#"["{}"]"#, "a".repeat(50));
        assert!(parse_tags(&ok).is_ok());

        let too_long = format!(r#"["{}"]"#, "a".repeat(51));
        assert!(matches!(
            parse_tags(&too_long),
            Err(crate::Error::InvalidTags(_))
        ));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("track.wav"), "wav");
        assert_eq!(file_extension("loop.final.mp3"), "mp3");
        assert_eq!(file_extension("noext"), "");
        assert_eq!(file_extension("trailing."), "");
        assert_eq!(file_extension(".hidden"), "hidden");
    }
}
