//! Storage backend implementations.

pub mod filesystem;
pub mod s3;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped inside a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Join a base URL and an object key, escaping each key segment.
pub(crate) fn join_url(base: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect();
    format!("{}/{}", base.trim_end_matches('/'), encoded.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://cdn.example.com/", "samples/a-b.wav"),
            "https://cdn.example.com/samples/a-b.wav"
        );
        assert_eq!(
            join_url("/files", "samples/my loop#1.wav"),
            "/files/samples/my%20loop%231.wav"
        );
    }
}
