use bytes::Bytes;
use futures::Stream;

/// Generate deterministic test data using a seeded pseudo-random generator.
/// Same seed produces same output (reproducible tests).
pub fn seeded_bytes(seed: u64, len: usize) -> Bytes {
    let mut data = vec![0u8; len];
    let mut state = seed;

    for chunk in data.chunks_mut(8) {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let bytes = state.to_le_bytes();
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = bytes[i % 8];
        }
    }

    Bytes::from(data)
}

/// Split `data` into a body stream of `chunk_size` pieces.
#[allow(dead_code)]
pub fn chunked_body(
    data: Bytes,
    chunk_size: usize,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send {
    let chunks: Vec<Result<Bytes, std::io::Error>> = data
        .chunks(chunk_size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    futures::stream::iter(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_bytes_deterministic() {
        assert_eq!(seeded_bytes(42, 100), seeded_bytes(42, 100));
        assert_ne!(seeded_bytes(42, 100), seeded_bytes(43, 100));
    }
}
