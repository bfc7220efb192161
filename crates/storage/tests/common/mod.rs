pub mod fixtures;
pub mod mocks;

#[allow(unused_imports)]
pub use fixtures::{chunked_body, seeded_bytes};
#[allow(unused_imports)]
pub use mocks::{FailMode, MemoryBackend};
