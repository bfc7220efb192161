//! Repository traits for metadata operations.

pub mod samples;
pub mod saves;
pub mod tokens;
pub mod users;

pub use samples::SampleRepo;
pub use saves::SavedSampleRepo;
pub use tokens::TokenRepo;
pub use users::UserRepo;
