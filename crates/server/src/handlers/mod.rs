//! HTTP request handlers.

pub mod files;
pub mod health;
pub mod samples;
pub mod saves;
pub mod users;

pub use files::*;
pub use health::*;
pub use samples::*;
pub use saves::*;
pub use users::*;
