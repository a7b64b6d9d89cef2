pub mod cache;
pub mod error;
pub mod types;

pub use cache::*;
pub use error::*;
pub use types::*;
