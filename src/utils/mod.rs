pub mod errors;
pub mod messages;

pub use errors::{PlaybackError, StorageError, StreamError};
pub use messages::Language;
