//! # Dispatcher
//!
//! Feed request dispatch.
//!
//! Responsible for:
//! - Resolving the feed variant of a request (unknown → legacy)
//! - Checking the variant's required fields
//! - Delegating to the bound SQL generator
//! - Shaping every outcome into a `{ sql }` / `{ error }` reply

pub mod body;
pub mod dispatcher;
pub mod error;
pub mod validate;

pub use contracts::{DispatchReply, FeedRequest, FeedResponse, ReplyStatus, SqlGenerator};
pub use dispatcher::{create_dispatcher, DispatcherBuilder, FeedDispatcher};
pub use error::DispatcherError;
pub use validate::validate;
