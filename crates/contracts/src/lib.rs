//! # Contracts
//!
//! Frozen interface contracts shared by every feedsql crate: the request and
//! response shapes of the feed endpoint, the closed set of feed variants, the
//! generator collaborator trait, and the warehouse configuration blueprint.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Wire model
//! - Requests are JSON objects with camelCase keys (`startDate`, `endDate`,
//!   `feedType`, `subid`, `days`)
//! - Replies carry exactly one of `sql` or `error`, plus a status code

mod blueprint;
mod error;
mod feed;
mod generator;
mod query;
mod request;
mod response;

pub use blueprint::*;
pub use error::*;
pub use feed::FeedType;
pub use generator::SqlGenerator;
pub use query::{resolve_trend_days, DateRange, FeedQuery, DEFAULT_TREND_DAYS};
pub use request::FeedRequest;
pub use response::*;
