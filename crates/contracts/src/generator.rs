//! SqlGenerator trait - collaborator interface of the dispatcher
//!
//! One method per feed variant. Implementations are pure string builders:
//! no I/O, deterministic for identical inputs apart from any intentional
//! "today" semantics.

use crate::GeneratorError;

/// SQL template collaborator
///
/// Inputs are passed through exactly as received; format and semantic
/// validation of dates or identifiers (if any) is the implementation's job.
pub trait SqlGenerator: Send + Sync {
    /// Default report over `[start_date, end_date]`
    fn legacy_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError>;

    fn feed_a_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError>;

    fn feed_b_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError>;

    fn feed_c_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError>;

    /// Time series for one `subid` over the last `days` days
    fn trend_series_sql(&self, subid: &str, days: u32) -> Result<String, GeneratorError>;
}

impl<G: SqlGenerator + ?Sized> SqlGenerator for std::sync::Arc<G> {
    fn legacy_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError> {
        (**self).legacy_sql(start_date, end_date)
    }

    fn feed_a_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError> {
        (**self).feed_a_sql(start_date, end_date)
    }

    fn feed_b_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError> {
        (**self).feed_b_sql(start_date, end_date)
    }

    fn feed_c_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError> {
        (**self).feed_c_sql(start_date, end_date)
    }

    fn trend_series_sql(&self, subid: &str, days: u32) -> Result<String, GeneratorError> {
        (**self).trend_series_sql(subid, days)
    }
}
