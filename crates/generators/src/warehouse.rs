//! WarehouseSqlGenerator - config-driven SQL generator

use chrono::{Days, NaiveDate, Utc};
use tracing::{debug, instrument};

use contracts::{FeedType, GeneratorError, SqlGenerator, WarehouseConfig};

use crate::templates::{self, RangeTemplate};

/// Source of "today" for rolling windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Today {
    /// Current UTC date at render time
    #[default]
    System,
    /// Pinned date, for reproducible output
    Fixed(NaiveDate),
}

impl Today {
    pub fn resolve(&self) -> NaiveDate {
        match self {
            Self::System => Utc::now().date_naive(),
            Self::Fixed(date) => *date,
        }
    }
}

/// Generator rendering every feed against the tables named in a [`WarehouseConfig`]
#[derive(Debug, Clone)]
pub struct WarehouseSqlGenerator {
    config: WarehouseConfig,
    today: Today,
}

impl WarehouseSqlGenerator {
    pub fn new(config: WarehouseConfig) -> Self {
        Self {
            config,
            today: Today::System,
        }
    }

    /// Pin the date used as the end of the trend window
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Today::Fixed(today);
        self
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Quoted table reference for `feed`
    ///
    /// # Errors
    /// Any part of the reference is empty.
    pub fn table(&self, feed: FeedType) -> Result<String, GeneratorError> {
        let warehouse = &self.config.warehouse;
        let table = self.config.tables.table_for(feed);

        if warehouse.project.is_empty() || warehouse.dataset.is_empty() {
            return Err(GeneratorError::template(
                feed,
                "warehouse project and dataset must be set",
            ));
        }
        if table.is_empty() {
            return Err(GeneratorError::template(feed, "no table configured"));
        }
        Ok(self.config.table_ref(feed))
    }

    #[instrument(
        name = "generator_render_range",
        skip(self, template),
        fields(feed = %template.feed)
    )]
    fn range_sql(
        &self,
        template: &RangeTemplate,
        start_date: &str,
        end_date: &str,
    ) -> Result<String, GeneratorError> {
        let table = self.table(template.feed)?;
        let sql = templates::render_range(
            template,
            &table,
            &self.config.warehouse.timestamp_column,
            start_date,
            end_date,
        );
        debug!(bytes = sql.len(), "Rendered range query");
        Ok(sql)
    }
}

impl SqlGenerator for WarehouseSqlGenerator {
    fn legacy_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError> {
        self.range_sql(&templates::LEGACY, start_date, end_date)
    }

    fn feed_a_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError> {
        self.range_sql(&templates::FEED_A, start_date, end_date)
    }

    fn feed_b_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError> {
        self.range_sql(&templates::FEED_B, start_date, end_date)
    }

    fn feed_c_sql(&self, start_date: &str, end_date: &str) -> Result<String, GeneratorError> {
        self.range_sql(&templates::FEED_C, start_date, end_date)
    }

    #[instrument(name = "generator_render_trend_series", skip(self, subid))]
    fn trend_series_sql(&self, subid: &str, days: u32) -> Result<String, GeneratorError> {
        let table = self.table(FeedType::TrendSeries)?;
        let window_end = self.today.resolve();
        let window_start = window_end
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or_else(|| {
                GeneratorError::render(
                    FeedType::TrendSeries,
                    format!("{days}-day window before {window_end} is out of range"),
                )
            })?;

        let sql = templates::render_trend_series(
            &table,
            &self.config.warehouse.timestamp_column,
            subid,
            &window_start.format("%Y-%m-%d").to_string(),
            &window_end.format("%Y-%m-%d").to_string(),
        );
        debug!(%window_start, %window_end, "Rendered trend series query");
        Ok(sql)
    }
}
