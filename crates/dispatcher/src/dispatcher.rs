//! FeedDispatcher - request validation and generator dispatch

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use chrono::NaiveDate;
use serde_json::Value;
use tokio::io::AsyncRead;
use tracing::{debug, error, instrument, warn};

use config_loader::ConfigLoader;
use contracts::{
    DispatchError, DispatchReply, DispatcherSettings, FeedQuery, FeedRequest, FeedType,
    PayloadError, SqlGenerator, WarehouseConfig,
};
use generators::WarehouseSqlGenerator;

use crate::body::read_body;
use crate::error::DispatcherError;
use crate::validate::validate;

/// Builder for a dispatcher bound to [`WarehouseSqlGenerator`]
pub struct DispatcherBuilder {
    config: WarehouseConfig,
    today: Option<NaiveDate>,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(config: WarehouseConfig) -> Self {
        Self {
            config,
            today: None,
        }
    }

    /// Pin the trend window end date (reproducible output)
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Validate the configuration and build the dispatcher
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub fn build(self) -> Result<FeedDispatcher<WarehouseSqlGenerator>, DispatcherError> {
        ConfigLoader::validate(&self.config)?;

        let settings = self.config.dispatcher.clone();
        let mut generator = WarehouseSqlGenerator::new(self.config);
        if let Some(today) = self.today {
            generator = generator.with_today(today);
        }
        Ok(FeedDispatcher::with_settings(generator, settings))
    }
}

/// Convenience function to create a dispatcher from configuration
pub fn create_dispatcher(
    config: &WarehouseConfig,
) -> Result<FeedDispatcher<WarehouseSqlGenerator>, DispatcherError> {
    DispatcherBuilder::new(config.clone()).build()
}

/// Maps feed requests to generated SQL.
///
/// Stateless between requests: the only fields are the generator and
/// immutable settings, so one instance can serve concurrent requests.
#[derive(Debug)]
pub struct FeedDispatcher<G> {
    generator: G,
    settings: DispatcherSettings,
}

impl<G: SqlGenerator> FeedDispatcher<G> {
    /// Create a dispatcher with default settings
    pub fn new(generator: G) -> Self {
        Self::with_settings(generator, DispatcherSettings::default())
    }

    pub fn with_settings(generator: G, settings: DispatcherSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Validate `request` and generate its SQL.
    ///
    /// Validation failures short-circuit before the generator is called.
    pub fn dispatch(&self, request: &FeedRequest) -> Result<String, DispatchError> {
        let query = validate(request)?;
        self.generate(&query)
    }

    /// Invoke the generator bound to the query's feed
    pub fn generate(&self, query: &FeedQuery) -> Result<String, DispatchError> {
        let sql = match query {
            FeedQuery::Legacy(range) => self.generator.legacy_sql(&range.start, &range.end),
            FeedQuery::FeedA(range) => self.generator.feed_a_sql(&range.start, &range.end),
            FeedQuery::FeedB(range) => self.generator.feed_b_sql(&range.start, &range.end),
            FeedQuery::FeedC(range) => self.generator.feed_c_sql(&range.start, &range.end),
            FeedQuery::TrendSeries { subid, days } => {
                self.generator.trend_series_sql(subid, *days)
            }
        }?;
        Ok(sql)
    }

    /// Handle an already-decoded request
    pub fn handle_request(&self, request: &FeedRequest) -> DispatchReply {
        self.guarded(|feed| {
            *feed = Some(request.feed());
            self.dispatch(request)
        })
    }

    /// Handle a JSON document
    pub fn handle_value(&self, value: &Value) -> DispatchReply {
        self.guarded(|feed| {
            let request = FeedRequest::from_value(value)?;
            *feed = Some(request.feed());
            self.dispatch(&request)
        })
    }

    /// Handle a raw request body (bounded by `max_body_bytes`)
    #[instrument(name = "dispatcher_handle_body", skip_all, fields(bytes = body.len()))]
    pub fn handle_body(&self, body: &[u8]) -> DispatchReply {
        let limit = self.settings.max_body_bytes;
        self.guarded(|feed| {
            if body.len() > limit {
                return Err(PayloadError::TooLarge { limit }.into());
            }
            let request = FeedRequest::from_slice(body)?;
            *feed = Some(request.feed());
            self.dispatch(&request)
        })
    }

    /// Read a body from `reader` (bounded by `max_body_bytes`) and handle it
    #[instrument(name = "dispatcher_handle_reader", skip_all)]
    pub async fn handle_reader<R>(&self, reader: R) -> DispatchReply
    where
        R: AsyncRead + Unpin,
    {
        match read_body(reader, self.settings.max_body_bytes).await {
            Ok(body) => self.handle_body(&body),
            Err(e) => self.guarded(|_| Err(e.into())),
        }
    }

    /// Single error boundary around parsing and generation.
    ///
    /// Panics are contained and reported like any other internal failure.
    fn guarded<F>(&self, f: F) -> DispatchReply
    where
        F: FnOnce(&mut Option<FeedType>) -> Result<String, DispatchError>,
    {
        let started = Instant::now();
        let mut feed = None;
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(&mut feed)))
            .unwrap_or_else(|payload| Err(DispatchError::internal(panic_reason(&*payload))));

        let label = feed.map_or("unknown", |f| f.as_str());
        match &result {
            Ok(sql) => debug!(feed = label, bytes = sql.len(), "SQL generated"),
            Err(DispatchError::Validation { message, .. }) => {
                warn!(feed = label, error = %message, "Request rejected")
            }
            Err(DispatchError::Internal { reason }) => {
                error!(feed = label, reason = %reason, "SQL generation failed")
            }
        }

        let reply = DispatchReply::from(result).with_feed(feed);
        observability::record_dispatch(label, reply.status.as_u16());
        observability::record_dispatch_latency_ms(label, started.elapsed().as_secs_f64() * 1000.0);
        reply
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    format!("generator panicked: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GeneratorError, ReplyStatus};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Legacy(String, String),
        FeedA(String, String),
        FeedB(String, String),
        FeedC(String, String),
        TrendSeries(String, u32),
    }

    /// Records every call and echoes it back as the "SQL"
    #[derive(Default)]
    struct RecordingGenerator {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingGenerator {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> Result<String, GeneratorError> {
            let sql = format!("{call:?}");
            self.calls.lock().unwrap().push(call);
            Ok(sql)
        }
    }

    impl SqlGenerator for RecordingGenerator {
        fn legacy_sql(&self, s: &str, e: &str) -> Result<String, GeneratorError> {
            self.record(Call::Legacy(s.into(), e.into()))
        }
        fn feed_a_sql(&self, s: &str, e: &str) -> Result<String, GeneratorError> {
            self.record(Call::FeedA(s.into(), e.into()))
        }
        fn feed_b_sql(&self, s: &str, e: &str) -> Result<String, GeneratorError> {
            self.record(Call::FeedB(s.into(), e.into()))
        }
        fn feed_c_sql(&self, s: &str, e: &str) -> Result<String, GeneratorError> {
            self.record(Call::FeedC(s.into(), e.into()))
        }
        fn trend_series_sql(&self, subid: &str, days: u32) -> Result<String, GeneratorError> {
            self.record(Call::TrendSeries(subid.into(), days))
        }
    }

    /// Fails (or panics) on every call
    struct BrokenGenerator {
        panic: bool,
    }

    impl BrokenGenerator {
        fn fail(&self, feed: FeedType) -> Result<String, GeneratorError> {
            if self.panic {
                panic!("template state corrupted");
            }
            Err(GeneratorError::template(feed, "secret internal detail"))
        }
    }

    impl SqlGenerator for BrokenGenerator {
        fn legacy_sql(&self, _: &str, _: &str) -> Result<String, GeneratorError> {
            self.fail(FeedType::Legacy)
        }
        fn feed_a_sql(&self, _: &str, _: &str) -> Result<String, GeneratorError> {
            self.fail(FeedType::FeedA)
        }
        fn feed_b_sql(&self, _: &str, _: &str) -> Result<String, GeneratorError> {
            self.fail(FeedType::FeedB)
        }
        fn feed_c_sql(&self, _: &str, _: &str) -> Result<String, GeneratorError> {
            self.fail(FeedType::FeedC)
        }
        fn trend_series_sql(&self, _: &str, _: u32) -> Result<String, GeneratorError> {
            self.fail(FeedType::TrendSeries)
        }
    }

    fn recording() -> FeedDispatcher<RecordingGenerator> {
        FeedDispatcher::new(RecordingGenerator::default())
    }

    #[test]
    fn test_legacy_when_feed_type_absent() {
        let dispatcher = recording();
        let reply = dispatcher.handle_value(&json!({
            "startDate": "2024-01-01",
            "endDate": "2024-01-31"
        }));

        assert_eq!(reply.status, ReplyStatus::Ok);
        assert_eq!(
            dispatcher.generator().calls(),
            vec![Call::Legacy("2024-01-01".into(), "2024-01-31".into())]
        );
    }

    #[test]
    fn test_legacy_for_null_and_unknown_feed_type() {
        for feed_type in [json!(null), json!("legacy"), json!("nope"), json!(3)] {
            let dispatcher = recording();
            let reply = dispatcher.handle_value(&json!({
                "feedType": feed_type,
                "startDate": "2024-01-01",
                "endDate": "2024-01-31"
            }));
            assert_eq!(reply.status, ReplyStatus::Ok);
            assert!(matches!(
                dispatcher.generator().calls().as_slice(),
                [Call::Legacy(..)]
            ));
        }
    }

    #[test]
    fn test_truthy_non_string_dates_reach_legacy() {
        let dispatcher = recording();
        let reply = dispatcher.handle_value(&json!({
            "startDate": true,
            "endDate": ["x"]
        }));

        assert_eq!(reply.status, ReplyStatus::Ok);
        assert_eq!(
            dispatcher.generator().calls(),
            vec![Call::Legacy("true".into(), r#"["x"]"#.into())]
        );
    }

    #[test]
    fn test_missing_dates_never_invoke_generator() {
        for feed in ["feed_a", "feed_b", "feed_c"] {
            let dispatcher = recording();
            let reply = dispatcher.handle_value(&json!({
                "feedType": feed,
                "endDate": "2024-01-31"
            }));

            assert_eq!(reply.status.as_u16(), 400);
            assert_eq!(
                reply.body.error(),
                Some(format!("Start date and end date are required for {feed}").as_str())
            );
            assert!(dispatcher.generator().calls().is_empty());
        }
    }

    #[test]
    fn test_legacy_missing_dates_message() {
        let dispatcher = recording();
        let reply = dispatcher.handle_value(&json!({}));
        assert_eq!(reply.status.as_u16(), 400);
        assert_eq!(
            reply.body.error(),
            Some("Start date and end date are required")
        );
    }

    #[test]
    fn test_trend_series_requires_subid() {
        let dispatcher = recording();
        let reply = dispatcher.handle_value(&json!({ "feedType": "trend_series" }));
        assert_eq!(reply.status.as_u16(), 400);
        assert_eq!(
            reply.body.error(),
            Some("subid is required for trend_series")
        );
        assert!(dispatcher.generator().calls().is_empty());
    }

    #[test]
    fn test_trend_series_default_and_explicit_days() {
        let dispatcher = recording();
        dispatcher.handle_value(&json!({ "feedType": "trend_series", "subid": "abc123" }));
        dispatcher.handle_value(&json!({
            "feedType": "trend_series",
            "subid": "abc123",
            "days": 30
        }));
        dispatcher.handle_value(&json!({
            "feedType": "trend_series",
            "subid": "abc123",
            "days": -4
        }));

        assert_eq!(
            dispatcher.generator().calls(),
            vec![
                Call::TrendSeries("abc123".into(), 180),
                Call::TrendSeries("abc123".into(), 30),
                Call::TrendSeries("abc123".into(), 180),
            ]
        );
    }

    #[test]
    fn test_feed_b_success_wraps_generator_output() {
        let dispatcher = recording();
        let reply = dispatcher.handle_value(&json!({
            "feedType": "feed_b",
            "startDate": "2024-02-01",
            "endDate": "2024-02-29"
        }));

        assert_eq!(reply.status.as_u16(), 200);
        let expected = format!(
            "{:?}",
            Call::FeedB("2024-02-01".into(), "2024-02-29".into())
        );
        assert_eq!(reply.body.sql(), Some(expected.as_str()));
        assert_eq!(reply.body.error(), None);
    }

    #[test]
    fn test_malformed_body_is_internal_error() {
        let dispatcher = recording();
        for body in [&b"{not json"[..], b"", b"[1,2]", b"null"] {
            let reply = dispatcher.handle_body(body);
            assert_eq!(reply.status.as_u16(), 500);
            assert_eq!(reply.body.error(), Some("Failed to generate SQL"));
        }
        assert!(dispatcher.generator().calls().is_empty());
    }

    #[test]
    fn test_generator_error_is_hidden() {
        let dispatcher = FeedDispatcher::new(BrokenGenerator { panic: false });
        let reply = dispatcher.handle_request(
            &FeedRequest::new()
                .with_feed_type("feed_c")
                .with_dates("2024-01-01", "2024-01-31"),
        );

        assert_eq!(reply.status, ReplyStatus::InternalServerError);
        let json = reply.to_json().unwrap();
        assert_eq!(json, r#"{"error":"Failed to generate SQL"}"#);
    }

    #[test]
    fn test_generator_panic_is_contained() {
        let dispatcher = FeedDispatcher::new(BrokenGenerator { panic: true });
        let reply = dispatcher.handle_request(&FeedRequest::new().with_dates("a", "b"));
        assert_eq!(reply.status.as_u16(), 500);
        assert_eq!(reply.body.error(), Some("Failed to generate SQL"));

        // Dispatcher stays usable afterwards
        let reply = dispatcher.handle_request(&FeedRequest::new());
        assert_eq!(reply.status.as_u16(), 400);
    }

    #[test]
    fn test_validation_precedes_generator_failure() {
        let dispatcher = FeedDispatcher::new(BrokenGenerator { panic: true });
        let reply = dispatcher.handle_request(&FeedRequest::new().with_feed_type("trend_series"));
        assert_eq!(reply.status.as_u16(), 400);
    }

    #[test]
    fn test_idempotent() {
        let dispatcher = recording();
        let body = br#"{"feedType":"feed_a","startDate":"2024-01-01","endDate":"2024-01-31"}"#;
        assert_eq!(dispatcher.handle_body(body), dispatcher.handle_body(body));
        assert_eq!(dispatcher.generator().calls().len(), 2);
    }

    #[test]
    fn test_dispatch_contract() {
        let dispatcher = recording();
        let err = dispatcher
            .dispatch(&FeedRequest::new().with_feed_type("feed_a"))
            .unwrap_err();
        assert_eq!(err.status().as_u16(), 400);

        let sql = dispatcher
            .dispatch(&FeedRequest::new().with_feed_type("trend_series").with_subid("x"))
            .unwrap();
        assert_eq!(sql, format!("{:?}", Call::TrendSeries("x".into(), 180)));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = WarehouseConfig::default();
        config.tables.feed_b = "bad table".into();
        assert!(matches!(
            create_dispatcher(&config),
            Err(DispatcherError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_builder_with_today() {
        let dispatcher = DispatcherBuilder::new(WarehouseConfig::default())
            .with_today(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
            .build()
            .unwrap();
        let reply = dispatcher.handle_value(&json!({
            "feedType": "trend_series",
            "subid": "abc123",
            "days": 30
        }));
        let sql = reply.body.sql().unwrap();
        assert!(sql.contains("BETWEEN '2024-05-31' AND '2024-06-30'"));
    }

    #[tokio::test]
    async fn test_handle_reader() {
        let dispatcher = recording();
        let body = br#"{"feedType":"feed_c","startDate":"2024-03-01","endDate":"2024-03-31"}"#;
        let reply = dispatcher.handle_reader(&body[..]).await;
        assert_eq!(reply.status.as_u16(), 200);
        assert_eq!(
            dispatcher.generator().calls(),
            vec![Call::FeedC("2024-03-01".into(), "2024-03-31".into())]
        );
    }

    #[tokio::test]
    async fn test_handle_reader_oversize_body() {
        let settings = DispatcherSettings { max_body_bytes: 64 };
        let dispatcher = FeedDispatcher::with_settings(RecordingGenerator::default(), settings);
        let body = format!(
            r#"{{"startDate":"2024-01-01","endDate":"2024-01-31","pad":"{}"}}"#,
            "x".repeat(128)
        );

        let reply = dispatcher.handle_reader(body.as_bytes()).await;
        assert_eq!(reply.status.as_u16(), 500);
        assert_eq!(reply.body.error(), Some("Failed to generate SQL"));
        assert!(dispatcher.generator().calls().is_empty());
    }

    #[test]
    fn test_handle_body_enforces_limit() {
        let settings = DispatcherSettings { max_body_bytes: 64 };
        let dispatcher = FeedDispatcher::with_settings(RecordingGenerator::default(), settings);
        let body = format!(
            r#"{{"startDate":"2024-01-01","endDate":"2024-01-31","pad":"{}"}}"#,
            "x".repeat(128)
        );

        let reply = dispatcher.handle_body(body.as_bytes());
        assert_eq!(reply.status.as_u16(), 500);
        assert_eq!(reply.feed, None);
        assert!(dispatcher.generator().calls().is_empty());

        let small = br#"{"startDate":"2024-01-01","endDate":"2024-01-31"}"#;
        assert!(small.len() <= 64);
        assert_eq!(dispatcher.handle_body(small).status.as_u16(), 200);
    }

    #[test]
    fn test_reply_carries_resolved_feed() {
        let dispatcher = recording();
        let reply = dispatcher.handle_body(br#"{"feedType":"feed_a"}"#);
        assert_eq!(reply.status.as_u16(), 400);
        assert_eq!(reply.feed, Some(FeedType::FeedA));
        assert_eq!(reply.feed_label(), "feed_a");

        let reply = dispatcher.handle_body(b"{ nope");
        assert_eq!(reply.feed, None);
        assert_eq!(reply.feed_label(), "unknown");
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_dispatcher() {
        let dispatcher = Arc::new(recording());
        let mut handles = Vec::new();
        for i in 0..16u32 {
            let dispatcher = Arc::clone(&dispatcher);
            handles.push(tokio::spawn(async move {
                let body = format!(
                    r#"{{"feedType":"trend_series","subid":"s{i}","days":{}}}"#,
                    i + 1
                );
                dispatcher.handle_reader(body.as_bytes()).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().status.as_u16(), 200);
        }
        assert_eq!(dispatcher.generator().calls().len(), 16);
    }
}
