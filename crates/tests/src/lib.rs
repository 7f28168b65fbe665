//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试（请求/响应 JSON 形状）
//! - 端到端测试：配置文件 → Dispatcher → 真实 SQL 生成器
//! - 并发与幂等性

#[cfg(test)]
mod contract_tests {
    use contracts::{DispatchError, DispatchReply, FeedRequest, FeedType};
    use serde_json::json;

    #[test]
    fn test_reply_wire_shapes() {
        let ok = DispatchReply::success("SELECT 1".to_string());
        assert_eq!(ok.to_json().unwrap(), r#"{"sql":"SELECT 1"}"#);

        let bad = DispatchReply::failure(&DispatchError::validation(FeedType::FeedC));
        assert_eq!(
            bad.to_json().unwrap(),
            r#"{"error":"Start date and end date are required for feed_c"}"#
        );
        assert_eq!(bad.status.as_u16(), 400);

        let internal = DispatchReply::failure(&DispatchError::internal("disk on fire"));
        assert_eq!(
            internal.to_json().unwrap(),
            r#"{"error":"Failed to generate SQL"}"#
        );
        assert_eq!(internal.status.as_u16(), 500);
    }

    #[test]
    fn test_request_snapshot() {
        let request = FeedRequest::from_value(&json!({
            "startDate": "2024-01-01",
            "endDate": "2024-01-31",
            "feedType": "feed_a",
            "subid": "abc",
            "days": "30"
        }))
        .unwrap();
        assert_eq!(request.feed(), FeedType::FeedA);
        assert_eq!(request.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(request.subid.as_deref(), Some("abc"));
        assert_eq!(request.days, Some(30));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{GeneratorError, ReplyStatus, SqlGenerator, WarehouseConfig};
    use dispatcher::{DispatcherBuilder, FeedDispatcher};
    use generators::WarehouseSqlGenerator;
    use serde_json::json;

    const CONFIG: &str = r#"
version = "V1"

[warehouse]
project = "acme-prod"
dataset = "marts"
timestamp_column = "created_at"

[tables]
legacy = "events"
feed_b = "partner_b"
trend_series = "subid_rollup"

[dispatcher]
max_body_bytes = 4096
"#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn config() -> WarehouseConfig {
        ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap()
    }

    fn dispatcher() -> FeedDispatcher<WarehouseSqlGenerator> {
        DispatcherBuilder::new(config())
            .with_today(today())
            .build()
            .unwrap()
    }

    /// Records every call so tests can assert which collaborator ran
    #[derive(Default)]
    struct Spy {
        calls: Mutex<Vec<String>>,
    }

    impl Spy {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: String) -> Result<String, GeneratorError> {
            self.calls.lock().unwrap().push(call.clone());
            Ok(format!("-- {call}"))
        }
    }

    impl SqlGenerator for Spy {
        fn legacy_sql(&self, start: &str, end: &str) -> Result<String, GeneratorError> {
            self.log(format!("legacy {start} {end}"))
        }
        fn feed_a_sql(&self, start: &str, end: &str) -> Result<String, GeneratorError> {
            self.log(format!("feed_a {start} {end}"))
        }
        fn feed_b_sql(&self, start: &str, end: &str) -> Result<String, GeneratorError> {
            self.log(format!("feed_b {start} {end}"))
        }
        fn feed_c_sql(&self, start: &str, end: &str) -> Result<String, GeneratorError> {
            self.log(format!("feed_c {start} {end}"))
        }
        fn trend_series_sql(&self, subid: &str, days: u32) -> Result<String, GeneratorError> {
            self.log(format!("trend_series {subid} {days}"))
        }
    }

    fn spy_dispatcher() -> (Arc<Spy>, FeedDispatcher<Arc<Spy>>) {
        let spy = Arc::new(Spy::default());
        (spy.clone(), FeedDispatcher::new(spy))
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedsql.toml");
        std::fs::write(&path, CONFIG).unwrap();

        let loaded = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(loaded.warehouse.project, "acme-prod");
        assert_eq!(loaded.tables.feed_b, "partner_b");
        // Unlisted tables keep their defaults
        assert_eq!(loaded.tables.feed_a, "feed_a_events");
        assert_eq!(loaded.dispatcher.max_body_bytes, 4096);

        let json_path = dir.path().join("feedsql.json");
        std::fs::write(&json_path, ConfigLoader::to_json(&loaded).unwrap()).unwrap();
        let reloaded = ConfigLoader::load_from_path(&json_path).unwrap();
        assert_eq!(
            reloaded.table_ref(contracts::FeedType::TrendSeries),
            "`acme-prod.marts.subid_rollup`"
        );
    }

    #[test]
    fn test_unknown_feed_types_fall_back_to_legacy() {
        let (spy, dispatcher) = spy_dispatcher();
        let payloads = [
            json!({"startDate": "2024-01-01", "endDate": "2024-01-31"}),
            json!({"startDate": "2024-01-01", "endDate": "2024-01-31", "feedType": null}),
            json!({"startDate": "2024-01-01", "endDate": "2024-01-31", "feedType": "feed_z"}),
            json!({"startDate": "2024-01-01", "endDate": "2024-01-31", "feedType": "FEED_A"}),
        ];
        for payload in &payloads {
            let reply = dispatcher.handle_value(payload);
            assert_eq!(reply.status, ReplyStatus::Ok);
            assert_eq!(reply.body.sql(), Some("-- legacy 2024-01-01 2024-01-31"));
        }
        assert_eq!(spy.calls().len(), payloads.len());
    }

    #[test]
    fn test_range_feeds_require_both_dates() {
        let (spy, dispatcher) = spy_dispatcher();
        for feed in ["feed_a", "feed_b", "feed_c"] {
            for payload in [
                json!({"feedType": feed}),
                json!({"feedType": feed, "startDate": "2024-01-01"}),
                json!({"feedType": feed, "endDate": "2024-01-31"}),
                json!({"feedType": feed, "startDate": "", "endDate": "2024-01-31"}),
            ] {
                let reply = dispatcher.handle_value(&payload);
                assert_eq!(reply.status, ReplyStatus::BadRequest);
                assert_eq!(
                    reply.body.error(),
                    Some(format!("Start date and end date are required for {feed}").as_str())
                );
            }
        }
        assert!(spy.calls().is_empty());
    }

    #[test]
    fn test_trend_series_requires_subid() {
        let (spy, dispatcher) = spy_dispatcher();
        let reply = dispatcher.handle_value(&json!({"feedType": "trend_series"}));
        assert_eq!(reply.status, ReplyStatus::BadRequest);
        assert_eq!(reply.body.error(), Some("subid is required for trend_series"));
        assert!(spy.calls().is_empty());
    }

    #[test]
    fn test_trend_series_days_resolution() {
        let (spy, dispatcher) = spy_dispatcher();
        let cases = [
            (json!({"feedType": "trend_series", "subid": "abc123"}), 180),
            (json!({"feedType": "trend_series", "subid": "abc123", "days": 30}), 30),
            (json!({"feedType": "trend_series", "subid": "abc123", "days": "45"}), 45),
            (json!({"feedType": "trend_series", "subid": "abc123", "days": 0}), 180),
            (json!({"feedType": "trend_series", "subid": "abc123", "days": -5}), 180),
            (json!({"feedType": "trend_series", "subid": "abc123", "days": "soon"}), 180),
        ];
        for (payload, days) in &cases {
            let reply = dispatcher.handle_value(payload);
            assert_eq!(reply.status, ReplyStatus::Ok, "{payload}");
            assert_eq!(
                spy.calls().last().map(String::as_str),
                Some(format!("trend_series abc123 {days}").as_str())
            );
        }
    }

    #[test]
    fn test_malformed_payload_is_internal_error() {
        let dispatcher = dispatcher();
        for body in [&b"{ not json"[..], b"", b"[1, 2]", br#"{"feedType": "feed_b""#] {
            let reply = dispatcher.handle_body(body);
            assert_eq!(reply.status, ReplyStatus::InternalServerError);
            assert_eq!(reply.body.error(), Some("Failed to generate SQL"));
        }
    }

    #[test]
    fn test_feed_b_end_to_end() {
        let reply = dispatcher().handle_body(
            br#"{"feedType":"feed_b","startDate":"2024-02-01","endDate":"2024-02-29"}"#,
        );
        assert_eq!(reply.status, ReplyStatus::Ok);
        let sql = reply.body.sql().unwrap();
        assert!(sql.contains("FROM `acme-prod.marts.partner_b`"));
        assert!(sql.contains("DATE(created_at) BETWEEN '2024-02-01' AND '2024-02-29'"));
    }

    #[test]
    fn test_trend_series_end_to_end() {
        let reply =
            dispatcher().handle_body(br#"{"feedType":"trend_series","subid":"abc123","days":30}"#);
        assert_eq!(reply.status, ReplyStatus::Ok);
        let sql = reply.body.sql().unwrap();
        assert!(sql.contains("FROM `acme-prod.marts.subid_rollup`"));
        assert!(sql.contains("WHERE subid = 'abc123'"));
        assert!(sql.contains("BETWEEN '2024-05-31' AND '2024-06-30'"));
    }

    #[test]
    fn test_subid_is_escaped() {
        let reply = dispatcher()
            .handle_body(br#"{"feedType":"trend_series","subid":"x' OR '1'='1"}"#);
        let sql = reply.body.sql().unwrap();
        assert!(sql.contains(r"WHERE subid = 'x\' OR \'1\'=\'1'"));
    }

    #[test]
    fn test_idempotent_replies() {
        let dispatcher = dispatcher();
        let body = br#"{"feedType":"feed_c","startDate":"2024-03-01","endDate":"2024-03-31"}"#;
        let first = dispatcher.handle_body(body);
        let second = dispatcher.handle_body(body);
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[tokio::test]
    async fn test_reader_respects_configured_limit() {
        let dispatcher = dispatcher();

        let ok = dispatcher
            .handle_reader(&br#"{"startDate":"2024-01-01","endDate":"2024-01-31"}"#[..])
            .await;
        assert_eq!(ok.status, ReplyStatus::Ok);

        let oversized = format!(r#"{{"subid":"{}"}}"#, "a".repeat(8192));
        let reply = dispatcher.handle_reader(oversized.as_bytes()).await;
        assert_eq!(reply.status, ReplyStatus::InternalServerError);
        assert_eq!(reply.body.error(), Some("Failed to generate SQL"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_dispatcher() {
        let dispatcher = Arc::new(dispatcher());
        let mut handles = Vec::new();
        for i in 0..16 {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                let body = format!(r#"{{"feedType":"trend_series","subid":"s{i}"}}"#);
                dispatcher.handle_reader(body.as_bytes()).await
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            let reply = handle.await.unwrap();
            assert_eq!(reply.status, ReplyStatus::Ok);
            assert!(reply.body.sql().unwrap().contains(&format!("'s{i}'")));
        }
    }

    #[test]
    fn test_batch_stats() {
        let dispatcher = dispatcher();
        let mut stats = observability::DispatchStats::new();
        let batch: [(&str, &[u8]); 3] = [
            ("legacy", br#"{"startDate":"2024-01-01","endDate":"2024-01-31"}"#),
            ("feed_a", br#"{"feedType":"feed_a"}"#),
            ("unknown", b"garbage"),
        ];
        for (feed, body) in batch {
            let reply = dispatcher.handle_body(body);
            stats.record(feed, reply.status.as_u16(), 1.0);
        }

        let summary = stats.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.failures, 2);
        assert_eq!(summary.by_status.get(&400), Some(&1));
        assert_eq!(summary.by_status.get(&500), Some(&1));
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let mut config = WarehouseConfig::default();
        config.tables.feed_c = "bad table".to_string();
        assert!(DispatcherBuilder::new(config).build().is_err());
    }
}
