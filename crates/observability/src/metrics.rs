//! 分发指标模块
//!
//! 记录每次 feed 请求的结果与耗时，并提供进程内聚合 (用于 CLI 批处理摘要)。

use std::collections::BTreeMap;
use std::fmt;

use metrics::{counter, histogram};

/// 记录一次分发结果
///
/// `feed` 为解析后的 feed 名称 (payload 无法解析时为 `"unknown"`)。
pub fn record_dispatch(feed: &str, status: u16) {
    counter!(
        "feedsql_requests_total",
        "feed" => feed.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if status >= 500 {
        counter!("feedsql_internal_errors_total", "feed" => feed.to_string()).increment(1);
    }
}

/// 记录一次分发耗时 (毫秒)
pub fn record_dispatch_latency_ms(feed: &str, latency_ms: f64) {
    histogram!("feedsql_dispatch_latency_ms", "feed" => feed.to_string()).record(latency_ms);
}

/// 分发结果聚合器
///
/// 在内存中聚合，便于输出摘要。请求之间不共享；由调用方持有。
#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    /// status -> count
    pub by_status: BTreeMap<u16, u64>,
    /// feed -> count
    pub by_feed: BTreeMap<String, u64>,
    latency_ms: RunningStats,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 聚合一次结果
    pub fn record(&mut self, feed: &str, status: u16, latency_ms: f64) {
        *self.by_status.entry(status).or_default() += 1;
        *self.by_feed.entry(feed.to_string()).or_default() += 1;
        self.latency_ms.push(latency_ms);
    }

    pub fn total(&self) -> u64 {
        self.latency_ms.count()
    }

    /// 非 2xx 结果数量
    pub fn failures(&self) -> u64 {
        self.by_status
            .iter()
            .filter(|(status, _)| !(200..300).contains(*status))
            .map(|(_, count)| count)
            .sum()
    }

    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            total: self.total(),
            failures: self.failures(),
            by_status: self.by_status.clone(),
            by_feed: self.by_feed.clone(),
            latency_ms: StatsSummary::from(&self.latency_ms),
        }
    }
}

/// 聚合摘要
#[derive(Debug, Clone)]
pub struct DispatchSummary {
    pub total: u64,
    pub failures: u64,
    pub by_status: BTreeMap<u16, u64>,
    pub by_feed: BTreeMap<String, u64>,
    pub latency_ms: StatsSummary,
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Requests: {} ({} failed)", self.total, self.failures)?;
        for (status, count) in &self.by_status {
            writeln!(f, "  status {status}: {count}")?;
        }
        for (feed, count) in &self.by_feed {
            writeln!(f, "  feed {feed}: {count}")?;
        }
        write!(f, "Latency (ms): {}", self.latency_ms)
    }
}

/// 统计摘要
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
