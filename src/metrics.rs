// ==========================================
// HTM Vault - 指标旁路
// ==========================================
// 职责: 定义指标接收端 trait，由调用方随每次操作传入
// 说明: 核心层不持有任何全局指标状态
// ==========================================

use std::sync::Mutex;

/// 指标名: `{操作}.{结果}.Count`
pub fn count_metric_name(operation: &str, outcome: &str) -> String {
    format!("{}.{}.Count", operation, outcome)
}

/// 成功结果的固定名称
pub const OUTCOME_SUCCESS: &str = "Success";

// ==========================================
// MetricsSink - 指标接收端
// ==========================================
pub trait MetricsSink: Send + Sync {
    /// 累加计数
    fn add_count(&self, name: &str, value: f64);

    /// 记录耗时（毫秒），默认忽略
    fn add_time(&self, name: &str, millis: f64) {
        let _ = (name, millis);
    }
}

/// 空操作接收端
#[derive(Debug, Clone, Default)]
pub struct NoOpMetricsSink;

impl MetricsSink for NoOpMetricsSink {
    fn add_count(&self, name: &str, value: f64) {
        tracing::trace!(name, value, "NoOpMetricsSink: 跳过计数");
    }
}

// ==========================================
// RecordingMetricsSink - 内存记录（测试与诊断用）
// ==========================================
#[derive(Debug, Default)]
pub struct RecordingMetricsSink {
    counts: Mutex<Vec<(String, f64)>>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部已记录的计数（按记录顺序）
    pub fn counts(&self) -> Vec<(String, f64)> {
        self.counts
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// 某个指标的累计值
    pub fn total(&self, name: &str) -> f64 {
        self.counts()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .sum()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn add_count(&self, name: &str, value: f64) {
        let mut guard = match self.counts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((name.to_string(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_metric_name_format() {
        assert_eq!(
            count_metric_name("AddDevice", "InvalidAttribute"),
            "AddDevice.InvalidAttribute.Count"
        );
    }

    #[test]
    fn test_recording_sink_totals_by_name() {
        let sink = RecordingMetricsSink::new();
        sink.add_count("A.Success.Count", 1.0);
        sink.add_count("A.Success.Count", 1.0);
        sink.add_count("B.Success.Count", 1.0);
        assert_eq!(sink.total("A.Success.Count"), 2.0);
        assert_eq!(sink.total("missing"), 0.0);
        assert_eq!(sink.counts().len(), 3);
    }
}
