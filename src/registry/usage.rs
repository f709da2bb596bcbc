//! Running usage statistics for registered tools and agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the running success rate is maintained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsStrategy {
    /// Reconstruct the previous success count from the stored rate as
    /// `round(rate * (n - 1))`. Rounding error can accumulate over many
    /// executions.
    #[default]
    Approximate,
    /// Keep an exact success counter alongside the rate.
    Exact,
}

impl std::str::FromStr for StatsStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approximate" => Ok(StatsStrategy::Approximate),
            "exact" => Ok(StatsStrategy::Exact),
            _ => Err(format!("Invalid stats strategy: {}", s)),
        }
    }
}

/// Mutable usage metadata of a tool or agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    /// Number of recorded executions.
    pub usage_count: u64,
    /// Running mean of execution times in milliseconds.
    pub average_execution_time_ms: f64,
    /// Running success rate in `[0, 1]`.
    pub success_rate: f64,
    /// Exact number of successes. Only consulted by [`StatsStrategy::Exact`].
    pub success_count: u64,
    /// When the entry was last executed.
    pub last_used: Option<DateTime<Utc>>,
}

impl UsageStats {
    /// Record one execution.
    pub fn record(&mut self, execution_time_ms: f64, success: bool, strategy: StatsStrategy) {
        self.usage_count += 1;
        let n = self.usage_count as f64;

        self.average_execution_time_ms =
            (self.average_execution_time_ms * (n - 1.0) + execution_time_ms) / n;

        let successes_before = match strategy {
            StatsStrategy::Approximate => (self.success_rate * (n - 1.0)).round(),
            StatsStrategy::Exact => self.success_count as f64,
        };
        let current = if success { 1.0 } else { 0.0 };
        self.success_rate = (successes_before + current) / n;

        if success {
            self.success_count += 1;
        }
        self.last_used = Some(Utc::now());
    }

    /// Successful executions derived from the rate, as reported in statistics.
    pub fn derived_successes(&self) -> u64 {
        (self.success_rate * self.usage_count as f64).round() as u64
    }

    /// Failed executions derived from the rate.
    pub fn derived_failures(&self) -> u64 {
        self.usage_count.saturating_sub(self.derived_successes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_average_is_arithmetic_mean() {
        let mut stats = UsageStats::default();
        for sample in [10.0, 20.0, 60.0] {
            stats.record(sample, true, StatsStrategy::Approximate);
        }

        assert_eq!(stats.usage_count, 3);
        assert!((stats.average_execution_time_ms - 30.0).abs() < 1e-9);
        assert!(stats.last_used.is_some());
    }

    #[test]
    fn test_success_rate_matches_ratio() {
        let mut stats = UsageStats::default();
        let outcomes = [true, false, true, true, false];
        for ok in outcomes {
            stats.record(1.0, ok, StatsStrategy::Approximate);
        }

        assert!((stats.success_rate - 3.0 / 5.0).abs() < 1e-9);
        assert_eq!(stats.derived_successes(), 3);
        assert_eq!(stats.derived_failures(), 2);
    }

    #[test]
    fn test_exact_strategy_counts() {
        let mut stats = UsageStats::default();
        for i in 0..1000 {
            stats.record(1.0, i % 3 == 0, StatsStrategy::Exact);
        }

        assert_eq!(stats.success_count, 334);
        assert!((stats.success_rate - 334.0 / 1000.0).abs() < 1e-12);
    }

    #[test]
    fn test_first_failure_gives_zero_rate() {
        let mut stats = UsageStats::default();
        stats.record(5.0, false, StatsStrategy::Approximate);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.derived_failures(), 1);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("Exact".parse::<StatsStrategy>().unwrap(), StatsStrategy::Exact);
        assert!("bogus".parse::<StatsStrategy>().is_err());
    }
}
