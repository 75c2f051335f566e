// ============================================
// TIMING - refresh tick measurement
// ============================================
// Usage:
//   let timer = Timer::start_with_threshold("refresh tick", 500);
//   ... work ...
//   let elapsed = timer.stop();   // warns when over the threshold
//   ticks.record(elapsed);
//   ticks.summary()               // count / avg / min / max
// ============================================

use colored::Colorize;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Wall-clock timer for one named operation
pub struct Timer {
    name: String,
    start: Instant,
    threshold_ms: u128,
}

impl Timer {
    /// Only warns when the operation takes at least `threshold_ms`
    pub fn start_with_threshold(name: impl Into<String>, threshold_ms: u128) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            threshold_ms,
        }
    }

    /// Stop the timer and log the result
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        let ms = duration.as_millis();

        if self.threshold_ms > 0 && ms >= self.threshold_ms {
            warn!(operation = %self.name, elapsed_ms = ms as u64, "slow operation");
        } else {
            debug!(operation = %self.name, elapsed_ms = ms as u64, "operation finished");
        }
        duration
    }
}

// ============================================
// AGGREGATE TIMING
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSummary {
    pub name: String,
    pub count: usize,
    pub total: Duration,
    pub avg: Duration,
    pub min: Duration,
    pub max: Duration,
}

/// Running statistics over repeated operations
pub struct AggregateTimer {
    name: String,
    count: usize,
    total_duration: Duration,
    min_duration: Option<Duration>,
    max_duration: Option<Duration>,
}

impl AggregateTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            total_duration: Duration::ZERO,
            min_duration: None,
            max_duration: None,
        }
    }

    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.min_duration = Some(self.min_duration.map_or(duration, |min| min.min(duration)));
        self.max_duration = Some(self.max_duration.map_or(duration, |max| max.max(duration)));
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn avg_duration(&self) -> Option<Duration> {
        if self.count == 0 {
            None
        } else {
            Some(self.total_duration / self.count as u32)
        }
    }

    /// `None` until something has been recorded
    pub fn summary(&self) -> Option<TimingSummary> {
        Some(TimingSummary {
            name: self.name.clone(),
            count: self.count,
            total: self.total_duration,
            avg: self.avg_duration()?,
            min: self.min_duration?,
            max: self.max_duration?,
        })
    }

    /// Print the summary block to stdout
    pub fn print_summary(&self) {
        let Some(summary) = self.summary() else {
            println!("📊 {} - No operations recorded", self.name.cyan());
            return;
        };

        println!("\n{}", "=".repeat(60).blue());
        println!("📊 {} - Summary", summary.name.cyan().bold());
        println!("{}", "=".repeat(60).blue());
        println!("  • Count: {}", summary.count);
        println!("  • Total: {:.2}s", summary.total.as_secs_f64());
        println!("  • Average: {}ms", summary.avg.as_millis());
        println!("  • Min: {}ms", summary.min.as_millis());
        println!("  • Max: {}ms", summary.max.as_millis());
        println!("{}", "=".repeat(60).blue());
    }
}
