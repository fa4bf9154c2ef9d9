use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for tick-loop events.
///
/// Keeps the session controller free of output concerns: the CLI reports
/// throughput and per-stage timing, tests stay silent.
pub trait SessionLogger: Send {
    /// A new session is starting; per-session totals start over.
    fn begin_session(&mut self) {}

    /// Report that tick `index` completed. Live sessions have no total.
    fn tick(&mut self, index: usize);

    /// Record how long a named stage took for one tick.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (detections, absence counter).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn tick(&mut self, _index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count/sum/max of one timing or metric. Constant size however
/// long the session runs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aggregate {
    pub count: usize,
    pub sum: f64,
    pub max: f64,
}

impl Aggregate {
    fn add(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Aggregates stage timings and metrics for the current session, logging a
/// heartbeat every `heartbeat_ticks` ticks and a per-stage table at the end.
pub struct StdoutSessionLogger {
    heartbeat_ticks: usize,
    timings: HashMap<String, Aggregate>,
    metrics: HashMap<String, Aggregate>,
    start_time: Instant,
    ticks: usize,
}

impl StdoutSessionLogger {
    pub fn new(heartbeat_ticks: usize) -> Self {
        Self {
            heartbeat_ticks: heartbeat_ticks.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            ticks: 0,
        }
    }

    /// Formatted report, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Session timing ({} ticks, {:.1}s):",
            self.ticks,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, agg) in stages {
            lines.push(format!(
                "  {stage:10}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                agg.mean(),
                agg.max,
                agg.sum
            ));
        }

        let mut metrics: Vec<_> = self.metrics.iter().collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));
        for (name, agg) in metrics {
            lines.push(format!("  {name}: avg {:.1}", agg.mean()));
        }

        if self.ticks > 0 && elapsed_ms > 0.0 {
            let rate = self.ticks as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Rate: {rate:.1} ticks/s"));
        }

        Some(lines.join("\n"))
    }

    #[cfg(test)]
    fn timing_for(&self, stage: &str) -> Option<Aggregate> {
        self.timings.get(stage).copied()
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn begin_session(&mut self) {
        self.timings.clear();
        self.metrics.clear();
        self.start_time = Instant::now();
        self.ticks = 0;
    }

    fn tick(&mut self, index: usize) {
        self.ticks += 1;
        if self.ticks % self.heartbeat_ticks == 0 {
            let secs = self.start_time.elapsed().as_secs_f64();
            log::info!("Monitoring: frame {index}, {} ticks in {secs:.0}s", self.ticks);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        record(&mut self.timings, stage, duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        record(&mut self.metrics, name, value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

fn record(map: &mut HashMap<String, Aggregate>, name: &str, value: f64) {
    match map.get_mut(name) {
        Some(agg) => agg.add(value),
        None => {
            let mut agg = Aggregate::default();
            agg.add(value);
            map.insert(name.to_string(), agg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_is_noop() {
        let mut logger = NullSessionLogger;
        logger.begin_session();
        logger.tick(1);
        logger.timing("detect", 5.0);
        logger.metric("detections", 1.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_aggregates_timings_per_stage() {
        let mut logger = StdoutSessionLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("record", 1.0);

        let detect = logger.timing_for("detect").unwrap();
        assert_eq!(detect.count, 2);
        assert_relative_eq!(detect.sum, 50.0);
        assert_relative_eq!(detect.max, 30.0);
        assert_relative_eq!(detect.mean(), 25.0);
        assert_eq!(logger.timing_for("record").unwrap().count, 1);
        assert!(logger.timing_for("capture").is_none());
    }

    #[test]
    fn test_max_tracks_negative_and_first_values() {
        let mut agg = Aggregate::default();
        agg.add(-3.0);
        assert_relative_eq!(agg.max, -3.0);
        agg.add(-1.0);
        assert_relative_eq!(agg.max, -1.0);
    }

    #[test]
    fn test_summary_lists_stages_metrics_and_rate() {
        let mut logger = StdoutSessionLogger::new(10);
        for i in 0..4 {
            logger.tick(i);
        }
        logger.timing("read", 4.0);
        logger.timing("detect", 12.0);
        logger.metric("absence_counter", 2.0);
        logger.metric("absence_counter", 5.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("4 ticks"));
        assert!(summary.contains("read"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("absence_counter: avg 3.5"));
        assert!(summary.contains("ticks/s"));
    }

    #[test]
    fn test_second_session_starts_from_zero() {
        let mut logger = StdoutSessionLogger::new(10);

        logger.begin_session();
        for i in 0..5 {
            logger.tick(i);
            logger.timing("detect", 100.0);
            logger.metric("detections", 1.0);
        }

        logger.begin_session();
        assert!(logger.summary_string().is_none());
        for i in 0..2 {
            logger.tick(i);
            logger.timing("detect", 10.0);
        }

        let detect = logger.timing_for("detect").unwrap();
        assert_eq!(detect.count, 2);
        assert_relative_eq!(detect.max, 10.0);
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("2 ticks"));
        assert!(!summary.contains("detections"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutSessionLogger::default().summary_string().is_none());
    }
}
