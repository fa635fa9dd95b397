//! Window aggregation for flow series.
//!
//! This crate partitions a chronologically ordered sample series into
//! fixed-width windows and reduces each window to a quality-gated average
//! suitable for reporting.

/// Contiguous fixed-duration windows over a sorted sample series.
pub mod window {
    use chrono::{NaiveDateTime, TimeDelta};
    use flowmon_core::sample::Sample;
    use serde::Serialize;

    /// The report granularities.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub enum Granularity {
        FifteenMinutes,
        Hour,
        Day,
    }

    impl Granularity {
        pub const ALL: [Granularity; 3] =
            [Granularity::FifteenMinutes, Granularity::Hour, Granularity::Day];

        pub fn minutes(&self) -> i64 {
            match self {
                Granularity::FifteenMinutes => 15,
                Granularity::Hour => 60,
                Granularity::Day => 1440,
            }
        }

        pub fn duration(&self) -> TimeDelta {
            TimeDelta::minutes(self.minutes())
        }

        /// Human-readable name, e.g. "15 Minute"
        pub fn label(&self) -> &'static str {
            match self {
                Granularity::FifteenMinutes => "15 Minute",
                Granularity::Hour => "1 Hour",
                Granularity::Day => "1 Day",
            }
        }

        /// Period name used in volume units, e.g. "USG/15 min"
        pub fn period(&self) -> &'static str {
            match self {
                Granularity::FifteenMinutes => "15 min",
                Granularity::Hour => "hour",
                Granularity::Day => "day",
            }
        }

        /// Stem of the report file for this granularity
        pub fn file_stem(&self) -> &'static str {
            match self {
                Granularity::FifteenMinutes => "15_minute",
                Granularity::Hour => "1_hour",
                Granularity::Day => "1_day",
            }
        }
    }

    /// The samples counted in one half-open interval `[start, end)`.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Window {
        pub start: NaiveDateTime,
        pub end: NaiveDateTime,
        pub valid_count: usize,
        pub invalid_count: usize,
        /// Sum of the flows of the valid samples
        pub flow_sum: f64,
    }

    impl Window {
        pub fn total_count(&self) -> usize {
            self.valid_count + self.invalid_count
        }
    }

    /// Iterator over the windows of a series, built by [`windows`].
    ///
    /// The first window starts at the first sample. Each following window
    /// starts where the previous one ended, so windows are emitted for gaps
    /// with no samples too. The last window is the one containing the last
    /// sample. Samples are consumed with a single forward cursor.
    #[derive(Debug, Clone)]
    pub struct Windows<'a> {
        samples: &'a [Sample],
        cursor: usize,
        start: NaiveDateTime,
        duration: TimeDelta,
        finished: bool,
    }

    /// Partition `samples` (sorted ascending by timestamp) into windows of
    /// `duration`. An empty series or a non-positive duration yields nothing.
    ///
    /// The iterator borrows the series; clone it or call this again to restart.
    pub fn windows(samples: &[Sample], duration: TimeDelta) -> Windows<'_> {
        match samples.first() {
            Some(first) if duration > TimeDelta::zero() => Windows {
                samples,
                cursor: 0,
                start: first.timestamp(),
                duration,
                finished: false,
            },
            _ => Windows {
                samples,
                cursor: 0,
                start: NaiveDateTime::MIN,
                duration,
                finished: true,
            },
        }
    }

    impl Iterator for Windows<'_> {
        type Item = Window;

        fn next(&mut self) -> Option<Self::Item> {
            if self.finished {
                return None;
            }
            let last = self.samples.last()?.timestamp();
            let start = self.start;
            let end = start + self.duration;

            let mut window = Window {
                start,
                end,
                valid_count: 0,
                invalid_count: 0,
                flow_sum: 0.0,
            };
            while let Some(sample) = self.samples.get(self.cursor) {
                if sample.timestamp() >= end {
                    break;
                }
                match sample.flow() {
                    Some(flow) if sample.is_valid() => {
                        window.valid_count += 1;
                        window.flow_sum += flow;
                    }
                    _ => window.invalid_count += 1,
                }
                self.cursor += 1;
            }

            self.start = end;
            if end > last {
                self.finished = true;
            }
            Some(window)
        }
    }

}

/// Quality gating of windows into reportable averages.
pub mod quality {
    use crate::window::{windows, Granularity, Window};
    use chrono::NaiveDateTime;
    use flowmon_core::{config::FlowConfig, sample::Sample};
    use flowmon_utils::numbers::round_to;
    use log::{debug, info};

    /// Quality percentages are reported and compared to two decimals.
    pub const QUALITY_DECIMALS: i32 = 2;

    /// Why a window reports no average.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum NoDataReason {
        /// No samples fell in the window
        Empty,
        /// Samples were present but none was valid
        AllInvalid,
        /// Some samples were valid but fewer than the minimum percentage
        BelowThreshold,
    }

    /// The reportable flow of a window.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum WindowFlow {
        /// Mean flow of the valid samples, US gallons/minute
        Average(f64),
        NoData(NoDataReason),
    }

    /// A window reduced to its report row.
    #[derive(Debug, Clone, PartialEq)]
    pub struct WindowSummary {
        pub start: NaiveDateTime,
        pub end: NaiveDateTime,
        pub valid_count: usize,
        pub invalid_count: usize,
        /// Percentage of valid samples, rounded to two decimals; 0 when empty
        pub quality_pct: f64,
        pub flow: WindowFlow,
    }

    impl WindowSummary {
        /// Gate `window` on `minimum_percentage`.
        pub fn from_window(window: &Window, minimum_percentage: f64) -> WindowSummary {
            let total = window.total_count();
            let quality_pct = if total == 0 {
                0.0
            } else {
                round_to(
                    100.0 * window.valid_count as f64 / total as f64,
                    QUALITY_DECIMALS,
                )
            };
            let flow = if total == 0 {
                WindowFlow::NoData(NoDataReason::Empty)
            } else if window.valid_count == 0 {
                WindowFlow::NoData(NoDataReason::AllInvalid)
            } else if quality_pct < minimum_percentage {
                WindowFlow::NoData(NoDataReason::BelowThreshold)
            } else {
                WindowFlow::Average(window.flow_sum / window.valid_count as f64)
            };
            WindowSummary {
                start: window.start,
                end: window.end,
                valid_count: window.valid_count,
                invalid_count: window.invalid_count,
                quality_pct,
                flow,
            }
        }

        /// Mean flow in US gallons/minute, if the window passed the gate.
        pub fn average(&self) -> Option<f64> {
            match self.flow {
                WindowFlow::Average(average) => Some(average),
                WindowFlow::NoData(_) => None,
            }
        }

        /// Volume over the whole window in US gallons: the per-minute
        /// average times the window length in minutes.
        pub fn scaled_total(&self) -> Option<f64> {
            let minutes = (self.end - self.start).num_minutes() as f64;
            self.average().map(|average| average * minutes)
        }
    }

    /// Window `samples` at `granularity` and gate each window on the
    /// configured minimum percentage.
    pub fn aggregate(
        samples: &[Sample],
        granularity: Granularity,
        config: &FlowConfig,
    ) -> Vec<WindowSummary> {
        let summaries: Vec<WindowSummary> = windows(samples, granularity.duration())
            .map(|window| {
                let summary = WindowSummary::from_window(&window, config.minimum_percentage());
                if let WindowFlow::NoData(reason) = summary.flow {
                    debug!(
                        "{} window at {}: no data ({:?}, {} valid / {} invalid, {}%)",
                        granularity.label(),
                        summary.start,
                        reason,
                        summary.valid_count,
                        summary.invalid_count,
                        summary.quality_pct
                    );
                }
                summary
            })
            .collect();
        let reported = summaries.iter().filter(|s| s.average().is_some()).count();
        info!(
            "{} averages: {} windows, {} with data",
            granularity.label(),
            summaries.len(),
            reported
        );
        summaries
    }

}
