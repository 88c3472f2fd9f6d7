//! Uptime monitoring: liveness probes, the scheduled sweep over all links,
//! and the rolling 7-day report built from recorded checks.

pub mod monitor;
pub mod probe;
pub mod recorder;
pub mod stats;

pub use monitor::{MonitorSettings, SweepOutcome, SweepReport, UptimeMonitor};
pub use probe::{HttpProber, Probe, Verdict};
pub use recorder::{record_verdict, RecordError};
pub use stats::daily_uptime;
