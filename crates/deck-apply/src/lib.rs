//! Executes a reconciliation plan against a remote adapter and reports
//! progress. Pure decision (which action, whether freeze suppresses it)
//! stays in `plan_runner`; emission goes through the `ProgressSink` seam in
//! `sink`, mirroring the decide/emit split of a render scheduler and its
//! writer.

mod plan_runner;
mod sink;

pub use plan_runner::{apply_incremental, apply_plan, ApplyError};
pub use sink::{ChannelSink, ProgressSink};
