pub mod panel_service;
pub use panel_service::{AccessContext, PanelApi, PanelError};

pub mod calculator;
pub use calculator::{Adjusted, AdjustmentSpec, CalculationError, Sign, adjust, adjust_str};

pub mod filter;
pub use filter::{FilterSpec, ReferenceClock, parse_online_at};

pub mod batch;
pub use batch::{BatchMutator, BatchReport, ItemOutcome, Job, JobKind, Outcome, SkipReason, run_job};

pub mod statistics;
pub use statistics::{StatsReport, summarize};

#[cfg(test)]
pub(crate) mod fake;
