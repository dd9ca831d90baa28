//! Roster business logic: control sessions, batch adjustment, reports.

mod adjustment;
mod desk;
mod report;

pub use adjustment::{apply_adjustment, AdjustmentReport};
pub use desk::ControlDesk;
pub use report::{status_report, StatusReport};
