//! Funnel report snapshots: the data an export collaborator renders into
//! a printable report.

pub mod report;

pub use report::{FunnelReport, ReportRow};
