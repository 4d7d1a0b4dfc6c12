//! Application-level orchestration utilities.
//!
//! This module owns the dashboard refresh lifecycle (periodic reloads, on-demand
//! refresh, shutdown). The TUI calls into this module so that rendering never
//! waits on the stores.

mod controller;

pub(crate) use controller::{run_controller, DashboardEvent, UiCommand};
