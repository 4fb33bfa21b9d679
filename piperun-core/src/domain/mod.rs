//! Core domain types
//!
//! This module contains the structures shared by the execution engine and the CLI.
//! Run definitions are produced by the configuration layer and are read-only
//! to the engine; run status and approvals mirror what the remote build service reports.

pub mod definition;
pub mod options;
pub mod run;
