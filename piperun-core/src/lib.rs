//! Piperun Core
//!
//! Core types for the piperun batch pipeline runner.
//!
//! This crate contains:
//! - Domain types: run definitions, parameter sets, remote run status and approvals
//! - DTOs: the JSON document used to supply run definitions

pub mod domain;
pub mod dto;
pub mod error;

pub use error::DefinitionError;
