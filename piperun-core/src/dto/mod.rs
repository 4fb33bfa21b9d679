//! Data Transfer Objects
//!
//! Serialized shapes exchanged with the outside world. The engine only sees
//! the domain types these documents unwrap into.

pub mod definition;
