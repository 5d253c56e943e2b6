//! Agricultural traceability library
//!
//! Validates the records of a three-stage supply chain (cultivation lot,
//! transformation, logistics) and the chain that links them. The validators
//! are pure functions returning a [`validation::ValidationResult`]; the
//! service layer parses requests, validates and persists through a
//! [`repositories::TraceabilityStore`].
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod dto;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;
pub mod validation;

pub use errors::ServiceError;
pub use repositories::{Dataset, InMemoryStore, TraceabilityReader, TraceabilityStore};
pub use services::TraceabilityService;
pub use validation::{
    ChainReport, Severity, ValidationResult, Violation, ViolationKind,
};
