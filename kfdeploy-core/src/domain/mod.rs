//! Core domain types
//!
//! This module contains the service-side entities this tool creates or
//! observes. All identifiers are opaque strings assigned by the service.

pub mod experiment;
pub mod pipeline;
pub mod run;
