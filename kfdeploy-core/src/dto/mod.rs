//! Data Transfer Objects for the pipeline service REST API
//!
//! These mirror the `v1beta1` JSON bodies. The service omits empty lists and
//! unset fields, so every collection defaults to empty when absent.

pub mod filter;
pub mod list;
pub mod run;
