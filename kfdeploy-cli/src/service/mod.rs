//! Service layer
//!
//! The three steps a delivery job performs against the pipeline service:
//! deploy a package, start a run, wait for it. Each takes the session handle
//! explicitly and reports failure as a typed error; nothing here exits the
//! process or prints to stdout.
//!
//! All services are generic over [`PipelineApi`](kfdeploy_client::PipelineApi)
//! so they can be driven by an in-memory registry in tests.

pub mod deployer;
pub mod runner;
pub mod waiter;

#[cfg(test)]
pub(crate) mod fake;

pub use waiter::WaitSettings;
