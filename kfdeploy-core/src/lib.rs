//! kfdeploy Core
//!
//! Core types and abstractions for deploying and running pipelines on a
//! Kubeflow Pipelines service.
//!
//! This crate contains:
//! - Domain types: service-side entities (Pipeline, PipelineVersion, Experiment, Run)
//! - DTOs: request and response bodies of the service REST API
//! - Definition: parsing of compiled pipeline packages
//! - Params: run parameter files

pub mod definition;
pub mod domain;
pub mod dto;
pub mod params;
