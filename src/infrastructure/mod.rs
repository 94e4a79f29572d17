//! Infrastructure layer - Evaluation engine, retrieval backends and services

pub mod evaluation;
pub mod logging;
pub mod observability;
pub mod retrieval;
pub mod services;
