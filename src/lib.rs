//! SaúdeConecta - Provider recommendation service for the SaúdeConecta healthcare marketplace
//!
//! This library ranks nearby healthcare providers for a patient by service,
//! distance and cost, and serves the provider directory and appointment API
//! around it.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{distance::distance_miles, Recommender};
pub use crate::models::{PatientQuery, Provider, Recommendation, ScoringWeights};
