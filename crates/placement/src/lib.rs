//! Internship placement: postings, student applications, offer allocation
//! and the seat reconciliation pass, plus the config, error and telemetry
//! plumbing shared with the API service.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
