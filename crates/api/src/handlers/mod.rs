//! HTTP handlers for the batch job endpoints.

pub mod jobs;
