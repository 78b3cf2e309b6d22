//! API module
//!
//! HTTP client for communicating with the backend API.

mod client;

pub use client::{ApiClient, ApiError};
