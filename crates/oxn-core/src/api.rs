//! Client for the OXN backend REST API.
//!
//! [`ApiClient`] owns the request bookkeeping (loading flag, last error) and the
//! typed endpoints; the bytes move through a [`Transport`]. Production code
//! uses [`HttpTransport`]; tests plug in their own.

pub mod client;
pub mod error;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{ApiClient, CallState};
pub use error::ApiError;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, RequestOptions, Transport};
