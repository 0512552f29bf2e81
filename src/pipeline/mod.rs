//! The shared request/response pipeline every API call goes through.
//!
//! A request is prepared by the interceptor (bearer token, tenant code),
//! handed to a [`Transport`], and the outcome is run through the response
//! policy in [`ApiClient::execute`]: refresh-and-replay on 401, redirect on
//! 403, bounded backoff for transient failures of idempotent requests, and
//! normalization of whatever error is left into an [`crate::error::ApiError`].

pub mod client;
pub mod interceptor;
pub mod retry;
pub mod transport;

pub use client::{ApiClient, ClientState};
pub use retry::{Sleeper, TokioSleeper};
pub use transport::{HttpTransport, RawResponse, Transport, TransportErrorKind, TransportFailure};
