//! Request authentication module
//!
//! Signs outgoing dataplane requests with AWS Signature Version 4.

use thiserror::Error;

pub mod sigv4;

pub use sigv4::RequestSigner;

/// Signing errors
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Invalid signing parameters: {0}")]
    InvalidParams(String),

    #[error("Request cannot be signed: {0}")]
    Unsignable(String),

    #[error("Invalid signature header: {0}")]
    InvalidHeader(String),
}
