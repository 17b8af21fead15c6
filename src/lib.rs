//! Dataplane Harness Library
//!
//! Integration-test fixtures and a SigV4-signed client for the media
//! dataplane API deployed behind Amazon API Gateway.
//!
//! # Features
//!
//! - **Environment Loading**: typed, fail-fast test configuration
//! - **Stack Resolution**: CloudFormation outputs of the deployment and its test stack
//! - **Media Upload**: sample media placed in the dataplane bucket once per session
//! - **API Client**: one signed request per dataplane operation, raw responses returned
//!
//! # Example
//!
//! ```no_run
//! use dataplane_harness::session::TestSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = TestSession::from_environment().await?;
//!     let api = session.api()?;
//!     let response = api.create_asset().await?;
//!     println!("{}", response.text().await?);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod logging;
pub mod s3;
pub mod session;
pub mod stack;

// Re-export commonly used types
pub use client::DataplaneApi;
pub use config::TestEnv;
pub use session::TestSession;
pub use stack::StackResources;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
