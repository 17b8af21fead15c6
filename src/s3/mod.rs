//! Sample media upload
//!
//! Puts the session's sample media file into the dataplane bucket before any
//! test runs. One upload per session, never deleted afterwards.
//!
//! # Example
//!
//! ```no_run
//! use dataplane_harness::config::{HarnessSettings, TestEnv};
//! use dataplane_harness::s3::{upload_sample_media, S3MediaUploader};
//! use dataplane_harness::stack::StackResources;
//!
//! # async fn example(sdk: aws_config::SdkConfig, resources: StackResources) -> Result<(), Box<dyn std::error::Error>> {
//! let env = TestEnv::from_env()?;
//! let uploader = S3MediaUploader::new(&sdk);
//! let uploaded = upload_sample_media(&uploader, &env, &resources, &HarnessSettings::default()).await?;
//! println!("s3://{}/{}", uploaded.bucket, uploaded.key);
//! # Ok(())
//! # }
//! ```

use crate::config::{HarnessSettings, TestEnv};
use crate::stack::{StackError, StackResources};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use thiserror::Error;

pub mod credentials;

pub use credentials::Credentials;

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read {path}: {message}")]
    ReadError { path: String, message: String },

    #[error("Failed to upload s3://{bucket}/{key}: {message}")]
    PutError {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Upload target unavailable: {0}")]
    Target(#[from] StackError),
}

/// Destination of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub bucket: String,
    pub key: String,
}

/// Object store the sample media is written to
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Upload a local file to `bucket`/`key`
    async fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<(), UploadError>;
}

/// S3 `PutObject` uploader
#[derive(Debug, Clone)]
pub struct S3MediaUploader {
    client: Client,
}

impl S3MediaUploader {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Wrap a preconfigured client, e.g. one forcing path-style addressing
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectUploader for S3MediaUploader {
    #[tracing::instrument(
        name = "s3.put_object",
        skip(self),
        fields(s3.bucket = %bucket, s3.key = %key),
        err
    )]
    async fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<(), UploadError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| UploadError::ReadError {
                path: path.display().to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::PutError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::info!(etag = ?output.e_tag(), "PutObject completed");

        Ok(())
    }
}

/// Upload `<media path><sample image>` to `<prefix><sample image>` in the
/// dataplane bucket.
pub async fn upload_sample_media(
    uploader: &dyn ObjectUploader,
    env: &TestEnv,
    resources: &StackResources,
    settings: &HarnessSettings,
) -> Result<UploadedObject, UploadError> {
    tracing::info!("Uploading test media");

    let target = UploadedObject {
        bucket: resources.dataplane_bucket()?.to_string(),
        key: env.upload_key(settings),
    };
    let source = env.sample_media_file();

    uploader
        .upload_file(Path::new(&source), &target.bucket, &target.key)
        .await?;

    Ok(target)
}
