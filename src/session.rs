//! Test session bootstrap
//!
//! A [`TestSession`] is built once per test binary: it reads the environment,
//! resolves the stack resources and uploads the sample media. Afterwards it is
//! immutable and shared by reference; each test asks it for a fresh
//! [`DataplaneApi`].
//!
//! # Example
//!
//! ```no_run
//! use dataplane_harness::session::TestSession;
//! use tokio::sync::OnceCell;
//!
//! static SESSION: OnceCell<TestSession> = OnceCell::const_new();
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = SESSION.get_or_try_init(TestSession::from_environment).await?;
//! let api = session.api()?;
//! let response = api.list_checkouts().await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

use crate::client::{ClientError, DataplaneApi};
use crate::config::{ConfigError, HarnessSettings, TestEnv};
use crate::s3::{
    upload_sample_media, Credentials, ObjectUploader, S3MediaUploader, UploadError,
    UploadedObject,
};
use crate::stack::{
    resolve_stack_resources, CloudFormationOutputs, StackError, StackOutputs, StackResources,
};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use thiserror::Error;

/// Session setup errors. Any of them aborts the whole run.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Resolved, read-only state shared by every test of a run
#[derive(Debug, Clone)]
pub struct TestSession {
    env: TestEnv,
    resources: StackResources,
    settings: HarnessSettings,
    uploaded: UploadedObject,
}

impl TestSession {
    /// Bootstrap against live AWS using the process environment
    pub async fn from_environment() -> Result<Self, SessionError> {
        Self::from_environment_with(HarnessSettings::default()).await
    }

    /// Bootstrap against live AWS with custom settings
    pub async fn from_environment_with(settings: HarnessSettings) -> Result<Self, SessionError> {
        settings.validate()?;

        let env = TestEnv::from_env()?;
        let sdk_config = load_sdk_config(&env).await;

        let stacks = CloudFormationOutputs::new(&sdk_config);
        let uploader = S3MediaUploader::new(&sdk_config);

        Self::bootstrap(env, settings, &stacks, &uploader).await
    }

    /// Resolve resources through `stacks`, then upload the sample media
    /// through `uploader`.
    pub async fn bootstrap(
        env: TestEnv,
        settings: HarnessSettings,
        stacks: &dyn StackOutputs,
        uploader: &dyn ObjectUploader,
    ) -> Result<Self, SessionError> {
        settings.validate()?;

        let resources = resolve_stack_resources(stacks, &env.region, &env.stack_name).await?;
        let uploaded = upload_sample_media(uploader, &env, &resources, &settings).await?;

        tracing::info!(
            stack = %env.stack_name,
            bucket = %uploaded.bucket,
            key = %uploaded.key,
            "Test session ready"
        );

        Ok(Self {
            env,
            resources,
            settings,
            uploaded,
        })
    }

    pub fn env(&self) -> &TestEnv {
        &self.env
    }

    pub fn resources(&self) -> &StackResources {
        &self.resources
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    /// Where the sample media was uploaded
    pub fn uploaded_media(&self) -> &UploadedObject {
        &self.uploaded
    }

    /// Build a new API client from the session data
    pub fn api(&self) -> Result<DataplaneApi, ClientError> {
        tracing::debug!("Generating a dataplane API client");
        DataplaneApi::with_settings(&self.env, &self.resources, self.settings.clone())
    }
}

/// AWS SDK configuration for the session's region and static credentials
pub async fn load_sdk_config(env: &TestEnv) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(env.region.clone()))
        .credentials_provider(Credentials::from(env).to_aws())
        .load()
        .await
}
