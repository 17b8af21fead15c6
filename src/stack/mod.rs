//! Stack resource resolution
//!
//! Looks up the CloudFormation outputs that locate the deployment under test.
//!
//! # Resolution
//!
//! 1. Describe the primary stack and flatten its outputs into [`StackResources`]
//! 2. Validate `DataplaneApiEndpoint` and `DataplaneBucket`
//! 3. Describe the stack named by the `TestStack` output and merge its outputs
//!    (same-named keys are overwritten)
//!
//! Any failure aborts resolution; nothing is retried.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

mod cloudformation;

pub use cloudformation::CloudFormationOutputs;

/// Output holding the dataplane API base URL
pub const DATAPLANE_API_ENDPOINT: &str = "DataplaneApiEndpoint";
/// Output holding the dataplane media bucket
pub const DATAPLANE_BUCKET: &str = "DataplaneBucket";
/// Output naming the linked test stack
pub const TEST_STACK: &str = "TestStack";

/// Stack resolution errors
#[derive(Error, Debug)]
pub enum StackError {
    #[error("Failed to describe stack '{stack}': {message}")]
    DescribeFailed { stack: String, message: String },

    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Stack output '{0}' is missing")]
    MissingOutput(&'static str),

    #[error("DataplaneApiEndpoint '{endpoint}' does not match {pattern}")]
    InvalidEndpoint { endpoint: String, pattern: String },
}

/// Source of stack outputs
#[async_trait]
pub trait StackOutputs: Send + Sync {
    /// Return the `(key, value)` outputs of a stack, in the order reported
    async fn describe_outputs(&self, stack_name: &str) -> Result<Vec<(String, String)>, StackError>;
}

/// Output key → value mapping merged from the primary and test stacks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StackResources {
    outputs: BTreeMap<String, String>,
}

impl StackResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert outputs; later values replace earlier ones with the same key
    pub fn merge<I>(&mut self, outputs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.outputs.extend(outputs);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outputs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Base URL of the dataplane API
    pub fn dataplane_api_endpoint(&self) -> Result<&str, StackError> {
        self.require(DATAPLANE_API_ENDPOINT)
    }

    /// Bucket sample media is uploaded to
    pub fn dataplane_bucket(&self) -> Result<&str, StackError> {
        self.require(DATAPLANE_BUCKET)
    }

    /// Name of the linked test stack
    pub fn test_stack(&self) -> Result<&str, StackError> {
        self.require(TEST_STACK)
    }

    fn require(&self, key: &'static str) -> Result<&str, StackError> {
        self.get(key).ok_or(StackError::MissingOutput(key))
    }

    /// Check the outputs needed to address the dataplane in `region`.
    ///
    /// The endpoint must match `.*.execute-api.<region>.amazonaws.com/api/.*`
    /// anchored at the start, with the unescaped dots matching any character.
    pub fn validate(&self, region: &str) -> Result<(), StackError> {
        let endpoint = self.dataplane_api_endpoint()?;
        self.dataplane_bucket()?;

        let pattern = endpoint_pattern(region);
        let matches = regex_lite::Regex::new(&format!("^{}", pattern))
            .map(|re| re.is_match(endpoint))
            .unwrap_or(false);

        if !matches {
            return Err(StackError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                pattern,
            });
        }

        Ok(())
    }
}

impl FromIterator<(String, String)> for StackResources {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut resources = Self::new();
        resources.merge(iter);
        resources
    }
}

fn endpoint_pattern(region: &str) -> String {
    format!(
        ".*.execute-api.{}.amazonaws.com/api/.*",
        regex_lite::escape(region)
    )
}

/// Resolve and validate the resources of `stack_name` and its test stack
#[tracing::instrument(name = "stack.resolve", skip(outputs), err)]
pub async fn resolve_stack_resources(
    outputs: &dyn StackOutputs,
    region: &str,
    stack_name: &str,
) -> Result<StackResources, StackError> {
    tracing::info!("Validating stack resources");

    let mut resources: StackResources = outputs
        .describe_outputs(stack_name)
        .await?
        .into_iter()
        .collect();
    resources.validate(region)?;

    let test_stack = resources.test_stack()?.to_string();
    let test_outputs = outputs.describe_outputs(&test_stack).await?;
    resources.merge(test_outputs);

    tracing::info!(
        test_stack = %test_stack,
        outputs = resources.len(),
        "Resolved stack resources"
    );

    Ok(resources)
}
