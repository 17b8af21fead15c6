//! CloudFormation-backed stack outputs

use super::{StackError, StackOutputs};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::Client;

/// Reads stack outputs with `DescribeStacks`
#[derive(Debug, Clone)]
pub struct CloudFormationOutputs {
    client: Client,
}

impl CloudFormationOutputs {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl StackOutputs for CloudFormationOutputs {
    #[tracing::instrument(name = "cloudformation.describe_stacks", skip(self), err)]
    async fn describe_outputs(&self, stack_name: &str) -> Result<Vec<(String, String)>, StackError> {
        let response = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| StackError::DescribeFailed {
                stack: stack_name.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let stack = response
            .stacks()
            .first()
            .ok_or_else(|| StackError::StackNotFound(stack_name.to_string()))?;

        // Outputs without both a key and a value carry nothing to resolve
        let outputs: Vec<(String, String)> = stack
            .outputs()
            .iter()
            .filter_map(|output| {
                Some((
                    output.output_key()?.to_string(),
                    output.output_value()?.to_string(),
                ))
            })
            .collect();

        tracing::debug!(outputs = outputs.len(), "Described stack");

        Ok(outputs)
    }
}
