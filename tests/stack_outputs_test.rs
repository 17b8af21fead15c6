//! CloudFormation Stack Outputs Tests
//!
//! Runs `CloudFormationOutputs` against a mock CloudFormation query endpoint
//! to pin how `DescribeStacks` responses turn into stack outputs.

#[cfg(test)]
mod tests {
    use aws_config::{BehaviorVersion, Region, SdkConfig};
    use dataplane_harness::s3::Credentials;
    use dataplane_harness::stack::{
        resolve_stack_resources, CloudFormationOutputs, StackError, StackOutputs,
        DATAPLANE_API_ENDPOINT, DATAPLANE_BUCKET, TEST_STACK,
    };
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn sdk_config(server: &MockServer) -> SdkConfig {
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new("us-west-2"))
            .endpoint_url(server.uri())
            .credentials_provider(Credentials::new("AKIDEXAMPLE", "secret").to_aws())
            .load()
            .await
    }

    fn output(key: Option<&str>, value: Option<&str>) -> String {
        let key = key
            .map(|k| format!("<OutputKey>{}</OutputKey>", k))
            .unwrap_or_default();
        let value = value
            .map(|v| format!("<OutputValue>{}</OutputValue>", v))
            .unwrap_or_default();
        format!("<member>{}{}</member>", key, value)
    }

    fn describe_stacks_body(stacks: &[(&str, Vec<String>)]) -> String {
        let members: String = stacks
            .iter()
            .map(|(name, outputs)| {
                format!(
                    "<member>\
                     <StackId>arn:aws:cloudformation:us-west-2:123456789012:stack/{name}/1</StackId>\
                     <StackName>{name}</StackName>\
                     <CreationTime>2024-01-01T00:00:00Z</CreationTime>\
                     <StackStatus>CREATE_COMPLETE</StackStatus>\
                     <Outputs>{outputs}</Outputs>\
                     </member>",
                    name = name,
                    outputs = outputs.concat(),
                )
            })
            .collect();

        format!(
            "<DescribeStacksResponse xmlns=\"http://cloudformation.amazonaws.com/doc/2010-05-15/\">\
             <DescribeStacksResult><Stacks>{}</Stacks></DescribeStacksResult>\
             <ResponseMetadata><RequestId>b9b4b068-3a41-11e5-94eb-example</RequestId></ResponseMetadata>\
             </DescribeStacksResponse>",
            members
        )
    }

    fn xml(body: String) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body, "text/xml")
    }

    fn describe_stacks(stack_name: &str) -> wiremock::MockBuilder {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains("Action=DescribeStacks"))
            .and(body_string_contains(format!("StackName={}", stack_name)))
    }

    #[tokio::test]
    async fn test_describe_outputs_returns_key_value_pairs() {
        let server = MockServer::start().await;

        describe_stacks("mie")
            .respond_with(xml(describe_stacks_body(&[(
                "mie",
                vec![
                    output(Some("DataplaneBucket"), Some("mie-dataplane-bucket")),
                    output(Some("TestStack"), Some("mie-test")),
                ],
            )])))
            .expect(1)
            .mount(&server)
            .await;

        let stacks = CloudFormationOutputs::new(&sdk_config(&server).await);
        let outputs = stacks.describe_outputs("mie").await.unwrap();

        assert_eq!(
            outputs,
            vec![
                ("DataplaneBucket".to_string(), "mie-dataplane-bucket".to_string()),
                ("TestStack".to_string(), "mie-test".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_stack_list_is_stack_not_found() {
        let server = MockServer::start().await;

        describe_stacks("mie")
            .respond_with(xml(describe_stacks_body(&[])))
            .expect(1)
            .mount(&server)
            .await;

        let stacks = CloudFormationOutputs::new(&sdk_config(&server).await);
        let result = stacks.describe_outputs("mie").await;

        assert!(matches!(result, Err(StackError::StackNotFound(name)) if name == "mie"));
    }

    #[tokio::test]
    async fn test_incomplete_outputs_are_skipped() {
        let server = MockServer::start().await;

        describe_stacks("mie")
            .respond_with(xml(describe_stacks_body(&[(
                "mie",
                vec![
                    output(Some("A"), Some("1")),
                    output(Some("B"), None),
                    output(None, Some("orphan")),
                    output(Some("C"), Some("3")),
                ],
            )])))
            .mount(&server)
            .await;

        let stacks = CloudFormationOutputs::new(&sdk_config(&server).await);
        let outputs = stacks.describe_outputs("mie").await.unwrap();

        assert_eq!(
            outputs,
            vec![
                ("A".to_string(), "1".to_string()),
                ("C".to_string(), "3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_service_error_is_describe_failed() {
        let server = MockServer::start().await;

        let body = "<ErrorResponse xmlns=\"http://cloudformation.amazonaws.com/doc/2010-05-15/\">\
                    <Error><Type>Sender</Type><Code>ValidationError</Code>\
                    <Message>Stack with id missing does not exist</Message></Error>\
                    <RequestId>4af14eec-350e-11e4-b260-example</RequestId>\
                    </ErrorResponse>";

        describe_stacks("missing")
            .respond_with(ResponseTemplate::new(400).set_body_raw(body, "text/xml"))
            .expect(1)
            .mount(&server)
            .await;

        let stacks = CloudFormationOutputs::new(&sdk_config(&server).await);
        let result = stacks.describe_outputs("missing").await;

        match result {
            Err(StackError::DescribeFailed { stack, message }) => {
                assert_eq!(stack, "missing");
                assert!(message.contains("does not exist"), "message: {}", message);
            }
            other => panic!("expected DescribeFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolver_merges_test_stack_outputs() {
        let server = MockServer::start().await;
        let endpoint = "https://k2k7m3hmwb.execute-api.us-west-2.amazonaws.com/api/";

        describe_stacks("primary")
            .respond_with(xml(describe_stacks_body(&[(
                "primary",
                vec![
                    output(Some(DATAPLANE_API_ENDPOINT), Some(endpoint)),
                    output(Some(DATAPLANE_BUCKET), Some("primary-bucket")),
                    output(Some(TEST_STACK), Some("extras")),
                ],
            )])))
            .expect(1)
            .mount(&server)
            .await;

        describe_stacks("extras")
            .respond_with(xml(describe_stacks_body(&[(
                "extras",
                vec![
                    output(Some(DATAPLANE_BUCKET), Some("override-bucket")),
                    output(Some("TestLambdaArn"), Some("arn:aws:lambda:us-west-2:1:function:t")),
                ],
            )])))
            .expect(1)
            .mount(&server)
            .await;

        let stacks = CloudFormationOutputs::new(&sdk_config(&server).await);
        let resources = resolve_stack_resources(&stacks, "us-west-2", "primary")
            .await
            .unwrap();

        assert_eq!(resources.dataplane_api_endpoint().unwrap(), endpoint);
        assert_eq!(resources.dataplane_bucket().unwrap(), "override-bucket");
        assert_eq!(
            resources.get("TestLambdaArn"),
            Some("arn:aws:lambda:us-west-2:1:function:t")
        );
    }
}
