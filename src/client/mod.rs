//! Dataplane API client
//!
//! One method per dataplane endpoint. Each performs exactly one SigV4-signed
//! request and hands the raw [`reqwest::Response`] back to the caller: no
//! status interpretation, no retries, no timeout beyond transport defaults.
//!
//! URLs are built by appending to the `DataplaneApiEndpoint` output as-is.
//!
//! # Example
//!
//! ```no_run
//! use dataplane_harness::client::DataplaneApi;
//! use dataplane_harness::config::TestEnv;
//! use dataplane_harness::stack::StackResources;
//!
//! # async fn example(env: TestEnv, resources: StackResources) -> Result<(), Box<dyn std::error::Error>> {
//! let api = DataplaneApi::new(&env, &resources)?;
//! let response = api.create_asset().await?;
//! assert_eq!(response.status(), 200);
//! # Ok(())
//! # }
//! ```
//!
//! # Tracing
//!
//! Every operation opens a `dataplane.<operation>` span carrying
//! `http.method`, `http.url` and, once the response arrives,
//! `http.status_code`.

use crate::auth::{RequestSigner, SigningError};
use crate::config::{ConfigError, HarnessSettings, TestEnv};
use crate::s3::Credentials;
use crate::stack::{StackError, StackResources};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::{json, Value};
use thiserror::Error;

/// Operator field naming a metadata entry
pub const OPERATOR_NAME: &str = "OperatorName";

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Stack resources incomplete: {0}")]
    Resources(#[from] StackError),

    #[error("Invalid settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("Operator has no string OperatorName: {0}")]
    MissingOperatorName(Value),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// SigV4-signed client for the dataplane API
#[derive(Debug, Clone)]
pub struct DataplaneApi {
    endpoint: String,
    bucket: String,
    sample_image: String,
    settings: HarnessSettings,
    signer: RequestSigner,
    http_client: reqwest::Client,
}

impl DataplaneApi {
    /// Create a client with the default [`HarnessSettings`]
    pub fn new(env: &TestEnv, resources: &StackResources) -> Result<Self, ClientError> {
        Self::with_settings(env, resources, HarnessSettings::default())
    }

    /// Create a client sending the literals in `settings`
    pub fn with_settings(
        env: &TestEnv,
        resources: &StackResources,
        settings: HarnessSettings,
    ) -> Result<Self, ClientError> {
        settings.validate()?;

        let signer = RequestSigner::new(
            Credentials::from(env),
            &env.region,
            &settings.service_name,
        );

        let http_client = reqwest::Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(false)
            .build()?;

        Ok(Self {
            endpoint: resources.dataplane_api_endpoint()?.to_string(),
            bucket: resources.dataplane_bucket()?.to_string(),
            sample_image: env.sample_image.clone(),
            settings,
            signer,
            http_client,
        })
    }

    /// Base URL every path is appended to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// `POST /create`: register the uploaded sample media as a new asset
    #[tracing::instrument(
        name = "dataplane.create_asset",
        skip(self),
        fields(
            http.method = "POST",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn create_asset(&self) -> Result<Response, ClientError> {
        let body = json!({
            "Input": {
                "MediaType": self.settings.media_type,
                "S3Bucket": self.bucket,
                "S3Key": format!("{}{}", self.settings.upload_prefix, self.sample_image),
            }
        });

        let url = format!("{}/create", self.endpoint);
        self.execute(self.request(Method::POST, &url).json(&body))
            .await
    }

    /// `POST metadata/{asset_id}` with the payload verbatim.
    ///
    /// `paginate` and `end` select the query string; `end` alone adds nothing.
    #[tracing::instrument(
        name = "dataplane.post_metadata",
        skip(self, metadata),
        fields(
            http.method = "POST",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn post_metadata(
        &self,
        asset_id: &str,
        metadata: &Value,
        paginate: bool,
        end: bool,
    ) -> Result<Response, ClientError> {
        let url = format!(
            "{}metadata/{}{}",
            self.endpoint,
            asset_id,
            metadata_query(paginate, end)
        );
        self.execute(self.request(Method::POST, &url).json(metadata))
            .await
    }

    /// `POST /checkout/{asset_id}`: lock the asset for the configured owner
    #[tracing::instrument(
        name = "dataplane.checkout_asset",
        skip(self),
        fields(
            http.method = "POST",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn checkout_asset(&self, asset_id: &str) -> Result<Response, ClientError> {
        let body = json!({ "LockedBy": self.settings.lock_owner });
        let url = format!("{}/checkout/{}", self.endpoint, asset_id);
        self.execute(self.request(Method::POST, &url).json(&body))
            .await
    }

    /// `GET /checkouts`
    #[tracing::instrument(
        name = "dataplane.list_checkouts",
        skip(self),
        fields(
            http.method = "GET",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn list_checkouts(&self) -> Result<Response, ClientError> {
        let url = format!("{}/checkouts", self.endpoint);
        self.execute(self.request(Method::GET, &url)).await
    }

    /// `POST /checkin/{asset_id}` without a body
    #[tracing::instrument(
        name = "dataplane.checkin_asset",
        skip(self),
        fields(
            http.method = "POST",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn checkin_asset(&self, asset_id: &str) -> Result<Response, ClientError> {
        let url = format!("{}/checkin/{}", self.endpoint, asset_id);
        self.execute(self.request(Method::POST, &url)).await
    }

    /// `GET metadata/{asset_id}`, continuing from `cursor` when given
    #[tracing::instrument(
        name = "dataplane.get_all_metadata",
        skip(self),
        fields(
            http.method = "GET",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn get_all_metadata(
        &self,
        asset_id: &str,
        cursor: Option<&str>,
    ) -> Result<Response, ClientError> {
        let url = format!("{}metadata/{}", self.endpoint, asset_id);
        let mut request = self.request(Method::GET, &url);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        self.execute(request).await
    }

    /// `GET metadata/{asset_id}/{operator.OperatorName}`
    #[tracing::instrument(
        name = "dataplane.get_single_metadata_field",
        skip(self, operator),
        fields(
            http.method = "GET",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn get_single_metadata_field(
        &self,
        asset_id: &str,
        operator: &Value,
    ) -> Result<Response, ClientError> {
        let url = self.metadata_field_url(asset_id, operator)?;
        self.execute(self.request(Method::GET, &url)).await
    }

    /// `DELETE metadata/{asset_id}/{operator.OperatorName}`
    #[tracing::instrument(
        name = "dataplane.delete_single_metadata_field",
        skip(self, operator),
        fields(
            http.method = "DELETE",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn delete_single_metadata_field(
        &self,
        asset_id: &str,
        operator: &Value,
    ) -> Result<Response, ClientError> {
        let url = self.metadata_field_url(asset_id, operator)?;
        self.execute(self.request(Method::DELETE, &url)).await
    }

    /// `DELETE metadata/{asset_id}`: the dataplane removes the asset through
    /// its metadata route
    #[tracing::instrument(
        name = "dataplane.delete_asset",
        skip(self),
        fields(
            http.method = "DELETE",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn delete_asset(&self, asset_id: &str) -> Result<Response, ClientError> {
        let url = format!("{}metadata/{}", self.endpoint, asset_id);
        self.execute(self.request(Method::DELETE, &url)).await
    }

    fn metadata_field_url(&self, asset_id: &str, operator: &Value) -> Result<String, ClientError> {
        let field = operator
            .get(OPERATOR_NAME)
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::MissingOperatorName(operator.clone()))?;

        Ok(format!("{}metadata/{}/{}", self.endpoint, asset_id, field))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Sign and send; records url and status on the operation span
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let mut request = builder.build()?;
        self.signer.sign(&mut request)?;

        let span = tracing::Span::current();
        span.record("http.url", request.url().as_str());

        let method = request.method().clone();
        let url = request.url().clone();
        let response = self.http_client.execute(request).await?;

        span.record("http.status_code", response.status().as_u16());
        tracing::info!(
            status = %response.status(),
            "{} {}",
            method,
            url.path()
        );

        Ok(response)
    }
}

fn metadata_query(paginate: bool, end: bool) -> &'static str {
    match (paginate, end) {
        (true, true) => "?paginated=true&end=true",
        (true, false) => "?paginated=true",
        _ => "",
    }
}
