//! AWS SigV4 request signing
//!
//! Produces the `authorization`, `x-amz-date` and (for temporary credentials)
//! `x-amz-security-token` headers API Gateway expects on IAM-protected routes.

use super::SigningError;
use crate::s3::Credentials;
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use reqwest::header::{HeaderName, HeaderValue};
use std::time::SystemTime;

/// SigV4 request signer bound to one credential set, region and service
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: Credentials,
    region: String,
    service: String,
}

impl RequestSigner {
    /// Create a new signer
    pub fn new(credentials: Credentials, region: &str, service: &str) -> Self {
        Self {
            credentials,
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    /// Get the signing region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Get the signing service name
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Sign the request at the current time
    pub fn sign(&self, request: &mut reqwest::Request) -> Result<(), SigningError> {
        self.sign_at(request, SystemTime::now())
    }

    /// Sign the request as of `time`, adding the signature headers in place.
    ///
    /// Covers method, full URL (query included), every header already set and
    /// the body bytes. Streaming bodies cannot be signed.
    pub fn sign_at(
        &self,
        request: &mut reqwest::Request,
        time: SystemTime,
    ) -> Result<(), SigningError> {
        let identity: Identity = self.credentials.to_aws().into();
        let signing_params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(&self.service)
            .time(time)
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| SigningError::InvalidParams(e.to_string()))?
            .into();

        let body = match request.body() {
            None => &[][..],
            Some(body) => body.as_bytes().ok_or_else(|| {
                SigningError::Unsignable("streaming request bodies are not supported".into())
            })?,
        };

        let headers = request
            .headers()
            .iter()
            .map(|(name, value)| {
                value
                    .to_str()
                    .map(|value| (name.as_str(), value))
                    .map_err(|e| SigningError::Unsignable(format!("header {}: {}", name, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let signable = SignableRequest::new(
            request.method().as_str(),
            request.url().as_str(),
            headers.into_iter(),
            SignableBody::Bytes(body),
        )
        .map_err(|e| SigningError::Unsignable(e.to_string()))?;

        let (instructions, _signature) = sign(signable, &signing_params)
            .map_err(|e| SigningError::Unsignable(e.to_string()))?
            .into_parts();

        let signed_headers = instructions
            .headers()
            .map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| SigningError::InvalidHeader(e.to_string()))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| SigningError::InvalidHeader(e.to_string()))?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>, SigningError>>()?;

        for (name, value) in signed_headers {
            request.headers_mut().insert(name, value);
        }

        tracing::trace!(
            method = %request.method(),
            url = %request.url(),
            service = %self.service,
            "Signed request"
        );

        Ok(())
    }
}
