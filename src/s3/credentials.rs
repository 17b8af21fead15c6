//! AWS credentials for the harness
//!
//! One static credential set, taken from the test environment, feeds both the
//! AWS SDK clients (CloudFormation, S3) and the SigV4 request signer.
//!
//! # Example
//!
//! ```
//! use dataplane_harness::s3::Credentials;
//!
//! let creds = Credentials::with_session_token("access-key", "secret-key", "token");
//! assert_eq!(creds.access_key_id(), "access-key");
//! assert_eq!(creds.session_token(), Some("token"));
//! ```

use crate::config::TestEnv;
use std::fmt;

/// Provider name reported to the AWS SDK for these credentials
const PROVIDER_NAME: &str = "dataplane-harness";

/// Credentials for AWS authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create new credentials
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Create credentials with session token (for temporary credentials)
    pub fn with_session_token(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: Some(session_token.into()),
        }
    }

    /// Get the access key ID
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the secret access key
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Get the session token (if any)
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Convert into the AWS SDK credential type
    pub fn to_aws(&self) -> aws_credential_types::Credentials {
        aws_credential_types::Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            self.session_token.clone(),
            None,
            PROVIDER_NAME,
        )
    }
}

impl From<&TestEnv> for Credentials {
    fn from(env: &TestEnv) -> Self {
        match &env.session_token {
            Some(token) => Self::with_session_token(&env.access_key, &env.secret_key, token),
            None => Self::new(&env.access_key, &env.secret_key),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
