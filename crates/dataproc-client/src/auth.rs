//! Service-account authentication
//!
//! Loads a Google service-account JSON key and exchanges a signed RS256 JWT
//! assertion for an OAuth2 access token (the `jwt-bearer` grant).

use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DataprocError;

/// OAuth scope granting access to all Cloud Platform APIs
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Token endpoint used when the key file does not name one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed assertion; Google rejects anything above one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service-account key as downloaded from the Cloud console
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

// Keeps the private key out of logs.
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Claims of the JWT assertion sent to the token endpoint
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// OAuth2 access token returned by the token endpoint
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Load a key from a JSON key file
    ///
    /// # Errors
    /// Returns `DataprocError::Credentials` if the file cannot be read or
    /// does not hold a service-account key.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DataprocError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DataprocError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
            .map_err(|msg| DataprocError::Credentials(format!("{}: {}", path.display(), msg)))
    }

    /// Parse a key from its JSON representation
    ///
    /// # Errors
    /// Returns `DataprocError::Credentials` on malformed JSON, a non
    /// service-account key type, or empty email / private key fields.
    pub fn from_json(json: &str) -> Result<Self, DataprocError> {
        Self::parse(json).map_err(DataprocError::Credentials)
    }

    fn parse(json: &str) -> Result<Self, String> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| format!("malformed key file: {}", e))?;

        if let Some(key_type) = key.key_type.as_deref() {
            if key_type != "service_account" {
                return Err(format!("expected a service_account key, found '{}'", key_type));
            }
        }
        if key.client_email.trim().is_empty() {
            return Err("client_email is empty".to_string());
        }
        if key.private_key.trim().is_empty() {
            return Err("private_key is empty".to_string());
        }

        Ok(key)
    }

    /// Sign a JWT assertion for the given scope, issued at `issued_at` (unix seconds)
    ///
    /// # Errors
    /// Returns `DataprocError::Credentials` if the private key is not a valid
    /// RSA PEM or signing fails.
    pub fn signed_assertion(&self, scope: &str, issued_at: i64) -> Result<String, DataprocError> {
        let encoding_key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| DataprocError::Credentials(format!("invalid private key: {}", e)))?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let claims = AssertionClaims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };

        encode(&header, &claims, &encoding_key)
            .map_err(|e| DataprocError::Credentials(format!("failed to sign assertion: {}", e)))
    }

    /// Exchange a freshly signed assertion for an access token
    ///
    /// # Errors
    /// Returns `DataprocError::Authentication` if the token endpoint rejects
    /// the assertion, or `DataprocError::Http` on transport failures.
    pub async fn fetch_access_token(
        &self,
        client: &Client,
        scope: &str,
    ) -> Result<AccessToken, DataprocError> {
        let assertion = self.signed_assertion(scope, Utc::now().timestamp())?;
        debug!("Requesting access token for {} from {}", self.client_email, self.token_uri);

        let response = client
            .post(&self.token_uri)
            .header("Accept", "application/json")
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(DataprocError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataprocError::Authentication(format!(
                "token exchange failed: {} - {}",
                status, body
            )));
        }

        let token: AccessToken = response.json().await.map_err(DataprocError::Http)?;
        if token.access_token.is_empty() {
            return Err(DataprocError::Authentication(
                "token endpoint returned an empty access token".to_string(),
            ));
        }

        debug!("Access token obtained (expires in {:?}s)", token.expires_in);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    const KEY_JSON: &str = include_str!("../tests/fixtures/service_account.json");
    const PUBLIC_KEY: &str = include_str!("../tests/fixtures/test_key.pub.pem");

    #[derive(Debug, Deserialize)]
    struct DecodedClaims {
        iss: String,
        scope: String,
        aud: String,
        iat: i64,
        exp: i64,
    }

    #[test]
    fn test_from_json_parses_service_account_key() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        assert_eq!(
            key.client_email,
            "dataproc-automation@demo-project.iam.gserviceaccount.com"
        );
        assert_eq!(key.project_id.as_deref(), Some("demo-project"));
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_from_json_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"private_key": "pem", "client_email": "a@b.iam.gserviceaccount.com"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_from_json_rejects_malformed_json() {
        let err = ServiceAccountKey::from_json("{not json").unwrap_err();
        assert!(matches!(err, DataprocError::Credentials(_)));
    }

    #[test]
    fn test_from_json_rejects_user_credentials() {
        let err = ServiceAccountKey::from_json(
            r#"{"type": "authorized_user", "private_key": "pem", "client_email": "a@b.c"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("authorized_user"));
    }

    #[test]
    fn test_from_json_rejects_empty_email() {
        let err = ServiceAccountKey::from_json(r#"{"private_key": "pem", "client_email": " "}"#)
            .unwrap_err();
        assert!(err.to_string().contains("client_email"));
    }

    #[test]
    fn test_from_file_missing_path_is_credentials_error() {
        let err = ServiceAccountKey::from_file("/nonexistent/sa.json").unwrap_err();
        assert!(matches!(err, DataprocError::Credentials(_)));
        assert!(err.to_string().contains("/nonexistent/sa.json"));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        let rendered = format!("{:?}", key);
        assert!(!rendered.contains("PRIVATE KEY"));
        assert!(rendered.contains("dataproc-automation@"));
    }

    #[test]
    fn test_signed_assertion_verifies_with_public_key() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        let issued_at = Utc::now().timestamp();
        let jwt = key.signed_assertion(CLOUD_PLATFORM_SCOPE, issued_at).unwrap();

        let header = jsonwebtoken::decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("0123456789abcdef"));

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth2.googleapis.com/token"]);
        let decoded = decode::<DecodedClaims>(
            &jwt,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims.iss, key.client_email);
        assert_eq!(decoded.claims.scope, CLOUD_PLATFORM_SCOPE);
        assert_eq!(decoded.claims.aud, "https://oauth2.googleapis.com/token");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_signed_assertion_rejects_garbage_key() {
        let key = ServiceAccountKey::from_json(
            r#"{"private_key": "not a pem", "client_email": "a@b.iam.gserviceaccount.com"}"#,
        )
        .unwrap();
        let err = key.signed_assertion(CLOUD_PLATFORM_SCOPE, 0).unwrap_err();
        assert!(err.to_string().contains("invalid private key"));
    }
}
