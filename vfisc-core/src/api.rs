//! HTTP client for the MRA e-invoicing gateway.
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("token request failed: {0}")]
    TokenTransport(#[source] reqwest::Error),
    #[error("transmission request failed: {0}")]
    SubmissionTransport(#[source] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: StatusCode, body: String },
    #[error("token generation failed, gateway response: {body}")]
    TokenGenerationFailed { body: String },
}

/// Successful token exchange: a bearer token plus the gateway AES key,
/// still encrypted under the session key we sent.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    token: String,
    encrypted_key: String,
}

impl TokenResponse {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn encrypted_key(&self) -> &str {
        &self.encrypted_key
    }
}

#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    key: Option<String>,
}

/// Body of the transmit call. `signedHash` is always empty, the gateway
/// reserves it for a signing scheme this integration does not use.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransmitRequest {
    pub request_id: String,
    pub request_date_time: String,
    pub signed_hash: String,
    pub encrypted_invoice: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalisedInvoice {
    #[serde(default)]
    irn: Option<String>,
    #[serde(default)]
    invoice_identifier: Option<String>,
}

impl FiscalisedInvoice {
    pub fn irn(&self) -> Option<&str> {
        self.irn.as_deref().filter(|s| !s.is_empty())
    }

    pub fn invoice_identifier(&self) -> Option<&str> {
        self.invoice_identifier.as_deref()
    }
}

/// Raw transmit outcome. The gateway sometimes answers with plain text on
/// errors, so the body is kept as a JSON value with a `raw` wrapper for
/// non-JSON responses rather than failing the call.
#[derive(Debug, Clone)]
pub struct TransmitResponse {
    status: StatusCode,
    body: serde_json::Value,
}

impl TransmitResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// Typed view of `fiscalisedInvoices`, empty when absent.
    pub fn fiscalised_invoices(&self) -> Vec<FiscalisedInvoice> {
        self.body
            .get("fiscalisedInvoices")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// IRN of the first fiscalised invoice, if the gateway issued one.
    pub fn first_irn(&self) -> Option<String> {
        self.fiscalised_invoices()
            .first()
            .and_then(|f| f.irn().map(str::to_string))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequestBody<'a> {
    request_id: &'a str,
    payload: &'a str,
}

/// Client for the MRA token and realtime transmission endpoints.
pub struct MraClient {
    client: reqwest::Client,
    config: Config,
}

impl MraClient {
    pub fn new(config: Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Exchange an RSA-wrapped credential envelope for a bearer token.
    ///
    /// `wrapped_payload` is the base64 output of the RSA wrap. A non-2xx
    /// status or a 2xx body without both `token` and `key` is an error;
    /// the gateway reports credential problems through the latter shape.
    pub async fn generate_token(
        &self,
        request_id: &str,
        wrapped_payload: &str,
    ) -> Result<TokenResponse, ApiError> {
        debug!(request_id, url = self.config.token_url(), "requesting token");
        let response = self
            .client
            .post(self.config.token_url())
            .header("username", self.config.credentials().username())
            .header("ebsMraId", self.config.ebs_mra_id())
            .header("areaCode", self.config.area_code())
            .json(&TokenRequestBody {
                request_id,
                payload: wrapped_payload,
            })
            .send()
            .await
            .map_err(ApiError::TokenTransport)?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::TokenTransport)?;
        if !status.is_success() {
            return Err(ApiError::TokenEndpoint { status, body });
        }
        let raw: RawTokenResponse =
            serde_json::from_str(&body).unwrap_or(RawTokenResponse { token: None, key: None });
        match (raw.token, raw.key) {
            (Some(token), Some(key)) if !token.is_empty() && !key.is_empty() => {
                Ok(TokenResponse {
                    token,
                    encrypted_key: key,
                })
            }
            _ => Err(ApiError::TokenGenerationFailed { body }),
        }
    }

    /// Transmit an encrypted document array under a previously issued
    /// token. The HTTP status is carried through in the response rather
    /// than treated as an error, since the gateway encodes per-document
    /// rejections in the body.
    pub async fn transmit(
        &self,
        token: &str,
        request: &TransmitRequest,
    ) -> Result<TransmitResponse, ApiError> {
        debug!(
            request_id = request.request_id.as_str(),
            url = self.config.transmit_url(),
            "transmitting documents"
        );
        let response = self
            .client
            .post(self.config.transmit_url())
            .header("username", self.config.credentials().username())
            .header("ebsMraId", self.config.ebs_mra_id())
            .header("areaCode", self.config.area_code())
            .header("token", token)
            .json(request)
            .send()
            .await
            .map_err(ApiError::SubmissionTransport)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(ApiError::SubmissionTransport)?;
        let body = serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": text }));
        Ok(TransmitResponse { status, body })
    }
}
