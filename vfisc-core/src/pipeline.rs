//! End-to-end submission pipeline: credential wrap, token exchange, key
//! unwrap, document encryption, transmission.
use chrono::Local;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ApiError, FiscalisedInvoice, MraClient, TransmitRequest, TransmitResponse};
use crate::config::Config;
use crate::crypto::{aes_ecb_decrypt, aes_ecb_encrypt, CryptoError, RsaWrapper, SymmetricKey};
use crate::document::FiscalInvoice;
use crate::mapping::format_request_datetime;

/// Gateway limit on documents per transmission.
pub const MAX_BATCH_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("batch of {count} documents outside the allowed range 1..={max}", max = MAX_BATCH_SIZE)]
    BatchSize { count: usize },
}

/// Credentials plus session key, RSA-wrapped as the token request
/// payload. `refreshToken` is the literal string "false", the gateway
/// does not accept a boolean here.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialEnvelope<'a> {
    username: &'a str,
    password: &'a str,
    encrypt_key: String,
    refresh_token: &'static str,
}

/// Outcome of a submission, wrapping the raw gateway response.
#[derive(Debug)]
pub struct SubmissionReceipt {
    request_id: String,
    response: TransmitResponse,
}

impl SubmissionReceipt {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn response(&self) -> &TransmitResponse {
        &self.response
    }

    pub fn fiscalised_invoices(&self) -> Vec<FiscalisedInvoice> {
        self.response.fiscalised_invoices()
    }

    /// IRN of the first fiscalised document, if any.
    pub fn first_irn(&self) -> Option<String> {
        self.response.first_irn()
    }
}

/// Drives the mandated handshake for one or more mapped documents.
///
/// Every submission performs a full handshake with a fresh session key;
/// tokens are not reused across calls.
pub struct Submitter {
    client: MraClient,
    rsa: RsaWrapper,
}

impl Submitter {
    /// Build a submitter, loading the MRA public key from the path in
    /// the configuration.
    pub fn new(config: Config) -> Result<Self, CryptoError> {
        let rsa = RsaWrapper::from_pem_file(config.public_key_path())?;
        Ok(Self {
            client: MraClient::new(config),
            rsa,
        })
    }

    /// Build a submitter from an in-memory public key PEM.
    pub fn with_public_key_pem(config: Config, pem: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            client: MraClient::new(config),
            rsa: RsaWrapper::from_pem(pem)?,
        })
    }

    /// Submit a single document. The request id is the document's own
    /// identifier.
    pub async fn submit(
        &self,
        document: &FiscalInvoice,
    ) -> Result<SubmissionReceipt, PipelineError> {
        let session_key = SymmetricKey::generate()?;
        let request_id = document.invoice_identifier.clone();
        self.run_handshake(&request_id, std::slice::from_ref(document), &session_key)
            .await
    }

    /// Submit up to [`MAX_BATCH_SIZE`] documents in one handshake. The
    /// first document's identifier serves as the request id.
    pub async fn submit_batch(
        &self,
        documents: &[FiscalInvoice],
    ) -> Result<SubmissionReceipt, PipelineError> {
        if documents.is_empty() || documents.len() > MAX_BATCH_SIZE {
            return Err(PipelineError::BatchSize {
                count: documents.len(),
            });
        }
        let session_key = SymmetricKey::generate()?;
        let request_id = documents[0].invoice_identifier.clone();
        self.run_handshake(&request_id, documents, &session_key).await
    }

    async fn run_handshake(
        &self,
        request_id: &str,
        documents: &[FiscalInvoice],
        session_key: &SymmetricKey,
    ) -> Result<SubmissionReceipt, PipelineError> {
        let config = self.client.config();
        let envelope = CredentialEnvelope {
            username: config.credentials().username(),
            password: config.credentials().password(),
            encrypt_key: session_key.to_base64(),
            refresh_token: "false",
        };
        let envelope_json =
            serde_json::to_vec(&envelope).map_err(CryptoError::Serialize)?;
        let wrapped = self.rsa.wrap(&envelope_json)?;
        debug!(request_id, "credential envelope wrapped");

        let token = self.client.generate_token(request_id, &wrapped).await?;
        info!(request_id, "token issued");

        // The gateway returns its AES key encrypted under our session key.
        let returned_key = aes_ecb_decrypt(session_key, token.encrypted_key())?;
        let final_key = SymmetricKey::from_base64(&returned_key)?;

        // The transmit body always carries an array, even for one document.
        let plaintext =
            serde_json::to_vec(&documents).map_err(CryptoError::Serialize)?;
        let encrypted_invoice = aes_ecb_encrypt(&final_key, &plaintext)?;
        debug!(
            request_id,
            documents = documents.len(),
            "document array encrypted"
        );

        let request = TransmitRequest {
            request_id: request_id.to_string(),
            request_date_time: format_request_datetime(Local::now()),
            signed_hash: String::new(),
            encrypted_invoice,
        };
        let response = self.client.transmit(token.token(), &request).await?;
        info!(
            request_id,
            status = response.status().as_u16(),
            fiscalised = response.fiscalised_invoices().len(),
            "transmission complete"
        );

        Ok(SubmissionReceipt {
            request_id: request_id.to_string(),
            response,
        })
    }
}
