//! LexDoc signature gateway adapter.
//!
//! Two-phase fiska protocol plus a generic PKCS7 signing call. Phase 1
//! sends the routing data and gets back an unsigned fiska sheet (base64
//! PDF) for the director to sign out-of-band with their key plugin.
//! Phase 2 sends the signed sheet plus the detached PKCS7 and gets back
//! a QR-stamped PDF with a verification URL.
//!
//! Every error carries an [`ErrorOrigin`] so the portal can say whether
//! the failure happened on our side or inside the LexDoc API.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::GatewayConfig;

// ═══════════════════════════════════════════
// Types
// ═══════════════════════════════════════════

/// Which side of the integration produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    OurSide,
    Lexdoc,
}

impl ErrorOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OurSide => "our_side",
            Self::Lexdoc => "lexdoc",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Cannot reach LexDoc at {url}")]
    Connection { url: String },
    #[error("LexDoc request timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("HTTP transport failure: {0}")]
    Transport(String),
    #[error("LexDoc returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Malformed LexDoc response: {0}")]
    ResponseParsing(String),
    #[error("LexDoc declined the request: {message}")]
    Declined { message: String },
    #[error("Invalid signing payload: {0}")]
    InvalidPayload(String),
}

impl GatewayError {
    pub fn origin(&self) -> ErrorOrigin {
        match self {
            GatewayError::InvalidPayload(_) => ErrorOrigin::OurSide,
            _ => ErrorOrigin::Lexdoc,
        }
    }
}

/// Routing data rendered onto the fiska sheet.
#[derive(Debug, Clone, Serialize)]
pub struct FiskaRequest {
    /// Document code, also embedded in the verification string.
    pub document_name: String,
    pub document_number: Option<String>,
    /// dd.mm.yyyy, matching the printed form.
    pub document_date: Option<String>,
    pub resolution: String,
    pub director_name: String,
    /// Display names, primary executor first, co-executors by their
    /// fiska priority.
    pub executor_names: Vec<String>,
    pub verification: String,
}

/// Context LexDoc embeds next to a PKCS7-signed main document.
#[derive(Debug, Clone, Serialize)]
pub struct SignMetadata {
    pub document_name: String,
    pub title: String,
    pub signed_by: String,
}

/// A signed PDF artifact returned by LexDoc.
#[derive(Debug, Clone)]
pub struct SignedArtifact {
    pub pdf_base64: String,
    pub verification_url: String,
}

/// External signing operations, as a trait so tests script the remote.
pub trait SignatureGateway: Send + Sync {
    /// Phase 1: render the unsigned fiska sheet. Returns base64 PDF.
    fn generate_fiska_pdf(&self, request: &FiskaRequest) -> Result<String, GatewayError>;

    /// Phase 2: exchange the signed sheet + detached PKCS7 for the
    /// QR-stamped artifact.
    fn process_signed_fiska(
        &self,
        signed_pdf_base64: &str,
        pkcs7_base64: &str,
    ) -> Result<SignedArtifact, GatewayError>;

    /// Sign an arbitrary document PDF with a detached PKCS7.
    fn sign_pdf(
        &self,
        pdf_base64: &str,
        pkcs7_base64: &str,
        metadata: &SignMetadata,
    ) -> Result<SignedArtifact, GatewayError>;
}

// ═══════════════════════════════════════════
// HTTP client
// ═══════════════════════════════════════════

/// Blocking LexDoc HTTP client. POST JSON with an `X-Api-Key` header,
/// fixed timeout, no retry.
pub struct LexdocClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl LexdocClient {
    pub fn new(config: &GatewayConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            timeout_secs: config.timeout_secs,
        }
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<LexdocResponse, GatewayError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    GatewayError::Connection {
                        url: self.base_url.clone(),
                    }
                } else if e.is_timeout() {
                    GatewayError::Timeout {
                        seconds: self.timeout_secs,
                    }
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: LexdocResponse = response
            .json()
            .map_err(|e| GatewayError::ResponseParsing(e.to_string()))?;
        if !parsed.ok {
            return Err(GatewayError::Declined {
                message: parsed
                    .message
                    .unwrap_or_else(|| "no reason given".to_string()),
            });
        }
        Ok(parsed)
    }
}

/// Response body shared by the LexDoc endpoints.
#[derive(Deserialize)]
struct LexdocResponse {
    ok: bool,
    pdf_base64: Option<String>,
    verification_url: Option<String>,
    message: Option<String>,
}

impl LexdocResponse {
    fn require_pdf(self) -> Result<String, GatewayError> {
        self.pdf_base64
            .ok_or_else(|| GatewayError::ResponseParsing("response carries no pdf_base64".into()))
    }

    fn require_artifact(self) -> Result<SignedArtifact, GatewayError> {
        let verification_url = self.verification_url.clone().ok_or_else(|| {
            GatewayError::ResponseParsing("response carries no verification_url".into())
        })?;
        Ok(SignedArtifact {
            pdf_base64: self.require_pdf()?,
            verification_url,
        })
    }
}

#[derive(Serialize)]
struct ProcessSignedRequest<'a> {
    pdf_base64: &'a str,
    pkcs7_base64: &'a str,
}

#[derive(Serialize)]
struct SignPdfRequest<'a> {
    pdf_base64: &'a str,
    pkcs7_base64: &'a str,
    metadata: &'a SignMetadata,
}

impl SignatureGateway for LexdocClient {
    fn generate_fiska_pdf(&self, request: &FiskaRequest) -> Result<String, GatewayError> {
        if request.executor_names.is_empty() && request.resolution.trim().is_empty() {
            return Err(GatewayError::InvalidPayload(
                "fiska sheet needs a resolution or at least one executor".into(),
            ));
        }
        info!(document = %request.document_name, "Requesting fiska sheet from LexDoc");
        self.post("/api/fiska/generate", request)?.require_pdf()
    }

    fn process_signed_fiska(
        &self,
        signed_pdf_base64: &str,
        pkcs7_base64: &str,
    ) -> Result<SignedArtifact, GatewayError> {
        validate_base64("signed PDF", signed_pdf_base64)?;
        validate_base64("PKCS7", pkcs7_base64)?;
        info!("Submitting signed fiska sheet to LexDoc");
        self.post(
            "/api/fiska/process",
            &ProcessSignedRequest {
                pdf_base64: signed_pdf_base64,
                pkcs7_base64,
            },
        )?
        .require_artifact()
    }

    fn sign_pdf(
        &self,
        pdf_base64: &str,
        pkcs7_base64: &str,
        metadata: &SignMetadata,
    ) -> Result<SignedArtifact, GatewayError> {
        validate_base64("PDF", pdf_base64)?;
        validate_base64("PKCS7", pkcs7_base64)?;
        info!(document = %metadata.document_name, "Submitting PKCS7 signature to LexDoc");
        self.post(
            "/api/pdf/sign",
            &SignPdfRequest {
                pdf_base64,
                pkcs7_base64,
                metadata,
            },
        )?
        .require_artifact()
    }
}

/// Reject obviously broken payloads before they travel.
fn validate_base64(label: &str, value: &str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::InvalidPayload(format!("{label} payload is empty")));
    }
    base64::engine::general_purpose::STANDARD
        .decode(value.trim())
        .map_err(|e| GatewayError::InvalidPayload(format!("{label} is not valid base64: {e}")))?;
    Ok(())
}

// ═══════════════════════════════════════════
// Mock
// ═══════════════════════════════════════════

/// Scripted gateway for tests: succeeds with canned artifacts, or
/// declines every call with a configured message. Records the last
/// fiska request behind a shared handle, so a clone kept outside a
/// `Box<dyn SignatureGateway>` still observes what the service sent.
#[derive(Clone)]
pub struct MockSignatureGateway {
    decline: Option<String>,
    last_fiska: std::sync::Arc<std::sync::Mutex<Option<FiskaRequest>>>,
}

impl MockSignatureGateway {
    pub fn new() -> Self {
        Self {
            decline: None,
            last_fiska: std::sync::Arc::default(),
        }
    }

    pub fn declining(message: &str) -> Self {
        Self {
            decline: Some(message.to_string()),
            last_fiska: std::sync::Arc::default(),
        }
    }

    pub fn last_fiska_request(&self) -> Option<FiskaRequest> {
        self.last_fiska
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check_decline(&self) -> Result<(), GatewayError> {
        match &self.decline {
            Some(message) => Err(GatewayError::Declined {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for MockSignatureGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureGateway for MockSignatureGateway {
    fn generate_fiska_pdf(&self, request: &FiskaRequest) -> Result<String, GatewayError> {
        *self.last_fiska.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());
        self.check_decline()?;
        Ok(base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 mock fiska sheet"))
    }

    fn process_signed_fiska(
        &self,
        _signed_pdf_base64: &str,
        _pkcs7_base64: &str,
    ) -> Result<SignedArtifact, GatewayError> {
        self.check_decline()?;
        Ok(SignedArtifact {
            pdf_base64: base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 mock qr sheet"),
            verification_url: "https://lexdoc.example/verify/MOCK".into(),
        })
    }

    fn sign_pdf(
        &self,
        _pdf_base64: &str,
        _pkcs7_base64: &str,
        _metadata: &SignMetadata,
    ) -> Result<SignedArtifact, GatewayError> {
        self.check_decline()?;
        Ok(SignedArtifact {
            pdf_base64: base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 mock signed"),
            verification_url: "https://lexdoc.example/verify/MOCK-SIGNED".into(),
        })
    }
}
