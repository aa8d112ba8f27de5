//! HTTP client for the SUNAT submission endpoint.
//!
//! The real wire format is out of scope; the document travels as an
//! opaque JSON POST and the answer carries an estado plus the signed
//! artifact. Transport failures and 5xx answers map to
//! [`AuthorityError::Unreachable`] so callers keep the comprobante in
//! SENT and retry later.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use emisor_shared::config::SunatConfig;

use super::{AuthorityClient, AuthorityError, SubmissionOutcome};
use crate::emission::DocumentPayload;

/// Reqwest-backed authority client with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct SunatClient {
    http: reqwest::Client,
    base_url: String,
}

impl SunatClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &SunatConfig) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AuthorityClient for SunatClient {
    async fn submit(&self, payload: &DocumentPayload) -> Result<SubmissionOutcome, AuthorityError> {
        let url = format!("{}/comprobantes", self.base_url);
        debug!(serie_numero = %payload.serie_numero, %url, "Submitting comprobante");

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AuthorityError::Unreachable(format!(
                "authority answered HTTP {status}"
            )));
        }

        let body: SunatResponse = response
            .json()
            .await
            .map_err(|e| AuthorityError::InvalidResponse(e.to_string()))?;

        interpret(body)
    }
}

fn transport_error(e: reqwest::Error) -> AuthorityError {
    if e.is_timeout() {
        AuthorityError::Unreachable(format!("submission timed out: {e}"))
    } else {
        AuthorityError::Unreachable(e.to_string())
    }
}

/// Raw answer from the submission endpoint.
#[derive(Debug, Deserialize)]
struct SunatResponse {
    estado: String,
    #[serde(default)]
    xml: Option<String>,
    #[serde(default)]
    numero_autorizacion: Option<String>,
    #[serde(default)]
    mensaje: Option<String>,
}

fn interpret(response: SunatResponse) -> Result<SubmissionOutcome, AuthorityError> {
    match response.estado.to_uppercase().as_str() {
        "ACEPTADO" | "AUTORIZADO" => {
            let artifact_xml = response.xml.ok_or_else(|| {
                AuthorityError::InvalidResponse(
                    "accepted answer without the signed artifact".to_string(),
                )
            })?;
            Ok(SubmissionOutcome::Accepted {
                artifact_xml,
                tracking_id: response.numero_autorizacion,
            })
        }
        "RECHAZADO" | "NO AUTORIZADO" => Ok(SubmissionOutcome::Rejected {
            reason: response
                .mensaje
                .unwrap_or_else(|| "rejected without a reason".to_string()),
        }),
        other => Err(AuthorityError::InvalidResponse(format!(
            "unknown estado: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(estado: &str, xml: Option<&str>, mensaje: Option<&str>) -> SunatResponse {
        SunatResponse {
            estado: estado.to_string(),
            xml: xml.map(String::from),
            numero_autorizacion: Some("AUT-001".to_string()),
            mensaje: mensaje.map(String::from),
        }
    }

    #[test]
    fn test_interpret_accepted_requires_artifact() {
        let outcome = interpret(response("ACEPTADO", Some("<xml/>"), None)).unwrap();
        assert_eq!(
            outcome,
            SubmissionOutcome::Accepted {
                artifact_xml: "<xml/>".to_string(),
                tracking_id: Some("AUT-001".to_string()),
            }
        );

        let err = interpret(response("AUTORIZADO", None, None)).unwrap_err();
        assert!(matches!(err, AuthorityError::InvalidResponse(_)));
    }

    #[test]
    fn test_interpret_rejected_carries_reason() {
        let outcome =
            interpret(response("RECHAZADO", None, Some("RUC inactivo"))).unwrap();
        assert_eq!(
            outcome,
            SubmissionOutcome::Rejected {
                reason: "RUC inactivo".to_string(),
            }
        );
    }

    #[test]
    fn test_interpret_unknown_estado_is_not_terminal() {
        let err = interpret(response("EN PROCESO", None, None)).unwrap_err();
        assert!(matches!(err, AuthorityError::InvalidResponse(_)));
    }

    #[test]
    fn test_interpret_is_case_insensitive() {
        assert!(interpret(response("aceptado", Some("<xml/>"), None)).is_ok());
    }
}
