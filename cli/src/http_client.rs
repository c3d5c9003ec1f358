use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{Settings, TokenAuth};
use crate::endpoint::Endpoint;
use crate::error::TransportError;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Status and full body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResult {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResult {
    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// One-shot authenticated POST client. TLS configuration is built per call.
#[derive(Debug, Clone)]
pub struct Client {
    ca_cert: Option<PathBuf>,
    auth: Option<TokenAuth>,
    timeout: Duration,
}

impl Client {
    pub fn new(ca_cert: Option<PathBuf>, auth: Option<TokenAuth>, timeout: Duration) -> Self {
        Self {
            ca_cert,
            auth,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.ca_cert.clone(),
            settings.auth.clone(),
            settings.timeout,
        )
    }

    pub async fn post(
        &self,
        endpoint: &Endpoint,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<TransportResult, TransportError> {
        post(
            endpoint,
            self.ca_cert.as_deref(),
            self.auth.as_ref(),
            body,
            content_type,
            self.timeout,
        )
        .await
    }
}

/// Sends `body` to `endpoint` and returns whatever the server answered.
/// Only connectivity, TLS and protocol problems are errors; there is no retry.
pub async fn post(
    endpoint: &Endpoint,
    ca_cert: Option<&Path>,
    auth: Option<&TokenAuth>,
    body: Vec<u8>,
    content_type: &str,
    timeout: Duration,
) -> Result<TransportResult, TransportError> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout);
    if let Some(path) = ca_cert {
        for cert in load_ca_cert(path)? {
            builder = builder.add_root_certificate(cert);
        }
    }
    let http = builder.build().map_err(TransportError::Build)?;

    let mut headers = HeaderMap::new();
    let (name, value) = header_kv(CONTENT_TYPE.as_str(), content_type)?;
    headers.insert(name, value);
    if let Some(auth) = auth {
        let (name, value) = auth_header(auth)?;
        headers.insert(name, value);
    }

    tracing::debug!(url = %endpoint, bytes = body.len(), "POST");

    let resp = http
        .post(endpoint.url().clone())
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(TransportError::Send)?;

    let status = resp.status().as_u16();
    let body = resp
        .bytes()
        .await
        .map_err(TransportError::Body)?
        .to_vec();

    tracing::debug!(status, bytes = body.len(), "response received");
    Ok(TransportResult { status, body })
}

const PEM_MARKER: &[u8] = b"-----BEGIN";

/// Reads every certificate in a CA file. PEM is recognised by its `-----BEGIN`
/// marker anywhere in the file, so leading whitespace and OpenSSL preambles
/// are fine; anything else is treated as a single DER certificate.
fn load_ca_cert(path: &Path) -> Result<Vec<reqwest::Certificate>, TransportError> {
    let bytes = std::fs::read(path).map_err(|source| TransportError::CaCertRead {
        path: path.to_path_buf(),
        source,
    })?;
    let invalid = |source| TransportError::CaCertInvalid {
        path: path.to_path_buf(),
        source,
    };

    let is_pem = bytes
        .windows(PEM_MARKER.len())
        .any(|w| w == PEM_MARKER);
    if !is_pem {
        return Ok(vec![reqwest::Certificate::from_der(&bytes).map_err(invalid)?]);
    }

    let certs = reqwest::Certificate::from_pem_bundle(&bytes).map_err(invalid)?;
    if certs.is_empty() {
        return Err(TransportError::CaCertEmpty {
            path: path.to_path_buf(),
        });
    }
    Ok(certs)
}

fn auth_header(auth: &TokenAuth) -> Result<(HeaderName, HeaderValue), TransportError> {
    match auth {
        TokenAuth::Bearer(token) => {
            let (name, mut value) =
                header_kv(AUTHORIZATION.as_str(), &format!("Bearer {}", token))?;
            value.set_sensitive(true);
            Ok((name, value))
        }
        TokenAuth::Header { name, value } => {
            let (name, mut value) = header_kv(name, value)?;
            value.set_sensitive(true);
            Ok((name, value))
        }
    }
}

pub fn header_kv(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), TransportError> {
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        TransportError::InvalidHeader(format!("invalid header name {:?}: {}", name, e))
    })?;
    let value = HeaderValue::from_str(value).map_err(|e| {
        TransportError::InvalidHeader(format!("invalid value for header {}: {}", name, e))
    })?;
    Ok((name, value))
}
