use crate::error::{Error, Result};
use reqwest::{Certificate, Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Connection details shared by the Elasticsearch and Kibana clients
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl Endpoint {
    /// Requests go to the first configured address.
    pub fn new(
        addresses: &[String],
        username: Option<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = addresses
            .first()
            .map(|a| a.trim_end_matches('/').to_string())
            .ok_or_else(|| Error::Config("no addresses provided".to_string()))?;
        Ok(Self {
            base_url,
            username,
            password,
            timeout,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `prefix` followed by one path segment per ID, each percent-encoded so
    /// a `/` inside an ID cannot reach another endpoint.
    pub fn url_for(&self, prefix: &str, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(Error::InvalidResourceId(bad.to_string()));
        }

        let raw = self.url(prefix);
        let mut url =
            Url::parse(&raw).map_err(|e| Error::Config(format!("invalid URL {}: {}", raw, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("{} cannot carry a path", raw)))?
            .extend(segments);
        Ok(url)
    }

    /// Attach basic auth (only when both parts are set) and the timeout.
    pub fn prepare(&self, req: RequestBuilder, timeout: Duration) -> RequestBuilder {
        let req = req.timeout(timeout);
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                req.basic_auth(user, Some(pass))
            }
            _ => req,
        }
    }
}

/// Build an HTTP client honouring the CA bundle and insecure flag.
pub(crate) fn build_client(ca_cert: Option<&Path>, insecure: bool) -> Result<Client> {
    let mut builder = Client::builder();

    if insecure {
        builder = builder.danger_accept_invalid_certs(true);
    } else if let Some(path) = ca_cert {
        let pem = std::fs::read(path).map_err(|e| {
            Error::Config(format!("reading CA cert {}: {}", path.display(), e))
        })?;
        let cert = Certificate::from_pem(&pem)
            .map_err(|e| Error::Config(format!("failed to parse CA certificate: {}", e)))?;
        builder = builder.add_root_certificate(cert);
    }

    builder
        .build()
        .map_err(|e| Error::Config(format!("error creating HTTP client: {}", e)))
}

/// Send a request and return the body of a 2xx response.
///
/// Transport failures and non-2xx answers both become `Error::Remote`; the
/// latter keep the status and the raw body so the operator sees why the
/// remote refused.
pub(crate) async fn send(operation: &'static str, req: RequestBuilder) -> Result<String> {
    let resp = req
        .send()
        .await
        .map_err(|e| Error::transport(operation, e))?;

    let status = resp.status();
    debug!(operation, status = status.as_u16(), "Remote call returned");

    let body = resp
        .text()
        .await
        .map_err(|e| Error::transport(operation, e))?;

    if !status.is_success() {
        return Err(Error::Remote {
            operation,
            status: Some(status.as_u16()),
            message: body,
        });
    }

    Ok(body)
}

/// Send a request and decode a 2xx JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    operation: &'static str,
    req: RequestBuilder,
) -> Result<T> {
    let body = send(operation, req).await?;
    decode(operation, &body)
}

pub(crate) fn decode<T: DeserializeOwned>(operation: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::decode(operation, e.to_string()))
}
