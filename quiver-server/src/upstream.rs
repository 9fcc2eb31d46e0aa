//! Origin-side HTTP client
//!
//! All live traffic goes through [`UpstreamClient`]: same-origin fetches are
//! resolved against the configured site origin, cross-origin pass-through
//! requests are sent to their target verbatim.

use axum::http::Uri;
use reqwest::Method;
use reqwest::header::{CACHE_CONTROL, HeaderMap, PRAGMA};
use std::time::Duration;
use tracing::debug;

use crate::core::{CachedResponse, QuiverError, Result};

/// Headers that describe the connection rather than the payload; never
/// stored and never forwarded
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// HTTP client pinned to the site origin the gateway fronts
pub struct UpstreamClient {
    origin: String,
    scheme: String,
    host: String,
    port: u16,
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(origin: &str, request_timeout_secs: u64) -> Result<Self> {
        let uri: Uri = origin
            .parse()
            .map_err(|_| QuiverError::InvalidRequest(format!("invalid upstream origin: {origin}")))?;
        let scheme = uri.scheme_str().unwrap_or("http").to_string();
        let host = uri
            .host()
            .ok_or_else(|| {
                QuiverError::InvalidRequest(format!("upstream origin has no host: {origin}"))
            })?
            .to_string();
        let port = uri.port_u16().unwrap_or_else(|| default_port(&scheme));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .map_err(|e| QuiverError::Internal(e.to_string()))?;

        Ok(Self {
            origin: origin.trim_end_matches('/').to_string(),
            scheme,
            host,
            port,
            client,
        })
    }

    /// Whether a request URI targets the configured origin. Origin-form URIs
    /// (no authority) are same-origin by construction; absolute-form URIs are
    /// compared by scheme, host, and port with default ports normalized.
    pub fn same_origin(&self, uri: &Uri) -> bool {
        match uri.host() {
            None => true,
            Some(host) => {
                let scheme = uri.scheme_str().unwrap_or("http");
                let port = uri.port_u16().unwrap_or_else(|| default_port(scheme));
                scheme == self.scheme && host.eq_ignore_ascii_case(&self.host) && port == self.port
            }
        }
    }

    /// Resolve a request URI to the absolute URL the fetch should hit
    pub fn absolute_url(&self, uri: &Uri) -> String {
        if uri.authority().is_some() {
            uri.to_string()
        } else {
            self.url_for(uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/"))
        }
    }

    /// Plain fetch of a same-origin path
    pub async fn fetch(&self, path_and_query: &str) -> Result<CachedResponse> {
        self.execute(self.client.get(self.url_for(path_and_query)))
            .await
    }

    /// Fetch bypassing intermediate HTTP caches (the network-first live
    /// attempt)
    pub async fn fetch_no_store(&self, path_and_query: &str) -> Result<CachedResponse> {
        let request = self
            .client
            .get(self.url_for(path_and_query))
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache");
        self.execute(request).await
    }

    /// Forward a request verbatim (cross-origin and non-GET pass-through)
    pub async fn forward(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<CachedResponse> {
        let mut filtered = HeaderMap::new();
        for (name, value) in headers.iter() {
            if !is_hop_by_hop(name.as_str()) && name.as_str() != "host" {
                filtered.append(name.clone(), value.clone());
            }
        }

        let mut request = self.client.request(method, url).headers(filtered);
        if !body.is_empty() {
            request = request.body(body);
        }
        self.execute(request).await
    }

    fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.origin, path_and_query)
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<CachedResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| QuiverError::Upstream(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = copy_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| QuiverError::Upstream(e.to_string()))?;

        debug!("upstream responded status={} bytes={}", status, body.len());
        Ok(CachedResponse::new(status, headers, body.to_vec()))
    }
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.contains(&name)
}

fn copy_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn default_port(scheme: &str) -> u16 {
    if scheme == "https" { 443 } else { 80 }
}
