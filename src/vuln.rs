//! Vulnerability database lookup keyed by banner fingerprint.
//!
//! Banners are reduced to a coarse product keyword, which is then searched
//! in a public CVE database. Lookup failures leave the port with no hits;
//! they never affect the scan itself.

use crate::banner::BannerMap;
use crate::error::{LookupError, LookupResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Default search endpoint; the service keyword is appended.
pub const DEFAULT_API_BASE: &str = "https://cve.circl.lu/api/search/";

/// At most this many entries are kept per port.
pub const MAX_HITS: usize = 5;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(6);

/// Port to raw CVE entries.
pub type CveMap = BTreeMap<u16, Vec<Value>>;

/// Coarse product keyword for a banner, first match wins.
pub fn service_from_banner(banner: &str) -> Option<&'static str> {
    let b = banner.to_lowercase();
    if b.contains("apache") {
        Some("apache")
    } else if b.contains("nginx") {
        Some("nginx")
    } else if b.contains("iis") {
        Some("iis")
    } else if b.contains("ssh") {
        Some("openssh")
    } else if b.contains("mysql") || b.contains("mariadb") {
        Some("mysql")
    } else if b.contains("tomcat") {
        Some("tomcat")
    } else {
        None
    }
}

/// A vulnerability database collaborator.
#[async_trait]
pub trait VulnLookup: Send + Sync {
    /// One entry per banner port; ports without a fingerprint or without
    /// hits map to an empty list.
    async fn check_services(&self, banners: &BannerMap) -> CveMap;
}

/// Looks services up in the CIRCL CVE search API.
pub struct CirclLookup {
    client: reqwest::Client,
    api_base: String,
}

impl CirclLookup {
    pub fn new(api_base: impl Into<String>) -> LookupResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("reconlab/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }

    async fn search(&self, service: &str) -> LookupResult<Vec<Value>> {
        let url = format!("{}{}", self.api_base, service);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }
        let body: Value = response.json().await?;
        Ok(truncate_hits(body))
    }
}

#[async_trait]
impl VulnLookup for CirclLookup {
    async fn check_services(&self, banners: &BannerMap) -> CveMap {
        let mut results = CveMap::new();
        for (&port, banner) in banners {
            let hits = match service_from_banner(banner) {
                Some(service) => match self.search(service).await {
                    Ok(hits) => {
                        debug!(port, service, hits = hits.len(), "CVE search done");
                        hits
                    }
                    Err(e) => {
                        warn!(port, service, error = %e, "CVE search failed");
                        Vec::new()
                    }
                },
                None => Vec::new(),
            };
            results.insert(port, hits);
        }
        results
    }
}

/// Skips the database entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLookup;

#[async_trait]
impl VulnLookup for OfflineLookup {
    async fn check_services(&self, banners: &BannerMap) -> CveMap {
        banners.keys().map(|&port| (port, Vec::new())).collect()
    }
}

/// The search API answers with a JSON array; some deployments wrap it in
/// an object under `results` or `data`.
fn truncate_hits(body: Value) -> Vec<Value> {
    let list = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results").or_else(|| map.remove("data")) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    list.into_iter().take(MAX_HITS).collect()
}
