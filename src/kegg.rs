use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, error, info};

use crate::domain::{OrganismCode, PathwayCode};
use crate::error::KeggError;

pub const KEGG_REST_BASE: &str = "https://rest.kegg.jp";

pub fn pathway_list_url(organism: &str) -> String {
    Endpoints::default().pathway_list_url(organism)
}

pub fn pathway_kgml_url(pathway: &str) -> String {
    Endpoints::default().pathway_kgml_url(pathway)
}

pub fn pathway_text_url(pathway: &str) -> String {
    Endpoints::default().pathway_text_url(pathway)
}

/// URL builders for the KEGG REST operations used by the exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pathway_list_url(&self, organism: &str) -> String {
        format!("{}/list/pathway/{}", self.base_url, organism)
    }

    pub fn pathway_kgml_url(&self, pathway: &str) -> String {
        format!("{}/get/{}/kgml", self.base_url, pathway)
    }

    pub fn pathway_text_url(&self, pathway: &str) -> String {
        format!("{}/get/{}", self.base_url, pathway)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(KEGG_REST_BASE)
    }
}

pub trait KeggClient: Send + Sync {
    fn fetch_pathway_list(&self, organism: &OrganismCode) -> Result<String, KeggError>;
    fn fetch_pathway_kgml(&self, pathway: &PathwayCode) -> Result<String, KeggError>;
}

#[derive(Clone)]
pub struct KeggHttpClient {
    client: Client,
    endpoints: Endpoints,
}

impl KeggHttpClient {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, KeggError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("keggpull/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KeggError::KeggHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| KeggError::KeggHttp(err.to_string()))?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Issues `url` and reports whether KEGG accepts the query, without keeping the body.
    pub fn check_query(&self, url: &str) -> Result<bool, KeggError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| KeggError::KeggHttp(err.to_string()))?;
        Ok(rest_response_validator(response.status().as_u16(), url))
    }

    fn get_text(&self, url: &str) -> Result<(u16, String), KeggError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| KeggError::KeggHttp(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Ok((status.as_u16(), String::new()));
        }
        let body = response
            .text()
            .map_err(|err| KeggError::KeggHttp(err.to_string()))?;
        Ok((status.as_u16(), body))
    }
}

impl KeggClient for KeggHttpClient {
    fn fetch_pathway_list(&self, organism: &OrganismCode) -> Result<String, KeggError> {
        let url = self.endpoints.pathway_list_url(organism.as_str());
        info!("Querying {organism} with {url}");
        let (status, body) = self.get_text(&url)?;
        if !(200..300).contains(&status) {
            error!("Request failed with status code {status}");
            return Err(KeggError::ListFetchFailed {
                organism: organism.to_string(),
                status,
            });
        }
        Ok(body)
    }

    fn fetch_pathway_kgml(&self, pathway: &PathwayCode) -> Result<String, KeggError> {
        let url = self.endpoints.pathway_kgml_url(pathway.as_str());
        let (status, body) = self.get_text(&url)?;
        if !(200..300).contains(&status) {
            return Err(KeggError::MarkupFetchFailed {
                pathway: pathway.to_string(),
                status,
            });
        }
        Ok(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Valid,
    /// KEGG answers 400 for malformed queries and 404 for unknown identifiers.
    Invalid,
    Unexpected(u16),
}

pub fn classify_status(status: u16) -> QueryStatus {
    match status {
        200 => QueryStatus::Valid,
        400 | 404 => QueryStatus::Invalid,
        other => QueryStatus::Unexpected(other),
    }
}

pub fn rest_response_validator(status: u16, url: &str) -> bool {
    match classify_status(status) {
        QueryStatus::Valid => {
            info!("Query: {url} is valid");
            true
        }
        QueryStatus::Invalid => {
            info!("Query: {url} is invalid");
            false
        }
        QueryStatus::Unexpected(status) => {
            error!("Server responded with status code:{status} to {url}");
            false
        }
    }
}

/// Parses the `list/pathway/{org}` body into pathway codes, keeping server order.
pub fn parse_pathway_list(text: &str) -> Result<Vec<PathwayCode>, KeggError> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let field = line.split('\t').next().unwrap_or_default();
            field.strip_prefix("path:").unwrap_or(field).parse()
        })
        .collect()
}
