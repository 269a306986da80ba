//! Public OID registry lookups over HTTP.
//!
//! None of these services offer a stable API; names are scraped from the
//! returned page with per-registry regexes. A 404 is a miss; any other
//! non-2xx status is reported as a source failure.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::LookupSource;
use crate::errors::SourceError;
use crate::models::resolution::SourceHit;

/// Known public identifier registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidRegistry {
    Alvestrand,
    OidRef,
    OidInfo,
    MibDepot,
    SnmpLink,
}

impl OidRegistry {
    /// Parse a configured source name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "alvestrand" => Some(Self::Alvestrand),
            "oidref" => Some(Self::OidRef),
            "oid-info" => Some(Self::OidInfo),
            "mib-depot" => Some(Self::MibDepot),
            "snmplink" => Some(Self::SnmpLink),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Alvestrand => "alvestrand",
            Self::OidRef => "oidref",
            Self::OidInfo => "oid-info",
            Self::MibDepot => "mib-depot",
            Self::SnmpLink => "snmplink",
        }
    }

    /// Scheme and host of the public registry.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Alvestrand => "https://www.alvestrand.no",
            Self::OidRef => "https://oidref.com",
            Self::OidInfo => "https://oid-info.com",
            Self::MibDepot => "https://www.mib-depot.com",
            Self::SnmpLink => "https://www.snmplink.org",
        }
    }

    /// Request path and query for `identifier`.
    pub fn path(&self, identifier: &str) -> String {
        match self {
            Self::Alvestrand => format!("/objectid/{identifier}.html"),
            Self::OidRef => format!("/{identifier}"),
            Self::OidInfo => format!("/get/{identifier}"),
            Self::MibDepot => format!("/cgi-bin/getmib.cgi?oid={identifier}"),
            Self::SnmpLink => format!("/oid/{}.html", identifier.replace('.', "-")),
        }
    }

    pub fn url(&self, identifier: &str) -> String {
        format!("{}{}", self.default_base_url(), self.path(identifier))
    }

    /// Pull a name (and description, if present) out of a response body.
    pub fn extract(&self, body: &str) -> Option<SourceHit> {
        let name = match self {
            Self::Alvestrand => capture(&ALVESTRAND_H1, body, 2)
                .or_else(|| capture(&ALVESTRAND_TITLE, body, 1)),
            Self::OidRef => capture(&H1, body, 1).or_else(|| capture(&TITLE, body, 1)),
            Self::OidInfo => {
                return extract_json(body).or_else(|| capture(&TITLE, body, 1).map(SourceHit::named));
            }
            Self::MibDepot => capture(&MIB_DEPOT_OID, body, 1),
            Self::SnmpLink => capture(&H1, body, 1),
        }?;

        let description = match self {
            Self::Alvestrand => capture(&ALVESTRAND_DESC, body, 1),
            Self::OidRef | Self::SnmpLink => capture(&PARAGRAPH, body, 1),
            Self::MibDepot => capture(&MIB_DEPOT_DESC, body, 1),
            Self::OidInfo => None,
        };

        Some(SourceHit { name, description })
    }
}

static TITLE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<title>([^<]+)</title>"));
static H1: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<h1[^>]*>([^<]+)</h1>"));
static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<p[^>]*>([^<]+)</p>"));
static ALVESTRAND_H1: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)<h1[^>]*>([^-<]+) - ([^<]+)</h1>"));
static ALVESTRAND_TITLE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)<title>OID description for [^-]+ - ([^<]+)</title>"));
static ALVESTRAND_DESC: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)<strong>OID description:</strong><br>\s*([^<]+)"));
static MIB_DEPOT_OID: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)OID:\s*([^\s<]+)"));
static MIB_DEPOT_DESC: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)Description[:\s]+([^<\n]+)"));

/// Compile a literal, known-good pattern.
fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static lookup pattern must compile")
}

fn capture(regex: &Regex, body: &str, group: usize) -> Option<String> {
    regex
        .captures(body)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_json(body: &str) -> Option<SourceHit> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let name = value.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let description = value
        .get("description")
        .and_then(|d| d.as_str())
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    Some(SourceHit {
        name: name.to_string(),
        description,
    })
}

/// HTTP lookup against one public registry.
#[derive(Debug, Clone)]
pub struct HttpLookup {
    registry: OidRegistry,
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpLookup {
    pub fn new(registry: OidRegistry, client: reqwest::Client) -> Self {
        Self {
            registry,
            client,
            base_url: None,
        }
    }

    /// Send requests to `base_url` instead of the registry's public host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    fn request_url(&self, identifier: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}{}", self.registry.path(identifier)),
            None => self.registry.url(identifier),
        }
    }
}

/// Shared client for all HTTP sources. Per-source timeouts are applied by the chain.
pub fn build_client(user_agent: &str) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().user_agent(user_agent).build()
}

#[async_trait]
impl LookupSource for HttpLookup {
    fn name(&self) -> &str {
        self.registry.name()
    }

    async fn lookup(&self, identifier: &str) -> Result<Option<SourceHit>, SourceError> {
        let response = self.client.get(self.request_url(identifier)).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(self.registry.extract(&body))
    }
}
