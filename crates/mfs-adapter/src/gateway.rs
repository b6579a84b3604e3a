//! Gateway URL resolution
//!
//! Turns a CID or IPNS name into an `https://` URL on a public or private
//! gateway, in one of three addressing styles:
//!
//! | style       | host                          | path                           |
//! |-------------|-------------------------------|--------------------------------|
//! | `path`      | `{gateway}`                   | `{service}/{identifier}/{file}`|
//! | `subdomain` | `{identifier}.{service}.{gateway}` | `{file}`                  |
//! | `dnslink`   | `{domain}` or `{gateway}`     | `[ipns/{domain}/]{path}/{file}`|

use crate::config::GatewayOptions;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gateway used when none is configured
pub const DEFAULT_GATEWAY: &str = "ipfs.io";

/// Namespace the gateway serves content from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayService {
    Ipfs,
    Ipns,
}

impl GatewayService {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayService::Ipfs => "ipfs",
            GatewayService::Ipns => "ipns",
        }
    }

    pub(crate) fn identifier_name(&self) -> &'static str {
        match self {
            GatewayService::Ipfs => "a CID",
            GatewayService::Ipns => "an IPNS identifier",
        }
    }
}

impl fmt::Display for GatewayService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayService {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ipfs" => Ok(GatewayService::Ipfs),
            "ipns" => Ok(GatewayService::Ipns),
            _ => Err(ValidationError::UnsupportedService(s.to_string())),
        }
    }
}

/// How the identifier is encoded into the URL
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStyle {
    Path,
    Subdomain,
    Dnslink,
}

impl GatewayStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayStyle::Path => "path",
            GatewayStyle::Subdomain => "subdomain",
            GatewayStyle::Dnslink => "dnslink",
        }
    }
}

impl fmt::Display for GatewayStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayStyle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "path" => Ok(GatewayStyle::Path),
            "subdomain" => Ok(GatewayStyle::Subdomain),
            "dnslink" => Ok(GatewayStyle::Dnslink),
            _ => Err(ValidationError::UnsupportedStyle(s.to_string())),
        }
    }
}

/// Validated gateway settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    service: GatewayService,
    style: GatewayStyle,
    host: String,
    domain: Option<String>,
    prefer_domain: bool,
}

impl GatewayConfig {
    /// Validate service and style names; the host defaults to `ipfs.io`
    pub fn new(service: &str, style: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            service: service.parse()?,
            style: style.parse()?,
            host: DEFAULT_GATEWAY.to_string(),
            domain: None,
            prefer_domain: true,
        })
    }

    /// Build from the `gateway` option group
    pub fn from_options(options: &GatewayOptions) -> Result<Self, ValidationError> {
        let config = Self::new(&options.service, &options.style)?
            .with_host(&options.url)
            .with_prefer_domain(options.prefer_domain);

        Ok(match options.domain.as_deref() {
            Some(domain) => config.with_domain(domain),
            None => config,
        })
    }

    pub fn with_host(mut self, host: &str) -> Self {
        let host = host.trim_matches('/');
        self.host = if host.is_empty() {
            DEFAULT_GATEWAY.to_string()
        } else {
            host.to_string()
        };
        self
    }

    /// An empty domain leaves the domain unset
    pub fn with_domain(mut self, domain: &str) -> Self {
        let domain = domain.trim_matches('/');
        self.domain = (!domain.is_empty()).then(|| domain.to_string());
        self
    }

    pub fn with_prefer_domain(mut self, prefer_domain: bool) -> Self {
        self.prefer_domain = prefer_domain;
        self
    }

    pub fn service(&self) -> GatewayService {
        self.service
    }

    pub fn style(&self) -> GatewayStyle {
        self.style
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn prefer_domain(&self) -> bool {
        self.prefer_domain
    }
}

/// Inputs of a single resolution
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionRequest<'a> {
    pub path: Option<&'a str>,
    pub file: Option<&'a str>,
    pub cid: Option<&'a str>,
    pub ipns_name: Option<&'a str>,
}

impl<'a> ResolutionRequest<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: &'a str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn file(mut self, file: &'a str) -> Self {
        self.file = Some(file);
        self
    }

    pub fn cid(mut self, cid: &'a str) -> Self {
        self.cid = Some(cid);
        self
    }

    pub fn ipns_name(mut self, ipns_name: Option<&'a str>) -> Self {
        self.ipns_name = ipns_name;
        self
    }
}

/// Resolves identifiers into gateway URLs. Pure: no I/O, no state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayResolver {
    config: GatewayConfig,
}

impl GatewayResolver {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub fn from_options(options: &GatewayOptions) -> Result<Self, ValidationError> {
        GatewayConfig::from_options(options).map(Self::new)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Whether resolution needs a CID
    pub fn requires_cid(&self) -> bool {
        self.config.service == GatewayService::Ipfs && self.config.style != GatewayStyle::Dnslink
    }

    /// Whether resolution needs an IPNS name
    pub fn requires_ipns_name(&self) -> bool {
        self.config.service == GatewayService::Ipns && self.config.style != GatewayStyle::Dnslink
    }

    /// Fail the same way `resolve` would, before anything is fetched
    pub fn validate(&self, request: &ResolutionRequest<'_>) -> Result<(), ValidationError> {
        self.identifier(request).map(|_| ())
    }

    pub fn resolve(&self, request: &ResolutionRequest<'_>) -> Result<String, ValidationError> {
        let identifier = self.identifier(request)?;

        Ok(format!(
            "https://{}/{}",
            self.resolve_host(identifier),
            self.resolve_path(request, identifier)
        ))
    }

    /// Identifier for the configured service; empty for dnslink
    fn identifier<'r>(&self, request: &ResolutionRequest<'r>) -> Result<&'r str, ValidationError> {
        let (service, style) = (self.config.service, self.config.style);

        if style == GatewayStyle::Dnslink {
            if self.config.domain.is_none() {
                return Err(ValidationError::MissingDomain { style });
            }
            return Ok("");
        }

        let identifier = match service {
            GatewayService::Ipfs => request.cid,
            GatewayService::Ipns => request.ipns_name,
        };
        identifier.ok_or(ValidationError::MissingIdentifier { service, style })
    }

    fn resolve_host(&self, identifier: &str) -> String {
        match (self.config.style, self.config.domain.as_deref()) {
            (GatewayStyle::Subdomain, _) => {
                format!("{}.{}.{}", identifier, self.config.service, self.config.host)
            }
            (GatewayStyle::Dnslink, Some(domain)) if self.config.prefer_domain => domain.to_string(),
            _ => self.config.host.clone(),
        }
    }

    fn resolve_path(&self, request: &ResolutionRequest<'_>, identifier: &str) -> String {
        let file = trim_separators(request.file);

        match self.config.style {
            GatewayStyle::Path => format!("{}/{}/{}", self.config.service, identifier, file),
            GatewayStyle::Subdomain => file.to_string(),
            GatewayStyle::Dnslink => {
                let resource = join_segments(&[trim_separators(request.path), file]);
                match self.config.domain.as_deref() {
                    Some(domain) if !self.config.prefer_domain => {
                        join_segments(&["ipns", domain, &resource])
                    }
                    _ => resource,
                }
            }
        }
    }
}

fn trim_separators(segment: Option<&str>) -> &str {
    segment.unwrap_or("").trim_matches('/')
}

/// Join non-empty segments with a single separator
fn join_segments(segments: &[&str]) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}
