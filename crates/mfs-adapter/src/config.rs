//! Adapter configuration
//!
//! `OperationalConfig` is the defaults tree an adapter is created with.
//! `ConfigOverride` is what a single call may supply; every field is optional
//! and option groups merge per sub-key. Unknown keys in a deserialized
//! override are ignored.

use crate::error::ValidationError;
use crate::gateway::{GatewayConfig, DEFAULT_GATEWAY};
use serde::{Deserialize, Serialize};

/// Pinning options
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinOptions {
    /// Pin against a remote service instead of locally
    pub remote: bool,
    /// Remote pinning service name, as registered on the node
    pub service: Option<String>,
}

impl PinOptions {
    /// Remote service to pin against, if remote pinning is usable
    pub fn remote_service(&self) -> Option<&str> {
        match self.service.as_deref() {
            Some(service) if self.remote && !service.is_empty() => Some(service),
            _ => None,
        }
    }
}

/// IPNS publish options
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishOptions {
    /// Record lifetime (e.g., "24h", "60s")
    pub lifetime: String,
    /// Publish without touching the network
    pub offline: bool,
    /// Allow publishing while the node is offline
    pub allow_offline: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            lifetime: "24h".to_string(),
            offline: false,
            allow_offline: true,
        }
    }
}

/// Gateway options, validated into a `GatewayConfig` at the point of use
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayOptions {
    /// "ipfs" or "ipns"
    pub service: String,
    /// "path", "subdomain" or "dnslink"
    pub style: String,
    /// Gateway host
    pub url: String,
    /// DNSLink domain
    pub domain: Option<String>,
    /// Serve dnslink URLs from the domain rather than through the gateway
    pub prefer_domain: bool,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            service: "ipfs".to_string(),
            style: "path".to_string(),
            url: DEFAULT_GATEWAY.to_string(),
            domain: None,
            prefer_domain: true,
        }
    }
}

/// Process-wide adapter defaults
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationalConfig {
    /// Pin content when it is added
    pub auto_pin: bool,
    pub pin_options: PinOptions,
    /// Link added content into MFS at the written path
    pub auto_copy: bool,
    /// Replace an existing MFS entry when linking
    pub auto_override: bool,
    /// Publish added content to IPNS
    pub auto_publish: bool,
    pub publish_options: PublishOptions,
    pub gateway: GatewayOptions,
    /// IPNS name to use for gateway URLs instead of publishing
    pub ipns: Option<String>,
    /// Keystore entry to publish with instead of a derived one
    pub key: Option<String>,
}

impl Default for OperationalConfig {
    fn default() -> Self {
        Self {
            auto_pin: true,
            pin_options: PinOptions::default(),
            auto_copy: true,
            auto_override: true,
            auto_publish: false,
            publish_options: PublishOptions::default(),
            gateway: GatewayOptions::default(),
            ipns: None,
            key: None,
        }
    }
}

impl OperationalConfig {
    /// Check the parts that can be invalid (the gateway service and style)
    pub fn validate(&self) -> Result<(), ValidationError> {
        GatewayConfig::from_options(&self.gateway).map(|_| ())
    }

    /// Effective configuration for one call. `self` is left untouched.
    pub fn merge(&self, overrides: &ConfigOverride) -> OperationalConfig {
        let pin = overrides.pin_options.as_ref();
        let publish = overrides.publish_options.as_ref();
        let gateway = overrides.gateway.as_ref();

        OperationalConfig {
            auto_pin: overrides.auto_pin.unwrap_or(self.auto_pin),
            pin_options: PinOptions {
                remote: pin.and_then(|p| p.remote).unwrap_or(self.pin_options.remote),
                service: pin
                    .and_then(|p| p.service.clone())
                    .or_else(|| self.pin_options.service.clone()),
            },
            auto_copy: overrides.auto_copy.unwrap_or(self.auto_copy),
            auto_override: overrides.auto_override.unwrap_or(self.auto_override),
            auto_publish: overrides.auto_publish.unwrap_or(self.auto_publish),
            publish_options: PublishOptions {
                lifetime: publish
                    .and_then(|p| p.lifetime.clone())
                    .unwrap_or_else(|| self.publish_options.lifetime.clone()),
                offline: publish
                    .and_then(|p| p.offline)
                    .unwrap_or(self.publish_options.offline),
                allow_offline: publish
                    .and_then(|p| p.allow_offline)
                    .unwrap_or(self.publish_options.allow_offline),
            },
            gateway: GatewayOptions {
                service: gateway
                    .and_then(|g| g.service.clone())
                    .unwrap_or_else(|| self.gateway.service.clone()),
                style: gateway
                    .and_then(|g| g.style.clone())
                    .unwrap_or_else(|| self.gateway.style.clone()),
                url: gateway
                    .and_then(|g| g.url.clone())
                    .unwrap_or_else(|| self.gateway.url.clone()),
                domain: gateway
                    .and_then(|g| g.domain.clone())
                    .or_else(|| self.gateway.domain.clone()),
                prefer_domain: gateway
                    .and_then(|g| g.prefer_domain)
                    .unwrap_or(self.gateway.prefer_domain),
            },
            ipns: overrides.ipns.clone().or_else(|| self.ipns.clone()),
            key: overrides.key.clone().or_else(|| self.key.clone()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinOptionsOverride {
    pub remote: Option<bool>,
    pub service: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishOptionsOverride {
    pub lifetime: Option<String>,
    pub offline: Option<bool>,
    pub allow_offline: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayOptionsOverride {
    pub service: Option<String>,
    pub style: Option<String>,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub prefer_domain: Option<bool>,
}

/// Per-call configuration. `None` means "use the default".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverride {
    pub auto_pin: Option<bool>,
    pub pin_options: Option<PinOptionsOverride>,
    pub auto_copy: Option<bool>,
    pub auto_override: Option<bool>,
    pub auto_publish: Option<bool>,
    pub publish_options: Option<PublishOptionsOverride>,
    pub gateway: Option<GatewayOptionsOverride>,
    pub ipns: Option<String>,
    pub key: Option<String>,
}

impl ConfigOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_pin(mut self, enabled: bool) -> Self {
        self.auto_pin = Some(enabled);
        self
    }

    pub fn remote_pin(mut self, service: impl Into<String>) -> Self {
        let pin = self.pin_options.get_or_insert_with(Default::default);
        pin.remote = Some(true);
        pin.service = Some(service.into());
        self
    }

    pub fn auto_copy(mut self, enabled: bool) -> Self {
        self.auto_copy = Some(enabled);
        self
    }

    pub fn auto_override(mut self, enabled: bool) -> Self {
        self.auto_override = Some(enabled);
        self
    }

    pub fn auto_publish(mut self, enabled: bool) -> Self {
        self.auto_publish = Some(enabled);
        self
    }

    pub fn lifetime(mut self, lifetime: impl Into<String>) -> Self {
        self.publish_options
            .get_or_insert_with(Default::default)
            .lifetime = Some(lifetime.into());
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.publish_options
            .get_or_insert_with(Default::default)
            .offline = Some(offline);
        self
    }

    pub fn gateway_service(mut self, service: impl Into<String>) -> Self {
        self.gateway.get_or_insert_with(Default::default).service = Some(service.into());
        self
    }

    pub fn gateway_style(mut self, style: impl Into<String>) -> Self {
        self.gateway.get_or_insert_with(Default::default).style = Some(style.into());
        self
    }

    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway.get_or_insert_with(Default::default).url = Some(url.into());
        self
    }

    pub fn gateway_domain(mut self, domain: impl Into<String>) -> Self {
        self.gateway.get_or_insert_with(Default::default).domain = Some(domain.into());
        self
    }

    pub fn prefer_domain(mut self, prefer: bool) -> Self {
        self.gateway.get_or_insert_with(Default::default).prefer_domain = Some(prefer);
        self
    }

    pub fn ipns(mut self, name: impl Into<String>) -> Self {
        self.ipns = Some(name.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}
