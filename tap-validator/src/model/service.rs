//! TAP service identity and its derived endpoint URLs.

use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the display name generated for unnamed services.
const GENERATED_NAME_LEN: usize = 16;

/// The endpoints exposed by a TAP service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Synchronous,
    Asynchronous,
    Tables,
    Capabilities,
    Availability,
}

impl Endpoint {
    /// Path suffix appended to the service base URL.
    pub fn suffix(&self) -> &'static str {
        match self {
            Endpoint::Synchronous => "/sync",
            Endpoint::Asynchronous => "/async",
            Endpoint::Tables => "/tables",
            Endpoint::Capabilities => "/capabilities",
            Endpoint::Availability => "/availability",
        }
    }

    /// Short name used in reports ("tables", "availability", ...).
    pub fn name(&self) -> &'static str {
        &self.suffix()[1..]
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The endpoint URLs of a TAP service, computed once from the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TapEndpoints {
    synchronous: String,
    asynchronous: String,
    tables: String,
    capabilities: String,
    availability: String,
}

impl TapEndpoints {
    fn derive(url: &str) -> Self {
        Self {
            synchronous: format!("{url}{}", Endpoint::Synchronous.suffix()),
            asynchronous: format!("{url}{}", Endpoint::Asynchronous.suffix()),
            tables: format!("{url}{}", Endpoint::Tables.suffix()),
            capabilities: format!("{url}{}", Endpoint::Capabilities.suffix()),
            availability: format!("{url}{}", Endpoint::Availability.suffix()),
        }
    }

    pub fn synchronous(&self) -> &str {
        &self.synchronous
    }

    pub fn asynchronous(&self) -> &str {
        &self.asynchronous
    }

    pub fn tables(&self) -> &str {
        &self.tables
    }

    pub fn capabilities(&self) -> &str {
        &self.capabilities
    }

    pub fn availability(&self) -> &str {
        &self.availability
    }

    /// Looks up an endpoint URL by kind.
    pub fn get(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Synchronous => self.synchronous(),
            Endpoint::Asynchronous => self.asynchronous(),
            Endpoint::Tables => self.tables(),
            Endpoint::Capabilities => self.capabilities(),
            Endpoint::Availability => self.availability(),
        }
    }
}

/// A remote TAP service.
///
/// The URL is stored verbatim; no validation or normalization (such as
/// stripping a trailing slash) is applied, so the endpoints are exactly
/// `url + suffix`. Deserializing reads only `url` and `name` and derives the
/// endpoints again.
///
/// # Examples
///
/// ```rust
/// use tap_validator::model::TapService;
///
/// let service = TapService::new("http://tap.roe.ac.uk/osa");
/// assert_eq!(service.endpoints().synchronous(), "http://tap.roe.ac.uk/osa/sync");
/// assert_eq!(service.name().len(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ServiceRecord")]
pub struct TapService {
    url: String,
    name: String,
    endpoints: TapEndpoints,
}

#[derive(Deserialize)]
struct ServiceRecord {
    url: String,
    #[serde(default)]
    name: String,
}

impl From<ServiceRecord> for TapService {
    fn from(record: ServiceRecord) -> Self {
        Self::with_name(record.url, record.name)
    }
}

impl TapService {
    /// Creates a service with a generated display name.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_name(url, "")
    }

    /// Creates a service with the given display name. An empty name is
    /// replaced by a generated one.
    pub fn with_name(url: impl Into<String>, name: impl Into<String>) -> Self {
        let url = url.into();
        let mut name = name.into();
        if name.is_empty() {
            name = Alphanumeric.sample_string(&mut rand::rng(), GENERATED_NAME_LEN);
        }
        let endpoints = TapEndpoints::derive(&url);
        Self {
            url,
            name,
            endpoints,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoints(&self) -> &TapEndpoints {
        &self.endpoints
    }
}

impl fmt::Display for TapService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
