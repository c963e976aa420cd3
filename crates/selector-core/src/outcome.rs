use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

use crate::Family;

/// Fetch-error categories surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorDomain {
    Service,
    Endpoint,
    Instance,
    Database,
    BrowserService,
    ItemService,
    ItemEndpoint,
    ItemInstance,
}

impl ErrorDomain {
    pub const ALL: [ErrorDomain; 8] = [
        ErrorDomain::Service,
        ErrorDomain::Endpoint,
        ErrorDomain::Instance,
        ErrorDomain::Database,
        ErrorDomain::BrowserService,
        ErrorDomain::ItemService,
        ErrorDomain::ItemEndpoint,
        ErrorDomain::ItemInstance,
    ];

    /// Key the error renderer looks messages up by.
    pub fn key(self) -> &'static str {
        match self {
            ErrorDomain::Service => "serviceErrors",
            ErrorDomain::Endpoint => "endpointErrors",
            ErrorDomain::Instance => "instanceErrors",
            ErrorDomain::Database => "databaseErrors",
            ErrorDomain::BrowserService => "browserServiceErrors",
            ErrorDomain::ItemService => "itemServiceErrors",
            ErrorDomain::ItemEndpoint => "itemEndpointErrors",
            ErrorDomain::ItemInstance => "itemInstanceErrors",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }

    /// Family whose list is reset when this domain fails. Item lookups own no list.
    pub fn family(self) -> Option<Family> {
        match self {
            ErrorDomain::Service | ErrorDomain::BrowserService => Some(Family::Service),
            ErrorDomain::Endpoint => Some(Family::Endpoint),
            ErrorDomain::Instance => Some(Family::Instance),
            ErrorDomain::Database => Some(Family::Database),
            ErrorDomain::ItemService | ErrorDomain::ItemEndpoint | ErrorDomain::ItemInstance => {
                None
            }
        }
    }
}

/// Last outcome per error domain. An empty message means the last fetch succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMap {
    entries: BTreeMap<ErrorDomain, String>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one outcome; other domains are left as they were.
    pub fn record(&mut self, domain: ErrorDomain, message: impl Into<String>) {
        self.entries.insert(domain, message.into());
    }

    pub fn record_success(&mut self, domain: ErrorDomain) {
        self.record(domain, String::new());
    }

    pub fn get(&self, domain: ErrorDomain) -> Option<&str> {
        self.entries.get(&domain).map(String::as_str)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&str> {
        ErrorDomain::from_key(key).and_then(|d| self.get(d))
    }

    pub fn has_error(&self, domain: ErrorDomain) -> bool {
        self.get(domain).is_some_and(|m| !m.is_empty())
    }

    /// Domains whose last outcome was a failure.
    pub fn failures(&self) -> impl Iterator<Item = (ErrorDomain, &str)> {
        self.entries
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(d, m)| (*d, m.as_str()))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ErrorMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (domain, message) in &self.entries {
            map.serialize_entry(domain.key(), message)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_other_domains() {
        let mut errors = ErrorMap::new();
        errors.record(ErrorDomain::Service, "svc down");
        errors.record(ErrorDomain::Endpoint, "boom");

        assert_eq!(errors.get(ErrorDomain::Service), Some("svc down"));
        assert_eq!(errors.get_by_key("endpointErrors"), Some("boom"));
        assert_eq!(errors.failures().count(), 2);
    }

    #[test]
    fn success_clears_only_its_domain() {
        let mut errors = ErrorMap::new();
        errors.record(ErrorDomain::Endpoint, "boom");
        errors.record(ErrorDomain::Instance, "timeout");

        errors.record_success(ErrorDomain::Endpoint);

        assert_eq!(errors.get(ErrorDomain::Endpoint), Some(""));
        assert!(!errors.has_error(ErrorDomain::Endpoint));
        assert!(errors.has_error(ErrorDomain::Instance));
        assert!(!errors.is_clean());
    }

    #[test]
    fn keys_round_trip_and_serialize() {
        for domain in ErrorDomain::ALL {
            assert_eq!(ErrorDomain::from_key(domain.key()), Some(domain));
        }
        assert_eq!(ErrorDomain::from_key("nope"), None);

        let mut errors = ErrorMap::new();
        errors.record(ErrorDomain::ItemInstance, "x");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["itemInstanceErrors"], "x");
    }

    #[test]
    fn item_domains_own_no_family() {
        assert_eq!(ErrorDomain::ItemEndpoint.family(), None);
        assert_eq!(ErrorDomain::BrowserService.family(), Some(Family::Service));
    }
}
