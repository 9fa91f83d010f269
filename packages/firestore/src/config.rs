use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// Default REST endpoint.
pub const DEFAULT_SERVICE_URL: &str = "https://firestore.googleapis.com";

/// Configuration for the [`Firestore`](crate::Firestore) engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FirestoreConfig {
    /// Scheme and authority requests are sent to.
    pub service_url: String,

    /// Sleep between scheduler ticks while a blocking call waits.
    pub poll_interval_ms: u64,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            poll_interval_ms: 1,
        }
    }
}

impl FirestoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = url.into();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parse and check `service_url`.
    ///
    /// Must be http(s) with a host and no path, query or fragment.
    pub fn service_url(&self) -> Result<Url> {
        let url = Url::parse(&self.service_url)?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(Error::InvalidConfig {
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if url.host_str().is_none() {
            return Err(Error::InvalidConfig {
                message: format!("service url '{}' has no host", self.service_url),
            });
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(Error::InvalidConfig {
                message: format!("service url '{}' must not carry a path", self.service_url),
            });
        }
        Ok(url)
    }
}

/// Configuration for one [`AsyncClient`](crate::AsyncClient).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum number of slots the client carries at once.
    pub max_slots: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { max_slots: 10 }
    }
}

impl ClientConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FirestoreConfig::default();
        assert_eq!(config.service_url, "https://firestore.googleapis.com");
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        assert_eq!(ClientConfig::default().max_slots, 10);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = FirestoreConfig::from_json_str(r#"{"poll_interval_ms": 5}"#).unwrap();
        assert_eq!(config.service_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.poll_interval_ms, 5);

        let client = ClientConfig::from_json_str(r#"{"max_slots": 2}"#).unwrap();
        assert_eq!(client.max_slots, 2);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            FirestoreConfig::from_json_str("{"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn service_url_validation() {
        let ok = FirestoreConfig::default().with_service_url("http://127.0.0.1:8080");
        assert_eq!(ok.service_url().unwrap().port(), Some(8080));

        let bad_scheme = FirestoreConfig::default().with_service_url("ftp://example.com");
        assert!(matches!(
            bad_scheme.service_url(),
            Err(Error::InvalidConfig { .. })
        ));

        let with_path = FirestoreConfig::default().with_service_url("https://example.com/v1");
        assert!(with_path.service_url().is_err());

        let garbage = FirestoreConfig::default().with_service_url("not a url");
        assert!(matches!(garbage.service_url(), Err(Error::UrlParse(_))));
    }
}
