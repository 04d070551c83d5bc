//! URL parsing for storage backends.
//!
//! Extracts backend configuration from S3 and local filesystem URL formats.

use object_store::path::Path;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{InvalidUrlSnafu, StorageError};

use super::{LocalConfig, S3Config};

// URL patterns for the supported storage backends
const S3_PATH: &str =
    r"^https://s3\.(?P<region>[\w\-]+)\.amazonaws\.com/(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";
const S3_VIRTUAL: &str =
    r"^https://(?P<bucket>[a-z0-9\-\.]+)\.s3\.(?P<region>[\w\-]+)\.amazonaws\.com(/(?P<key>.+))?$";
const S3_URL: &str = r"^[sS]3[aA]?://(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";

const FILE_URI: &str = r"^file://(?P<path>.*)$";
const FILE_PATH: &str = r"^/(?P<path>.*)$";

fn s3_matchers() -> &'static Vec<Regex> {
    static MATCHERS: OnceLock<Vec<Regex>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        vec![
            Regex::new(S3_PATH).unwrap(),
            Regex::new(S3_VIRTUAL).unwrap(),
            Regex::new(S3_URL).unwrap(),
        ]
    })
}

fn local_matchers() -> &'static Vec<Regex> {
    static MATCHERS: OnceLock<Vec<Regex>> = OnceLock::new();
    MATCHERS
        .get_or_init(|| vec![Regex::new(FILE_URI).unwrap(), Regex::new(FILE_PATH).unwrap()])
}

/// Backend configuration enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    S3(S3Config),
    Local(LocalConfig),
}

impl BackendConfig {
    /// Parse a URL into a backend configuration.
    pub fn parse_url(url: &str) -> Result<Self, StorageError> {
        if let Some(matches) = s3_matchers().iter().filter_map(|r| r.captures(url)).next() {
            return Ok(Self::parse_s3(&matches));
        }

        if let Some(matches) = local_matchers()
            .iter()
            .filter_map(|r| r.captures(url))
            .next()
        {
            return Ok(Self::parse_local(&matches));
        }

        InvalidUrlSnafu {
            url: url.to_string(),
        }
        .fail()
    }

    fn parse_s3(matches: &regex::Captures) -> Self {
        let bucket = matches
            .name("bucket")
            .expect("bucket is present in every S3 pattern")
            .as_str()
            .to_string();

        let region = std::env::var("AWS_DEFAULT_REGION")
            .ok()
            .or_else(|| matches.name("region").map(|m| m.as_str().to_string()));

        let key = matches.name("key").map(|m| Path::from(m.as_str()));

        Self::S3(S3Config {
            region,
            bucket,
            key,
        })
    }

    fn parse_local(matches: &regex::Captures) -> Self {
        let path = matches
            .name("path")
            .expect("path is present in every local pattern")
            .as_str();

        // FILE_PATH strips the leading slash; restore it
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Self::Local(LocalConfig { path, key: None })
    }

    /// Key prefix configured for this backend, if any.
    pub fn key(&self) -> Option<&Path> {
        match self {
            BackendConfig::S3(config) => config.key.as_ref(),
            BackendConfig::Local(config) => config.key.as_ref(),
        }
    }
}
