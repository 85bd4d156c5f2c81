use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use regex_lite::Regex;
use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_scribe::config::load_config;
///
/// let config = load_config(Path::new("crawl.toml")).unwrap();
/// println!("Max pages: {}", config.crawler.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Reads and parses a configuration file without validating it
///
/// Used when command-line flags still have to be layered on top before the
/// result can be judged complete.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two runs over the same output directory can be
/// matched to the configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Number, optional unit prefix, optional `B`; matched against uppercased input
const BYTE_SIZE_PATTERN: &str = r"^(\d+(?:\.\d+)?)([KMGTP]?)B?$";

/// Parses a human-readable byte size such as `5GB`, `512K` or `1.5MB`
///
/// Units are powers of 1024 and case-insensitive. A bare number is bytes.
///
/// ```
/// use sumi_scribe::config::parse_byte_size;
///
/// assert_eq!(parse_byte_size("2KB").unwrap(), 2048);
/// assert_eq!(parse_byte_size("1.5m").unwrap(), 1_572_864);
/// ```
pub fn parse_byte_size(value: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidByteSize(value.to_string());
    let pattern = Regex::new(BYTE_SIZE_PATTERN).map_err(|_| invalid())?;

    let text = value.trim().to_uppercase();
    let captures = pattern.captures(&text).ok_or_else(invalid)?;

    let scale: u64 = match &captures[2] {
        "" => 1,
        "K" => 1 << 10,
        "M" => 1 << 20,
        "G" => 1 << 30,
        "T" => 1 << 40,
        _ => 1 << 50,
    };

    let number: f64 = captures[1].parse().map_err(|_| invalid())?;
    Ok((number * scale as f64) as u64)
}

/// Accepts either an integer byte count or a human-readable size string
pub(crate) fn deserialize_byte_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSize {
        Bytes(u64),
        Human(String),
    }

    match RawSize::deserialize(deserializer)? {
        RawSize::Bytes(bytes) => Ok(bytes),
        RawSize::Human(text) => parse_byte_size(&text).map_err(serde::de::Error::custom),
    }
}
