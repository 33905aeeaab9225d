//! Configuration management for scanward.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`<PREFIX>__<SECTION>__<FIELD>`)
//! 2. Config file (`<prefix>.toml`, `.yaml`, `.json`, ...)
//! 3. Defaults provided by the section type
//!
//! Command-line overrides are applied on top by the binary.

use serde::de::DeserializeOwned;

pub use config::ConfigError;

/// Load one section of the layered configuration.
///
/// A missing file or a missing section yields `T::default()`; a section
/// that is present but malformed is an error.
pub fn load_section<T>(file_prefix: &str, env_prefix: &str, section: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix(env_prefix).separator("__"),
        )
        .build()?;

    match cfg.get::<T>(section) {
        Ok(value) => Ok(value),
        Err(ConfigError::NotFound(_)) => {
            tracing::debug!(section, "Config section not found, using defaults");
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

/// Serde helpers for durations written as `"500ms"`, `"5s"`, `"30m"`.
pub mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(duration))
    }

    /// Parse an integer followed by a unit: `ns`, `us`, `ms`, `s`, `m`, `h`.
    pub fn parse(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("Invalid number in duration: '{s}'"))?;
        let unit = s[digits.len()..].trim();

        let duration = match unit {
            "ns" => Duration::from_nanos(value),
            "us" | "µs" => Duration::from_micros(value),
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            "" => return Err(format!("Missing unit in duration: '{s}' (use ms, s, m, ...)")),
            other => {
                return Err(format!(
                    "Unknown duration unit '{other}'; supported: ns, us, ms, s, m, h"
                ))
            }
        };
        Ok(duration)
    }

    pub fn format(duration: &Duration) -> String {
        if duration.subsec_nanos() == 0 {
            format!("{}s", duration.as_secs())
        } else if duration.as_nanos() % 1_000_000 == 0 {
            format!("{}ms", duration.as_millis())
        } else {
            format!("{}ns", duration.as_nanos())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default = "default_name")]
        name: String,
        #[serde(default = "default_wait", with = "duration")]
        wait: Duration,
    }

    fn default_name() -> String {
        "default".to_string()
    }

    fn default_wait() -> Duration {
        Duration::from_secs(5)
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                name: default_name(),
                wait: default_wait(),
            }
        }
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(duration::parse("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(duration::parse("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(duration::parse(" 2m ").unwrap(), Duration::from_secs(120));
        assert_eq!(duration::parse("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(duration::parse("10us").unwrap(), Duration::from_micros(10));
        assert!(duration::parse("5").is_err());
        assert!(duration::parse("fast").is_err());
        assert!(duration::parse("5 days").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(duration::format(&Duration::from_secs(5)), "5s");
        assert_eq!(duration::format(&Duration::from_millis(1500)), "1500ms");
        assert_eq!(duration::format(&Duration::from_nanos(10)), "10ns");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let sample: Sample =
            load_section(prefix.to_str().unwrap(), "SCANWARD_TEST_ABSENT", "sample").unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_file_section_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("scanward.toml"),
            "[sample]\nname = \"from-file\"\nwait = \"750ms\"\n",
        )
        .unwrap();
        let prefix = dir.path().join("scanward");
        let sample: Sample =
            load_section(prefix.to_str().unwrap(), "SCANWARD_TEST_FILE", "sample").unwrap();
        assert_eq!(sample.name, "from-file");
        assert_eq!(sample.wait, Duration::from_millis(750));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("scanward.toml"),
            "[sample]\nname = \"from-file\"\n",
        )
        .unwrap();
        std::env::set_var("SCANWARD_TEST_ENV__SAMPLE__NAME", "from-env");
        let prefix = dir.path().join("scanward");
        let sample: Sample =
            load_section(prefix.to_str().unwrap(), "SCANWARD_TEST_ENV", "sample").unwrap();
        std::env::remove_var("SCANWARD_TEST_ENV__SAMPLE__NAME");
        assert_eq!(sample.name, "from-env");
        assert_eq!(sample.wait, Duration::from_secs(5));
    }

    #[derive(Debug, Default, Deserialize)]
    struct Credentials {
        #[serde(default)]
        key: String,
        #[serde(default)]
        limit: usize,
    }

    #[test]
    fn test_numeric_looking_env_values_keep_their_text() {
        std::env::set_var("SCANWARD_TEST_KEYS__CREDS__KEY", "0123456789");
        std::env::set_var("SCANWARD_TEST_KEYS__CREDS__LIMIT", "42");
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let creds: Credentials =
            load_section(prefix.to_str().unwrap(), "SCANWARD_TEST_KEYS", "creds").unwrap();
        std::env::remove_var("SCANWARD_TEST_KEYS__CREDS__KEY");
        std::env::remove_var("SCANWARD_TEST_KEYS__CREDS__LIMIT");
        assert_eq!(creds.key, "0123456789");
        assert_eq!(creds.limit, 42);
    }

    #[test]
    fn test_malformed_section_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("scanward.toml"),
            "[sample]\nwait = \"soon\"\n",
        )
        .unwrap();
        let prefix = dir.path().join("scanward");
        let result: Result<Sample, _> =
            load_section(prefix.to_str().unwrap(), "SCANWARD_TEST_BAD", "sample");
        assert!(result.is_err());
    }
}
