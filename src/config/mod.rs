//! Coordinator configuration from the process environment.
//!
//! | Variable       | Required | Default          | Meaning                       |
//! |----------------|----------|------------------|-------------------------------|
//! | `N`            | yes      |                  | total samples                 |
//! | `WORKERS`      | yes      |                  | worker count                  |
//! | `A`            | no       | `0`              | interval low                  |
//! | `B`            | no       | `1`              | interval high                 |
//! | `WORKER_IMAGE` | no       | current binary   | executable for process workers|
//! | `SEED`         | no       | clock per worker | base seed                     |
//! | `SUBSTRATE`    | no       | `local`          | `local` or `process`          |
//! | `COLLECT`      | no       | `sequential`     | `sequential` or `concurrent`  |
//!
//! Empty values count as unset. Any missing or invalid required value is a
//! startup error; nothing is dispatched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::str::FromStr;
use validator::Validate;

use crate::coordinator::CollectStrategy;
use crate::error::{PiError, PiResult};
use crate::substrate::SubstrateKind;

/// Environment variables the coordinator reads.
pub const ENV_KEYS: [&str; 8] = [
    "N",
    "A",
    "B",
    "WORKERS",
    "WORKER_IMAGE",
    "SEED",
    "SUBSTRATE",
    "COLLECT",
];

/// Validated coordinator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RunnerConfig {
    /// Total samples requested (`N`).
    #[validate(range(min = 1))]
    pub total_samples: u64,

    /// Lower interval bound (`A`).
    pub interval_low: f64,

    /// Upper interval bound (`B`).
    pub interval_high: f64,

    /// Worker count (`WORKERS`).
    #[validate(range(min = 1))]
    pub workers: usize,

    /// Executable started for each process worker.
    #[serde(default)]
    pub worker_image: Option<String>,

    /// Base seed; `None` seeds each worker from its clock.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Where workers run.
    #[serde(default)]
    pub substrate: SubstrateKind,

    /// How replies are awaited.
    #[serde(default)]
    pub collect: CollectStrategy,
}

impl RunnerConfig {
    /// Build from this process's environment.
    ///
    /// Only [`ENV_KEYS`] are read; other variables are never inspected.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if one of those keys holds a value that
    /// is not valid UTF-8, otherwise see [`Self::from_vars`].
    pub fn from_env() -> PiResult<Self> {
        Self::from_vars(known_vars(|key| std::env::var_os(key))?)
    }

    /// Build from any set of key/value pairs.
    ///
    /// # Errors
    ///
    /// Returns [`PiError::Config`] if `N` or `WORKERS` is missing, any value
    /// fails to parse, a count is negative, or a bound is not finite, and
    /// [`PiError::Validation`] if a count is zero.
    pub fn from_vars<I, K, V>(vars: I) -> PiResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();

        let total_samples = non_negative("N", parse_required::<i64>(&vars, "N")?)?;
        let workers = non_negative("WORKERS", parse_required::<i64>(&vars, "WORKERS")?)?;
        let workers = usize::try_from(workers)
            .map_err(|_| PiError::config(format!("WORKERS={workers} is too large")))?;

        let config = Self {
            total_samples,
            interval_low: parse_optional(&vars, "A")?.unwrap_or(0.0),
            interval_high: parse_optional(&vars, "B")?.unwrap_or(1.0),
            workers,
            worker_image: vars.get("WORKER_IMAGE").map(|s| s.trim().to_string()),
            seed: parse_optional(&vars, "SEED")?,
            substrate: parse_optional(&vars, "SUBSTRATE")?.unwrap_or_default(),
            collect: parse_optional(&vars, "COLLECT")?.unwrap_or_default(),
        };
        config.check()?;
        Ok(config)
    }

    /// Run declarative and semantic validation.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn check(&self) -> PiResult<()> {
        self.validate()?;

        for (name, value) in [("A", self.interval_low), ("B", self.interval_high)] {
            if !value.is_finite() {
                return Err(PiError::config(format!("{name} must be finite, got {value}")));
            }
        }

        // Every worker must receive at least one sample.
        if self.total_samples < self.workers as u64 {
            return Err(PiError::config(format!(
                "N={} is smaller than WORKERS={}; every worker needs at least one sample",
                self.total_samples, self.workers
            )));
        }

        Ok(())
    }

    /// Executable for process workers: `WORKER_IMAGE`, else this binary.
    ///
    /// # Errors
    ///
    /// Returns an error if no image is set and the current executable path
    /// cannot be determined.
    pub fn resolve_worker_image(&self) -> PiResult<String> {
        if let Some(image) = &self.worker_image {
            return Ok(image.clone());
        }
        let exe = std::env::current_exe()?;
        Ok(exe.to_string_lossy().into_owned())
    }
}

/// Look up every key in [`ENV_KEYS`], keeping those that are set.
fn known_vars<F>(lookup: F) -> PiResult<Vec<(&'static str, String)>>
where
    F: Fn(&str) -> Option<OsString>,
{
    ENV_KEYS
        .iter()
        .filter_map(|&key| lookup(key).map(|value| (key, value)))
        .map(|(key, value)| {
            value
                .into_string()
                .map(|value| (key, value))
                .map_err(|raw| PiError::config(format!("{key}={raw:?} is not valid UTF-8")))
        })
        .collect()
}

fn parse_required<T>(vars: &HashMap<String, String>, key: &str) -> PiResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_optional(vars, key)?.ok_or_else(|| PiError::config(format!("{key} is required")))
}

fn parse_optional<T>(vars: &HashMap<String, String>, key: &str) -> PiResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    vars.get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| PiError::config(format!("invalid {key}='{raw}': {e}")))
        })
        .transpose()
}

fn non_negative(key: &str, value: i64) -> PiResult<u64> {
    u64::try_from(value)
        .map_err(|_| PiError::config(format!("{key} must not be negative, got {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::from_vars(vars(&[("N", "1000000"), ("WORKERS", "4")])).unwrap();
        assert_eq!(config.total_samples, 1_000_000);
        assert_eq!(config.workers, 4);
        assert!(config.interval_low.abs() < f64::EPSILON);
        assert!((config.interval_high - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.seed, None);
        assert_eq!(config.substrate, SubstrateKind::Local);
        assert_eq!(config.collect, CollectStrategy::Sequential);
        assert_eq!(config.worker_image, None);
    }

    #[test]
    fn test_all_values() {
        let config = RunnerConfig::from_vars(vars(&[
            ("N", "100"),
            ("WORKERS", "2"),
            ("A", "-0.5"),
            ("B", "0.5"),
            ("SEED", "42"),
            ("SUBSTRATE", "process"),
            ("COLLECT", "concurrent"),
            ("WORKER_IMAGE", "/opt/distpi"),
        ]))
        .unwrap();
        assert!((config.interval_low + 0.5).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.substrate, SubstrateKind::Process);
        assert_eq!(config.collect, CollectStrategy::Concurrent);
        assert_eq!(config.resolve_worker_image().unwrap(), "/opt/distpi");
    }

    #[test]
    fn test_empty_optional_means_default() {
        let config =
            RunnerConfig::from_vars(vars(&[("N", "10"), ("WORKERS", "1"), ("A", ""), ("B", " ")]))
                .unwrap();
        assert!(config.interval_low.abs() < f64::EPSILON);
        assert!((config.interval_high - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_required() {
        let err = RunnerConfig::from_vars(vars(&[("WORKERS", "4")])).unwrap_err();
        assert!(err.to_string().contains("N is required"));

        let err = RunnerConfig::from_vars(vars(&[("N", "10")])).unwrap_err();
        assert!(err.to_string().contains("WORKERS is required"));

        let err = RunnerConfig::from_vars(vars(&[("N", ""), ("WORKERS", "4")])).unwrap_err();
        assert!(err.is_startup_error());
    }

    #[test]
    fn test_invalid_values() {
        for pairs in [
            vec![("N", "ten"), ("WORKERS", "4")],
            vec![("N", "10"), ("WORKERS", "4.5")],
            vec![("N", "10"), ("WORKERS", "4"), ("A", "zero")],
            vec![("N", "10"), ("WORKERS", "4"), ("SUBSTRATE", "k8s")],
            vec![("N", "10"), ("WORKERS", "4"), ("SEED", "-1")],
        ] {
            let err = RunnerConfig::from_vars(vars(&pairs)).unwrap_err();
            assert!(err.is_startup_error(), "{pairs:?} gave {err:?}");
        }
    }

    #[test]
    fn test_negative_counts() {
        let err = RunnerConfig::from_vars(vars(&[("N", "-5"), ("WORKERS", "4")])).unwrap_err();
        assert!(err.to_string().contains("N must not be negative"));

        let err = RunnerConfig::from_vars(vars(&[("N", "5"), ("WORKERS", "-1")])).unwrap_err();
        assert!(err.to_string().contains("WORKERS must not be negative"));
    }

    #[test]
    fn test_zero_workers_fails_validation() {
        let err = RunnerConfig::from_vars(vars(&[("N", "5"), ("WORKERS", "0")])).unwrap_err();
        assert!(matches!(err, PiError::Validation(_)));
    }

    #[test]
    fn test_fewer_samples_than_workers() {
        let err = RunnerConfig::from_vars(vars(&[("N", "3"), ("WORKERS", "4")])).unwrap_err();
        assert!(err.to_string().contains("smaller than WORKERS"));
    }

    #[test]
    fn test_non_finite_bound() {
        let err =
            RunnerConfig::from_vars(vars(&[("N", "5"), ("WORKERS", "1"), ("B", "inf")])).unwrap_err();
        assert!(err.to_string().contains("B must be finite"));
    }

    #[test]
    fn test_default_worker_image_is_current_exe() {
        let config = RunnerConfig::from_vars(vars(&[("N", "5"), ("WORKERS", "1")])).unwrap();
        let image = config.resolve_worker_image().unwrap();
        assert!(!image.is_empty());
    }

    #[test]
    fn test_known_vars_reads_only_known_keys() {
        let env: HashMap<&str, &str> = [("N", "100"), ("WORKERS", "2"), ("PATH", "/bin")].into();
        let pairs = known_vars(|key| env.get(key).map(OsString::from)).unwrap();
        assert_eq!(pairs, vec![("N", "100".to_string()), ("WORKERS", "2".to_string())]);

        let config = RunnerConfig::from_vars(pairs).unwrap();
        assert_eq!(config.total_samples, 100);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_known_value_is_config_error() {
        use std::os::unix::ffi::OsStringExt;

        let err = known_vars(|key| (key == "SEED").then(|| OsString::from_vec(vec![0xff, 0xfe])))
            .unwrap_err();
        assert!(err.is_startup_error());
        assert!(err.to_string().contains("SEED"));
    }

    #[cfg(unix)]
    #[test]
    fn test_from_env_ignores_unrelated_non_utf8_entries() {
        use std::os::unix::ffi::OsStringExt;

        std::env::set_var(
            "DISTPI_TEST_UNRELATED",
            OsString::from_vec(vec![0xff, 0xfe]),
        );
        // N and WORKERS may or may not be set here; either way there is no panic.
        match RunnerConfig::from_env() {
            Ok(config) => assert!(config.workers >= 1),
            Err(err) => assert!(err.is_startup_error(), "{err:?}"),
        }
        std::env::remove_var("DISTPI_TEST_UNRELATED");
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = RunnerConfig::from_vars(vars(&[("N", "5"), ("WORKERS", "1")])).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"substrate\":\"local\""));
        let back: RunnerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
