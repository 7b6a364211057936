use anyhow::Context;
use directories::ProjectDirs;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the platform data directory
pub(crate) const DATA_DIR_ENV: &str = "TRIPCAL_DATA_DIR";

/// Environment variable holding the log filter.  Nothing is logged unless it
/// is set.
pub(crate) const LOG_ENV: &str = "TRIPCAL_LOG";

/// Locations of the files tripcal reads & writes
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Config {
    data_dir: PathBuf,
}

impl Config {
    /// Determine the data directory from, in order of precedence, the
    /// `--data-dir` option, the `TRIPCAL_DATA_DIR` environment variable, and
    /// the platform's per-user data directory
    pub(crate) fn resolve(data_dir: Option<PathBuf>) -> anyhow::Result<Config> {
        Config::resolve_with(data_dir, std::env::var_os(DATA_DIR_ENV))
    }

    fn resolve_with(data_dir: Option<PathBuf>, env: Option<OsString>) -> anyhow::Result<Config> {
        let data_dir = match data_dir.or_else(|| env.filter(|s| !s.is_empty()).map(PathBuf::from))
        {
            Some(dir) => dir,
            None => ProjectDirs::from("", "", "tripcal")
                .context("could not determine data directory")?
                .data_dir()
                .to_path_buf(),
        };
        Ok(Config { data_dir })
    }

    pub(crate) fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub(crate) fn trips_path(&self) -> PathBuf {
        self.data_dir.join("trips.json")
    }

    pub(crate) fn current_trip_path(&self) -> PathBuf {
        self.data_dir.join("current-trip")
    }

    pub(crate) fn log_path(&self) -> PathBuf {
        self.data_dir.join("tripcal.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_beats_env() {
        let config = Config::resolve_with(
            Some(PathBuf::from("/srv/trips")),
            Some(OsString::from("/var/lib/tripcal")),
        )
        .unwrap();
        assert_eq!(config.data_dir(), Path::new("/srv/trips"));
        assert_eq!(config.trips_path(), Path::new("/srv/trips/trips.json"));
        assert_eq!(
            config.current_trip_path(),
            Path::new("/srv/trips/current-trip")
        );
        assert_eq!(config.log_path(), Path::new("/srv/trips/tripcal.log"));
    }

    #[test]
    fn test_env() {
        let config =
            Config::resolve_with(None, Some(OsString::from("/var/lib/tripcal"))).unwrap();
        assert_eq!(config.data_dir(), Path::new("/var/lib/tripcal"));
    }

    #[test]
    fn test_empty_env_ignored() {
        let config = Config::resolve_with(None, Some(OsString::new()));
        if let Ok(config) = config {
            assert_ne!(config.data_dir(), Path::new(""));
        }
    }
}
