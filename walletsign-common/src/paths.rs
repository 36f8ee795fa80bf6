//! Default locations for walletsign configuration files and key stores.
//!
//! # Examples
//!
//! ```
//! use walletsign_common::paths::{
//!     get_config_file,
//!     get_config_file_or_default,
//!     get_config_file_paths,
//!     get_default_storage_path,
//! };
//!
//! // Get the first config file found, according to directory precedence.
//! println!("{:?}", get_config_file());
//!
//! // Get the first config file found, or the default if none are found.
//! println!("{:?}", get_config_file_or_default());
//!
//! // Get all configuration file paths, sorted by directory precedence.
//! println!("{:?}", get_config_file_paths());
//!
//! // Get the default directory of the key store.
//! println!("{:?}", get_default_storage_path());
//! ```

use std::path::{Path, PathBuf};

/// The configuration directories for walletsign hosts in descending priority.
const CONFIG_DIRS: [&str; 4] = [
    "/etc/walletsign/",
    "/run/walletsign/",
    "/usr/local/share/walletsign/",
    "/usr/share/walletsign/",
];

/// The filename of a walletsign configuration file.
const CONFIG_FILE: &str = "config.toml";

/// The default directory of the embedded key store.
const DEFAULT_STORAGE_DIR: &str = "/var/lib/walletsign/keys";

/// Returns a list of all configuration file locations, sorted by precedence.
///
/// Considers files named `config.toml` in the following directories in descending priority:
/// - `/etc/walletsign`
/// - `/run/walletsign`
/// - `/usr/local/share/walletsign`
/// - `/usr/share/walletsign`
pub fn get_config_file_paths() -> Vec<PathBuf> {
    CONFIG_DIRS
        .iter()
        .map(|dir| Path::new(dir).join(CONFIG_FILE))
        .collect()
}

/// Returns the first walletsign configuration file available, or [`None`] if none found.
///
/// The directories are searched in the order of [`get_config_file_paths`].
pub fn get_config_file() -> Option<PathBuf> {
    first_existing_file(get_config_file_paths())
}

/// Returns the first walletsign configuration file available, or the default if none found.
///
/// If no file is found, the default location `/usr/share/walletsign/config.toml` is returned.
pub fn get_config_file_or_default() -> PathBuf {
    let Some(config) = get_config_file() else {
        return get_default_config_file_path();
    };
    config
}

/// Returns the file path of the default configuration file below /usr.
pub fn get_default_config_file_path() -> PathBuf {
    Path::new(CONFIG_DIRS[CONFIG_DIRS.len() - 1]).join(CONFIG_FILE)
}

/// Returns the default directory of the embedded key store.
pub fn get_default_storage_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_DIR)
}

/// Returns the first path in `candidates` that is an existing file.
fn first_existing_file(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|file| file.is_file())
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use rstest::rstest;
    use tempfile::tempdir;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn config_file_paths_are_sorted_by_precedence() {
        let paths = get_config_file_paths();
        assert_eq!(paths.len(), 4);
        assert_eq!(paths[0], PathBuf::from("/etc/walletsign/config.toml"));
        assert_eq!(paths[3], get_default_config_file_path());
    }

    #[rstest]
    #[case(&["second"], Some("second"))]
    #[case(&["first", "second"], Some("first"))]
    #[case(&[], None)]
    fn first_existing_file_wins(
        #[case] existing: &[&str],
        #[case] expected: Option<&str>,
    ) -> TestResult {
        let dir = tempdir()?;
        for name in existing {
            File::create(dir.path().join(name))?;
        }
        let candidates = ["first", "second"].map(|name| dir.path().join(name));

        assert_eq!(
            first_existing_file(candidates),
            expected.map(|name| dir.path().join(name))
        );
        Ok(())
    }
}
