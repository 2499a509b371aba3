//! Environment-driven configuration.
//!
//! Every setting has an env-var override and a default derived from the
//! user's home directory via [`dirs`]. Resolution never fails: a missing
//! home directory just falls back to a relative path under the current
//! working directory.

use std::path::{Path, PathBuf};

const ENV_BROWSER_BINARY: &str = "SCOUTBROWSER_BROWSER_BINARY";
const ENV_BROWSER_PROFILE: &str = "SCOUTBROWSER_BROWSER_PROFILE";
const ENV_BROWSER_SCREENSHOTS: &str = "SCOUTBROWSER_BROWSER_SCREENSHOTS";
const ENV_BROWSER_WATCHERS_FILE: &str = "SCOUTBROWSER_BROWSER_WATCHERS_FILE";

const DATA_DIR_NAME: &str = "scoutbrowser";

/// Resolved configuration for the browser core.
///
/// Each field is read from its environment variable on construction; unset
/// variables fall back to a well-known path under the user's home
/// directory. Binary discovery beyond an explicit override/`PATH` scan is
/// out of scope — see [`Config::resolve_browser_binary`].
#[derive(Debug, Clone)]
pub struct Config {
    browser_binary: Option<PathBuf>,
    browser_profile: PathBuf,
    browser_screenshots: PathBuf,
    browser_watchers_file: PathBuf,
}

impl Config {
    /// Resolve configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let data_dir = default_data_dir();
        Self {
            browser_binary: std::env::var(ENV_BROWSER_BINARY).ok().map(PathBuf::from),
            browser_profile: env_path_or(ENV_BROWSER_PROFILE, data_dir.join("profile")),
            browser_screenshots: env_path_or(ENV_BROWSER_SCREENSHOTS, data_dir.join("screenshots")),
            browser_watchers_file: env_path_or(ENV_BROWSER_WATCHERS_FILE, data_dir.join("watchers.json")),
        }
    }

    /// An explicit override for the Chromium binary path, if the env var
    /// was set. `None` means discovery (PATH/common-locations scan) should
    /// run instead.
    #[must_use]
    pub fn browser_binary_override(&self) -> Option<&Path> {
        self.browser_binary.as_deref()
    }

    /// Directory holding the Chromium profile (`--user-data-dir`).
    #[must_use]
    pub fn browser_profile(&self) -> &Path {
        &self.browser_profile
    }

    /// Directory screenshots are written into.
    #[must_use]
    pub fn browser_screenshots(&self) -> &Path {
        &self.browser_screenshots
    }

    /// Path to the watcher persistence file (`watchers.json`).
    #[must_use]
    pub fn browser_watchers_file(&self) -> &Path {
        &self.browser_watchers_file
    }

    /// Resolve the Chromium/Chrome binary to launch: the env override if
    /// set and present, otherwise a scan of `PATH` and well-known install
    /// locations. Does not implement full cross-platform channel discovery
    /// — that policy lives outside this core.
    #[must_use]
    pub fn resolve_browser_binary(&self) -> Option<PathBuf> {
        if let Some(path) = &self.browser_binary {
            if path.exists() {
                return Some(path.clone());
            }
        }
        find_on_path(&["chromium", "chromium-browser", "google-chrome", "chrome"])
            .or_else(|| COMMON_BINARY_PATHS.iter().map(PathBuf::from).find(|p| p.exists()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_path_or(var: &str, default: PathBuf) -> PathBuf {
    std::env::var(var).map(PathBuf::from).unwrap_or(default)
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

const COMMON_BINARY_PATHS: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/snap/bin/chromium",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
];

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for name in names {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}
