use crate::{Error, Result};
use std::path::{Path, PathBuf};

#[cfg(target_os = "macos")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(target_os = "linux")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

#[cfg(target_os = "windows")]
const INSTALL_LOCATIONS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const INSTALL_LOCATIONS: &[&str] = &[];

/// Binary names looked up on `PATH` when no well-known install exists
const PATH_CANDIDATES: &[&str] = &["google-chrome", "chromium", "chromium-browser", "chrome"];

/// Locates the Chrome binary that scrapes are driven through
pub struct ChromeFinder {
    custom_path: Option<PathBuf>,
}

impl ChromeFinder {
    pub fn new(custom_path: Option<PathBuf>) -> Self {
        Self { custom_path }
    }

    /// The explicit path if one was given (and nothing else), otherwise
    /// the first usable install location, otherwise the first match on `PATH`
    pub fn find(&self) -> Result<PathBuf> {
        if let Some(path) = &self.custom_path {
            return check_executable(path).map(|()| path.clone());
        }

        let installed = INSTALL_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|path| check_executable(path).is_ok());
        if let Some(path) = installed {
            tracing::debug!("Using Chrome installed at {}", path.display());
            return Ok(path);
        }

        match PATH_CANDIDATES.iter().find_map(|name| which::which(name).ok()) {
            Some(path) => {
                tracing::debug!("Using Chrome from PATH: {}", path.display());
                Ok(path)
            }
            None => Err(Error::Browser(format!(
                "Chrome not found in {} or as {} on PATH; pass --chrome",
                INSTALL_LOCATIONS.join(", "),
                PATH_CANDIDATES.join("/")
            ))),
        }
    }
}

fn check_executable(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path)
        .map_err(|_| Error::Browser(format!("Chrome not found at: {}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(Error::Browser(format!(
                "Chrome binary not executable: {}",
                path.display()
            )));
        }
    }
    #[cfg(not(unix))]
    let _ = metadata;

    Ok(())
}
