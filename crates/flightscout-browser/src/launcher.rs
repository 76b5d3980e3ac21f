use crate::{Error, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

pub const DEFAULT_DEBUGGING_PORT: u16 = 9222;

/// Some booking pages refuse to render when `navigator.webdriver` is set
const BASE_FLAGS: &[&str] = &[
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-blink-features=AutomationControlled",
    "--lang=en-US",
];

const HEADLESS_FLAGS: &[&str] = &["--headless=new", "--window-size=1600,1200", "--disable-gpu"];

/// Spawns the Chrome process a session connects to
pub struct ChromeLauncher {
    chrome_path: PathBuf,
    profile_path: PathBuf,
    debugging_port: u16,
    headless: bool,
}

impl ChromeLauncher {
    pub fn new(chrome_path: PathBuf, profile_path: PathBuf) -> Self {
        Self {
            chrome_path,
            profile_path,
            debugging_port: DEFAULT_DEBUGGING_PORT,
            headless: true,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.debugging_port = port;
        self
    }

    /// Visible window instead of headless, used when debugging a scraper
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn debugging_port(&self) -> u16 {
        self.debugging_port
    }

    pub fn launch(&self) -> Result<Child> {
        let args = self.args();
        tracing::debug!("Launching {} {:?}", self.chrome_path.display(), args);

        Command::new(&self.chrome_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::Browser(format!(
                    "Cannot start {}: {}",
                    self.chrome_path.display(),
                    e
                ))
            })
    }

    fn args(&self) -> Vec<OsString> {
        let mut user_data_dir = OsString::from("--user-data-dir=");
        user_data_dir.push(&self.profile_path);

        let mode: &[&str] = if self.headless { HEADLESS_FLAGS } else { &[] };

        [format!("--remote-debugging-port={}", self.debugging_port).into(), user_data_dir]
            .into_iter()
            .chain(BASE_FLAGS.iter().chain(mode).map(OsString::from))
            .chain(std::iter::once(OsString::from("about:blank")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher() -> ChromeLauncher {
        ChromeLauncher::new(
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/tmp/flightscout-profile"),
        )
    }

    fn has(args: &[OsString], flag: &str) -> bool {
        args.iter().any(|a| a == flag)
    }

    #[test]
    fn test_headless_by_default() {
        let args = launcher().args();

        assert_eq!(args[0], "--remote-debugging-port=9222");
        assert_eq!(args[1], "--user-data-dir=/tmp/flightscout-profile");
        assert!(has(&args, "--disable-blink-features=AutomationControlled"));
        assert!(has(&args, "--headless=new"));
        assert_eq!(args.last().unwrap(), "about:blank");
    }

    #[test]
    fn test_visible_window_for_debugging() {
        let launcher = launcher().with_headless(false).with_port(9333);
        let args = launcher.args();

        assert_eq!(launcher.debugging_port(), 9333);
        assert_eq!(args[0], "--remote-debugging-port=9333");
        assert!(!args.iter().any(|a| a.to_string_lossy().starts_with("--headless")));
        assert!(!has(&args, "--window-size=1600,1200"));
    }

    #[test]
    fn test_launch_reports_unstartable_binary() {
        let launcher = ChromeLauncher::new(
            PathBuf::from("/nonexistent/chrome"),
            PathBuf::from("/tmp/flightscout-profile"),
        );
        let err = launcher.launch().unwrap_err();
        assert!(err.to_string().contains("Cannot start /nonexistent/chrome"));
    }
}
