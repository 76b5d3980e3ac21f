use crate::chromium::ChromiumDriver;
use crate::launcher::DEFAULT_DEBUGGING_PORT;
use crate::{ChromeFinder, ChromeLauncher, Error, ProfileManager, Result};
use chromiumoxide::browser::Browser;
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Child;
use std::time::Duration;
use tokio::task::JoinHandle;

const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// How a `BrowserSession` starts Chrome
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Explicit Chrome binary; searched for when `None`
    pub chrome_path: Option<PathBuf>,
    /// Persistent profile directory; a temporary one when `None`
    pub profile: Option<PathBuf>,
    pub headless: bool,
    pub debugging_port: u16,
    pub connect_attempts: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            profile: None,
            headless: true,
            debugging_port: DEFAULT_DEBUGGING_PORT,
            connect_attempts: 5,
        }
    }
}

/// A launched Chrome plus the CDP connection driving its page.
///
/// Chrome is killed and a temporary profile removed when the session is shut
/// down or dropped, whichever comes first.
pub struct BrowserSession {
    driver: ChromiumDriver,
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    child: Option<Child>,
    // dropped last so the profile outlives the process using it
    _profile: ProfileManager,
}

impl BrowserSession {
    pub async fn launch(options: SessionOptions) -> Result<Self> {
        let chrome_path = ChromeFinder::new(options.chrome_path.clone()).find()?;
        let profile = match &options.profile {
            Some(path) => ProfileManager::persistent(path.clone())?,
            None => ProfileManager::temporary()?,
        };

        let launcher = ChromeLauncher::new(chrome_path, profile.path().to_path_buf())
            .with_port(options.debugging_port)
            .with_headless(options.headless);
        let mut child = launcher.launch()?;
        tracing::info!(
            "Chrome started (pid {}, port {})",
            child.id(),
            launcher.debugging_port()
        );

        match Self::connect(launcher.debugging_port(), options.connect_attempts).await {
            Ok((browser, handler, driver)) => Ok(Self {
                driver,
                browser: Some(browser),
                handler,
                child: Some(child),
                _profile: profile,
            }),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(e)
            }
        }
    }

    async fn connect(
        port: u16,
        attempts: u32,
    ) -> Result<(Browser, JoinHandle<()>, ChromiumDriver)> {
        let url = format!("http://localhost:{}", port);
        let attempts = attempts.max(1);

        // Chrome may not be listening yet
        let mut remaining = attempts;
        let (browser, mut handler) = loop {
            tracing::debug!("Attempting CDP connection to {}...", url);
            match Browser::connect(&url).await {
                Ok(result) => break result,
                Err(e) => {
                    remaining -= 1;
                    if remaining == 0 {
                        return Err(Error::Cdp(format!(
                            "Failed to connect to Chrome after {} attempts: {}",
                            attempts, e
                        )));
                    }
                    tracing::debug!("CDP connection failed, retrying... ({} left)", remaining);
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                }
            }
        };
        tracing::info!("CDP connection established");

        // The handler must be polled for any browser command to complete
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        tokio::time::sleep(CONNECT_RETRY_DELAY).await;
        let existing = match browser.pages().await {
            Ok(pages) => pages.into_iter().next(),
            Err(e) => {
                handler_task.abort();
                return Err(e.into());
            }
        };
        let page = match existing {
            Some(page) => page,
            None => match browser.new_page("about:blank").await {
                Ok(page) => page,
                Err(e) => {
                    handler_task.abort();
                    return Err(e.into());
                }
            },
        };

        Ok((browser, handler_task, ChromiumDriver::new(page)))
    }

    pub fn driver(&self) -> &ChromiumDriver {
        &self.driver
    }

    /// Close the browser gracefully, then make sure the process is gone
    pub async fn shutdown(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!("Browser close failed: {}", e);
            }
        }
        self.teardown();
        tracing::info!("Browser session closed");
    }

    fn teardown(&mut self) {
        self.handler.abort();
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("Chrome already exited: {}", e);
            }
            let _ = child.wait();
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
