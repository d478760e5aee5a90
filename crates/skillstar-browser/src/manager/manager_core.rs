//! BrowserManager: connect or launch Chrome, hold the shared page session,
//! shut down with a bounded grace period.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use skillstar_config::BrowserConfig;
use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::BrowserError;
use crate::cdp::{CdpClient, PageSession};

/// Owns the single browser connection and page used by all tasks.
pub struct BrowserManager {
    config: BrowserConfig,
    client: RwLock<Option<Arc<CdpClient>>>,
    page: RwLock<Option<Arc<PageSession>>>,
    /// Chrome process handle (if we launched it).
    chrome_process: RwLock<Option<Child>>,
}

impl BrowserManager {
    /// Create a new browser manager.
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            page: RwLock::new(None),
            chrome_process: RwLock::new(None),
        }
    }

    /// Browser configuration in use.
    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Find Chrome executable path.
    pub fn find_chrome() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths: &[&str] = &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];

        #[cfg(target_os = "linux")]
        let paths: &[&str] = &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        #[cfg(target_os = "windows")]
        let paths: &[&str] = &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let paths: &[&str] = &[];

        paths.iter().map(PathBuf::from).find(|p| p.exists())
    }

    /// Chrome command-line arguments for this configuration.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.config.debug_port),
            format!("--user-data-dir={}", self.config.profile_dir().display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-background-networking".to_string(),
            "--disable-sync".to_string(),
            "--disable-translate".to_string(),
        ];
        if self.config.headless {
            args.push("--headless=new".to_string());
        }
        args
    }

    async fn is_chrome_running(&self) -> bool {
        reqwest::get(&format!("{}/json/version", self.config.endpoint()))
            .await
            .is_ok()
    }

    async fn launch_chrome(&self) -> Result<Child, BrowserError> {
        let chrome_path = Self::find_chrome().ok_or(BrowserError::ChromeNotFound)?;
        let profile_dir = self.config.profile_dir();

        if let Err(e) = std::fs::create_dir_all(&profile_dir) {
            warn!("Failed to create profile directory: {}", e);
        }

        info!("Launching Chrome with profile at: {}", profile_dir.display());

        let child = Command::new(&chrome_path)
            .args(self.launch_args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!("Chrome launched with PID: {:?}", child.id());
        Ok(child)
    }

    /// Connect to the browser, launching it if necessary.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        if self.client.read().await.is_some() {
            return Ok(());
        }

        if !self.is_chrome_running().await {
            info!(
                "Chrome not running on port {}, launching...",
                self.config.debug_port
            );

            let child = self.launch_chrome().await?;
            *self.chrome_process.write().await = Some(child);

            let poll = Duration::from_millis(200);
            let attempts = (self.config.launch_timeout_ms / 200).max(1);
            let mut ready = false;
            for _ in 0..attempts {
                tokio::time::sleep(poll).await;
                if self.is_chrome_running().await {
                    ready = true;
                    break;
                }
            }

            if !ready {
                return Err(BrowserError::LaunchFailed(
                    "Chrome failed to start within timeout".to_string(),
                ));
            }
        } else {
            info!("Chrome already running on port {}", self.config.debug_port);
        }

        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        let client = CdpClient::connect(&self.config.endpoint(), timeout).await?;
        *self.client.write().await = Some(Arc::new(client));

        info!("Connected to Chrome at {}", self.config.endpoint());
        Ok(())
    }

    /// The shared page session, opening it on first use.
    pub async fn page(&self) -> Result<Arc<PageSession>, BrowserError> {
        if let Some(page) = self.page.read().await.clone() {
            return Ok(page);
        }

        self.connect().await?;
        let client = self
            .client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)?;

        let page = Arc::new(client.new_page(None).await?);
        debug!("Opened page session {}", page.session_id());
        *self.page.write().await = Some(page.clone());
        Ok(page)
    }

    /// Drop the page and connection without touching the Chrome process.
    pub async fn close(&self) -> Result<(), BrowserError> {
        self.page.write().await.take();
        self.client.write().await.take();
        info!("Browser connection closed");
        Ok(())
    }

    /// Tear down the session; a Chrome we launched gets `shutdown_grace_secs`
    /// to exit before it is killed.
    pub async fn shutdown(&self) -> Result<(), BrowserError> {
        let client = self.client.read().await.clone();
        let child = self.chrome_process.write().await.take();

        if let (Some(client), Some(_)) = (&client, &child) {
            if let Err(e) = client.close_browser().await {
                debug!("Browser.close failed: {}", e);
            }
        }

        self.close().await?;

        if let Some(mut child) = child {
            let grace = Duration::from_secs(self.config.shutdown_grace_secs);
            match tokio::time::timeout(grace, child.wait()).await {
                Ok(Ok(status)) => info!("Chrome exited: {}", status),
                Ok(Err(e)) => warn!("Waiting for Chrome failed: {}", e),
                Err(_) => {
                    warn!("Chrome did not exit within {:?}, killing", grace);
                    let _ = child.kill().await;
                }
            }
        }

        Ok(())
    }
}
