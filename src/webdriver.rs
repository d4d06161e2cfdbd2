use std::time::Duration;

use fantoccini::{Client, ClientBuilder};
use serde_json::json;

use crate::{
    error::{ScrollcastError, ScrollcastResult},
    navigate::PageNavigator,
};

/// [`PageNavigator`] backed by a WebDriver endpoint (chromedriver,
/// geckodriver) through `fantoccini`.
///
/// fantoccini is async; a dedicated current-thread runtime is blocked on at
/// the trait boundary so the capture pipeline stays synchronous.
pub struct WebDriverNavigator {
    rt: tokio::runtime::Runtime,
    client: Option<Client>,
}

impl WebDriverNavigator {
    /// Connect to a running WebDriver at `webdriver_url` and size the window
    /// to the capture viewport.
    pub fn connect(
        webdriver_url: &str,
        viewport_width: u32,
        viewport_height: u32,
    ) -> ScrollcastResult<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                ScrollcastError::navigation(format!("failed to start webdriver runtime: {e}"))
            })?;

        let client = rt.block_on(async {
            let client = ClientBuilder::native()
                .connect(webdriver_url)
                .await
                .map_err(|e| {
                    ScrollcastError::navigation(format!(
                        "failed to connect to webdriver at '{webdriver_url}': {e}"
                    ))
                })?;
            client
                .set_window_size(viewport_width, viewport_height)
                .await
                .map_err(|e| {
                    ScrollcastError::navigation(format!("failed to size browser window: {e}"))
                })?;
            Ok::<_, ScrollcastError>(client)
        })?;

        Ok(Self {
            rt,
            client: Some(client),
        })
    }

    fn client(&self) -> ScrollcastResult<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| ScrollcastError::navigation("browser session is already closed"))
    }
}

impl PageNavigator for WebDriverNavigator {
    fn navigate(&mut self, url: &str, timeout: Duration) -> ScrollcastResult<f64> {
        let client = self.client()?;
        self.rt.block_on(async {
            tokio::time::timeout(timeout, client.goto(url))
                .await
                .map_err(|_| {
                    ScrollcastError::navigation(format!(
                        "page '{url}' did not load within {timeout:?}"
                    ))
                })?
                .map_err(|e| {
                    ScrollcastError::navigation(format!("failed to load '{url}': {e}"))
                })?;

            let height = client
                .execute("return document.documentElement.scrollHeight;", vec![])
                .await
                .map_err(|e| {
                    ScrollcastError::navigation(format!("failed to read page height: {e}"))
                })?;
            height.as_f64().ok_or_else(|| {
                ScrollcastError::navigation("page height is not a number (unexpected)")
            })
        })
    }

    fn scroll_to(&mut self, y: f64) -> ScrollcastResult<()> {
        let client = self.client()?;
        self.rt.block_on(async {
            client
                .execute("window.scrollTo(0, arguments[0]);", vec![json!(y)])
                .await
                .map_err(|e| ScrollcastError::navigation(format!("scroll command failed: {e}")))?;
            Ok(())
        })
    }

    fn screenshot(&mut self) -> ScrollcastResult<Vec<u8>> {
        let client = self.client()?;
        self.rt.block_on(async {
            client
                .screenshot()
                .await
                .map_err(|e| ScrollcastError::capture(format!("screenshot failed: {e}")))
        })
    }

    fn close(&mut self) -> ScrollcastResult<()> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };
        self.rt.block_on(async {
            client.close().await.map_err(|e| {
                ScrollcastError::navigation(format!("failed to close browser session: {e}"))
            })
        })
    }
}

impl Drop for WebDriverNavigator {
    fn drop(&mut self) {
        if self.client.is_some()
            && let Err(e) = self.close()
        {
            tracing::warn!(error = %e, "failed to close browser session on drop");
        }
    }
}
