//! Scoped headless-browser session for sources that only render their
//! listings after JavaScript execution.

use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use rand::Rng;

use crate::fetch::FetchError;
use crate::user_agent::next_identity;

const LANDMARK_WAIT: Duration = Duration::from_secs(10);

/// One exclusively-owned browser process per scrape session.
///
/// The underlying Chrome process is a live external resource: it is acquired
/// once at session start and torn down when this value drops, on every exit
/// path.
pub struct BrowserSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserSession {
    /// Launches a headless browser and opens the session tab. Failure here is
    /// fatal to the run and is propagated to the caller immediately.
    pub fn launch() -> Result<Self, FetchError> {
        let browser = Browser::new(LaunchOptions {
            headless: true,
            idle_browser_timeout: Duration::from_secs(300),
            ..Default::default()
        })
        .map_err(browser_err)?;
        let tab = browser.new_tab().map_err(browser_err)?;
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    /// Navigates to `url`, waits for `landmark` to appear, scrolls the page
    /// like a reader would, and returns the rendered HTML.
    ///
    /// The browser protocol calls are synchronous, so the work runs on the
    /// blocking pool.
    pub(crate) async fn render_page(
        &self,
        url: &str,
        landmark: &str,
    ) -> Result<String, FetchError> {
        let tab = Arc::clone(&self.tab);
        let url = url.to_string();
        let landmark = landmark.to_string();
        tokio::task::spawn_blocking(move || render_on_tab(&tab, &url, &landmark))
            .await
            .map_err(browser_err)?
    }
}

fn render_on_tab(tab: &Tab, url: &str, landmark: &str) -> Result<String, FetchError> {
    let identity = next_identity();
    tab.set_user_agent(identity.user_agent, Some("en-US,en;q=0.9"), None)
        .map_err(browser_err)?;
    tab.navigate_to(url).map_err(browser_err)?;
    tab.wait_until_navigated().map_err(browser_err)?;
    tab.wait_for_element_with_custom_timeout(landmark, LANDMARK_WAIT)
        .map_err(|_| FetchError::LandmarkTimeout {
            selector: landmark.to_string(),
        })?;
    human_scroll(tab)?;
    tab.get_content().map_err(browser_err)
}

/// Scrolls to 5-10 pseudo-random vertical offsets with short randomized
/// pauses. Triggers lazy-loaded listings and avoids the instant full-page
/// read that marks automated access.
fn human_scroll(tab: &Tab) -> Result<(), FetchError> {
    let steps = rand::thread_rng().gen_range(5..=10);
    for _ in 0..steps {
        let offset: u32 = rand::thread_rng().gen_range(200..2000);
        tab.evaluate(&format!("window.scrollTo(0, {offset});"), false)
            .map_err(browser_err)?;
        let pause = rand::thread_rng().gen_range(150..450);
        std::thread::sleep(Duration::from_millis(pause));
    }
    Ok(())
}

fn browser_err<E: std::fmt::Display>(err: E) -> FetchError {
    FetchError::Browser(err.to_string())
}
