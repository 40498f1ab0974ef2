//! UI actuator trait definition
//!
//! A UI actuator drives one browser page. Every call is a fallible remote
//! operation that may time out or find nothing; callers verify outcomes
//! themselves instead of trusting that an action had its effect.

use super::selector::Selector;
use crate::config::CookieConfig;
use crate::domain::ActuatorError;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Result type for actuator calls
pub type ActuatorResult<T> = std::result::Result<T, ActuatorError>;

/// Element state awaited by [`UiActuator::wait_for`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Present in the DOM
    Attached,
    /// Present and rendered
    Visible,
    /// Absent or not rendered
    Hidden,
    /// Absent from the DOM
    Detached,
}

impl WaitState {
    /// Whether an element in the observed state satisfies this wait
    ///
    /// `observed` is one of "detached", "hidden" or "visible".
    pub fn is_satisfied_by(&self, observed: &str) -> bool {
        match self {
            WaitState::Attached => observed != "detached",
            WaitState::Visible => observed == "visible",
            WaitState::Hidden => observed != "visible",
            WaitState::Detached => observed == "detached",
        }
    }
}

/// Cookie injected into the browser session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserCookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Cookie domain; the current page's host when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Cookie path
    pub path: String,
}

impl From<&CookieConfig> for BrowserCookie {
    fn from(config: &CookieConfig) -> Self {
        Self {
            name: config.name.clone(),
            value: config.value.expose_secret().as_ref().to_string(),
            domain: config.domain.clone(),
            path: config.path.clone(),
        }
    }
}

/// Browser page automation
///
/// Implementations must be safe to share across tasks, although the export
/// flow drives one page sequentially.
#[async_trait]
pub trait UiActuator: Send + Sync {
    /// Open a URL in the current page
    async fn navigate(&self, url: &str) -> ActuatorResult<()>;

    /// Reload the current page
    async fn reload(&self) -> ActuatorResult<()>;

    /// Wait until the document has finished loading
    async fn wait_for_load(&self, timeout: Duration) -> ActuatorResult<()>;

    /// Wait until the first element matching `selector` reaches `state`
    async fn wait_for(
        &self,
        selector: &Selector,
        state: WaitState,
        timeout: Duration,
    ) -> ActuatorResult<()>;

    /// Click the first matching element
    async fn click(&self, selector: &Selector) -> ActuatorResult<()>;

    /// Replace the value of the first matching input
    async fn fill(&self, selector: &Selector, value: &str) -> ActuatorResult<()>;

    /// Current value of the first matching input
    async fn input_value(&self, selector: &Selector) -> ActuatorResult<String>;

    /// Rendered text of the first matching element
    async fn read_text(&self, selector: &Selector) -> ActuatorResult<String>;

    /// Whether the first matching checkbox is checked
    async fn is_checked(&self, selector: &Selector) -> ActuatorResult<bool>;

    /// Move the pointer over the first matching element
    async fn hover(&self, selector: &Selector) -> ActuatorResult<()>;

    /// Run a script in the page
    ///
    /// The script is a function body; `arguments[0..]` holds `args`.
    async fn evaluate(&self, script: &str, args: Vec<Value>) -> ActuatorResult<Value>;

    /// Add cookies to the current browsing context
    async fn set_cookies(&self, cookies: &[BrowserCookie]) -> ActuatorResult<()>;

    /// End the browser session
    async fn close(&self) -> ActuatorResult<()>;
}
