//! W3C WebDriver actuator
//!
//! Talks JSON over HTTP to a chromedriver-compatible endpoint. Elements are
//! located by one in-page script that applies the CSS, text filter and child
//! rules of a [`Selector`]; the returned element reference is then used with
//! the native WebDriver element commands.

use super::selector::Selector;
use super::traits::{ActuatorResult, BrowserCookie, UiActuator, WaitState};
use crate::config::DashboardConfig;
use crate::domain::ActuatorError;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Key under which WebDriver serializes element references
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Finds the element a selector designates, or null
const FIND_ELEMENT_JS: &str = r#"
function __dashportFind(sel) {
  let candidates = Array.from(document.querySelectorAll(sel.css));
  if (sel.text !== null) {
    candidates = candidates.filter(el => (el.innerText || el.textContent || '').includes(sel.text));
  }
  for (const el of candidates) {
    if (sel.child === null) return el;
    const child = el.querySelector(sel.child);
    if (child) return child;
  }
  return null;
}
"#;

const RESOLVE_BODY: &str = "return __dashportFind(arguments[0]);";

const STATE_BODY: &str = r#"
const el = __dashportFind(arguments[0]);
if (!el) return 'detached';
const rect = el.getBoundingClientRect();
const style = window.getComputedStyle(el);
const shown = rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
return shown ? 'visible' : 'hidden';
"#;

/// Options for creating a browser session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// WebDriver endpoint
    pub webdriver_url: String,
    /// Browser executable, when not the driver's default
    pub browser_binary: Option<String>,
    /// Run without a visible window
    pub headless: bool,
    /// Extra browser arguments
    pub args: Vec<String>,
    /// Window size in pixels
    pub window: (u32, u32),
    /// User agent override
    pub user_agent: Option<String>,
    /// Directory the browser saves downloads into
    pub download_dir: PathBuf,
    /// HTTP timeout for one driver command
    pub command_timeout: Duration,
}

impl SessionOptions {
    /// Options from the dashboard section
    pub fn from_config(config: &DashboardConfig, download_dir: &Path) -> Self {
        Self {
            webdriver_url: config.webdriver_url.trim_end_matches('/').to_string(),
            browser_binary: config.resolved_browser_binary(),
            headless: config.headless,
            args: config.browser_args.clone(),
            window: (config.window_width, config.window_height),
            user_agent: config.user_agent.clone(),
            download_dir: absolute(download_dir),
            command_timeout: config.default_timeout(),
        }
    }

    /// New-session request body
    pub fn capabilities(&self) -> Value {
        let mut args = self.args.clone();
        args.push(format!("--window-size={},{}", self.window.0, self.window.1));
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if let Some(agent) = &self.user_agent {
            args.push(format!("--user-agent={agent}"));
        }

        let mut chrome = json!({
            "args": args,
            "prefs": {
                "download.default_directory": self.download_dir.to_string_lossy(),
                "download.prompt_for_download": false,
            },
        });
        if let Some(binary) = &self.browser_binary {
            chrome["binary"] = Value::String(binary.clone());
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "acceptInsecureCerts": true,
                    "goog:chromeOptions": chrome,
                }
            }
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Browser session driven through WebDriver
pub struct WebDriverActuator {
    client: Client,
    endpoint: String,
    session_id: String,
}

impl WebDriverActuator {
    /// Create a new browser session
    ///
    /// # Errors
    ///
    /// Returns an error if the driver is unreachable or refuses the session
    pub async fn launch(options: &SessionOptions) -> ActuatorResult<Self> {
        let client = ClientBuilder::new()
            .timeout(options.command_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ActuatorError::Transport(format!("Failed to build HTTP client: {e}")))?;

        let endpoint = options.webdriver_url.trim_end_matches('/').to_string();
        let url = format!("{endpoint}/session");

        tracing::debug!(endpoint = %endpoint, "Creating WebDriver session");
        let value = send(&client, Method::POST, &url, Some(options.capabilities())).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ActuatorError::Protocol {
                error: "invalid response".to_string(),
                message: format!("new session response without sessionId: {value}"),
            })?
            .to_string();

        tracing::info!(session_id = %session_id, "Browser session created");

        Ok(Self {
            client,
            endpoint,
            session_id,
        })
    }

    /// Driver-assigned session id
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.endpoint, self.session_id, path)
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> ActuatorResult<Value> {
        send(&self.client, method, &self.url(path), body).await
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> ActuatorResult<Value> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    /// Element id for the first match
    async fn resolve(&self, selector: &Selector) -> ActuatorResult<String> {
        let script = format!("{FIND_ELEMENT_JS}\n{RESOLVE_BODY}");
        let value = self.execute(&script, vec![selector.to_json()]).await?;
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ActuatorError::ElementNotFound(selector.to_string()))
    }

    /// One of "detached", "hidden", "visible"
    async fn element_state(&self, selector: &Selector) -> ActuatorResult<String> {
        let script = format!("{FIND_ELEMENT_JS}\n{STATE_BODY}");
        let value = self.execute(&script, vec![selector.to_json()]).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ActuatorError::Script(format!("unexpected element state {value}")))
    }

    async fn element_command(
        &self,
        selector: &Selector,
        method: Method,
        suffix: &str,
        body: Option<Value>,
    ) -> ActuatorResult<Value> {
        let id = self.resolve(selector).await?;
        self.command(method, &format!("/element/{id}{suffix}"), body)
            .await
    }
}

#[async_trait]
impl UiActuator for WebDriverActuator {
    async fn navigate(&self, url: &str) -> ActuatorResult<()> {
        tracing::debug!(url = %url, "Navigating");
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn reload(&self) -> ActuatorResult<()> {
        self.command(Method::POST, "/refresh", Some(json!({})))
            .await
            .map(|_| ())
    }

    async fn wait_for_load(&self, timeout: Duration) -> ActuatorResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let state = self.execute("return document.readyState;", Vec::new()).await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ActuatorError::Timeout {
                    what: "page load".to_string(),
                    after_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for(
        &self,
        selector: &Selector,
        state: WaitState,
        timeout: Duration,
    ) -> ActuatorResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let observed = self.element_state(selector).await?;
            if state.is_satisfied_by(&observed) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ActuatorError::Timeout {
                    what: format!("{selector} to be {state:?}"),
                    after_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, selector: &Selector) -> ActuatorResult<()> {
        self.element_command(selector, Method::POST, "/click", Some(json!({})))
            .await
            .map(|_| ())
    }

    async fn fill(&self, selector: &Selector, value: &str) -> ActuatorResult<()> {
        let id = self.resolve(selector).await?;
        self.command(Method::POST, &format!("/element/{id}/clear"), Some(json!({})))
            .await?;
        self.command(
            Method::POST,
            &format!("/element/{id}/value"),
            Some(json!({ "text": value })),
        )
        .await
        .map(|_| ())
    }

    async fn input_value(&self, selector: &Selector) -> ActuatorResult<String> {
        let value = self
            .element_command(selector, Method::GET, "/property/value", None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn read_text(&self, selector: &Selector) -> ActuatorResult<String> {
        let value = self
            .element_command(selector, Method::GET, "/text", None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn is_checked(&self, selector: &Selector) -> ActuatorResult<bool> {
        let value = self
            .element_command(selector, Method::GET, "/property/checked", None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn hover(&self, selector: &Selector) -> ActuatorResult<()> {
        let id = self.resolve(selector).await?;
        let actions = json!({
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": [{
                    "type": "pointerMove",
                    "duration": 0,
                    "origin": { ELEMENT_KEY: id },
                    "x": 0,
                    "y": 0
                }]
            }]
        });
        self.command(Method::POST, "/actions", Some(actions))
            .await
            .map(|_| ())
    }

    async fn evaluate(&self, script: &str, args: Vec<Value>) -> ActuatorResult<Value> {
        self.execute(script, args).await
    }

    async fn set_cookies(&self, cookies: &[BrowserCookie]) -> ActuatorResult<()> {
        for cookie in cookies {
            self.command(Method::POST, "/cookie", Some(json!({ "cookie": cookie })))
                .await?;
        }
        tracing::debug!(count = cookies.len(), "Cookies set");
        Ok(())
    }

    async fn close(&self) -> ActuatorResult<()> {
        let url = format!("{}/session/{}", self.endpoint, self.session_id);
        send(&self.client, Method::DELETE, &url, None).await?;
        tracing::info!(session_id = %self.session_id, "Browser session closed");
        Ok(())
    }
}

/// Send one command and unwrap the `value` member of the reply
async fn send(client: &Client, method: Method, url: &str, body: Option<Value>) -> ActuatorResult<Value> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ActuatorError::Transport(e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ActuatorError::Transport(e.to_string()))?;

    let payload: Value = serde_json::from_str(&text).map_err(|_| ActuatorError::Protocol {
        error: format!("http {}", status.as_u16()),
        message: text.clone(),
    })?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(match error {
            "no such element" | "stale element reference" => ActuatorError::ElementNotFound(message),
            "script timeout" | "timeout" => ActuatorError::Timeout {
                what: message,
                after_ms: 0,
            },
            "javascript error" => ActuatorError::Script(message),
            _ => ActuatorError::Protocol {
                error: error.to_string(),
                message,
            },
        });
    }

    if !status.is_success() {
        return Err(ActuatorError::Protocol {
            error: format!("http {}", status.as_u16()),
            message: text,
        });
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn options(url: String) -> SessionOptions {
        SessionOptions {
            webdriver_url: url,
            browser_binary: Some("/opt/chrome/chrome".to_string()),
            headless: true,
            args: vec!["--no-sandbox".to_string()],
            window: (1600, 900),
            user_agent: None,
            download_dir: PathBuf::from("/tmp/downloads"),
            command_timeout: Duration::from_secs(5),
        }
    }

    async fn launched(server: &mut Server) -> WebDriverActuator {
        server
            .mock("POST", "/session")
            .with_header("content-type", "application/json")
            .with_body(r#"{"value":{"sessionId":"abc","capabilities":{}}}"#)
            .create_async()
            .await;
        WebDriverActuator::launch(&options(server.url()))
            .await
            .unwrap()
    }

    fn element_body() -> String {
        format!(r#"{{"value":{{"{ELEMENT_KEY}":"el-1"}}}}"#)
    }

    #[test]
    fn test_capabilities() {
        let caps = options("http://localhost:9515".to_string()).capabilities();
        let chrome = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"];
        let args: Vec<&str> = chrome["args"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(args.contains(&"--window-size=1600,900"));
        assert!(args.contains(&"--headless=new"));
        assert_eq!(chrome["binary"], "/opt/chrome/chrome");
        assert_eq!(chrome["prefs"]["download.default_directory"], "/tmp/downloads");
    }

    #[tokio::test]
    async fn test_launch_reads_session_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/session")
            .match_body(Matcher::PartialJson(json!({
                "capabilities": { "alwaysMatch": { "browserName": "chrome" } }
            })))
            .with_body(r#"{"value":{"sessionId":"abc","capabilities":{}}}"#)
            .create_async()
            .await;

        let actuator = WebDriverActuator::launch(&options(server.url()))
            .await
            .unwrap();
        assert_eq!(actuator.session_id(), "abc");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_launch_refused() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/session")
            .with_status(500)
            .with_body(r#"{"value":{"error":"session not created","message":"Chrome failed to start"}}"#)
            .create_async()
            .await;

        let err = WebDriverActuator::launch(&options(server.url()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ActuatorError::Protocol { ref error, .. } if error == "session not created"));
    }

    #[tokio::test]
    async fn test_click_resolves_then_clicks() {
        let mut server = Server::new_async().await;
        let actuator = launched(&mut server).await;

        let resolve = server
            .mock("POST", "/session/abc/execute/sync")
            .match_body(Matcher::PartialJson(json!({
                "args": [{ "css": "button", "text": "筛选", "child": null }]
            })))
            .with_body(element_body())
            .create_async()
            .await;
        let click = server
            .mock("POST", "/session/abc/element/el-1/click")
            .with_body(r#"{"value":null}"#)
            .create_async()
            .await;

        let selector = Selector::parse(r#"button:has-text("筛选")"#).unwrap();
        actuator.click(&selector).await.unwrap();

        resolve.assert_async().await;
        click.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_element() {
        let mut server = Server::new_async().await;
        let actuator = launched(&mut server).await;
        server
            .mock("POST", "/session/abc/execute/sync")
            .with_body(r#"{"value":null}"#)
            .create_async()
            .await;

        let err = actuator
            .read_text(&Selector::css_only(".sourcelist"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActuatorError::ElementNotFound(ref s) if s == ".sourcelist"));
    }

    #[tokio::test]
    async fn test_fill_clears_then_types() {
        let mut server = Server::new_async().await;
        let actuator = launched(&mut server).await;
        server
            .mock("POST", "/session/abc/execute/sync")
            .with_body(element_body())
            .create_async()
            .await;
        let clear = server
            .mock("POST", "/session/abc/element/el-1/clear")
            .with_body(r#"{"value":null}"#)
            .create_async()
            .await;
        let value = server
            .mock("POST", "/session/abc/element/el-1/value")
            .match_body(Matcher::PartialJson(json!({ "text": "2025/01/02 14:00:00" })))
            .with_body(r#"{"value":null}"#)
            .create_async()
            .await;

        actuator
            .fill(&Selector::css_only("input"), "2025/01/02 14:00:00")
            .await
            .unwrap();
        clear.assert_async().await;
        value.assert_async().await;
    }

    #[tokio::test]
    async fn test_wait_for_times_out() {
        let mut server = Server::new_async().await;
        let actuator = launched(&mut server).await;
        server
            .mock("POST", "/session/abc/execute/sync")
            .with_body(r#"{"value":"hidden"}"#)
            .expect_at_least(2)
            .create_async()
            .await;

        let err = actuator
            .wait_for(
                &Selector::css_only(".dropdown"),
                WaitState::Visible,
                Duration::from_millis(250),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ActuatorError::Timeout { after_ms: 250, .. }));
    }

    #[tokio::test]
    async fn test_wait_for_attached_accepts_hidden() {
        let mut server = Server::new_async().await;
        let actuator = launched(&mut server).await;
        server
            .mock("POST", "/session/abc/execute/sync")
            .with_body(r#"{"value":"hidden"}"#)
            .create_async()
            .await;

        actuator
            .wait_for(
                &Selector::css_only(".sourcelist"),
                WaitState::Attached,
                Duration::from_secs(1),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_script_error_mapped() {
        let mut server = Server::new_async().await;
        let actuator = launched(&mut server).await;
        server
            .mock("POST", "/session/abc/execute/sync")
            .with_status(500)
            .with_body(r#"{"value":{"error":"javascript error","message":"x is not defined"}}"#)
            .create_async()
            .await;

        let err = actuator.evaluate("return x;", Vec::new()).await.unwrap_err();
        assert!(matches!(err, ActuatorError::Script(ref m) if m == "x is not defined"));
    }

    #[tokio::test]
    async fn test_close_deletes_session() {
        let mut server = Server::new_async().await;
        let actuator = launched(&mut server).await;
        let delete = server
            .mock("DELETE", "/session/abc")
            .with_body(r#"{"value":null}"#)
            .create_async()
            .await;

        actuator.close().await.unwrap();
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let err = WebDriverActuator::launch(&options("http://127.0.0.1:1".to_string()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ActuatorError::Transport(_)));
    }
}
