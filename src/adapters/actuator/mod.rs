//! Browser automation
//!
//! [`UiActuator`] is the capability the dashboard adapter consumes;
//! [`WebDriverActuator`] implements it over the W3C WebDriver protocol.

pub mod selector;
pub mod traits;
pub mod webdriver;

pub use selector::Selector;
pub use traits::{ActuatorResult, BrowserCookie, UiActuator, WaitState};
pub use webdriver::{SessionOptions, WebDriverActuator};
