//! Element selectors
//!
//! A selector is plain CSS, optionally narrowed by a `:has-text("...")` text
//! filter on the matched element and optionally followed by `>> child-css`,
//! naming the descendant to act on. Examples:
//!
//! ```text
//! .sourcelist
//! button.el-button:has-text("筛选")
//! label:has-text("微博") >> .el-checkbox__inner
//! ```

use crate::domain::ActuatorError;
use serde_json::{json, Value};
use std::fmt;

const HAS_TEXT: &str = ":has-text(";
const CHILD_SEPARATOR: &str = ">>";

/// Parsed selector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    css: String,
    text: Option<String>,
    child: Option<String>,
}

impl Selector {
    /// Parse a selector string
    ///
    /// # Errors
    ///
    /// Returns [`ActuatorError::InvalidSelector`] for empty input, an
    /// unterminated text filter or an empty child part.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashport::adapters::actuator::Selector;
    ///
    /// let selector = Selector::parse(r#"label:has-text("微博") >> .el-checkbox__inner"#).unwrap();
    /// assert_eq!(selector.css(), "label");
    /// assert_eq!(selector.text(), Some("微博"));
    /// assert_eq!(selector.child(), Some(".el-checkbox__inner"));
    /// ```
    pub fn parse(input: &str) -> Result<Self, ActuatorError> {
        let invalid = |why: &str| ActuatorError::InvalidSelector(format!("{why}: '{input}'"));

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty selector"));
        }

        let (head, child) = match split_child(trimmed) {
            Some((head, child)) => {
                let child = child.trim();
                if child.is_empty() {
                    return Err(invalid("empty child selector"));
                }
                (head.trim(), Some(child.to_string()))
            }
            None => (trimmed, None),
        };

        let (css, text) = match head.find(HAS_TEXT) {
            Some(at) => {
                let (text, rest) = parse_quoted(&head[at + HAS_TEXT.len()..])
                    .ok_or_else(|| invalid("unterminated :has-text()"))?;
                if !rest.trim().is_empty() {
                    return Err(invalid(":has-text() must end the selector"));
                }
                (head[..at].trim(), Some(text))
            }
            None => (head, None),
        };

        if css.is_empty() {
            return Err(invalid("missing CSS part"));
        }

        Ok(Self {
            css: css.to_string(),
            text,
            child,
        })
    }

    /// Selector for plain CSS
    pub fn css_only(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: None,
            child: None,
        }
    }

    /// CSS part
    pub fn css(&self) -> &str {
        &self.css
    }

    /// Text filter, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Descendant CSS, if any
    pub fn child(&self) -> Option<&str> {
        self.child.as_deref()
    }

    /// Same selector acting on a descendant
    ///
    /// Replaces any existing child part.
    pub fn with_child(&self, child: impl Into<String>) -> Self {
        Self {
            child: Some(child.into()),
            ..self.clone()
        }
    }

    /// Same selector with a text filter
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..self.clone()
        }
    }

    /// JSON form passed to in-page resolution scripts
    pub fn to_json(&self) -> Value {
        json!({
            "css": self.css,
            "text": self.text,
            "child": self.child,
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css)?;
        if let Some(text) = &self.text {
            write!(f, ":has-text({text:?})")?;
        }
        if let Some(child) = &self.child {
            write!(f, " {CHILD_SEPARATOR} {child}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Selector {
    type Err = ActuatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split at the first `>>` outside quotes
fn split_child(input: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => {
                if matches!(chars.peek(), Some((_, '>'))) {
                    return Some((&input[..i], &input[i + CHILD_SEPARATOR.len()..]));
                }
            }
            (None, _) => {}
        }
    }
    None
}

/// Parse `"text")rest` into the text and `rest`
fn parse_quoted(input: &str) -> Option<(String, &str)> {
    let mut chars = input.char_indices();
    let (_, quote) = chars.next().filter(|(_, c)| *c == '"' || *c == '\'')?;

    let mut text = String::new();
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            text.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            let rest = input[i + c.len_utf8()..].strip_prefix(')')?;
            return Some((text, rest));
        } else {
            text.push(c);
        }
    }
    None
}
