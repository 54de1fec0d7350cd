//! Typed locator chains
//!
//! A [`Locator`] is a list of refinement segments applied left to right,
//! starting from the page. The Playwright bridge replays the same chain with
//! `page.locator(..)`, `getByRole(..)`, `filter(..)` and `nth(..)`, so a
//! locator built here resolves exactly like its Playwright counterpart.

use std::fmt;

use serde::{Deserialize, Serialize};

/// ARIA roles the page objects query by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    Button,
    Textbox,
    Heading,
}

impl AriaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AriaRole::Button => "button",
            AriaRole::Textbox => "textbox",
            AriaRole::Heading => "heading",
        }
    }
}

/// Element state to wait for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

/// Page load milestone to wait for after navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Load,
    DomContentLoaded,
    NetworkIdle,
}

/// One refinement step of a locator chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Css { selector: String },
    Xpath { expression: String },
    Role { role: AriaRole, name: Option<String> },
    Text { text: String, exact: bool },
    HasText { text: String },
    /// Regex source applied to the element's full text.
    HasPattern { pattern: String },
    Has { inner: Locator },
    Nth { index: usize },
}

/// A query describing how to find zero, one or many elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    segments: Vec<Segment>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_segment(Segment::Css { selector: selector.into() })
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::from_segment(Segment::Xpath { expression: expression.into() })
    }

    pub fn role(role: AriaRole, name: Option<&str>) -> Self {
        Self::from_segment(Segment::Role {
            role,
            name: name.map(String::from),
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_segment(Segment::Text { text: text.into(), exact: false })
    }

    fn from_segment(segment: Segment) -> Self {
        Self { segments: vec![segment] }
    }

    fn push(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Descendant CSS query scoped to this locator.
    pub fn locator(self, selector: impl Into<String>) -> Self {
        self.push(Segment::Css { selector: selector.into() })
    }

    /// Descendant text query scoped to this locator.
    pub fn get_by_text(self, text: impl Into<String>) -> Self {
        self.push(Segment::Text { text: text.into(), exact: false })
    }

    /// Keep elements whose text contains `text` (case-insensitive).
    pub fn has_text(self, text: impl Into<String>) -> Self {
        self.push(Segment::HasText { text: text.into() })
    }

    /// Keep elements whose full text equals `text`, ignoring surrounding
    /// whitespace.
    pub fn has_text_exact(self, text: impl AsRef<str>) -> Self {
        self.push(Segment::HasPattern {
            pattern: exact_text_pattern(text.as_ref()),
        })
    }

    /// Keep elements that contain a descendant matching `inner`.
    pub fn has(self, inner: Locator) -> Self {
        self.push(Segment::Has { inner })
    }

    /// Zero-based occurrence among the current matches.
    pub fn nth(self, index: usize) -> Self {
        self.push(Segment::Nth { index })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Css { selector } => write!(f, "locator({selector:?})")?,
                Segment::Xpath { expression } => write!(f, "locator(\"xpath={expression}\")")?,
                Segment::Role { role, name: Some(name) } => {
                    write!(f, "getByRole({:?}, {{ name: {name:?} }})", role.as_str())?
                }
                Segment::Role { role, name: None } => write!(f, "getByRole({:?})", role.as_str())?,
                Segment::Text { text, exact } => write!(f, "getByText({text:?}, exact={exact})")?,
                Segment::HasText { text } => write!(f, "filter(hasText={text:?})")?,
                Segment::HasPattern { pattern } => write!(f, "filter(hasText=/{pattern}/)")?,
                Segment::Has { inner } => write!(f, "filter(has={inner})")?,
                Segment::Nth { index } => write!(f, "nth({index})")?,
            }
        }
        Ok(())
    }
}

/// Anchored regex source matching exactly `text`, padded by whitespace.
///
/// The source is compiled by JavaScript's `RegExp` on the bridge side;
/// `regex::escape` only emits escapes JavaScript accepts.
pub fn exact_text_pattern(text: &str) -> String {
    format!(r"^\s*{}\s*$", regex::escape(text))
}

/// Quote a string for use as an XPath 1.0 literal.
///
/// XPath has no escape syntax, so values holding both quote kinds are
/// split into a `concat(..)` call.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
