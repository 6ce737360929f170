//! XML column values and the restricted path language used to query them.
//!
//! # Responsibility
//! - Guarantee that an `XmlDocument` holds well-formed XML text.
//! - Parse and evaluate absolute element paths with an optional attribute or
//!   `text()` tail.
//!
//! # Invariants
//! - A parsed `XmlPath` contains no quote characters, so it can be rendered
//!   as a SQL string literal without escaping.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static XML_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(/[A-Za-z_][A-Za-z0-9_.\-]*)+(/@[A-Za-z_][A-Za-z0-9_.\-]*|/text\(\))?$")
        .expect("valid xml path regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlError {
    message: String,
}

impl XmlError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for XmlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for XmlError {}

/// Well-formed XML text persisted in a text column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    text: String,
}

impl XmlDocument {
    pub fn parse(text: impl Into<String>) -> Result<Self, XmlError> {
        let text = text.into();
        parse_tree(&text)
            .map_err(|err| XmlError::new(format!("malformed xml document: {err}")))?;
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Returns the text selected by `path`, or `None` when nothing matches.
    pub fn select(&self, path: &XmlPath) -> Result<Option<String>, XmlError> {
        path.evaluate(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathTail {
    Element,
    Text,
    Attribute(String),
}

/// Absolute path such as `/Study/Series/@Modality` or `/Study/Desc/text()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPath {
    raw: String,
    steps: Vec<String>,
    tail: PathTail,
}

impl XmlPath {
    pub fn parse(path: &str) -> Result<Self, XmlError> {
        let trimmed = path.trim();
        if !XML_PATH_RE.is_match(trimmed) {
            return Err(XmlError::new(format!(
                "unsupported xml path `{trimmed}`; expected /element[/element...][/@attribute|/text()]"
            )));
        }

        let mut steps = trimmed
            .split('/')
            .skip(1)
            .map(str::to_string)
            .collect::<Vec<_>>();
        let tail = match steps.last().map(String::as_str) {
            Some("text()") => {
                steps.pop();
                PathTail::Text
            }
            Some(last) if last.starts_with('@') => {
                let name = last.trim_start_matches('@').to_string();
                steps.pop();
                PathTail::Attribute(name)
            }
            _ => PathTail::Element,
        };

        Ok(Self {
            raw: trimmed.to_string(),
            steps,
            tail,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Evaluates the path against raw XML text; the first match wins.
    pub fn evaluate(&self, document: &str) -> Result<Option<String>, XmlError> {
        let doc = parse_tree(document)
            .map_err(|err| XmlError::new(format!("malformed xml document: {err}")))?;

        let mut current = vec![doc.root()];
        for step in &self.steps {
            current = current
                .iter()
                .flat_map(|node| node.children())
                .filter(|child| child.is_element() && child.tag_name().name() == step)
                .collect();
            if current.is_empty() {
                return Ok(None);
            }
        }

        let selected = match &self.tail {
            PathTail::Attribute(name) => current
                .iter()
                .find_map(|node| node.attribute(name.as_str()))
                .map(str::to_string),
            PathTail::Element | PathTail::Text => current.first().map(|node| {
                node.descendants()
                    .filter(|descendant| descendant.is_text())
                    .filter_map(|descendant| descendant.text())
                    .collect::<String>()
            }),
        };
        Ok(selected)
    }
}

impl Display for XmlPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Document tree with `<!DOCTYPE>` allowed; external entities are never resolved.
fn parse_tree(text: &str) -> Result<roxmltree::Document<'_>, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    roxmltree::Document::parse_with_options(text, options)
}
