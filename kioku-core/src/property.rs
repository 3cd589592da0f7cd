//! Typed view of the remote store's property bags.
//!
//! The remote store returns every property as `{"type": "<kind>", "<kind>": ...}`.
//! Unknown property kinds decode as [`PropertyValue::Unsupported`] so a schema
//! change on the remote side never fails a whole page.

use crate::{MediaLink, RemoteRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaValue {
    Number {
        number: Option<f64>,
    },
    String {
        string: Option<String>,
    },
    Boolean {
        boolean: Option<bool>,
    },
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExternalFile {
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HostedFile {
    pub url: String,
    #[serde(default)]
    pub expiry_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileAttachment {
    External {
        #[serde(default)]
        name: String,
        external: ExternalFile,
    },
    File {
        #[serde(default)]
        name: String,
        file: HostedFile,
    },
}

impl FileAttachment {
    pub fn to_media(&self) -> Option<MediaLink> {
        let link = match self {
            FileAttachment::External { external, .. } => MediaLink::External {
                url: external.url.trim().to_string(),
            },
            FileAttachment::File { file, .. } => MediaLink::Hosted {
                url: file.url.trim().to_string(),
                expires_at: file.expiry_time,
            },
        };
        (!link.url().is_empty()).then_some(link)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        title: Vec<RichText>,
    },
    RichText {
        rich_text: Vec<RichText>,
    },
    Select {
        select: Option<SelectOption>,
    },
    Checkbox {
        checkbox: bool,
    },
    Number {
        number: Option<f64>,
    },
    Formula {
        formula: FormulaValue,
    },
    Url {
        url: Option<String>,
    },
    Files {
        files: Vec<FileAttachment>,
    },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    pub fn title(text: impl Into<String>) -> Self {
        PropertyValue::Title {
            title: vec![RichText { plain_text: text.into() }],
        }
    }

    pub fn rich_text(text: impl Into<String>) -> Self {
        PropertyValue::RichText {
            rich_text: vec![RichText { plain_text: text.into() }],
        }
    }

    pub fn select(name: impl Into<String>) -> Self {
        PropertyValue::Select {
            select: Some(SelectOption { name: name.into() }),
        }
    }

    pub fn checkbox(value: bool) -> Self {
        PropertyValue::Checkbox { checkbox: value }
    }

    pub fn number(value: f64) -> Self {
        PropertyValue::Number { number: Some(value) }
    }

    pub fn formula_number(value: f64) -> Self {
        PropertyValue::Formula {
            formula: FormulaValue::Number { number: Some(value) },
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        PropertyValue::Url { url: Some(url.into()) }
    }

    pub fn external_file(url: impl Into<String>) -> Self {
        PropertyValue::Files {
            files: vec![FileAttachment::External {
                name: String::new(),
                external: ExternalFile { url: url.into() },
            }],
        }
    }

    pub fn hosted_file(url: impl Into<String>, expiry_time: Option<DateTime<Utc>>) -> Self {
        PropertyValue::Files {
            files: vec![FileAttachment::File {
                name: String::new(),
                file: HostedFile {
                    url: url.into(),
                    expiry_time,
                },
            }],
        }
    }

    /// Property type name as the remote store spells it.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Title { .. } => "title",
            PropertyValue::RichText { .. } => "rich_text",
            PropertyValue::Select { .. } => "select",
            PropertyValue::Checkbox { .. } => "checkbox",
            PropertyValue::Number { .. } => "number",
            PropertyValue::Formula { .. } => "formula",
            PropertyValue::Url { .. } => "url",
            PropertyValue::Files { .. } => "files",
            PropertyValue::Unsupported => "unsupported",
        }
    }

    /// Text content of any text-like property. Fragments are joined.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            PropertyValue::Title { title: parts } | PropertyValue::RichText { rich_text: parts } => {
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.iter().map(|p| p.plain_text.as_str()).collect())
                }
            }
            PropertyValue::Select { select } => select.as_ref().map(|s| s.name.clone()),
            PropertyValue::Number { number } => number.map(format_number),
            PropertyValue::Formula { formula } => match formula {
                FormulaValue::String { string } => string.clone(),
                FormulaValue::Number { number } => number.map(format_number),
                _ => None,
            },
            PropertyValue::Url { url } => url.clone(),
            _ => None,
        }
    }

    pub fn as_checkbox(&self) -> Option<bool> {
        match self {
            PropertyValue::Checkbox { checkbox } => Some(*checkbox),
            PropertyValue::Formula {
                formula: FormulaValue::Boolean { boolean },
            } => *boolean,
            _ => None,
        }
    }

    /// Numeric value for ordering. Numbers and number formulas only.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number { number } => *number,
            PropertyValue::Formula {
                formula: FormulaValue::Number { number },
            } => *number,
            _ => None,
        }
    }

    /// First attachment of a files property, or the link of a url property.
    pub fn first_media(&self) -> Option<MediaLink> {
        match self {
            PropertyValue::Files { files } => files.first().and_then(FileAttachment::to_media),
            PropertyValue::Url { url: Some(url) } if !url.trim().is_empty() => Some(MediaLink::External {
                url: url.trim().to_string(),
            }),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One document as returned by the remote store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RemoteDocument {
    pub id: RemoteRef,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl RemoteDocument {
    pub fn new(id: impl Into<RemoteRef>) -> Self {
        Self {
            id: id.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Completion flag; a missing or non-checkbox property reads as unset.
    pub fn flag(&self, name: &str) -> bool {
        self.property(name).and_then(PropertyValue::as_checkbox).unwrap_or(false)
    }
}
