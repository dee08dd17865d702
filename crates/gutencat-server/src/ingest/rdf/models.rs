// Catalog record models

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw structural node copied out of the RDF document
///
/// Kept in JSON form (see [`XmlElement::to_json`](super::XmlElement::to_json))
/// so the parsed document can be dropped once masking is done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawNode(pub Value);

impl RawNode {
    /// Text of a bare leaf node
    pub fn as_text(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Missing or empty leaves count as absent values
    pub fn is_falsy(&self) -> bool {
        matches!(&self.0, Value::Null | Value::Bool(false))
            || self.as_text().is_some_and(str::is_empty)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

impl From<&str> for RawNode {
    fn from(text: &str) -> Self {
        RawNode(Value::String(text.to_string()))
    }
}

/// Issued date of a catalog entry
///
/// Unparsable source text is kept as `Invalid` so it stays distinguishable
/// from a record that carries no date at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationDate {
    Valid(NaiveDate),
    Invalid(String),
}

impl PublicationDate {
    /// Parse free-form date text
    ///
    /// Accepts ISO dates, RFC 3339 and RFC 2822 timestamps, slash-separated
    /// dates, and bare year-month or year values.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
            .or_else(|_| DateTime::parse_from_rfc2822(s).map(|dt| dt.date_naive()))
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
            .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d"))
            .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01-01", s), "%Y-%m-%d"))
            .map(PublicationDate::Valid)
            .unwrap_or_else(|_| PublicationDate::Invalid(raw.to_string()))
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            PublicationDate::Valid(date) => Some(*date),
            PublicationDate::Invalid(_) => None,
        }
    }
}

/// The normalized subset of one catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedMetadata {
    /// Numeric suffix of the entry's `rdf:about`; `None` when it could not be
    /// read as an integer, which the store rejects
    pub id: Option<i64>,
    pub language: Option<String>,
    pub title: Option<RawNode>,
    pub subjects: Vec<RawNode>,
    pub authors: Vec<String>,
    pub rights: Vec<RawNode>,
    pub publication_date: Option<PublicationDate>,
    pub publisher: Option<RawNode>,
}

impl MaskedMetadata {
    /// An empty record for `id`
    pub fn new(id: i64) -> Self {
        Self {
            id: Some(id),
            language: None,
            title: None,
            subjects: Vec::new(),
            authors: Vec::new(),
            rights: Vec::new(),
            publication_date: None,
            publisher: None,
        }
    }
}
