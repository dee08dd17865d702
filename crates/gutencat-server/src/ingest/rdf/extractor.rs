//! Field extraction ("masking") for Gutenberg RDF records

use super::document::{RdfDocument, XmlElement};
use super::models::{MaskedMetadata, PublicationDate, RawNode};
use crate::ingest::{IngestError, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Element naming one catalog entry
pub const EBOOK_ELEMENT: &str = "pgterms:ebook";

/// Fixed prefix of the entry's `rdf:about` value, e.g. `ebooks/10`
pub const EBOOK_ID_PREFIX: &str = "ebooks/";

const ABOUT_ATTRIBUTE: &str = "rdf:about";
const DESCRIPTION: &str = "rdf:Description";
const VALUE: &str = "rdf:value";

/// Outcome of [`RdfMetadataExtractor::mask`]
#[derive(Debug, Clone, PartialEq)]
pub enum Masked {
    Ready(MaskedMetadata),
    /// No document has been parsed yet
    NotReady,
}

#[derive(Debug, Default)]
enum ExtractorState {
    #[default]
    Uninitialized,
    Ready(RdfDocument),
}

/// Parses one record file and masks it down to [`MaskedMetadata`]
#[derive(Debug, Default)]
pub struct RdfMetadataExtractor {
    state: ExtractorState,
}

impl RdfMetadataExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ExtractorState::Ready(_))
    }

    /// Read and parse a record file
    ///
    /// On failure the extractor holds no document, even if an earlier parse
    /// had succeeded.
    pub async fn parse(&mut self, path: &Path) -> Result<()> {
        self.state = ExtractorState::Uninitialized;
        let bytes = tokio::fs::read(path).await?;
        let xml = String::from_utf8(bytes).map_err(|e| {
            IngestError::Parse(format!("{} is not valid UTF-8: {}", path.display(), e))
        })?;
        self.parse_str(&xml)
    }

    pub fn parse_str(&mut self, xml: &str) -> Result<()> {
        self.state = ExtractorState::Uninitialized;
        self.state = ExtractorState::Ready(RdfDocument::parse_str(xml)?);
        Ok(())
    }

    /// Extract the indexed fields from the parsed document
    pub fn mask(&self) -> Masked {
        match &self.state {
            ExtractorState::Uninitialized => {
                warn!("Document not ready: mask() called before a successful parse()");
                Masked::NotReady
            },
            ExtractorState::Ready(document) => Masked::Ready(mask_document(document)),
        }
    }
}

/// Apply the extraction rules against the first ebook node in the document
pub fn mask_document(document: &RdfDocument) -> MaskedMetadata {
    let Some(ebook) = document.root().find_first(EBOOK_ELEMENT) else {
        warn!("Document has no {} node", EBOOK_ELEMENT);
        return MaskedMetadata {
            id: None,
            language: None,
            title: None,
            subjects: Vec::new(),
            authors: Vec::new(),
            rights: Vec::new(),
            publication_date: None,
            publisher: None,
        };
    };

    let record = MaskedMetadata {
        id: ebook_id(ebook),
        language: language(ebook),
        title: ebook.child("dcterms:title").map(raw),
        subjects: subjects(ebook),
        authors: authors(ebook),
        rights: ebook.children_named("dcterms:rights").map(raw).collect(),
        publication_date: publication_date(ebook),
        publisher: ebook.child("dcterms:publisher").map(raw),
    };

    debug!(
        id = ?record.id,
        subjects = record.subjects.len(),
        authors = record.authors.len(),
        "Masked catalog entry"
    );

    record
}

fn raw(node: &XmlElement) -> RawNode {
    RawNode(node.to_json())
}

fn ebook_id(ebook: &XmlElement) -> Option<i64> {
    let about = ebook.attribute(ABOUT_ATTRIBUTE).unwrap_or_default();
    let suffix = about.strip_prefix(EBOOK_ID_PREFIX).unwrap_or(about);

    match suffix.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!(about = %about, "Entry resource identifier has no numeric id");
            None
        },
    }
}

fn language(ebook: &XmlElement) -> Option<String> {
    ebook
        .descend(&["dcterms:language", DESCRIPTION, VALUE])
        .and_then(XmlElement::text)
        .map(str::to_string)
}

fn subjects(ebook: &XmlElement) -> Vec<RawNode> {
    ebook
        .children_named("dcterms:subject")
        .filter_map(|subject| subject.descend(&[DESCRIPTION, VALUE]))
        .map(raw)
        .filter(|node| !node.is_falsy())
        .collect()
}

fn authors(ebook: &XmlElement) -> Vec<String> {
    ebook
        .children_named("dcterms:creator")
        .filter_map(|creator| creator.descend(&["pgterms:agent", "pgterms:name"]))
        .filter_map(XmlElement::text)
        .map(str::to_string)
        .collect()
}

fn publication_date(ebook: &XmlElement) -> Option<PublicationDate> {
    ebook
        .child("dcterms:issued")
        .and_then(XmlElement::text)
        .map(PublicationDate::parse)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn ebook(body: &str) -> String {
        format!(
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
  xmlns:dcterms="http://purl.org/dc/terms/" xmlns:pgterms="http://www.gutenberg.org/2009/pgterms/">
  <pgterms:ebook rdf:about="ebooks/42">{}</pgterms:ebook>
</rdf:RDF>"#,
            body
        )
    }

    fn masked(xml: &str) -> MaskedMetadata {
        let mut extractor = RdfMetadataExtractor::new();
        extractor.parse_str(xml).unwrap();
        match extractor.mask() {
            Masked::Ready(record) => record,
            Masked::NotReady => panic!("extractor not ready after parse"),
        }
    }

    #[test]
    fn test_mask_before_parse_is_not_ready() {
        let extractor = RdfMetadataExtractor::new();
        assert!(!extractor.is_ready());
        assert_eq!(extractor.mask(), Masked::NotReady);
    }

    #[test]
    fn test_failed_parse_drops_previous_document() {
        let mut extractor = RdfMetadataExtractor::new();
        extractor.parse_str(&ebook("")).unwrap();
        assert!(extractor.is_ready());

        assert!(extractor.parse_str("<rdf:RDF>").is_err());
        assert_eq!(extractor.mask(), Masked::NotReady);
    }

    #[test]
    fn test_id_from_resource_identifier() {
        assert_eq!(masked(&ebook("")).id, Some(42));
    }

    #[test]
    fn test_non_numeric_id_is_absent() {
        let xml = ebook("").replace("ebooks/42", "ebooks/forty-two");
        assert_eq!(masked(&xml).id, None);
    }

    #[test]
    fn test_document_without_ebook() {
        let record = masked("<rdf:RDF><pgterms:agent/></rdf:RDF>");
        assert_eq!(record.id, None);
        assert!(record.subjects.is_empty());
    }

    #[test]
    fn test_empty_entry_defaults() {
        let record = masked(&ebook(""));
        assert_eq!(record.language, None);
        assert_eq!(record.title, None);
        assert_eq!(record.publisher, None);
        assert_eq!(record.publication_date, None);
        assert!(record.subjects.is_empty());
        assert!(record.authors.is_empty());
        assert!(record.rights.is_empty());
    }

    #[test]
    fn test_language_is_first_value() {
        let record = masked(&ebook(
            r#"<dcterms:language><rdf:Description rdf:nodeID="L1">
                 <rdf:value rdf:datatype="http://purl.org/dc/terms/RFC4646">fr</rdf:value>
               </rdf:Description></dcterms:language>
               <dcterms:language><rdf:Description><rdf:value>en</rdf:value></rdf:Description></dcterms:language>"#,
        ));
        assert_eq!(record.language.as_deref(), Some("fr"));
    }

    #[test]
    fn test_subjects_drop_falsy_and_keep_order() {
        let record = masked(&ebook(
            r#"<dcterms:subject><rdf:Description><rdf:value>Zoology</rdf:value></rdf:Description></dcterms:subject>
               <dcterms:subject><rdf:Description><rdf:value></rdf:value></rdf:Description></dcterms:subject>
               <dcterms:subject><rdf:Description><dcam:memberOf rdf:resource="x"/></rdf:Description></dcterms:subject>
               <dcterms:subject/>
               <dcterms:subject><rdf:Description><rdf:value>Anatomy</rdf:value></rdf:Description></dcterms:subject>"#,
        ));
        assert_eq!(
            record.subjects,
            vec![RawNode::from("Zoology"), RawNode::from("Anatomy")]
        );
    }

    #[test]
    fn test_authors_drop_falsy_and_keep_order() {
        let record = masked(&ebook(
            r#"<dcterms:creator><pgterms:agent rdf:about="2009/agents/2"><pgterms:name>Twain, Mark</pgterms:name></pgterms:agent></dcterms:creator>
               <dcterms:creator><pgterms:agent><pgterms:name> </pgterms:name></pgterms:agent></dcterms:creator>
               <dcterms:creator><pgterms:agent><pgterms:birthdate>1900</pgterms:birthdate></pgterms:agent></dcterms:creator>
               <dcterms:creator><pgterms:agent><pgterms:name>Austen, Jane</pgterms:name></pgterms:agent></dcterms:creator>"#,
        ));
        assert_eq!(record.authors, vec!["Twain, Mark", "Austen, Jane"]);
    }

    #[test]
    fn test_title_and_publisher_stay_raw() {
        let record = masked(&ebook(
            r#"<dcterms:title rdf:parseType="Literal">Moby Dick</dcterms:title>
               <dcterms:title>Second title</dcterms:title>
               <dcterms:publisher>Project Gutenberg</dcterms:publisher>"#,
        ));
        assert_eq!(
            record.title,
            Some(RawNode(json!({"$": {"rdf:parseType": "Literal"}, "_": "Moby Dick"})))
        );
        assert_eq!(record.publisher, Some(RawNode::from("Project Gutenberg")));
    }

    #[test]
    fn test_rights_are_unfiltered() {
        let record = masked(&ebook(
            r#"<dcterms:rights>Public domain in the USA.</dcterms:rights><dcterms:rights/>"#,
        ));
        assert_eq!(
            record.rights,
            vec![RawNode::from("Public domain in the USA."), RawNode::from("")]
        );
    }

    #[test]
    fn test_publication_date_outcomes() {
        let valid = masked(&ebook(
            r#"<dcterms:issued rdf:datatype="http://www.w3.org/2001/XMLSchema#date">1989-08-01</dcterms:issued>"#,
        ));
        assert_eq!(
            valid.publication_date,
            Some(PublicationDate::Valid(NaiveDate::from_ymd_opt(1989, 8, 1).unwrap()))
        );

        let invalid = masked(&ebook("<dcterms:issued>None</dcterms:issued>"));
        assert_eq!(invalid.publication_date, Some(PublicationDate::Invalid("None".to_string())));

        let absent = masked(&ebook(""));
        assert_eq!(absent.publication_date, None);
    }
}
