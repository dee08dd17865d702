// Gutenberg RDF/XML record handling
//
// Each catalog entry ships as one RDF/XML file using Dublin Core terms
// (dcterms:*) and Gutenberg-specific terms (pgterms:*):
//
//   <rdf:RDF>
//     <pgterms:ebook rdf:about="ebooks/10">
//       <dcterms:title>...</dcterms:title>
//       <dcterms:language><rdf:Description><rdf:value>en</rdf:value>...
//       <dcterms:subject><rdf:Description><rdf:value>Bible</rdf:value>...
//       <dcterms:creator><pgterms:agent><pgterms:name>...</pgterms:name>...
//       <dcterms:issued>1989-08-01</dcterms:issued>
//     </pgterms:ebook>
//   </rdf:RDF>
//
// - document: quick-xml driven element tree
// - models: MaskedMetadata and its field types
// - extractor: parse -> mask state machine

pub mod document;
pub mod extractor;
pub mod models;

pub use document::{RdfDocument, XmlElement};
pub use extractor::{mask_document, Masked, RdfMetadataExtractor};
pub use models::{MaskedMetadata, PublicationDate, RawNode};
