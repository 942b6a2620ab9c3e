//! Raw data sources: delimited text, paged documents, object storage and
//! structured files.

mod document;
mod object_store;
mod parser;
mod structured;

pub use document::{DelimitedDocumentReader, DocumentReader};
pub use object_store::{HttpObjectStore, ObjectAddress};
pub use parser::{Parser, ParserConfig};
pub use structured::StructuredFileReader;
