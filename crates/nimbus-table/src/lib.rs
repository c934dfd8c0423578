//! Nimbus table extraction
//!
//! Turns a server-rendered HTML document into ordered tables of cell
//! strings. Positional cell access is the interface; callers translate rows
//! into named views immediately after fetching.

mod extractor;

pub use extractor::TableExtractor;

/// One cell row; position carries the meaning, per table kind.
pub type TableRow = Vec<String>;

/// One table: ordered rows of ordered cells.
pub type Table = Vec<TableRow>;
