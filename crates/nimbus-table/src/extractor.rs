//! Listing-table extractor
//!
//! Cells are the trimmed character data of `th`/`td` elements, joined with
//! a configurable separator when markup splits the text. A hyperlink target
//! anywhere inside a cell replaces the visible text entirely; only the first
//! link per cell counts. rowspan/colspan are not replicated into following
//! rows; the service's listing tables do not use them.

use scraper::{ElementRef, Html, Selector};

use crate::{Table, TableRow};

pub struct TableExtractor {
    separator: String,
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TableExtractor {
    pub fn new() -> Self {
        Self {
            separator: " ".to_string(),
        }
    }

    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Parse every table in the document, in document order.
    pub fn parse(&self, html: &str) -> Vec<Table> {
        let (Ok(table_sel), Ok(row_sel), Ok(cell_sel), Ok(link_sel)) = (
            Selector::parse("table"),
            Selector::parse("tr"),
            Selector::parse("th, td"),
            Selector::parse("[href]"),
        ) else {
            return Vec::new();
        };

        let document = Html::parse_document(html);

        document
            .select(&table_sel)
            .map(|table| {
                table
                    .select(&row_sel)
                    .map(|row| {
                        row.select(&cell_sel)
                            .map(|cell| self.cell_value(cell, &link_sel))
                            .collect::<TableRow>()
                    })
                    .collect::<Table>()
            })
            .collect()
    }

    fn cell_value(&self, cell: ElementRef<'_>, link_sel: &Selector) -> String {
        // Link target takes precedence over visible text
        if let Some(href) = cell.value().attr("href") {
            return href.to_string();
        }
        if let Some(link) = cell.select(link_sel).next() {
            if let Some(href) = link.value().attr("href") {
                return href.to_string();
            }
        }

        let parts: Vec<&str> = cell
            .text()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        parts.join(&self.separator)
    }
}
