//! Table extraction from malformed HTML/XML listings
//!
//! Listings exported by legacy systems arrive in a declared legacy encoding
//! with unquoted attribute values and bare ampersands. Those two defects are
//! repaired textually before the first `<table>` is read.

use crate::error::{Result, TabsnapError};
use crate::table::{Row, Table};
use encoding_rs::Encoding;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

fn tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^<>]*>").expect("valid tag regex"))
}

fn unquoted_attribute() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(\s[A-Za-z_:][-A-Za-z0-9_:.]*)=([^\s"'=<>`]+)"#)
            .expect("valid attribute regex")
    })
}

fn ampersand() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&([A-Za-z][A-Za-z0-9]*;|#[0-9]+;|#[xX][0-9A-Fa-f]+;)?")
            .expect("valid entity regex")
    })
}

/// Parses the first table of a markup listing into a [`Table`]
#[derive(Debug, Clone, Default)]
pub struct MarkupTableParser;

impl MarkupTableParser {
    /// Decode `bytes` with `encoding_label` (e.g. `"iso-8859-1"`), repair
    /// known defects and read the first table
    pub fn parse(bytes: &[u8], encoding_label: &str) -> Result<Table> {
        let text = Self::decode(bytes, encoding_label)?;
        let cleaned = Self::clean(&text);
        Self::parse_table(&cleaned)
    }

    pub fn decode(bytes: &[u8], encoding_label: &str) -> Result<String> {
        let encoding = Encoding::for_label(encoding_label.trim().as_bytes()).ok_or_else(|| {
            TabsnapError::invalid_input(format!("Unknown encoding: {encoding_label}"))
        })?;
        let (text, used, had_errors) = encoding.decode(bytes);
        if had_errors {
            log::warn!("Listing contained bytes invalid for {}", used.name());
        }
        Ok(text.into_owned())
    }

    /// Quote bare attribute values and escape stray ampersands.
    ///
    /// Attribute quoting only applies inside tags; cell text is left as is.
    pub fn clean(text: &str) -> String {
        let text = text.replace("&nbsp;", " ");
        let text = tag().replace_all(&text, |caps: &Captures| {
            unquoted_attribute()
                .replace_all(&caps[0], r#"$1="$2""#)
                .into_owned()
        });
        ampersand()
            .replace_all(&text, |caps: &Captures| match caps.get(1) {
                Some(_) => caps[0].to_string(),
                None => "&amp;".to_string(),
            })
            .into_owned()
    }

    fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css)
            .map_err(|e| TabsnapError::markup(format!("bad selector '{css}': {e:?}")))
    }

    fn parse_table(markup: &str) -> Result<Table> {
        let document = Html::parse_document(markup);
        let table_sel = Self::selector("table")?;
        let row_sel = Self::selector("tr")?;
        let cell_sel = Self::selector("th, td")?;

        let table = document
            .select(&table_sel)
            .next()
            .ok_or_else(|| TabsnapError::markup("listing contains no <table>"))?;

        let rows: Vec<Row> = table
            .select(&row_sel)
            .map(|tr| tr.select(&cell_sel).map(cell_text).collect())
            .collect();

        log::debug!("Parsed {} rows from markup listing", rows.len());
        Ok(Table::new(rows))
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    let raw: String = cell.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_quotes_bare_attributes() {
        let cleaned = MarkupTableParser::clean(r#"<td class=name width="10" align=left>x</td>"#);
        assert_eq!(cleaned, r#"<td class="name" width="10" align="left">x</td>"#);
    }

    #[test]
    fn test_clean_leaves_cell_text_alone() {
        let cleaned = MarkupTableParser::clean("<td align=left>total x=5 a=b</td>");
        assert_eq!(cleaned, r#"<td align="left">total x=5 a=b</td>"#);
    }

    #[test]
    fn test_parse_keeps_equals_in_cells() {
        let html = b"<table><tr><td>total x=5</td><td>a=b</td></tr></table>";
        let table = MarkupTableParser::parse(html, "utf-8").unwrap();
        assert_eq!(table.rows()[0], vec!["total x=5", "a=b"]);
    }

    #[test]
    fn test_clean_escapes_stray_ampersands() {
        let cleaned = MarkupTableParser::clean("Smith & Co &amp; &#233; &eacute;&nbsp;ok");
        assert_eq!(cleaned, "Smith &amp; Co &amp; &#233; &eacute; ok");
    }

    #[test]
    fn test_parse_latin1_listing() {
        let html = "<html><body><table border=1>\
            <tr><th>Pasaporte</th><th>Nombre</th></tr>\
            <tr><td>123</td><td>Jos\u{e9}  P\u{e9}rez</td></tr>\
            <tr><td>456</td><td>Ana & Co</td></tr>\
            </table></body></html>";
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(html);

        let table = MarkupTableParser::parse(&bytes, "iso-8859-1").unwrap();
        assert_eq!(table.header().unwrap().names(), &["Pasaporte", "Nombre"]);
        assert_eq!(table.body()[0], vec!["123", "José Pérez"]);
        assert_eq!(table.body()[1], vec!["456", "Ana & Co"]);
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            MarkupTableParser::parse(b"<table></table>", "klingon"),
            Err(TabsnapError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_listing_without_table() {
        assert!(matches!(
            MarkupTableParser::parse(b"<p>empty</p>", "utf-8"),
            Err(TabsnapError::Markup { .. })
        ));
    }
}
