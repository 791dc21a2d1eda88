//! Structured-Block Recovery: find the fenced CSV block in a model response.
//!
//! The system prompt asks the model to repeat its comparison table as CSV in
//! one fenced code block tagged `csv`. Models wrap that block in free-form
//! prose, so the block is located with a regex rather than by position:
//! the first `` ```<tag> `` opener (tag matched case-insensitively) up to the
//! next `` ``` ``. Only the first block counts.
//!
//! Turning the recovered text into rows is delegated to the `csv` crate. A
//! parse failure is not an error: the caller keeps the raw text and shows it
//! instead of the table.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fence tag the prompts ask for.
pub const CSV_TAG: &str = "csv";

static RE_CSV_BLOCK: Lazy<Regex> = Lazy::new(|| block_regex(CSV_TAG));

fn block_regex(tag: &str) -> Regex {
    // `(?is)`: case-insensitive tag, `.` spans newlines. Lazy `.*?` stops at the
    // first closing fence. The tag is escaped, so the pattern is always valid.
    Regex::new(&format!(r"(?is)```{}\s*(.*?)```", regex::escape(tag)))
        .expect("escaped tag always yields a valid pattern")
}

/// Return the trimmed content of the first fenced block tagged `tag`.
///
/// `None` means no such block exists; `Some("")` means an empty block was
/// found.
pub fn recover_block<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let caps = if tag.eq_ignore_ascii_case(CSV_TAG) {
        RE_CSV_BLOCK.captures(text)
    } else {
        block_regex(tag).captures(text)
    }?;
    caps.get(1).map(|m| m.as_str().trim())
}

/// Shorthand for [`recover_block`] with the `csv` tag.
pub fn recover_csv(text: &str) -> Option<&str> {
    recover_block(text, CSV_TAG)
}

/// A parsed delimited table: one header row and any number of data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Render as a GFM pipe table for terminal display.
    ///
    /// Pipes inside cells are escaped and embedded newlines become `<br>`.
    pub fn to_markdown(&self) -> String {
        fn cell(s: &str) -> String {
            s.trim()
                .replace('|', "\\|")
                .replace("\r\n", "<br>")
                .replace('\n', "<br>")
        }
        fn row(cells: &[String]) -> String {
            let inner: Vec<String> = cells.iter().map(|c| cell(c)).collect();
            format!("| {} |", inner.join(" | "))
        }

        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(row(&self.headers));
        out.push(format!(
            "|{}",
            std::iter::repeat_n(" --- |", self.headers.len().max(1)).collect::<String>()
        ));
        for r in &self.rows {
            out.push(row(r));
        }
        out.join("\n")
    }
}

/// Parse recovered CSV text. The first record is the header.
///
/// Rows whose length differs from the header are a parse error, as is a
/// payload without a header row.
pub fn parse_table(payload: &str) -> Result<CsvTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(payload.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "CSV block has no header row",
        )));
    }

    let rows = reader
        .records()
        .map(|rec| rec.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

    Ok(CsvTable { headers, rows })
}
