//! Result types returned by a comparison.

use crate::pipeline::recover::CsvTable;
use serde::{Deserialize, Serialize};

/// Everything a front end needs to show the outcome of one comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutput {
    /// The full model response, Markdown.
    pub content: String,
    /// What became of the CSV block.
    pub table: TableOutcome,
    /// First (ASR) document.
    pub left: DocumentStats,
    /// Second document.
    pub right: DocumentStats,
    pub stats: ComparisonStats,
}

/// The CSV block recovered from the model response, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome {
    /// A block was found and parsed into rows.
    Parsed { csv: String, table: CsvTable },
    /// A block was found but is not valid CSV. The raw text is kept so the
    /// user can still see and download it.
    Unparsed { csv: String, reason: String },
    /// The response contains no CSV block.
    Absent,
}

impl TableOutcome {
    /// Raw CSV text, present for both parsed and unparsed blocks.
    pub fn csv(&self) -> Option<&str> {
        match self {
            TableOutcome::Parsed { csv, .. } | TableOutcome::Unparsed { csv, .. } => Some(csv),
            TableOutcome::Absent => None,
        }
    }

    pub fn table(&self) -> Option<&CsvTable> {
        match self {
            TableOutcome::Parsed { table, .. } => Some(table),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, TableOutcome::Absent)
    }
}

/// Extraction figures for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Display label ("ASR", "Andere verzekeraar").
    pub label: String,
    /// Characters extracted.
    pub chars: usize,
    /// Characters cut off by the request budget.
    pub truncated_chars: usize,
    /// Backend that produced the text.
    pub backend: Option<String>,
}

/// Token usage and timings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonStats {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Wall-clock time spent extracting both documents.
    pub extraction_ms: u64,
    /// Wall-clock time of the remote call.
    pub generation_ms: u64,
    pub total_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_accessor_covers_both_found_variants() {
        let unparsed = TableOutcome::Unparsed {
            csv: "a,b\n1".into(),
            reason: "ragged".into(),
        };
        assert_eq!(unparsed.csv(), Some("a,b\n1"));
        assert!(unparsed.table().is_none());
        assert_eq!(TableOutcome::Absent.csv(), None);
        assert!(TableOutcome::Absent.is_absent());
    }

    #[test]
    fn outcome_serialises_with_status_tag() {
        let json = serde_json::to_value(TableOutcome::Absent).unwrap();
        assert_eq!(json["status"], "absent");

        let parsed = TableOutcome::Parsed {
            csv: "A\n1".into(),
            table: CsvTable {
                headers: vec!["A".into()],
                rows: vec![vec!["1".into()]],
            },
        };
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["status"], "parsed");
        assert_eq!(json["table"]["headers"][0], "A");
    }
}
