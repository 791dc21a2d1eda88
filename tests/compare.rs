//! Integration tests for the comparison flow.
//!
//! Extraction backends and the generation service are replaced by in-process
//! mocks, so these tests need neither pdfium nor network access.

use polis_compare::pipeline::backend::ExtractionBackend;
use polis_compare::{
    compare, compare_documents, write_csv, BackendError, CompareError, ComparisonConfig,
    ComparisonMode, ComparisonProgressCallback, ComparisonRequest, Document, Generation,
    GenerationService, TableOutcome, TextExtractor,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Backend that returns a fixed result for every document.
struct FixedBackend {
    name: &'static str,
    result: Result<Vec<String>, BackendError>,
}

impl ExtractionBackend for FixedBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extract_pages(&self, _bytes: &[u8]) -> Result<Vec<String>, BackendError> {
        self.result.clone()
    }
}

/// Backend that echoes the document bytes after the `%PDF` magic as one page.
struct EchoBackend;

impl ExtractionBackend for EchoBackend {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, BackendError> {
        Ok(vec![String::from_utf8_lossy(&bytes[4..]).into_owned()])
    }
}

fn broken(name: &'static str) -> Arc<dyn ExtractionBackend> {
    Arc::new(FixedBackend {
        name,
        result: Err(BackendError::Failed {
            backend: name.to_string(),
            detail: "invalid xref table".to_string(),
        }),
    })
}

fn blank_pages(name: &'static str, n: usize) -> Arc<dyn ExtractionBackend> {
    Arc::new(FixedBackend {
        name,
        result: Ok(vec![String::new(); n]),
    })
}

/// Generation service that records the request and answers with fixed text.
struct ScriptedService {
    reply: String,
    delay: Option<Duration>,
    seen: Mutex<Vec<ComparisonRequest>>,
}

impl ScriptedService {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn last_request(&self) -> ComparisonRequest {
        self.seen.lock().unwrap().last().cloned().expect("no request sent")
    }
}

impl GenerationService for ScriptedService {
    fn provider_label(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ComparisonRequest) -> Result<Generation, CompareError> {
        self.seen.lock().unwrap().push(request.clone());
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        Ok(Generation {
            content: self.reply.clone(),
            input_tokens: 1_200,
            output_tokens: 300,
        })
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl ComparisonProgressCallback for Recorder {
    fn on_extraction_start(&self, document: &str) {
        self.events.lock().unwrap().push(format!("start:{document}"));
    }
    fn on_extraction_complete(&self, document: &str, chars: usize, backend: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done:{document}:{chars}:{}", backend.unwrap_or("-")));
    }
    fn on_generation_start(&self, model: &str) {
        self.events.lock().unwrap().push(format!("generate:{model}"));
    }
    fn on_generation_complete(&self, _response_len: usize, table_found: bool) {
        self.events.lock().unwrap().push(format!("answer:{table_found}"));
    }
    fn on_error(&self, _error: &str) {
        self.events.lock().unwrap().push("error".to_string());
    }
}

fn pdf(name: &str, text: &str) -> Document {
    Document::from_bytes(name, format!("%PDF{text}").into_bytes()).unwrap()
}

const REPLY: &str = "## Vergelijking\n\n| Onderwerp | ASR | Andere verzekeraar | Verschillen |\n\
|---|---|---|---|\n| Eigen risico | € 250 | € 500 | Ander hoger |\n\n\
```csv\nOnderwerp,ASR,Andere verzekeraar,Verschillen\nEigen risico,€ 250,€ 500,Ander hoger\n```\n\n\
Samenvatting volgt.";

// ── Flow ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_flow_recovers_parsed_table() {
    let recorder = Arc::new(Recorder::default());
    let config = ComparisonConfig::builder()
        .progress_callback(recorder.clone() as Arc<dyn ComparisonProgressCallback>)
        .build()
        .unwrap();
    let extractor = TextExtractor::new(vec![Arc::new(EchoBackend)]);
    let service = ScriptedService::replying(REPLY);

    let out = compare_documents(
        pdf("asr.pdf", "Artikel 1 ASR dekking"),
        pdf("ander.pdf", "Artikel 1 ander dekking"),
        &config,
        &extractor,
        &service,
    )
    .await
    .unwrap();

    assert_eq!(out.content, REPLY);
    let table = out.table.table().expect("table should parse");
    assert_eq!(table.headers[0], "Onderwerp");
    assert_eq!(table.rows[0][2], "€ 500");

    assert_eq!(out.left.label, "ASR");
    assert_eq!(out.left.backend.as_deref(), Some("echo"));
    assert_eq!(out.left.chars, "Artikel 1 ASR dekking".chars().count());
    assert_eq!(out.stats.input_tokens, 1_200);

    let req = service.last_request();
    assert!(req.user_message.contains("ASR (volledige tekst, mogelijk ingekort):\nArtikel 1 ASR dekking\n"));
    assert!(req.user_message.contains("Andere verzekeraar (volledige tekst, mogelijk ingekort):\nArtikel 1 ander dekking\n"));
    assert_eq!(req.model, "gpt-4o-mini");
    assert_eq!(req.temperature, 0.1);

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start:ASR",
            "done:ASR:21:echo",
            "start:Andere verzekeraar",
            "done:Andere verzekeraar:23:echo",
            "generate:gpt-4o-mini",
            "answer:true",
        ]
    );
}

#[tokio::test]
async fn primary_failure_falls_back_to_secondary() {
    let config = ComparisonConfig::default();
    let extractor = TextExtractor::new(vec![broken("pdfium"), Arc::new(EchoBackend)]);
    let service = ScriptedService::replying("no table");

    let out = compare_documents(
        pdf("a.pdf", "left"),
        pdf("b.pdf", "right"),
        &config,
        &extractor,
        &service,
    )
    .await
    .unwrap();

    assert_eq!(out.left.backend.as_deref(), Some("echo"));
    assert_eq!(out.table, TableOutcome::Absent);
}

#[tokio::test]
async fn request_is_truncated_to_budget_in_characters() {
    let config = ComparisonConfig::builder()
        .max_chars(5_000)
        .mode(ComparisonMode::Summary)
        .build()
        .unwrap();
    let extractor = TextExtractor::new(vec![Arc::new(EchoBackend)]);
    let service = ScriptedService::replying("ok");
    let long = "é".repeat(6_000);

    let out = compare_documents(
        pdf("a.pdf", &long),
        pdf("b.pdf", "kort"),
        &config,
        &extractor,
        &service,
    )
    .await
    .unwrap();

    assert_eq!(out.left.chars, 6_000);
    assert_eq!(out.left.truncated_chars, 1_000);
    assert_eq!(out.right.truncated_chars, 0);

    let req = service.last_request();
    assert!(req.user_message.contains(&format!("\n{}\n", "é".repeat(5_000))));
    assert!(!req.user_message.contains(&"é".repeat(5_001)));
    assert_eq!(req.temperature, 0.3);
}

#[tokio::test]
async fn unparseable_block_keeps_raw_text() {
    let config = ComparisonConfig::default();
    let extractor = TextExtractor::new(vec![Arc::new(EchoBackend)]);
    let service = ScriptedService::replying("```csv\nA,B\n1,2,3\n```");

    let out = compare_documents(pdf("a.pdf", "x"), pdf("b.pdf", "y"), &config, &extractor, &service)
        .await
        .unwrap();

    match out.table {
        TableOutcome::Unparsed { csv, .. } => assert_eq!(csv, "A,B\n1,2,3"),
        other => panic!("expected Unparsed, got {other:?}"),
    }
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn textless_document_is_reported_as_such() {
    let recorder = Arc::new(Recorder::default());
    let config = ComparisonConfig::builder()
        .progress_callback(recorder.clone() as Arc<dyn ComparisonProgressCallback>)
        .build()
        .unwrap();
    let extractor = TextExtractor::new(vec![broken("pdfium"), blank_pages("pdf-extract", 4)]);
    let service = ScriptedService::replying("unused");

    let err = compare_documents(pdf("scan.pdf", ""), pdf("b.pdf", ""), &config, &extractor, &service)
        .await
        .unwrap_err();

    match err {
        CompareError::NoExtractableText { document, pages } => {
            assert_eq!(document, "scan.pdf");
            assert_eq!(pages, 4);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(service.seen.lock().unwrap().is_empty());
    assert_eq!(recorder.events.lock().unwrap().last().map(String::as_str), Some("error"));
}

#[tokio::test]
async fn unreadable_document_is_extraction_failure() {
    let config = ComparisonConfig::default();
    let extractor = TextExtractor::new(vec![broken("pdfium"), broken("pdf-extract")]);
    let service = ScriptedService::replying("unused");

    let err = compare_documents(pdf("a.pdf", ""), pdf("b.pdf", ""), &config, &extractor, &service)
        .await
        .unwrap_err();

    match err {
        CompareError::ExtractionFailed { document, detail } => {
            assert_eq!(document, "a.pdf");
            assert!(detail.contains("pdfium: invalid xref table"));
            assert!(detail.contains("pdf-extract: invalid xref table"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn slow_service_times_out() {
    let config = ComparisonConfig::builder().api_timeout_secs(1).build().unwrap();
    let extractor = TextExtractor::new(vec![Arc::new(EchoBackend)]);
    let service = ScriptedService {
        delay: Some(Duration::from_secs(30)),
        ..ScriptedService::replying("late")
    };

    let err = compare_documents(pdf("a.pdf", "x"), pdf("b.pdf", "y"), &config, &extractor, &service)
        .await
        .unwrap_err();

    assert!(matches!(err, CompareError::ApiTimeout { .. }), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn missing_input_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.pdf");
    let config = ComparisonConfig::builder().api_key("sk-test").build().unwrap();

    let err = compare(missing.to_string_lossy(), missing.to_string_lossy(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, CompareError::FileNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn non_pdf_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, b"plain text, not a pdf").unwrap();
    let config = ComparisonConfig::builder().api_key("sk-test").build().unwrap();

    let err = compare(path.to_string_lossy(), path.to_string_lossy(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, CompareError::NotAPdf { .. }), "got {err:?}");
}

// ── CSV file ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn recovered_csv_is_written_verbatim() {
    let config = ComparisonConfig::default();
    let extractor = TextExtractor::new(vec![Arc::new(EchoBackend)]);
    let service = ScriptedService::replying(REPLY);
    let out = compare_documents(pdf("a.pdf", "x"), pdf("b.pdf", "y"), &config, &extractor, &service)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vergelijking.csv");
    write_csv(&path, out.table.csv().unwrap()).await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "Onderwerp,ASR,Andere verzekeraar,Verschillen\nEigen risico,€ 250,€ 500,Ander hoger"
    );
}

#[test]
fn output_is_json_serialisable() {
    let output = tokio_test::block_on(async {
        let extractor = TextExtractor::new(vec![Arc::new(EchoBackend)]);
        let service = ScriptedService::replying(REPLY);
        compare_documents(
            pdf("a.pdf", "x"),
            pdf("b.pdf", "y"),
            &ComparisonConfig::default(),
            &extractor,
            &service,
        )
        .await
    })
    .unwrap();

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["table"]["status"], "parsed");
    assert_eq!(json["left"]["label"], "ASR");
    assert_eq!(json["stats"]["output_tokens"], 300);
}
