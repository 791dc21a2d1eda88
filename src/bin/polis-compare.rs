//! CLI binary for polis-compare.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ComparisonConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use polis_compare::{
    compare_with_capabilities, write_csv, Capabilities, ComparisonConfig, ComparisonMode, ComparisonOutput,
    ComparisonProgressCallback, ProgressCallback, TableOutcome, DEFAULT_CSV_FILE_NAME,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner whose message follows the stage,
/// plus a log line per finished document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ComparisonProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, document: &str) {
        self.bar.set_prefix("Reading");
        self.bar.set_message(format!("{document}…"));
    }

    fn on_extraction_complete(&self, document: &str, chars: usize, backend: Option<&str>) {
        if let Some(backend) = backend {
            self.bar.println(format!(
                "  {} {:<20} {}  {}",
                green("✓"),
                document,
                dim(&format!("{chars:>7} chars")),
                dim(backend),
            ));
        }
    }

    fn on_generation_start(&self, model: &str) {
        self.bar.set_prefix("Comparing");
        self.bar.set_message(format!("waiting for {model}…"));
    }

    fn on_generation_complete(&self, response_len: usize, table_found: bool) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} response of {} chars{}",
            green("✔"),
            bold(&response_len.to_string()),
            if table_found { ", CSV table found" } else { "" },
        );
    }

    fn on_error(&self, _error: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Literal comparison, Markdown to stdout
  polis-compare asr.pdf ander.pdf

  # Save the recovered table (default name asr_vs_ander_vergelijking.csv)
  polis-compare --csv-out asr.pdf ander.pdf

  # Save it under another name (the '=' is required)
  polis-compare --csv-out=vergelijking.csv asr.pdf ander.pdf

  # Only the differences, larger budget
  polis-compare --mode differences --max-chars 80000 asr.pdf ander.pdf

  # Another provider through edgequake-llm
  polis-compare --provider anthropic --model claude-sonnet-4-20250514 asr.pdf ander.pdf

  # JSON output with statistics
  polis-compare --json asr.pdf ander.pdf > result.json

API KEY (first match wins):
  1. --api-key / POLIS_API_KEY
  2. OPENAI_API_KEY in the secrets file (--secrets, default .polis-compare/secrets.toml)
  3. OPENAI_KEY in the secrets file
  4. OPENAI_API_KEY environment variable
  5. OPENAI_KEY environment variable

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key (with --provider anthropic)
  EDGEQUAKE_LLM_PROVIDER  Provider used when no OpenAI key is found
  EDGEQUAKE_MODEL         Model used with EDGEQUAKE_LLM_PROVIDER
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, e.g. polis_compare=debug
"#;

/// Compare two insurance policy PDFs with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "polis-compare",
    version,
    about = "Compare two insurance policy PDFs with an LLM and recover the table as CSV",
    long_about = "Extract the text of an ASR policy and a policy from another insurer, ask a chat \
model for a structured four-column comparison, and recover the comparison table from the \
fenced CSV block in the answer.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// ASR policy: local PDF path or HTTP/HTTPS URL.
    asr: String,

    /// Policy of the other insurer: local PDF path or HTTP/HTTPS URL.
    other: String,

    /// Characters kept per document (5000–200000).
    #[arg(long, env = "POLIS_MAX_CHARS", default_value_t = 40_000,
          value_parser = clap::value_parser!(u64).range(5_000..=200_000))]
    max_chars: u64,

    /// Comparison style.
    #[arg(long, env = "POLIS_MODE", value_enum, default_value = "literal")]
    mode: ModeArg,

    /// LLM model ID (default gpt-4o-mini).
    #[arg(long, env = "POLIS_MODEL")]
    model: Option<String>,

    /// LLM provider for edgequake-llm: anthropic, gemini, ollama, ...
    #[arg(long, env = "POLIS_PROVIDER")]
    provider: Option<String>,

    /// OpenAI API key. Wins over the secrets file and the environment.
    #[arg(long, env = "POLIS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Secrets file (TOML) consulted for OPENAI_API_KEY / OPENAI_KEY.
    #[arg(long, env = "POLIS_SECRETS")]
    secrets: Option<PathBuf>,

    /// OpenAI-compatible API root.
    #[arg(long, env = "POLIS_BASE_URL")]
    base_url: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "POLIS_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// LLM temperature override (0.0–2.0). Default depends on --mode.
    #[arg(long, env = "POLIS_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max LLM output tokens.
    #[arg(long, env = "POLIS_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Label of the first document.
    #[arg(long, env = "POLIS_LEFT_LABEL", default_value = "ASR")]
    left_label: String,

    /// Label of the second document.
    #[arg(long, env = "POLIS_RIGHT_LABEL", default_value = "Andere verzekeraar")]
    right_label: String,

    /// Write the recovered CSV table to this file (--csv-out=FILE).
    #[arg(long, env = "POLIS_CSV_OUT", num_args = 0..=1, require_equals = true,
          default_missing_value = DEFAULT_CSV_FILE_NAME)]
    csv_out: Option<PathBuf>,

    /// Output structured JSON (ComparisonOutput) instead of Markdown.
    #[arg(long, env = "POLIS_JSON")]
    json: bool,

    /// Disable progress spinner.
    #[arg(long, env = "POLIS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "POLIS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "POLIS_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "POLIS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// LLM call timeout in seconds.
    #[arg(long, env = "POLIS_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ModeArg {
    Literal,
    Differences,
    Summary,
}

impl From<ModeArg> for ComparisonMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Literal => ComparisonMode::Literal,
            ModeArg::Differences => ComparisonMode::Differences,
            ModeArg::Summary => ComparisonMode::Summary,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level library logs unless --verbose is set.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ComparisonProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Detect extraction backends ───────────────────────────────────────
    let caps = tokio::task::spawn_blocking(Capabilities::detect)
        .await
        .context("Backend detection failed")?;
    tracing::debug!("extraction backends: {:?}", caps.backend_names());

    // ── Run comparison ───────────────────────────────────────────────────
    let output = compare_with_capabilities(&cli.asr, &cli.other, &config, &caps)
        .await
        .context("Comparison failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_markdown(&output)?;
    }

    // ── Optional CSV file ────────────────────────────────────────────────
    if let Some(ref path) = cli.csv_out {
        match output.table.csv() {
            Some(csv) => {
                write_csv(path, csv).await.context("Failed to save CSV")?;
                if !cli.quiet {
                    eprintln!("{} CSV saved to {}", green("✔"), bold(&path.display().to_string()));
                }
            }
            None => eprintln!("{} no CSV block to save", cyan("ℹ")),
        }
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.total_ms,
        );
        for doc in [&output.left, &output.right] {
            if doc.truncated_chars > 0 {
                eprintln!(
                    "   {} {} truncated: {} of {} chars not sent",
                    cyan("ℹ"),
                    doc.label,
                    doc.truncated_chars,
                    doc.chars
                );
            }
        }
    }

    Ok(())
}

/// Print the model response, then the table section.
fn print_markdown(output: &ComparisonOutput) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(output.content.as_bytes())
        .context("Failed to write to stdout")?;
    if !output.content.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }

    match &output.table {
        TableOutcome::Parsed { table, .. } => {
            writeln!(handle, "\n## Tabel (CSV omgezet)\n\n{}", table.to_markdown())
                .context("Failed to write to stdout")?;
        }
        TableOutcome::Unparsed { reason, .. } => {
            eprintln!(
                "{} Could not parse the CSV block ({reason}). Copy it from the response above, or save it with --csv-out.",
                cyan("ℹ")
            );
        }
        TableOutcome::Absent => {
            eprintln!(
                "{} No CSV block detected in the response. Copy the table manually.",
                cyan("ℹ")
            );
        }
    }
    Ok(())
}

/// Map CLI args to `ComparisonConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ComparisonConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ComparisonConfig::builder()
        .max_chars(cli.max_chars as usize)
        .mode(cli.mode.clone().into())
        .labels(cli.left_label.clone(), cli.right_label.clone())
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref path) = cli.secrets {
        builder = builder.secrets_path(path.clone());
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
