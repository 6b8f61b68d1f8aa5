//! CLI binary for resume-tailor.
//!
//! A thin shim over the library crate: maps flags to `ClientConfig`, drives
//! the orchestrator through Upload → Tailor → Download and prints the
//! assessment.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use resume_tailor::{
    ClientConfig, Orchestrator, PipelineObserver, PipelineState, SavedDocument, ScoreBand, Step,
    TailorResult,
};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Spinner plus one log line per finished step.
struct CliObserver {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineObserver for CliObserver {
    fn on_step_start(&self, step: Step) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        let msg = match step {
            Step::Upload => "Extracting résumé text…",
            Step::Tailor => "Tailoring and scoring…",
            Step::Download => "Generating document…",
        };
        self.bar.set_prefix(step.to_string());
        self.bar.set_message(msg);
    }

    fn on_step_complete(&self, step: Step) {
        self.bar
            .println(format!("  {} {:<9} {}", green("✓"), step, self.elapsed()));
    }

    fn on_step_error(&self, step: Step, message: &str) {
        self.bar.println(format!(
            "  {} {:<9} {}  {}",
            red("✗"),
            step,
            red(message),
            self.elapsed()
        ));
    }

    fn on_state_change(&self, _from: PipelineState, to: PipelineState) {
        self.bar.set_message(to.to_string());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Tailor against a job description file, save the .docx in ./out
  resume-tailor resume.docx --job job.txt -o out/

  # Job description from stdin
  pbpaste | resume-tailor resume.docx --job -

  # Inline job description, score only
  resume-tailor resume.docx --job-text "Senior Rust engineer" --no-download

  # Machine-readable result
  resume-tailor resume.docx --job job.txt --json > result.json

  # Check the API and list recent analyses
  resume-tailor --health
  resume-tailor --history

ENVIRONMENT VARIABLES:
  RESUME_TAILOR_API_URL   API base URL (default http://localhost:8001)
  REACT_APP_BACKEND_URL   Fallback API base URL
  RESUME_TAILOR_TIMEOUT   Request timeout in seconds
  RUST_LOG                Log filter, e.g. resume_tailor=debug
"#;

/// Tailor a .docx résumé to a job description and score it for ATS compatibility.
#[derive(Parser, Debug)]
#[command(
    name = "resume-tailor",
    version,
    about = "Tailor a .docx résumé to a job description and score it for ATS compatibility",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Résumé document (.docx).
    #[arg(required_unless_present_any = ["health", "history"])]
    resume: Option<PathBuf>,

    /// File containing the job description, or `-` for stdin.
    #[arg(short, long, conflicts_with = "job_text")]
    job: Option<PathBuf>,

    /// Job description given inline.
    #[arg(long)]
    job_text: Option<String>,

    /// Directory the tailored document is written to.
    #[arg(short, long, env = "RESUME_TAILOR_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// API base URL.
    #[arg(long, env = "RESUME_TAILOR_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "RESUME_TAILOR_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Stop after tailoring; do not download the document.
    #[arg(long)]
    no_download: bool,

    /// Also write the original document, decoded from the upload payload.
    #[arg(long)]
    keep_original: bool,

    /// Print the tailored résumé text.
    #[arg(long)]
    show_text: bool,

    /// Output the result as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Check the API health endpoint and exit.
    #[arg(long)]
    health: bool,

    /// List recent analyses stored by the API and exit.
    #[arg(long)]
    history: bool,

    /// Disable the spinner.
    #[arg(long, env = "RESUME_TAILOR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long)]
    quiet: bool,
}

/// What `--json` prints.
#[derive(Serialize)]
struct Report<'a> {
    file_name: Option<&'a str>,
    state: PipelineState,
    analysis_id: Option<&'a str>,
    #[serde(flatten)]
    result: Option<&'a TailorResult>,
    band: Option<&'static str>,
    saved: Option<&'a SavedDocument>,
    original_saved: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
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

    let observer = show_progress.then(CliObserver::new);
    let config = build_config(&cli, observer.clone())?;
    let mut session = Orchestrator::new(&config).context("Failed to create API client")?;

    // ── Health / history modes ───────────────────────────────────────────
    if cli.health {
        let health = session.client().health().await.context("Health check failed")?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&health)?);
        } else {
            let mark = if health.is_healthy() { green("✔") } else { red("✘") };
            println!("{mark} {} {} ({})", health.service, health.status, config.base_url);
        }
        return Ok(());
    }
    if cli.history {
        let analyses = session
            .client()
            .recent_analyses()
            .await
            .context("Failed to list analyses")?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&analyses)?);
        } else if analyses.is_empty() {
            println!("No analyses yet.");
        } else {
            for a in &analyses {
                println!(
                    "{}  {:>3}%  {}  {}",
                    a.id,
                    a.ats_score,
                    dim(a.created_at.as_deref().unwrap_or("-")),
                    a.headline(60)
                );
            }
        }
        return Ok(());
    }

    // ── Pipeline ─────────────────────────────────────────────────────────
    let resume = cli.resume.as_deref().context("A résumé file is required")?;
    let job_description = read_job_description(&cli)?;

    let outcome = run_pipeline(&cli, &mut session, resume, job_description).await;
    if let Some(obs) = &observer {
        obs.finish();
    }
    let (saved, original_saved) = outcome?;

    // ── Report ───────────────────────────────────────────────────────────
    let run = session.run();
    if cli.json {
        let report = Report {
            file_name: run.uploaded_file_name(),
            state: session.state(),
            analysis_id: run.analysis_id(),
            result: run.result(),
            band: run.result().map(|r| r.band().label()),
            saved: saved.as_ref(),
            original_saved,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise result")?
        );
        return Ok(());
    }

    let Some(result) = run.result() else {
        bail!("Tailoring produced no result");
    };
    print_result(result, cli.show_text)?;
    if !cli.quiet {
        if let Some(saved) = &saved {
            eprintln!(
                "{}  {}  ({} bytes)",
                green("✔"),
                bold(&saved.path.display().to_string()),
                saved.bytes_written
            );
        }
        if let Some(path) = &original_saved {
            eprintln!("   original kept at {}", dim(&path.display().to_string()));
        }
    }
    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, observer: Option<Arc<CliObserver>>) -> Result<ClientConfig> {
    let mut builder = match &cli.api_url {
        Some(url) => ClientConfig::builder().base_url(url),
        None => {
            let from_env = ClientConfig::from_env().context("Invalid environment configuration")?;
            ClientConfig::builder().base_url(from_env.base_url)
        }
    }
    .request_timeout_secs(cli.timeout)
    .download_dir(&cli.output);

    if let Some(obs) = observer {
        builder = builder.observer(obs as Arc<dyn PipelineObserver>);
    }
    builder.build().context("Invalid configuration")
}

fn read_job_description(cli: &Cli) -> Result<String> {
    let text = match (&cli.job, &cli.job_text) {
        (_, Some(text)) => text.clone(),
        (Some(path), None) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read job description from stdin")?;
            buf
        }
        (Some(path), None) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job description from {:?}", path))?,
        (None, None) => bail!("Provide a job description with --job <FILE|-> or --job-text <TEXT>"),
    };
    Ok(text)
}

async fn run_pipeline(
    cli: &Cli,
    session: &mut Orchestrator,
    resume: &Path,
    job_description: String,
) -> Result<(Option<SavedDocument>, Option<PathBuf>)> {
    session
        .upload_path(resume)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Upload failed")?;

    let original_saved = if cli.keep_original {
        match session.run().original_document()? {
            Some(bytes) => {
                let name = session.run().uploaded_file_name().unwrap_or("resume.docx");
                let path = cli.output.join(format!("original_{name}"));
                std::fs::create_dir_all(&cli.output)
                    .and_then(|_| std::fs::write(&path, bytes))
                    .with_context(|| format!("Failed to write {:?}", path))?;
                Some(path)
            }
            None => None,
        }
    } else {
        None
    };

    session.set_job_description(job_description);
    session
        .tailor()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Tailoring failed")?;

    let saved = if cli.no_download {
        None
    } else {
        Some(
            session
                .download()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Download failed")?,
        )
    };
    Ok((saved, original_saved))
}

fn print_result(result: &TailorResult, show_text: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let band = result.band();
    let score = format!("{}%", result.ats_score);
    let score = match band {
        ScoreBand::Excellent => green(&score),
        ScoreBand::Good => yellow(&score),
        ScoreBand::NeedsImprovement => red(&score),
    };
    writeln!(out, "{}  {}  {}", bold("ATS score"), bold(&score), band)?;

    if !result.matched_keywords.is_empty() {
        writeln!(out, "\n{}", bold("Matched keywords"))?;
        writeln!(out, "  {}", green(&result.matched_keywords.join(", ")))?;
    }
    if !result.missing_keywords.is_empty() {
        writeln!(out, "\n{}", bold("Missing keywords"))?;
        writeln!(out, "  {}", red(&result.missing_keywords.join(", ")))?;
    }
    if !result.suggestions.is_empty() {
        writeln!(out, "\n{}", bold("Suggestions"))?;
        for s in &result.suggestions {
            writeln!(out, "  • {s}")?;
        }
    }
    if show_text {
        writeln!(out, "\n{}\n{}", bold("Tailored résumé"), result.tailored_text)?;
    }
    Ok(())
}
