//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use speakerscout_core::{
    CachedExplainer, HeuristicKeywordExtractor, KeywordSource, OpenRouterClient,
    OpenRouterExplainer, OpenRouterKeywordExtractor, Pipeline, ProgressReporter, RankingOptions,
    RunOutcome, RunReport, StageReport, StaticKeywords, TemplateExplainer, top_quartile,
};
use speakerscout_filters::WhatlangDetector;
use speakerscout_filters::lexicon::{check_event_location, partition_countries};
use speakerscout_shared::{
    AppConfig, ClassifiedKeywords, ExplanationFailurePolicy, KeywordMode, PipelineConfig,
    RecordSet, StageKind, expand_home, init_config, load_config, load_config_from,
    validate_api_key,
};
use speakerscout_storage::{NewRun, RunCompletion, Storage};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SpeakerScout: shortlist event speakers from profile exports.
#[derive(Parser)]
#[command(
    name = "speakerscout",
    version,
    about = "Filter a batch of professional profiles down to an explained speaker shortlist.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.speakerscout/speakerscout.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the filtering pipeline over a profile batch.
    Run(RunArgs),

    /// List recent runs.
    History {
        /// Number of runs to show.
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Explanation cache management.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
pub(crate) struct RunArgs {
    /// Profile batch: JSON array or JSON Lines (.jsonl).
    #[arg(long)]
    pub profiles: PathBuf,

    /// Event topic (source of Class A keywords).
    #[arg(long)]
    pub topic: String,

    /// Event sub-topic (source of Class B keywords).
    #[arg(long)]
    pub subtopic: String,

    /// Country the event takes place in.
    #[arg(long)]
    pub event_location: Option<String>,

    /// Extra country to accept, on top of the EU list (repeatable).
    #[arg(long = "add-country")]
    pub add_country: Vec<String>,

    /// Keyword matching policy: classified or legacy.
    #[arg(long)]
    pub keyword_mode: Option<KeywordMode>,

    /// Class A keywords (comma-separated); skips keyword extraction.
    #[arg(long, value_delimiter = ',')]
    pub class_a: Vec<String>,

    /// Class B keywords (comma-separated); skips keyword extraction.
    #[arg(long, value_delimiter = ',')]
    pub class_b: Vec<String>,

    /// Run without OpenRouter: heuristic keywords and template explanations.
    #[arg(long)]
    pub offline: bool,

    /// Model id for OpenRouter calls (overrides the config default).
    #[arg(long)]
    pub model: Option<String>,

    /// Write the annotated shortlist here (JSON, or JSON Lines for .jsonl).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Write the top-quartile view here.
    #[arg(long)]
    pub top: Option<PathBuf>,

    /// Leave Category C profiles out of the top-quartile view.
    #[arg(long)]
    pub exclude_category_c: bool,

    /// Concurrent explanation calls.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// What a failed explanation does to the run: isolate or abort.
    #[arg(long)]
    pub on_explanation_error: Option<ExplanationFailurePolicy>,

    /// Excluded-companies table (overrides config).
    #[arg(long)]
    pub excluded_companies: Option<String>,

    /// Category A companies table (overrides config).
    #[arg(long)]
    pub category_a: Option<String>,

    /// Category B companies table (overrides config).
    #[arg(long)]
    pub category_b: Option<String>,
}

/// Cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Delete every cached explanation.
    Clear,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "speakerscout=info",
        1 => "speakerscout=debug",
        _ => "speakerscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let interactive = matches!(cli.log_format, LogFormat::Text);

    match cli.command {
        Command::Run(args) => cmd_run(config, args, interactive).await,
        Command::History { limit } => cmd_history(&config, limit).await,
        Command::Cache { action } => match action {
            CacheAction::Clear => cmd_cache_clear(&config).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Merge config file and flags into the runtime pipeline config.
fn pipeline_config(config: &AppConfig, args: &RunArgs) -> Result<PipelineConfig> {
    let mut pc = PipelineConfig::from(config);
    pc.topic = args.topic.trim().to_string();
    pc.subtopic = args.subtopic.trim().to_string();
    if pc.topic.is_empty() {
        return Err(eyre!("--topic must not be empty"));
    }

    if let Some(location) = args.event_location.as_deref().map(str::trim) {
        if !location.is_empty() && !check_event_location(location)? {
            warn!(location, "event location is not a recognised country");
        }
        pc.event_location = Some(location.to_string());
    }

    let (countries, unrecognised) =
        partition_countries(pc.additional_countries.iter().chain(&args.add_country));
    for name in &unrecognised {
        warn!(country = %name, "ignoring unrecognised additional country");
    }
    pc.additional_countries = countries;

    if let Some(mode) = args.keyword_mode {
        pc.keyword_mode = mode;
    }
    if let Some(n) = args.concurrency {
        pc.explanation_concurrency = n;
    }
    if let Some(policy) = args.on_explanation_error {
        pc.on_explanation_error = policy;
    }
    Ok(pc)
}

async fn cmd_run(mut config: AppConfig, args: RunArgs, interactive: bool) -> Result<()> {
    let pc = pipeline_config(&config, &args)?;

    if let Some(path) = &args.excluded_companies {
        config.reference.excluded_companies = Some(path.clone());
    }
    if let Some(path) = &args.category_a {
        config.reference.category_a = Some(path.clone());
    }
    if let Some(path) = &args.category_b {
        config.reference.category_b = Some(path.clone());
    }

    let rows = speakerscout_io::load_profiles(&args.profiles)?;
    let tables = speakerscout_io::load_reference_tables(&config.reference)?;

    // Everything that can fail before the pipeline starts must run ahead of
    // start_run, or the history row is left without an outcome.
    let client = if args.offline {
        None
    } else {
        Some(openrouter_client(&config, &args)?)
    };

    let storage = Arc::new(Storage::open(&expand_home(&config.defaults.cache_path)?).await?);
    let keyword_mode = pc.keyword_mode.to_string();
    let run_id = storage
        .start_run(&NewRun {
            topic: &pc.topic,
            subtopic: &pc.subtopic,
            event_location: pc.event_location(),
            keyword_mode: &keyword_mode,
            rows_in: rows.len(),
        })
        .await?;

    info!(
        run_id = %run_id,
        profiles = %args.profiles.display(),
        rows = rows.len(),
        offline = args.offline,
        "starting pipeline"
    );

    let static_keywords = (!args.class_a.is_empty() || !args.class_b.is_empty())
        .then(|| StaticKeywords::new(ClassifiedKeywords::new(&args.class_a, &args.class_b)));

    let progress: Box<dyn ProgressReporter> = if interactive {
        Box::new(CliProgress::new())
    } else {
        Box::new(speakerscout_core::SilentProgress)
    };

    let result = match client {
        None => {
            let extractor = match static_keywords {
                Some(s) => KeywordSource::Static(s),
                None => KeywordSource::Heuristic(HeuristicKeywordExtractor),
            };
            Pipeline::new(pc, tables, WhatlangDetector, extractor, TemplateExplainer)
                .run_rows(&rows, progress.as_ref())
                .await
        }
        Some(client) => {
            let extractor = match static_keywords {
                Some(s) => KeywordSource::Static(s),
                None => KeywordSource::OpenRouter(OpenRouterKeywordExtractor::new(client.clone())),
            };
            let explainer =
                CachedExplainer::new(OpenRouterExplainer::new(client), Arc::clone(&storage));
            Pipeline::new(pc, tables, WhatlangDetector, extractor, explainer)
                .run_rows(&rows, progress.as_ref())
                .await
        }
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            let failed = RunCompletion {
                outcome: "failed",
                rows_out: 0,
                emptied_stage: None,
                stages_json: "[]",
            };
            if let Err(history_err) = storage.finish_run(&run_id, &failed).await {
                warn!(error = %history_err, "could not record failed run");
            }
            return Err(e.into());
        }
    };

    record_outcome(&storage, &run_id, &outcome).await?;
    print_report(outcome.report());

    match &outcome {
        RunOutcome::Emptied { stage, .. } => {
            println!();
            println!(
                "  No profiles left after stage {} ({stage}); nothing to export.",
                stage.position()
            );
            println!();
        }
        RunOutcome::Completed { records, .. } => {
            export(records, &args)?;
        }
    }
    Ok(())
}

fn openrouter_client(config: &AppConfig, args: &RunArgs) -> Result<OpenRouterClient> {
    let api_key = validate_api_key(config)?;
    let model = args
        .model
        .clone()
        .unwrap_or_else(|| config.openrouter.default_model.clone());
    Ok(OpenRouterClient::new(&config.openrouter.base_url, api_key, model)?)
}

async fn record_outcome(storage: &Storage, run_id: &str, outcome: &RunOutcome) -> Result<()> {
    let report = outcome.report();
    let stages_json = serde_json::to_string(&report.stages)?;
    let emptied = match outcome {
        RunOutcome::Emptied { stage, .. } => Some(stage.name()),
        RunOutcome::Completed { .. } => None,
    };
    storage
        .finish_run(
            run_id,
            &RunCompletion {
                outcome: if emptied.is_some() { "emptied" } else { "completed" },
                rows_out: outcome.rows_out(),
                emptied_stage: emptied,
                stages_json: &stages_json,
            },
        )
        .await?;
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    println!("  Profiles in: {}", report.rows_in);
    if let Some(kw) = &report.keywords {
        println!("  Class A:     {}", kw.class_a().join(", "));
        println!("  Class B:     {}", kw.class_b().join(", "));
    }
    println!();
    println!("  {:<28} {:>7} {:>7}", "Stage", "In", "Out");
    for s in &report.stages {
        println!(
            "  {:<28} {:>7} {:>7}",
            format!("{}. {}", s.stage.position(), s.stage),
            s.rows_in,
            s.rows_out
        );
    }
    if report.explanation_failures > 0 {
        println!();
        println!(
            "  {} explanation(s) failed; see the llm_error column.",
            report.explanation_failures
        );
    }
}

fn export(records: &RecordSet, args: &RunArgs) -> Result<()> {
    println!();
    println!("  Shortlisted: {}", records.len());

    if let Some(out) = &args.out {
        speakerscout_io::write_rows(out, &records.to_rows())?;
        println!("  Results:     {}", out.display());
    }

    let options = RankingOptions {
        include_category_c: !args.exclude_category_c,
    };
    let top = top_quartile(records.records(), options);
    println!();
    println!("  Top quartile ({}):", top.len());
    for ranked in &top {
        let r = ranked.record;
        println!("  {:>4}  {:<40} {}", ranked.score, r.title, r.company_name);
    }

    if let Some(path) = &args.top {
        let rows: Vec<_> = top
            .iter()
            .map(|ranked| {
                let mut row = ranked.record.to_row();
                row.insert("score".into(), Value::from(ranked.score));
                row
            })
            .collect();
        speakerscout_io::write_rows(path, &rows)?;
        println!("  Top view:    {}", path.display());
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner, switching to a bar for
/// the explanation stage.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

impl ProgressReporter for CliProgress {
    fn stage_started(&self, stage: StageKind, rows: usize) {
        if stage == StageKind::Explanation {
            self.bar.set_style(bar_style());
            self.bar.set_length(rows as u64);
            self.bar.set_position(0);
        }
        self.bar
            .set_message(format!("[{}/9] {stage} ({rows} profiles)", stage.position()));
    }

    fn stage_finished(&self, _report: &StageReport) {}

    fn row_explained(&self, current: usize, _total: usize) {
        self.bar.set_position(current as u64);
    }

    fn done(&self, _outcome: &RunOutcome) {
        self.bar.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// history / cache / config
// ---------------------------------------------------------------------------

async fn cmd_history(config: &AppConfig, limit: usize) -> Result<()> {
    let path = expand_home(&config.defaults.cache_path)?;
    let storage = Storage::open_readonly(&path).await?;
    let runs = storage.recent_runs(limit).await?;

    if runs.is_empty() {
        println!("No runs recorded yet.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<20}  {:<24}  {:>6}  {:>6}  {}",
        "ID", "Started", "Topic", "In", "Out", "Outcome"
    );
    for run in runs {
        let outcome = match (&run.outcome, &run.emptied_stage) {
            (Some(o), Some(stage)) => format!("{o} at {stage}"),
            (Some(o), None) => o.clone(),
            (None, _) => "unfinished".to_string(),
        };
        println!(
            "{:<36}  {:<20}  {:<24}  {:>6}  {:>6}  {}",
            run.id,
            run.started_at.chars().take(19).collect::<String>(),
            run.topic.chars().take(24).collect::<String>(),
            run.rows_in,
            run.rows_out.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
            outcome
        );
    }
    Ok(())
}

async fn cmd_cache_clear(config: &AppConfig) -> Result<()> {
    let path = expand_home(&config.defaults.cache_path)?;
    if !path.exists() {
        return Err(eyre!("no database at '{}'", path.display()));
    }
    let storage = Storage::open(&path).await?;
    let removed = storage.clear_explanations().await?;
    println!("Removed {removed} cached explanation(s).");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn args(extra: &[&str]) -> RunArgs {
        let mut argv = vec![
            "speakerscout",
            "run",
            "--profiles",
            "profiles.json",
            "--topic",
            " AI ",
            "--subtopic",
            "Healthcare",
        ];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn flags_override_config() {
        let config = AppConfig::default();
        let pc = pipeline_config(
            &config,
            &args(&[
                "--keyword-mode",
                "legacy",
                "--concurrency",
                "8",
                "--on-explanation-error",
                "abort",
                "--event-location",
                "France",
            ]),
        )
        .unwrap();
        assert_eq!(pc.topic, "AI");
        assert_eq!(pc.keyword_mode, KeywordMode::Legacy);
        assert_eq!(pc.explanation_concurrency, 8);
        assert_eq!(pc.on_explanation_error, ExplanationFailurePolicy::Abort);
        assert_eq!(pc.event_location(), Some("France"));
    }

    #[test]
    fn unrecognised_countries_are_dropped() {
        let mut config = AppConfig::default();
        config.location.additional_countries = vec!["Japan".into()];
        let pc = pipeline_config(
            &config,
            &args(&["--add-country", "Narnia", "--add-country", "Brazil"]),
        )
        .unwrap();
        assert_eq!(pc.additional_countries, vec!["Japan", "Brazil"]);
    }

    #[test]
    fn event_location_with_digits_is_rejected() {
        let config = AppConfig::default();
        assert!(pipeline_config(&config, &args(&["--event-location", "Berlin 2025"])).is_err());
    }

    #[test]
    fn class_lists_split_on_commas() {
        let a = args(&["--class-a", "ai,innovation", "--class-b", "healthcare"]);
        assert_eq!(a.class_a, vec!["ai", "innovation"]);
        assert_eq!(a.class_b, vec!["healthcare"]);
    }

    #[tokio::test]
    async fn missing_api_key_leaves_no_open_run() {
        let tmp = std::env::temp_dir();
        let profiles = tmp.join(format!("speakerscout_cli_profiles_{}.json", Uuid::now_v7()));
        let db = tmp.join(format!("speakerscout_cli_{}.db", Uuid::now_v7()));
        std::fs::write(
            &profiles,
            r#"[{"title":"CTO","companyName":"Acme","summary":"AI in healthcare","location":"Berlin, Germany"}]"#,
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.defaults.cache_path = db.to_string_lossy().into_owned();
        config.openrouter.api_key_env =
            format!("SPEAKERSCOUT_UNSET_KEY_{}", Uuid::now_v7().simple());
        let mut run_args = args(&[]);
        run_args.profiles = profiles.clone();

        let err = cmd_run(config.clone(), run_args, false).await.unwrap_err();
        assert!(err.to_string().contains(&config.openrouter.api_key_env));

        let storage = Storage::open(&db).await.unwrap();
        let runs = storage.recent_runs(10).await.unwrap();
        assert!(runs.iter().all(|r| r.finished_at.is_some()));
        assert!(runs.is_empty());

        let _ = std::fs::remove_file(&profiles);
        let _ = std::fs::remove_file(&db);
    }
}
