use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indexmap::IndexMap;
use tracing::{info, warn};

use version_matrix::config::{
    AppConfig, DEFAULT_CACHE_FILE, DEFAULT_FEED_OUTPUT_DIR, DEFAULT_MATRIX_FILE,
    DEFAULT_MAX_AGE_DAYS, DEFAULT_TEMPLATE_FILE, DEFAULT_VERSION_COUNT, github_token,
};
use version_matrix::json_format::to_string_pretty4;
use version_matrix::matrix::feed_matrix::generate_matrix;
use version_matrix::matrix::github_output::{parse_json, set_github_output};
use version_matrix::matrix::refresh::{UpdateOptions, update_versions};
use version_matrix::matrix::template::{SortOrder, TemplateOptions, generate_template};
use version_matrix::matrix::update::{Strategy, update_matrix};
use version_matrix::version::cache::VersionCache;
use version_matrix::version::feeds::{ReleaseFeeds, VersionType};
use version_matrix::version::fetcher::tag_fetchers;
use version_matrix::version::types::Language;

#[derive(Parser)]
#[command(name = "version-matrix")]
#[command(version, about = "Fetch language release versions into CI build-matrix JSON")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// JSON file overriding service endpoints
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh the version cache and regenerate the version template
    Cache(CacheArgs),
    /// Rewrite an existing matrix file from per-language strategies
    UpdateMatrix(UpdateMatrixArgs),
    /// Build a matrix from the official release feeds
    Feeds(FeedsArgs),
    /// Append a matrix file to GITHUB_OUTPUT as KEY=value lines
    GithubOutput(GithubOutputArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LanguageArg {
    Python,
    Nodejs,
    Ruby,
    Go,
    Rust,
    All,
}

impl LanguageArg {
    fn language(self) -> Option<Language> {
        match self {
            LanguageArg::Python => Some(Language::Python),
            LanguageArg::Nodejs => Some(Language::Nodejs),
            LanguageArg::Ruby => Some(Language::Ruby),
            LanguageArg::Go => Some(Language::Go),
            LanguageArg::Rust => Some(Language::Rust),
            LanguageArg::All => None,
        }
    }
}

#[derive(Args)]
struct CacheArgs {
    /// Languages to update
    #[arg(long, num_args = 1.., value_enum, default_value = "all")]
    languages: Vec<LanguageArg>,

    /// Update even if the cache is fresh
    #[arg(long)]
    force: bool,

    /// Maximum cache age in days before an update
    #[arg(long, default_value_t = DEFAULT_MAX_AGE_DAYS)]
    max_age: i64,

    /// Number of versions to fetch per language
    #[arg(long, default_value_t = DEFAULT_VERSION_COUNT)]
    count: usize,

    #[arg(long, default_value = DEFAULT_CACHE_FILE)]
    cache_file: PathBuf,

    #[arg(long, default_value = DEFAULT_TEMPLATE_FILE)]
    template_file: PathBuf,

    /// Existing template to keep `os` and `ghpages_branch` from
    #[arg(long)]
    existing_template: Option<PathBuf>,

    /// Only update the cache
    #[arg(long, conflicts_with = "template_only")]
    cache_only: bool,

    /// Only generate the template from the existing cache
    #[arg(long)]
    template_only: bool,

    /// Append new versions instead of replacing the cached ones
    #[arg(long)]
    incremental: bool,

    /// Keep the existing template's versions for languages without data
    #[arg(long)]
    keep_existing: bool,

    #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
    sort: SortOrder,

    /// Maximum number of versions per language in the template
    #[arg(long)]
    max_versions: Option<usize>,
}

#[derive(Args)]
struct UpdateMatrixArgs {
    #[arg(long, default_value = DEFAULT_MATRIX_FILE)]
    json_file: PathBuf,

    #[arg(long, value_enum)]
    python: Option<Strategy>,

    #[arg(long, value_enum)]
    nodejs: Option<Strategy>,

    #[arg(long, value_enum)]
    ruby: Option<Strategy>,

    #[arg(long, value_enum)]
    go: Option<Strategy>,

    #[arg(long, value_enum)]
    rust: Option<Strategy>,

    /// Apply the same strategy to every language
    #[arg(long, value_enum)]
    all: Option<Strategy>,

    /// Log the result without writing the file
    #[arg(long)]
    dry_run: bool,
}

impl UpdateMatrixArgs {
    fn strategies(&self) -> IndexMap<Language, Strategy> {
        if let Some(strategy) = self.all {
            return Language::ALL.into_iter().map(|l| (l, strategy)).collect();
        }
        [
            (Language::Python, self.python),
            (Language::Nodejs, self.nodejs),
            (Language::Ruby, self.ruby),
            (Language::Go, self.go),
            (Language::Rust, self.rust),
        ]
        .into_iter()
        .filter_map(|(language, strategy)| strategy.map(|s| (language, s)))
        .collect()
    }
}

#[derive(Args)]
struct FeedsArgs {
    #[arg(long = "type", value_enum, default_value_t = VersionType::Stable)]
    version_type: VersionType,

    /// Only this language
    #[arg(long)]
    lang: Option<Language>,

    #[arg(long, default_value = DEFAULT_FEED_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Print the fetched versions and details
    #[arg(long)]
    debug: bool,
}

#[derive(Args)]
struct GithubOutputArgs {
    json_file: PathBuf,

    /// Print every output line
    #[arg(long)]
    debug: bool,
}

fn selected_languages(args: &[LanguageArg]) -> Vec<Language> {
    if args.contains(&LanguageArg::All) {
        return Language::ALL.to_vec();
    }
    let mut languages: Vec<Language> = Vec::new();
    for language in args.iter().filter_map(|a| a.language()) {
        if !languages.contains(&language) {
            languages.push(language);
        }
    }
    languages
}

async fn run_cache(args: CacheArgs, config: &AppConfig) -> anyhow::Result<()> {
    let languages = selected_languages(&args.languages);

    let force = if !args.template_only && !args.cache_file.exists() {
        warn!(
            "Cache file {:?} does not exist, creating a new one",
            args.cache_file
        );
        true
    } else {
        args.force
    };

    let mut cache = VersionCache::load(&args.cache_file);
    if args.template_only {
        info!("Template-only mode: skipping cache update");
    } else {
        let options = UpdateOptions {
            force,
            max_age_days: args.max_age,
            count: args.count,
            incremental: args.incremental,
        };
        let token = github_token();
        let fetchers = tag_fetchers(&languages, &config.endpoints, token.as_deref());
        update_versions(&mut cache, &fetchers, &options).await;
    }

    if args.cache_only {
        info!("Cache-only mode: skipping template generation");
        return Ok(());
    }

    let template_languages = if args.template_only && args.languages.contains(&LanguageArg::All) {
        None
    } else {
        Some(languages.iter().map(ToString::to_string).collect())
    };
    let options = TemplateOptions {
        languages: template_languages,
        keep_existing: args.keep_existing,
        sort: args.sort,
        max_versions: args.max_versions,
    };
    let existing = args
        .existing_template
        .as_deref()
        .unwrap_or(args.template_file.as_path());
    generate_template(cache.data(), &args.template_file, Some(existing), &options)?;
    Ok(())
}

async fn run_update_matrix(args: UpdateMatrixArgs, config: &AppConfig) -> anyhow::Result<()> {
    let strategies = args.strategies();
    if strategies.is_empty() {
        anyhow::bail!("At least one language strategy must be specified");
    }

    let languages: Vec<Language> = strategies.keys().copied().collect();
    let token = github_token();
    let fetchers = tag_fetchers(&languages, &config.endpoints, token.as_deref());
    update_matrix(&args.json_file, &strategies, &fetchers, args.dry_run).await?;
    Ok(())
}

async fn run_feeds(args: FeedsArgs, config: &AppConfig) -> anyhow::Result<()> {
    let languages = match args.lang {
        Some(language) => vec![language],
        None => Language::ALL.to_vec(),
    };
    let token = github_token();
    let feeds = ReleaseFeeds::new(&config.endpoints, token.as_deref());
    let versions = feeds.fetch_all(&languages, args.version_type).await;

    let path = generate_matrix(&args.output_dir, args.lang, &versions)?;
    if args.debug {
        println!("{}", to_string_pretty4(&versions)?);
    }
    info!("Generated {:?}", path);
    Ok(())
}

fn run_github_output(args: GithubOutputArgs) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.json_file)
        .with_context(|| format!("Couldn't read {}", args.json_file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", args.json_file.display()))?;

    let outputs = parse_json(&value)?;
    if args.debug {
        for (key, value) in &outputs {
            println!("{key}={value}");
        }
    }
    set_github_output(&outputs)?;
    if args.debug {
        println!("Written to GITHUB_OUTPUT");
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    AppConfig::load(path).with_context(|| match path {
        Some(path) => format!("Couldn't load config file: {}", path.display()),
        None => "Couldn't load config".to_string(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = version_matrix::logging::init(cli.verbose, cli.log_file.as_deref())?;
    let config = load_config(cli.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Cache(args) => runtime.block_on(run_cache(args, &config)),
        Command::UpdateMatrix(args) => runtime.block_on(run_update_matrix(args, &config)),
        Command::Feeds(args) => runtime.block_on(run_feeds(args, &config)),
        Command::GithubOutput(args) => run_github_output(args),
    }
}
