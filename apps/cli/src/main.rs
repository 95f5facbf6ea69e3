use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use numismat_catalog::{
    render_template, Catalog, ConfigStore, L10nConfig, TranslateParams, Translator,
};
use serde_json::{json, Value as SerdeValue};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const DEFAULT_CONFIG_FILE: &str = "l10n.json";
const UNTRANSLATED_DEFAULT_LIMIT: usize = 20;

#[derive(Parser)]
#[command(
    name = "numismat-l10n",
    about = "Inspect and maintain OpenNumismat translation catalogs",
    author,
    version
)]
struct Cli {
    /// 設定檔路徑；預設為目前目錄的 l10n.json。 / Config file (defaults to ./l10n.json).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// 提高日誌詳細程度，可重複。 / Increase log verbosity (repeatable).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 顯示翻譯檔統計。 / Show per-catalog message counts.
    Stats(StatsArgs),
    /// 驗證翻譯檔並列出診斷。 / Validate catalogs and print diagnostics.
    Check(CheckArgs),
    /// 查詢單一訊息的翻譯。 / Resolve one message the way the application would.
    Lookup(LookupArgs),
    /// 列出尚未完成的翻譯。 / List unfinished messages by context.
    Untranslated(UntranslatedArgs),
    /// 以標準格式重新寫出翻譯檔。 / Rewrite a catalog in canonical layout.
    Normalize(NormalizeArgs),
    /// 列出可用語系與設定選用的語系。 / List available languages and the configured choice.
    Languages,
}

#[derive(Args)]
struct StatsArgs {
    /// 翻譯檔或資料夾；預設為設定中的目錄。 / Catalog files or directories (defaults to the configured directory).
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
    /// 以 JSON 輸出。 / Emit machine-readable JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// 翻譯檔或資料夾；預設為設定中的目錄。 / Catalog files or directories (defaults to the configured directory).
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
    /// 有任何診斷即失敗。 / Fail when any diagnostic is reported.
    #[arg(long)]
    strict: bool,
    /// 有未完成翻譯即失敗。 / Fail when unfinished messages remain.
    #[arg(long)]
    fail_on_unfinished: bool,
}

#[derive(Args)]
struct LookupArgs {
    /// 翻譯檔。 / Catalog file.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// 訊息所屬的 context。 / Context name.
    #[arg(long)]
    context: String,
    /// 原文。 / Source text.
    #[arg(long)]
    source: String,
    /// 消歧義註解。 / Disambiguation comment.
    #[arg(long)]
    comment: Option<String>,
    /// 複數數量，用於選擇複數形式與 %n。 / Count selecting the plural form and filling %n.
    #[arg(long, allow_negative_numbers = true)]
    count: Option<i64>,
    /// 依序填入 %1..%9 的值。 / Values for %1..%9, in order.
    #[arg(long = "arg", value_name = "VALUE")]
    args: Vec<String>,
}

#[derive(Args)]
struct UntranslatedArgs {
    /// 翻譯檔。 / Catalog file.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// 最多列出的訊息數。 / Maximum number of messages to list.
    #[arg(long, default_value_t = UNTRANSLATED_DEFAULT_LIMIT)]
    limit: usize,
}

#[derive(Args)]
struct NormalizeArgs {
    /// 翻譯檔。 / Catalog file.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// 輸出路徑；預設覆寫原檔。 / Output path (defaults to rewriting the input).
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        config,
        verbose,
        command,
    } = Cli::parse();
    init_tracing(verbose);
    let store = load_config(config)?;

    match command {
        Commands::Stats(args) => execute_stats(args, &store),
        Commands::Check(args) => execute_check(args, &store),
        Commands::Lookup(args) => execute_lookup(args),
        Commands::Untranslated(args) => execute_untranslated(args),
        Commands::Normalize(args) => execute_normalize(args),
        Commands::Languages => execute_languages(&store),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<PathBuf>) -> Result<ConfigStore> {
    let explicit = path.is_some();
    let path = resolve_input_path(&path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)))?;
    if explicit && !path.exists() {
        bail!("config file {} does not exist", path.display());
    }
    ConfigStore::load(&path).with_context(|| format!("load config {}", path.display()))
}

fn execute_stats(args: StatsArgs, store: &ConfigStore) -> Result<()> {
    let files = collect_catalogs(&args.paths, store)?;
    let mut reports = Vec::new();
    for path in files {
        let catalog = load_catalog(&path)?;
        reports.push((path, catalog.stats()));
    }

    if args.json {
        let payload: Vec<SerdeValue> = reports
            .iter()
            .map(|(path, stats)| {
                json!({
                    "path": path.display().to_string(),
                    "stats": stats,
                    "completion": stats.completion(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Loaded {} catalog(s)", reports.len());
    for (path, stats) in &reports {
        println!(
            " - {} [{}]: {} messages in {} contexts; {} translated, {} unfinished, {} obsolete ({} plural); {:.1}% complete",
            stats.language,
            file_label(path),
            stats.messages,
            stats.contexts,
            stats.translated,
            stats.unfinished,
            stats.obsolete,
            stats.plural,
            stats.completion() * 100.0
        );
    }
    Ok(())
}

fn execute_check(args: CheckArgs, store: &ConfigStore) -> Result<()> {
    let files = collect_catalogs(&args.paths, store)?;
    let mut failed = 0usize;
    let mut diagnostics = 0usize;
    let mut unfinished = 0usize;

    for path in &files {
        let catalog = match Catalog::load(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                eprintln!("error: {err}");
                failed += 1;
                continue;
            }
        };
        for warning in catalog.warnings() {
            eprintln!("warning: {}: {warning}", path.display());
        }
        let stats = catalog.stats();
        diagnostics += catalog.warnings().len();
        unfinished += stats.unfinished;
        println!(
            "{}: ok ({} messages, {} unfinished, {} warning(s))",
            path.display(),
            stats.messages,
            stats.unfinished,
            catalog.warnings().len()
        );
    }

    println!(
        "Checked {} catalog(s): {failed} failed, {diagnostics} warning(s), {unfinished} unfinished",
        files.len()
    );
    if failed > 0 {
        bail!("{failed} catalog(s) failed to parse");
    }
    if args.strict && diagnostics > 0 {
        bail!("{diagnostics} diagnostic(s) reported in strict mode");
    }
    if args.fail_on_unfinished && unfinished > 0 {
        bail!("{unfinished} unfinished message(s) remain");
    }
    Ok(())
}

fn execute_lookup(args: LookupArgs) -> Result<()> {
    let path = resolve_input_path(&args.file)?;
    let catalog = load_catalog(&path)?;
    let values: Vec<&str> = args.args.iter().map(String::as_str).collect();
    let params = match args.count {
        Some(count) => TranslateParams::with_count(&values, count),
        None => TranslateParams::new(&values),
    };

    let template = match (&args.comment, args.count) {
        (Some(comment), Some(count)) => {
            catalog.lookup_plural_with_comment(&args.context, &args.source, comment, count)
        }
        (Some(comment), None) => catalog.lookup_with_comment(&args.context, &args.source, comment),
        (None, Some(count)) => catalog.lookup_plural(&args.context, &args.source, count),
        (None, None) => catalog.lookup(&args.context, &args.source),
    };
    println!("{}", render_template(template, &params));
    Ok(())
}

fn execute_untranslated(args: UntranslatedArgs) -> Result<()> {
    let path = resolve_input_path(&args.file)?;
    let catalog = load_catalog(&path)?;
    let pending: Vec<_> = catalog.untranslated().collect();
    if pending.is_empty() {
        println!("{}: all messages translated", catalog.language());
        return Ok(());
    }

    println!(
        "{}: {} unfinished message(s)",
        catalog.language(),
        pending.len()
    );
    let mut current_context: Option<&str> = None;
    for (context, message) in pending.iter().take(args.limit) {
        if current_context != Some(context.name()) {
            println!("{}", context.name());
            current_context = Some(context.name());
        }
        match message.locations.first() {
            Some(location) => match location.line {
                Some(line) => println!("  · {} ({}:{line})", message.source, location.filename),
                None => println!("  · {} ({})", message.source, location.filename),
            },
            None => println!("  · {}", message.source),
        }
    }
    if pending.len() > args.limit {
        println!("  · ... {} more", pending.len() - args.limit);
    }
    Ok(())
}

fn execute_normalize(args: NormalizeArgs) -> Result<()> {
    let input = resolve_input_path(&args.file)?;
    let catalog = load_catalog(&input)?;
    let output = match args.output {
        Some(path) => resolve_input_path(&path)?,
        None => input,
    };
    catalog
        .write_to_path(&output)
        .with_context(|| format!("write catalog {}", output.display()))?;
    println!(
        "Wrote {} ({} messages)",
        output.display(),
        catalog.message_count()
    );
    Ok(())
}

fn execute_languages(store: &ConfigStore) -> Result<()> {
    let config: &L10nConfig = store.config();
    let translator = Translator::from_config(config, store.root())
        .with_context(|| format!("load catalogs from {}", store.catalog_dir().display()))?;
    let active = translator.language();

    println!("Catalog directory: {}", store.catalog_dir().display());
    println!(
        "Configured language: {} (resolved: {})",
        config.language,
        config.resolved_language()
    );
    for entry in translator.available_catalogs() {
        let marker = if entry.code == active { "*" } else { " " };
        println!("{marker} {} [{}]", entry.code, file_label(&entry.path));
    }
    if translator.available_catalogs().iter().all(|entry| entry.code != active) {
        println!("* {active} [source text]");
    }
    Ok(())
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    Catalog::load(path).with_context(|| format!("load catalog {}", path.display()))
}

/// Catalog files named by `paths`; directories are walked for files with
/// the configured extension. No paths means the configured directory.
fn collect_catalogs(paths: &[PathBuf], store: &ConfigStore) -> Result<Vec<PathBuf>> {
    let roots = if paths.is_empty() {
        vec![store.catalog_dir()]
    } else {
        paths
            .iter()
            .map(|path| resolve_input_path(path))
            .collect::<Result<Vec<_>>>()?
    };
    let extension = store.config().file_extension.as_str();

    let mut files = BTreeSet::new();
    for root in roots {
        if root.is_file() {
            files.insert(root.clone());
        } else if root.is_dir() {
            for entry in WalkDir::new(&root) {
                match entry {
                    Ok(entry) => {
                        let path = entry.path();
                        if entry.file_type().is_file()
                            && path.extension().and_then(|ext| ext.to_str()) == Some(extension)
                        {
                            files.insert(path.to_path_buf());
                        }
                    }
                    Err(err) => {
                        eprintln!("warning: {}: {}", root.display(), err);
                    }
                }
            }
        } else {
            eprintln!("warning: {} does not exist", root.display());
        }
    }

    if files.is_empty() {
        bail!("no catalogs found");
    }
    Ok(files.into_iter().collect())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn resolve_input_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("determine current directory")?
            .join(path))
    }
}
