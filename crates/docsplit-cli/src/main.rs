use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use docsplit_core::ProgressEvent;
use docsplit_core::config_file::{self, ConfigFile};
use docsplit_ingest::{SplitRequest, archive_file_name, plan_file, split_file};
use docsplit_parsing::{DetectionConfig, DetectionConfigBuilder};
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Split consolidated PDF, Excel, and Word files into one document per client
#[derive(Parser, Debug)]
#[command(name = "docsplit", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a PDF wherever a new account header starts
    Pdf {
        /// Path to the consolidated PDF
        file_path: PathBuf,

        /// Path of the ZIP archive to write (default: Split_<name>.zip next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        detection: DetectionArgs,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Print the sections a PDF split would produce, without writing anything
    Detect {
        /// Path to the consolidated PDF
        file_path: PathBuf,

        #[command(flatten)]
        detection: DetectionArgs,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Split the first worksheet of a workbook by the values of one column
    Excel {
        /// Path to the workbook
        file_path: PathBuf,

        /// Header of the column to split by
        #[arg(long)]
        column: Option<String>,

        /// Path of the ZIP archive to write (default: Split_<name>.zip next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Split a Word document at every paragraph containing a delimiter
    Word {
        /// Path to the .docx file
        file_path: PathBuf,

        /// Text that marks the first paragraph of each document
        #[arg(long)]
        delimiter: Option<String>,

        /// Path of the ZIP archive to write (default: Split_<name>.zip next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
struct DetectionArgs {
    /// Regex matching a header line; a named group `label` selects the label text
    #[arg(long)]
    pattern: Option<String>,

    /// Number of leading lines inspected on each page
    #[arg(long)]
    max_header_lines: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config_file::load_config();

    match cli.command {
        Command::Pdf {
            file_path,
            output,
            detection,
            no_color,
        } => {
            let detection = resolve_detection(detection, &config, env_var)?;
            let color = color_mode(no_color, &config);
            run_split(&file_path, SplitRequest::Pdf(detection), output, &config, color)
        }
        Command::Detect {
            file_path,
            detection,
            no_color,
        } => {
            let detection = resolve_detection(detection, &config, env_var)?;
            detect(&file_path, &detection, color_mode(no_color, &config))
        }
        Command::Excel {
            file_path,
            column,
            output,
            no_color,
        } => {
            let Some(column) = column.or_else(|| config.excel.as_ref().and_then(|e| e.column.clone()))
            else {
                anyhow::bail!("No column given. Pass --column NAME or set [excel] column in .docsplit.toml");
            };
            let color = color_mode(no_color, &config);
            run_split(&file_path, SplitRequest::Excel { column }, output, &config, color)
        }
        Command::Word {
            file_path,
            delimiter,
            output,
            no_color,
        } => {
            let Some(delimiter) =
                delimiter.or_else(|| config.word.as_ref().and_then(|w| w.delimiter.clone()))
            else {
                anyhow::bail!(
                    "No delimiter given. Pass --delimiter TEXT or set [word] delimiter in .docsplit.toml"
                );
            };
            let color = color_mode(no_color, &config);
            run_split(&file_path, SplitRequest::Word { delimiter }, output, &config, color)
        }
    }
}

/// Logs go to stderr at `warn` unless `-v` or `RUST_LOG` asks for more.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn color_mode(no_color: bool, config: &ConfigFile) -> ColorMode {
    let disabled = no_color
        || config
            .output
            .as_ref()
            .and_then(|o| o.no_color)
            .unwrap_or(false);
    ColorMode(!disabled)
}

/// Resolve detection settings: CLI flags > env vars > config file > defaults.
fn resolve_detection(
    args: DetectionArgs,
    config: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<DetectionConfig> {
    let file = config.detection.as_ref();

    let pattern = args
        .pattern
        .or_else(|| env("DOCSPLIT_HEADER_PATTERN"))
        .or_else(|| file.and_then(|d| d.header_pattern.clone()));

    let max_header_lines = match args.max_header_lines {
        Some(n) => Some(n),
        None => match env("DOCSPLIT_MAX_HEADER_LINES") {
            Some(v) => Some(
                v.parse::<usize>()
                    .with_context(|| format!("DOCSPLIT_MAX_HEADER_LINES is not a number: {v}"))?,
            ),
            None => file.and_then(|d| d.max_header_lines),
        },
    };

    let mut builder = DetectionConfigBuilder::new();
    if let Some(ref p) = pattern {
        builder = builder.header_regex(p);
    }
    if let Some(n) = max_header_lines {
        builder = builder.max_header_lines(n);
    }
    builder
        .build()
        .with_context(|| format!("Invalid header pattern: {}", pattern.unwrap_or_default()))
}

/// Where the archive goes when `-o` is not given: the configured output
/// directory, else the input's directory.
fn default_output(input: &Path, config: &ConfigFile) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = config
        .output
        .as_ref()
        .and_then(|o| o.directory.as_deref())
        .map(PathBuf::from)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(archive_file_name(&name))
}

fn progress_printer(color: ColorMode) -> impl Fn(ProgressEvent) {
    move |event| {
        let _ = output::print_progress(&mut std::io::stdout(), &event, color);
    }
}

fn run_split(
    file_path: &Path,
    request: SplitRequest,
    output: Option<PathBuf>,
    config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("Input file not found: {}", file_path.display());
    }
    let archive_path = output.unwrap_or_else(|| default_output(file_path, config));

    let mut writer = std::io::stdout();
    writeln!(writer, "Splitting {}...", file_path.display())?;

    let outcome = split_file(file_path, &request, progress_printer(color))
        .with_context(|| format!("Failed to split {}", file_path.display()))?;

    std::fs::write(&archive_path, &outcome.archive)
        .with_context(|| format!("Failed to write {}", archive_path.display()))?;
    tracing::info!(path = %archive_path.display(), bytes = outcome.archive.len(), "archive written");

    output::print_summary(&mut writer, &outcome, &archive_path, color)?;
    Ok(())
}

fn detect(file_path: &Path, config: &DetectionConfig, color: ColorMode) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("Input file not found: {}", file_path.display());
    }

    let segments = plan_file(file_path, config, progress_printer(color))
        .with_context(|| format!("Failed to analyze {}", file_path.display()))?;

    let name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output::print_plan(&mut std::io::stdout(), &name, &segments, color)?;
    Ok(())
}
