// GridEdit CLI - drive the in-place cell editor without a UI

mod exit_codes;
mod replay;
mod script;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gridedit_config::EditorSettings;
use gridedit_editor::{classify, ClassifyContext, Modifiers};
use gridedit_engine::sheet::Sheet;
use gridedit_engine::snapshot::read_snapshot;

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "gridedit")]
#[command(about = "Headless driver for the in-place cell editor")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script of selection, key and input events against a sheet
    #[command(after_help = "\
Examples:
  gridedit replay --sheet book.json --script steps.json
  gridedit replay --sheet book.json --script steps.json --output after.json
  GRIDEDIT_LOG=debug gridedit replay --sheet book.json --script steps.json")]
    Replay {
        /// Sheet JSON ({\"rows\", \"cols\", \"cells\": [{\"r\", \"c\", \"v\", ...}]})
        #[arg(long)]
        sheet: PathBuf,

        /// Script JSON (array of steps)
        #[arg(long)]
        script: PathBuf,

        /// Editor settings file (defaults to the user settings)
        #[arg(long, env = "GRIDEDIT_CONFIG")]
        config: Option<PathBuf>,

        /// Write the final sheet here instead of embedding it in the report
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show the text an edit session would start from
    #[command(after_help = "\
Examples:
  gridedit snapshot --sheet book.json --cell B3
  gridedit snapshot --sheet book.json --cell B3 --json")]
    Snapshot {
        #[arg(long)]
        sheet: PathBuf,

        /// Cell in A1 notation
        #[arg(long)]
        cell: String,

        /// Print kind and content as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a single key-down as an active edit session would
    #[command(after_help = "\
Examples:
  gridedit classify Escape
  gridedit classify ArrowLeft --shift
  gridedit classify v --ctrl
  gridedit classify Enter --candidate")]
    Classify {
        /// Key name (Escape, Enter, Tab, ArrowUp, ...) or a single character
        key: String,

        /// Explicit key code (derived from the key name when omitted)
        #[arg(long, default_value_t = 0)]
        code: u32,

        #[arg(long)]
        shift: bool,

        #[arg(long)]
        ctrl: bool,

        #[arg(long)]
        alt: bool,

        /// Cmd on macOS, Windows key elsewhere
        #[arg(long)]
        meta: bool,

        /// Pretend the formula suggestion list has a highlighted candidate
        #[arg(long)]
        candidate: bool,

        #[arg(long, env = "GRIDEDIT_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\neditor:  gridedit-editor ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("GRIDEDIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second subscriber (tests spawning in-process) is not an error
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("usage: gridedit <replay|snapshot|classify> [options]");
            eprintln!("run `gridedit --help` for details");
            return ExitCode::from(EXIT_USAGE);
        }
        Some(Commands::Replay { sheet, script, config, output }) => cmd_replay(sheet, script, config, output),
        Some(Commands::Snapshot { sheet, cell, json }) => cmd_snapshot(sheet, cell, json),
        Some(Commands::Classify { key, code, shift, ctrl, alt, meta, candidate, config }) => {
            let modifiers = Modifiers { control: ctrl, alt, shift, platform: meta };
            cmd_classify(key, code, modifiers, candidate, config)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_replay(
    sheet_path: PathBuf,
    script_path: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let sheet = load_sheet(&sheet_path)?;
    let steps = script::parse_script(&read_file(&script_path)?)?;
    let settings = load_settings(config.as_deref())?;
    log::info!("replaying {} steps against {}", steps.len(), sheet_path.display());

    let report = replay::run(sheet, settings, &steps)?;

    let json = match &output {
        Some(path) => {
            let sheet_json = to_json(&report.sheet)?;
            fs::write(path, sheet_json + "\n")
                .map_err(|e| CliError::io(format!("cannot write {}: {}", path.display(), e)))?;
            to_json(&serde_json::json!({ "steps": report.steps }))?
        }
        None => to_json(&report)?,
    };
    println!("{}", json);
    Ok(())
}

fn cmd_snapshot(sheet_path: PathBuf, cell: String, json: bool) -> Result<(), CliError> {
    let sheet = load_sheet(&sheet_path)?;
    let (row, col) = script::parse_cell(&cell)?;
    if !sheet.in_bounds(row, col) {
        return Err(CliError::args(format!("{} is outside the {}x{} sheet", cell, sheet.rows, sheet.cols)));
    }

    let snapshot = read_snapshot(&sheet, row, col);
    if json {
        let value = serde_json::json!({
            "cell": cell.to_ascii_uppercase(),
            "kind": snapshot.kind,
            "content": snapshot.rendered_content,
        });
        println!("{}", to_json(&value)?);
    } else {
        println!("{}", snapshot.rendered_content);
    }
    Ok(())
}

fn cmd_classify(
    key: String,
    code: u32,
    modifiers: Modifiers,
    candidate: bool,
    config: Option<PathBuf>,
) -> Result<(), CliError> {
    let settings = load_settings(config.as_deref())?;
    let event = script::key_event(&key, code, modifiers);
    let ctx = ClassifyContext {
        candidate_active: candidate,
        enter_commits: settings.enter_commits,
        platform_is_control: settings.platform_is_control(),
    };

    let classification = classify(&event, &ctx);
    let value = serde_json::json!({
        "key": event.key,
        "key_code": event.key_code,
        "classification": classification,
    });
    println!("{}", to_json(&value)?);
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| CliError::io(format!("cannot read {}: {}", path.display(), e)))
}

fn load_sheet(path: &Path) -> Result<Sheet, CliError> {
    let contents = read_file(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        CliError::parse(format!("invalid sheet {}: {}", path.display(), e))
            .with_hint("expected {\"rows\": N, \"cols\": N, \"cells\": [{\"r\": 0, \"c\": 0, \"v\": ...}]}")
    })
}

/// An explicit `--config` must exist and parse; the user settings file falls
/// back to defaults.
fn load_settings(config: Option<&Path>) -> Result<EditorSettings, CliError> {
    match config {
        Some(path) => {
            let contents = read_file(path)?;
            EditorSettings::parse(&contents)
                .map_err(|e| CliError::parse(format!("invalid settings {}: {}", path.display(), e)))
        }
        None => Ok(EditorSettings::load()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("cannot serialize output: {}", e),
        hint: None,
    })
}
