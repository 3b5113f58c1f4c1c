use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use credit_balance_flipper::{
    BYTES_PER_MEBIBYTE, BalanceFlipper, BatchReport, DEFAULT_MAX_FILE_SIZE, FailureKind, Mode,
    Outcome,
};
use crossterm::style::{Color, Stylize};

/// Make the credit card balance in .qfx/.ofx files negative (or positive again with --undo).
///
/// Files can also be dropped onto the executable.
#[derive(Parser, Debug)]
#[command(name = "credit-balance-flipper", version, about)]
struct Cli {
    /// File(s) to process
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Make the credit balance positive in the specified files
    #[arg(short, long)]
    undo: bool,

    /// Wait for user input before exiting
    #[arg(short, long)]
    pause: bool,

    /// Tag holding the balance amount
    #[arg(long, default_value = "BALAMT")]
    tag: String,

    /// Aggregate the balance tag must be inside of
    #[arg(long, default_value = "LEDGERBAL", conflicts_with = "any_scope")]
    scope: String,

    /// Match the balance tag anywhere in the file
    #[arg(long)]
    any_scope: bool,

    /// Refuse files bigger than this many MiB
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE / BYTES_PER_MEBIBYTE)]
    max_size_mib: u64,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log level for diagnostics written to stderr
    #[arg(long, env = "FLIPPER_LOG", default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!("credit_balance_flipper={}", cli.log_level))
        .with_writer(io::stderr)
        .init();

    let mut builder = BalanceFlipper::builder()
        .tag(&cli.tag)
        .mode(if cli.undo { Mode::Undo } else { Mode::Flip })
        .max_file_size(cli.max_size_mib.saturating_mul(BYTES_PER_MEBIBYTE));
    builder = if cli.any_scope {
        builder.any_scope()
    } else {
        builder.scope(&cli.scope)
    };

    let report = builder.build().process_files(&cli.files);

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("[ERROR] Failed to serialize report: {err}"),
        }
    } else {
        print_report(&report);
    }

    let success = report.is_success();
    if cli.pause || (!success && io::stdin().is_terminal()) {
        pause();
    }

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Ok,
    Warning,
    Error,
}

impl Level {
    fn of(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Updated { .. } | Outcome::Unchanged { .. } => Level::Ok,
            Outcome::Failed {
                kind: FailureKind::FieldNotFound,
                ..
            } => Level::Warning,
            Outcome::Failed { .. } => Level::Error,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Level::Ok => "[OK]",
            Level::Warning => "[WARNING]",
            Level::Error => "[ERROR]",
        }
    }

    fn color(self) -> Color {
        match self {
            Level::Ok => Color::Green,
            Level::Warning => Color::Yellow,
            Level::Error => Color::Red,
        }
    }
}

fn tag(text: &str, color: Color, styled: bool) -> String {
    if styled {
        text.with(color).to_string()
    } else {
        text.to_string()
    }
}

fn print_report(report: &BatchReport) {
    let styled = io::stdout().is_terminal();
    let target = report.mode.target();

    for result in &report.results {
        let name = result
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| result.path.display().to_string());

        let level = Level::of(&result.outcome);
        let label = tag(level.label(), level.color(), styled);
        match &result.outcome {
            Outcome::Updated { fields, .. } => {
                println!("{label} Made {fields} balance(s) {target} in: \"{name}\"")
            }
            Outcome::Unchanged { .. } => println!("{label} Balance already {target} in: \"{name}\""),
            Outcome::Failed { error, .. } => println!("{label} {error}: \"{name}\""),
        }
    }

    let total = report.results.len();
    let succeeded = report.succeeded();
    let finished = tag("Finished.", Color::Green, styled);
    if succeeded == total {
        println!("{}", tag("Process completed successfully.", Color::Green, styled));
    } else if succeeded == 0 {
        println!("{finished} No files could be updated. [0/{total}]");
    } else {
        println!("{finished} Updated/validated {succeeded} of {total} files successfully.");
    }
}

fn pause() {
    print!("Press Enter to continue...");
    let _ = io::stdout().flush();
    let _ = io::stdin().lock().read_line(&mut String::new());
}
