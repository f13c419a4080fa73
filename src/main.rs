//! Purpose: `jfetch` CLI entry point.
//! Role: Binary crate root; parses args, runs the one GET, prints JSON on stdout.
//! Invariants: The decoded response value is the only stdout payload.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `error::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::time::Duration;

use clap::{CommandFactory, Parser, ValueEnum, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod color_json;

use color_json::colorize_json;
use jfetch::error::{Error, ErrorKind, to_exit_code};
use jfetch::params::{parse_params, query_pairs};
use jfetch::request::Client;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                return Ok(RunOutcome::ok());
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage).with_message(clap_error_summary(&err)),
                    ColorMode::Auto,
                ));
            }
        },
    };
    let color_mode = cli.color;
    dispatch(cli).map_err(|err| (err, color_mode))
}

fn dispatch(cli: Cli) -> Result<RunOutcome, Error> {
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        clap_complete::aot::generate(shell, &mut cmd, "jfetch", &mut io::stdout());
        return Ok(RunOutcome::ok());
    }

    // clap enforces --url unless --completion short-circuits above.
    let url = cli.url.ok_or_else(|| {
        Error::new(ErrorKind::Usage).with_message("--url is required")
    })?;
    let params = parse_params(cli.params.as_deref().unwrap_or("{}"))?;
    let pairs = query_pairs(&params);

    let client = match cli.timeout_ms {
        Some(ms) => Client::with_timeout(Duration::from_millis(ms)),
        None => Client::new(),
    };
    let value = client.get_json(&url, &pairs)?;

    emit_value(&value, cli.compact, cli.color);
    Ok(RunOutcome::ok())
}

#[derive(Parser)]
#[command(
    name = "jfetch",
    version,
    about = "One HTTP GET with JSON-object query parameters; prints the JSON response",
    after_help = r#"EXAMPLES
  $ jfetch --url https://api.example.com/search --params '{"q": "test", "limit": 5}'
  # issues GET https://api.example.com/search?q=test&limit=5 and prints the body

  $ jfetch --url http://localhost:8080/health
  # no --params means no query string

  Output is pretty-printed on a terminal, one line of strict JSON otherwise."#,
    long_about = None
)]
struct Cli {
    #[arg(long, required_unless_present = "completion", help = "Target URL for the GET request")]
    url: Option<String>,
    #[arg(
        long,
        help = "JSON object literal; entries become query parameters (default: {})"
    )]
    params: Option<String>,
    #[arg(long, value_name = "MS", help = "Overall request timeout; none when omitted")]
    timeout_ms: Option<u64>,
    #[arg(long, help = "Print the response as one line of strict JSON")]
    compact: bool,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize pretty output and stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,
    #[arg(long, value_enum, help = "Print a shell completion script and exit")]
    completion: Option<Shell>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

fn emit_value(value: &Value, compact: bool, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    if compact || !is_tty {
        let line = serde_json::to_string(value)
            .unwrap_or_else(|_| "null".to_string());
        println!("{line}");
        return;
    }
    println!("{}", colorize_json(value, color_mode.use_color(is_tty)));
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let line = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{line}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(url) = err.url() {
        inner.insert("url".to_string(), json!(url));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, ANSI_RED),
        error_message(err)
    ));
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, ANSI_YELLOW)
        ));
    }
    if let Some(url) = err.url() {
        lines.push(format!(
            "{} {url}",
            colorize_label("url:", use_color, ANSI_YELLOW)
        ));
    }
    if let Some(status) = err.status() {
        lines.push(format!(
            "{} {status}",
            colorize_label("status:", use_color, ANSI_YELLOW)
        ));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, ANSI_YELLOW)
        ));
    }
    lines.join("\n")
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

const ANSI_RED: &str = "31";
const ANSI_YELLOW: &str = "33";

fn colorize_label(label: &str, use_color: bool, color: &str) -> String {
    if use_color {
        format!("\u{1b}[{color}m{label}\u{1b}[0m")
    } else {
        label.to_string()
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim_start_matches("error: ").to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
