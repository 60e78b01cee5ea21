mod http;
mod logging;
mod play;
mod serve;

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use clap::{Args, Parser, Subcommand};
use services::api::StartRequest;
use services::{AppServices, Clock, ServiceOptions};
use storage::load_banks_from_dir;

use crate::http::HttpConfig;
use crate::logging::{LogConfig, LogFormat, init_logging};

/// Serve randomized quizzes from a directory of JSON question banks.
#[derive(Debug, Parser)]
#[command(name = "quiz", version)]
struct Cli {
    /// Directory holding `<bank>.json` files
    #[arg(long, env = "QUIZ_BANKS_DIR", default_value = "questions", global = true)]
    banks_dir: PathBuf,

    /// Seed for question selection and shuffling (random when unset)
    #[arg(long, env = "QUIZ_SEED", global = true)]
    seed: Option<u64>,

    /// Drop sessions idle for this many seconds (never when unset)
    #[arg(long, env = "QUIZ_SESSION_TTL_SECS", global = true)]
    session_ttl_secs: Option<u32>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "QUIZ_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[arg(long, env = "QUIZ_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List loaded question banks
    Banks,
    /// Take a quiz interactively
    Play(PlayArgs),
    /// Answer JSON requests, one per stdin line
    Serve,
    /// Serve the JSON API over HTTP
    Http(HttpArgs),
}

#[derive(Debug, Args)]
struct HttpArgs {
    #[arg(long, env = "QUIZ_HTTP_ADDR", default_value = "127.0.0.1:8000")]
    addr: SocketAddr,

    /// Frontend files served for paths outside /api
    #[arg(long, env = "QUIZ_STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

impl From<HttpArgs> for HttpConfig {
    fn from(args: HttpArgs) -> Self {
        HttpConfig {
            addr: args.addr,
            static_dir: args.static_dir,
        }
    }
}

#[derive(Debug, Args)]
struct PlayArgs {
    #[arg(long)]
    bank: String,

    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    count: i64,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    start: i64,

    #[arg(long, allow_negative_numbers = true)]
    end: Option<i64>,

    /// "test" or "study"
    #[arg(long, default_value = "test")]
    mode: String,
}

impl From<PlayArgs> for StartRequest {
    fn from(args: PlayArgs) -> Self {
        StartRequest::new(args.bank, args.count)
            .with_window(args.start, args.end)
            .with_mode(args.mode)
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&LogConfig {
        level: cli.log_level.clone(),
        format: cli.log_format,
    })?;

    // Banks are loaded once, before any request is handled.
    let banks = load_banks_from_dir(&cli.banks_dir)?;
    let services = AppServices::in_memory(
        banks,
        ServiceOptions {
            clock: Clock::system(),
            seed: cli.seed,
            idle_ttl: cli.session_ttl_secs.map(|secs| Duration::seconds(i64::from(secs))),
        },
    );
    let quiz = services.quiz();

    match cli.command {
        Command::Banks => {
            for name in quiz.list_banks().banks {
                println!("{name}");
            }
        }
        Command::Play(args) => {
            let stdin = std::io::stdin();
            play::run_play(&quiz, args.into(), stdin.lock(), std::io::stdout())?;
        }
        Command::Serve => {
            let stdin = std::io::stdin();
            serve::run_serve(&quiz, stdin.lock(), std::io::stdout().lock())?;
        }
        Command::Http(args) => http::run_http(quiz, args.into())?,
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
