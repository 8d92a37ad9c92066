use std::time::Duration;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pagequiz::commands::{self, ask, extract, key, quiz};
use pagequiz::llm::ClientConfig;
use pagequiz::llm::quiz::DEFAULT_QUESTION_COUNT;
use pagequiz::palette::Palette;
use pagequiz::store::LocalStore;

const LOG_ENV: &str = "PAGEQUIZ_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "pagequiz",
    version,
    about = "Quizzes, summaries and chat over captured web pages.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Give up on the completion endpoint after this many seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture the visible text of a page for later use
    Extract {
        /// URL, HTML file or plain-text file
        #[arg(value_name = "SOURCE", value_hint = ValueHint::AnyPath)]
        source: String,
    },
    /// Show the previously captured text
    Text {
        /// Print the whole text instead of a preview
        #[arg(long, default_value_t = false)]
        full: bool,
    },
    /// Generate a multiple-choice quiz from the captured text
    Quiz {
        /// Number of questions to ask the model for
        #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_QUESTION_COUNT)]
        questions: usize,
        /// Print the quiz as JSON instead of running it
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Summarize the captured text
    Summarize,
    /// List the key points of the captured text
    KeyPoints,
    /// Ask questions about the captured text
    Chat {
        /// Question to ask. Starts an interactive session when omitted.
        #[arg(value_name = "MESSAGE")]
        message: Option<String>,
        /// Do not send the captured text as context
        #[arg(long, default_value_t = false)]
        no_context: bool,
    },
    /// Manage the stored API key
    Key {
        /// Store a new API key in the local store
        #[arg(long, value_name = "KEY")]
        set: Option<String>,
        /// Remove the stored API key
        #[arg(long, conflicts_with = "set")]
        clear: bool,
        /// Show the configured API key, masked
        #[arg(long)]
        view: bool,
        /// Skip the confirmation when clearing
        #[arg(long, short, requires = "clear")]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run_cli(cli).await {
        match err.downcast_ref::<pagequiz::Error>() {
            Some(cause) if cause.is_setup_error() => {
                eprintln!("{}", Palette::paint(Palette::WARNING, format!("{err:#}")));
            }
            _ => eprintln!("{:?}", err),
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_cli(cli: Cli) -> Result<()> {
    let store = LocalStore::open_default()?;
    debug!(path = %store.path().display(), "opened local store");

    let mut config = ClientConfig::from_env();
    if let Some(secs) = cli.timeout.filter(|secs| *secs > 0) {
        config = config.with_timeout(Some(Duration::from_secs(secs)));
    }

    match cli.command {
        Command::Extract { source } => extract::run(&store, &source).await?,
        Command::Text { full } => extract::view(&store, full)?,
        Command::Quiz { questions, json } => quiz::run(&store, config, questions, json).await?,
        Command::Summarize => ask::run_summary(&store, config).await?,
        Command::KeyPoints => ask::run_key_points(&store, config).await?,
        Command::Chat {
            message,
            no_context,
        } => ask::run_chat(&store, config, message, !no_context).await?,
        Command::Key {
            set,
            clear,
            view,
            yes,
        } => key::run(
            &commands::credential_store(&store),
            key::KeyAction {
                set,
                clear,
                view,
                assume_yes: yes,
            },
        )?,
    }

    Ok(())
}
