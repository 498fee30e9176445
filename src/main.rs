//! Co-Pilot - terminal coding assistant
//!
//! Reads lines from stdin, answers math locally and forwards everything else
//! to the configured text-generation endpoint.

use clap::Parser;
use copilot_chat::commands::Command;
use copilot_chat::math::MathEngine;
use copilot_chat::session_log::SessionLog;
use copilot_chat::{AssistantConfig, Dispatcher, History, RoutingPolicy};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const GREETING: &str =
    "Hi! I'm your local coding assistant. Type '/help' for commands or 'exit' to quit.";

/// Co-Pilot: a terminal coding assistant that does its own arithmetic.
#[derive(Parser, Debug)]
#[command(name = "copilot", version, about)]
struct CliArgs {
    /// Math engine: exact or numeric.
    #[arg(long = "engine")]
    engine: Option<MathEngine>,

    /// Skip availability probing and always try the model.
    #[arg(long = "no-probe")]
    no_probe: bool,

    /// Wrap math answers in a conversational phrase.
    #[arg(long = "wrap-math")]
    wrap_math: bool,

    /// Session log file.
    #[arg(long = "session-log")]
    session_log: Option<PathBuf>,

    /// Text-generation endpoint URL.
    #[arg(long = "endpoint")]
    endpoint: Option<String>,
}

impl CliArgs {
    /// Flags win over environment values.
    fn apply(self, config: &mut AssistantConfig) {
        if let Some(engine) = self.engine {
            config.math_engine = engine;
        }
        if self.no_probe {
            config.policy = RoutingPolicy::MathFirstThenGenerate;
        }
        if self.wrap_math {
            config.wrap_math = true;
        }
        if let Some(path) = self.session_log {
            config.session_log = path;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "copilot_chat=warn,copilot=warn".into());
    let json = std::env::var("COPILOT_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    // stdout belongs to the conversation
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn say(text: &str) {
    println!("Co-Pilot: {text}");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = CliArgs::parse();
    let mut config = AssistantConfig::from_env()?;
    args.apply(&mut config);

    tracing::info!(
        endpoint = %config.endpoint,
        engine = %config.math_engine,
        policy = ?config.policy,
        authenticated = config.api_token.is_some(),
        "Starting assistant"
    );

    let mut dispatcher = Dispatcher::from_config(&config)?;

    let log = match SessionLog::open(&config.session_log) {
        Ok(log) => Some(log),
        Err(e) => {
            tracing::warn!(error = %e, "Session logging disabled");
            None
        }
    };
    if let Some(log) = &log {
        if let Err(e) = log.start_session(chrono::Utc::now()) {
            tracing::warn!(error = %e, "Failed to write session header");
        }
    }

    say(GREETING);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut history = History::default();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            say(Command::Exit.reply());
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = Command::parse(input) {
            match command {
                Command::Exit => {
                    say(command.reply());
                    break;
                }
                Command::ClearLog => {
                    if let Some(Err(e)) = log.as_ref().map(SessionLog::clear) {
                        tracing::warn!(error = %e, "Failed to clear session log");
                    }
                }
                Command::ResetHistory => history = history.reset(),
                Command::Help => {}
            }
            say(command.reply());
            continue;
        }

        let reply = dispatcher.dispatch(input, &history).await;
        say(&reply.text);
        history = reply.history;

        if let Some(Err(e)) = log.as_ref().map(|l| l.append(input, &reply.text)) {
            tracing::warn!(error = %e, "Failed to append to session log");
        }
    }

    Ok(())
}
