use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use event_monitor::logging::{LogFormat, init_tracing};
use event_monitor::{Config, Details, Pipeline};

#[derive(Debug, Parser)]
#[command(name = "event-monitor", version, about = "Filtered event monitoring over RabbitMQ")]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Watch the log files and consume the monitoring queue until Ctrl-C
    Run {
        /// Only watch log files
        #[arg(long)]
        no_consume: bool,

        /// Queue to consume, defaults to the monitoring queue
        #[arg(long)]
        queue: Option<String>,
    },
    /// Push one event through the producer
    Emit {
        event_type: String,

        /// Event details as a JSON object
        #[arg(long, default_value = "{}")]
        details: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = Config::try_from_env().context("failed to load configuration")?;
    let pipeline = Pipeline::build(&config)?;

    match cli.command.unwrap_or(Command::Run {
        no_consume: false,
        queue: None,
    }) {
        Command::Run { no_consume, queue } => {
            let queue = queue.unwrap_or_else(|| config.events.default_queue.clone());
            info!(queue = %queue, consume = !no_consume, "starting event monitor");

            pipeline
                .run_until(!no_consume, &queue, async {
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %err, "failed to listen for Ctrl-C");
                    }
                })
                .await?;
        }
        Command::Emit {
            event_type,
            details,
        } => {
            let details = parse_details(&details)?;
            let outcome = pipeline.emit(&event_type, details).await?;
            println!("{:?}", outcome);
            pipeline.repository().close().await?;
        }
    }

    Ok(())
}

fn parse_details(raw: &str) -> anyhow::Result<Details> {
    match serde_json::from_str::<Value>(raw).context("--details is not valid JSON")? {
        Value::Object(details) => Ok(details),
        other => bail!("--details must be a JSON object, got {}", other),
    }
}
