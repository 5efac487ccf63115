//! CLI for mq-client
//!
//! Runs an interactive chat against the broker. Lines typed on stdin are
//! published on the current channel or interpreted as `/commands`; messages
//! from other clients are printed as they arrive.

use std::os::fd::AsRawFd;
use std::process::ExitCode;

use clap::Parser;
use mq_client::chat::Chat;
use mq_client::client::MessageQueue;
use mq_client::config::{Settings, load_config};
use mq_client::utils::{Result, logging};
use tokio::io::{AsyncBufReadExt, BufReader, Interest, unix::AsyncFd};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mq-chat", about = "Chat over the mq publish/subscribe broker")]
struct Args {
    /// Client name, also the broker mailbox id
    #[arg(long)]
    name: Option<String>,
    /// Broker host
    #[arg(long)]
    host: Option<String>,
    /// Broker port
    #[arg(long)]
    port: Option<u16>,
    /// Channel to join at startup
    #[arg(long)]
    topic: Option<String>,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(name) = self.name {
            settings.client.name = name;
        }
        if let Some(host) = self.host {
            settings.client.host = host;
        }
        if let Some(port) = self.port {
            settings.client.port = port;
        }
        if let Some(topic) = self.topic {
            settings.client.topic = topic;
        }
        if let Some(level) = self.log_level {
            settings.log.level = level;
        }
        settings
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = match load_config() {
        Ok(settings) => args.apply(settings),
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.log.level);

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Chat failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<()> {
    let client = &settings.client;
    let mq = MessageQueue::with_settings(
        &client.name,
        &client.host,
        client.port,
        settings.engine.clone(),
    )?;
    mq.start()?;

    let result = chat(&mq, &client.name, &client.topic).await;
    mq.stop()?;
    info!("Disconnected from {}:{}", mq.host(), mq.port());
    result
}

async fn chat(mq: &MessageQueue, name: &str, topic: &str) -> Result<()> {
    mq.readiness().set_nonblocking(true)?;
    let ready = AsyncFd::with_interest(mq.readiness().as_raw_fd(), Interest::READABLE)?;

    let mut chat = Chat::new(mq, name, topic)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print(&[format!("Hello {name}, you are on {topic}. Type /menu for commands.")]);

    while !chat.is_closed() {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => print(&chat.handle_line(&line)),
                None => break,
            },
            guard = ready.readable() => {
                let mut guard = guard?;
                // Signals can be dropped when the pipe is full, so every wakeup
                // drains all staged messages.
                loop {
                    match guard.try_io(|_| mq.readiness().consume()) {
                        Ok(Ok(())) => {
                            while let Some(body) = mq.try_retrieve() {
                                print(&chat.receive(&body));
                            }
                        }
                        Ok(Err(e)) => return Err(e.into()),
                        Err(_would_block) => break,
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, leaving chat.");
                break;
            }
        }
    }
    Ok(())
}

fn print(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
