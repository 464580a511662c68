mod logging;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use procq_core::impls::{InMemoryStore, RedisPool};
use procq_core::ports::ConnectionPool;
use procq_core::{BaseQueue, Config, ProcessorKind, Queue, QueueError};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "procq", about = "Push to and pull from named list queues")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store URL (overrides the configuration file).
    #[arg(long)]
    url: Option<String>,

    /// Queue name.
    #[arg(short, long, default_value = "jobs")]
    source: String,

    /// Ordering policy (overrides the configuration file).
    #[arg(short, long)]
    processor: Option<ProcessorKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Enqueue one payload.
    Push { payload: String },
    /// Wait for and print the next payload (Ctrl-C to give up).
    Pull,
    /// Claim the next payload into another list and print it.
    PullTo { dest: String },
    /// Move one payload to another list without waiting.
    Concat { dest: String },
    /// Print the number of pending payloads.
    Len,
    /// Run a short FIFO/LIFO walkthrough against an in-process store.
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging()?;
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let url = cli.url.as_deref().unwrap_or(&config.store.url);
    let processor = cli.processor.unwrap_or_else(|| {
        config
            .queue(&cli.source)
            .map(|q| q.processor)
            .unwrap_or_default()
    });

    // Nothing is dialled until the first command.
    let pool = RedisPool::open(url)?.with_block_timeout(config.store.block_timeout());
    let queue = BaseQueue::with_processor(pool, cli.source.clone(), processor.processor());
    info!(source = queue.source(), processor = %processor, "queue ready");

    run(&queue, cli.command).await
}

async fn run<P: ConnectionPool>(queue: &BaseQueue<P>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Push { payload } => {
            queue.push(payload.as_bytes()).await?;
        }
        Command::Pull => {
            let (tx, mut rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = tx.send(true);
                }
            });
            match queue.pull_or_shutdown(&mut rx).await {
                Ok(payload) => print_payload(payload.as_deref())?,
                Err(QueueError::Cancelled) => info!("pull cancelled"),
                Err(e) => return Err(e.into()),
            }
        }
        Command::PullTo { dest } => {
            let payload = queue.pull_to(&dest).await?;
            print_payload(payload.as_deref())?;
        }
        Command::Concat { dest } => {
            queue.concat(&dest).await?;
            info!(source = queue.source(), dest = %dest, "moved one payload");
        }
        Command::Len => {
            println!("{}", queue.len().await?);
        }
        Command::Demo => demo().await?,
    }
    Ok(())
}

fn print_payload(payload: Option<&[u8]>) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    match payload {
        Some(bytes) => {
            out.write_all(bytes)?;
            writeln!(out)?;
        }
        None => info!("no payload available"),
    }
    Ok(())
}

/// FIFO vs LIFO ordering, then a reliable hand-off and a requeue.
async fn demo() -> anyhow::Result<()> {
    let store = InMemoryStore::new().with_block_timeout(Duration::from_millis(100));

    for kind in [ProcessorKind::Fifo, ProcessorKind::Lifo] {
        let queue =
            BaseQueue::with_processor(store.clone(), format!("demo:{kind}"), kind.processor());
        for n in 1..=3 {
            queue.push(format!("item-{n}").as_bytes()).await?;
        }
        let mut order = Vec::new();
        while let Some(payload) = queue.pull().await? {
            order.push(String::from_utf8_lossy(&payload).into_owned());
        }
        println!("{kind}: {}", order.join(" -> "));
    }

    let jobs = BaseQueue::new(store.clone(), "demo:jobs");
    jobs.push(b"resize-image").await?;
    let claimed = jobs.pull_to("demo:processing").await?;
    println!(
        "claimed {:?}; processing holds {} item(s)",
        claimed.as_deref().map(String::from_utf8_lossy),
        store.snapshot("demo:processing").await.len()
    );

    // Worker "crashed": put the claimed item back.
    let processing = BaseQueue::new(store.clone(), "demo:processing");
    processing.concat("demo:jobs").await?;
    println!("requeued; jobs pending = {}", jobs.len().await?);

    match processing.concat("demo:jobs").await {
        Err(QueueError::EmptySource { source_name }) => {
            println!("nothing left in {source_name}")
        }
        other => other?,
    }
    Ok(())
}
