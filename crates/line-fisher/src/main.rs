use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use fish_analysis::UciOracle;
use line_fisher::{
    export, progress::config_summary, FishState, FisherConfig, LineFisher, LineSink, LogProgress,
    NullSink, RunOutcome, Storage,
};
use std::path::PathBuf;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "line-fisher")]
#[command(about = "Explore chess opening lines with a UCI engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a fishing session
    Fish(FishArgs),
    /// Print the export of a stored session
    Export {
        /// Session id
        #[arg(short, long)]
        session: String,
        /// Database path (defaults to the configured one)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// List stored lines that reach a position
    Lookup {
        /// Position to look up
        #[arg(short, long)]
        fen: String,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// List stored sessions
    Sessions {
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct FishArgs {
    /// Config file (defaults to fisher.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Root position
    #[arg(long)]
    fen: Option<String>,
    /// Ply pairs per line
    #[arg(long)]
    max_depth: Option<usize>,
    /// Default number of responder replies
    #[arg(long)]
    replies: Option<usize>,
    /// Engine threads
    #[arg(long)]
    threads: Option<u32>,
    /// Engine executable
    #[arg(long)]
    engine: Option<String>,
    /// Search depth per query
    #[arg(long)]
    depth: Option<u32>,
    /// Continue from a snapshot written by an earlier run
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Always write a snapshot here when the run ends
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Write the export here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Do not write lines to the database
    #[arg(long)]
    no_db: bool,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<FisherConfig> {
    let config = match path {
        Some(path) => FisherConfig::load_from(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => FisherConfig::load()?,
    };
    Ok(config)
}

fn open_storage(db: Option<PathBuf>) -> anyhow::Result<Storage> {
    let path = match db {
        Some(path) => path,
        None => FisherConfig::load()?.db_path,
    };
    Storage::open(&path).with_context(|| format!("Failed to open database {}", path.display()))
}

async fn fish(args: FishArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(fen) = args.fen {
        config.session.root_fen = fen;
    }
    if let Some(max_depth) = args.max_depth {
        config.session.max_depth = max_depth;
    }
    if let Some(replies) = args.replies {
        config.session.default_responder_count = replies;
    }
    if let Some(threads) = args.threads {
        config.session.threads = threads;
    }
    if let Some(engine) = args.engine {
        config.engine_path = engine;
    }
    if let Some(depth) = args.depth {
        config.search_depth = depth;
    }

    let resumed = match &args.resume {
        Some(path) => Some(
            FishState::load(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?,
        ),
        None => None,
    };
    // A resumed session keeps its own parameters.
    if let Some(state) = &resumed {
        config.session.threads = state.config.threads;
    }

    let mut sink: Box<dyn LineSink> = if args.no_db {
        Box::new(NullSink)
    } else {
        Box::new(Storage::open(&config.db_path).with_context(|| {
            format!("Failed to open database {}", config.db_path.display())
        })?)
    };

    let mut oracle = UciOracle::spawn(&config.engine_path, config.engine_settings())
        .await
        .with_context(|| format!("Failed to start engine {}", config.engine_path))?;

    let mut fisher = match resumed {
        Some(state) => {
            tracing::info!(session = %state.session_id, wip = state.wip.len(), "Resuming session");
            LineFisher::resume(state)
        }
        None => LineFisher::start(config.session.clone(), &mut oracle, sink.as_mut()).await?,
    };
    tracing::info!("{}", config_summary(&fisher.state().config));

    let flag = fisher.fishing_flag();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, finishing current step");
            flag.stop();
        }
    });

    let result = fisher
        .run(&mut oracle, sink.as_mut(), &mut LogProgress)
        .await;

    let snapshot_path = match (&result, &args.snapshot) {
        (_, Some(path)) => Some(path.clone()),
        (Ok(RunOutcome::Finished), None) => None,
        _ => Some(PathBuf::from(format!(
            "data/snapshots/{}.json",
            fisher.state().session_id
        ))),
    };
    if let Some(path) = snapshot_path {
        fisher
            .state()
            .save(&path)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), "Snapshot written");
    }

    let text = fisher.export()?;
    match &args.output {
        Some(path) => std::fs::write(path, format!("{}\n", text))
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", text),
    }

    if let Err(e) = oracle.quit().await {
        tracing::warn!(error = %e, "Engine did not shut down cleanly");
    }

    match result? {
        RunOutcome::Finished => tracing::info!(
            lines = fisher.state().done.len(),
            transpositions = fisher.state().transposition_count(),
            "Session complete"
        ),
        RunOutcome::Cancelled => tracing::info!(
            wip = fisher.state().wip.len(),
            "Session cancelled, resume with --resume"
        ),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fish(args) => fish(args).await?,
        Commands::Export { session, db } => {
            let storage = open_storage(db)?;
            let lines: Vec<_> = storage
                .session_lines(&session)?
                .into_iter()
                .map(|stored| stored.line)
                .collect();
            if lines.is_empty() {
                bail!("No lines stored for session {}", session);
            }
            println!("{}", export::export_lines(&lines)?);
        }
        Commands::Lookup { fen, db } => {
            let storage = open_storage(db)?;
            let found = storage.lines_at_position(&fen)?;
            if found.is_empty() {
                println!("No stored lines reach this position");
            }
            for stored in found {
                println!(
                    "{} #{} {} {}",
                    stored.session_id,
                    stored.line.line_index,
                    stored.san,
                    stored
                        .line
                        .score
                        .map(|s| s.to_string())
                        .unwrap_or_default()
                );
            }
        }
        Commands::Sessions { db } => {
            let storage = open_storage(db)?;
            for session in storage.sessions()? {
                println!(
                    "{} {} lines {} {}",
                    session.id, session.line_count, session.created_at, session.root_fen
                );
            }
        }
    }
    Ok(())
}
