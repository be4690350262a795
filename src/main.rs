use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use dirsize::config::port::load_port;
use dirsize::config::settings::Settings;
use dirsize::core::scanner::Scanner;
use dirsize::core::sorter::{sort_entries, SortDirection};
use dirsize::export::console::render_table;
use dirsize::export::json::export_json;

#[derive(Parser, Debug)]
#[command(
    name = "dirsize",
    version,
    about = "List a directory's entries with their total sizes",
    subcommand_negates_reqs = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory whose immediate entries are listed
    #[arg(long, required = true)]
    root: Option<PathBuf>,

    /// Order by size: ASC or DESC
    #[arg(long, default_value = "ASC")]
    sort: SortDirection,

    /// Maximum concurrent directory reads
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Follow symbolic links
    #[arg(long)]
    follow_symlinks: bool,

    /// Also write the sorted entries as JSON to this file
    #[arg(long)]
    export_json: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `GET /files?root=<path>&sort=<ASC|DESC>` over HTTP
    Serve {
        /// File holding the listen port on one line
        #[arg(long, default_value = "./resources/port.config")]
        config: PathBuf,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Maximum concurrent directory reads, shared by all requests
        #[arg(short = 'c', long)]
        concurrency: Option<usize>,

        /// Follow symbolic links
        #[arg(long)]
        follow_symlinks: bool,

        /// Seconds to let in-flight requests finish after a shutdown signal
        #[arg(long, default_value_t = 10)]
        shutdown_timeout: u64,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let started = Instant::now();

    // Logs go to stderr so stdout carries only the listing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve {
            config,
            host,
            concurrency,
            follow_symlinks,
            shutdown_timeout,
        }) => {
            let mut settings = Settings::default();
            if let Some(conc) = concurrency {
                settings.max_concurrent_io = conc;
            }
            settings.follow_symlinks = follow_symlinks;
            settings.shutdown_timeout = Duration::from_secs(shutdown_timeout);
            settings.port_config = config;

            let port = load_port(&settings.port_config)?;
            actix_web::rt::System::new().block_on(dirsize::server::serve(settings, &host, port))?;

            let uptime = started.elapsed();
            info!(uptime_ms = uptime.as_millis() as u64, "shutdown complete");
            println!("Total runtime: {uptime:.2?}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let mut settings = Settings::default();
            if let Some(conc) = cli.concurrency {
                settings.max_concurrent_io = conc;
            }
            settings.follow_symlinks = cli.follow_symlinks;

            let Some(root) = cli.root else {
                anyhow::bail!("--root is required");
            };

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_scan(settings, root, cli.sort, cli.export_json, started))
        }
    }
}

async fn run_scan(
    settings: Settings,
    root: PathBuf,
    direction: SortDirection,
    export_path: Option<PathBuf>,
    started: Instant,
) -> anyhow::Result<ExitCode> {
    let scanner = Scanner::new(settings);

    // Losing the race drops the scan future, which aborts every subtree task.
    let mut result = tokio::select! {
        result = scanner.scan(root) => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("scan interrupted");
            eprintln!("Interrupted after {:.2?}", started.elapsed());
            return Ok(ExitCode::from(130));
        }
    };

    sort_entries(&mut result.entries, direction);
    print!("{}", render_table(&result, direction)?);

    if let Some(ref export_path) = export_path {
        export_json(&result.entries, export_path)?;
        println!("Exported to: {}", export_path.display());
    }

    Ok(ExitCode::SUCCESS)
}
