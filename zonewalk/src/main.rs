//! Zonewalk CLI Application
//!
//! Reads seed domains from the command line or stdin and prints every name
//! found by walking their NSEC chains. This CLI application is a thin layer
//! over the zonewalk-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use std::io;
use std::process;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, error, Level};
use tracing_subscriber::EnvFilter;
use ui::StdoutSink;
use zonewalk_lib::{
    ingest_seeds, load_env_config, parse_timeout_string, validate_domain, ConfigManager,
    Dispatcher, FileConfig, ResolverPool, UdpNsecTransport, WalkConfig, ZoneWalkError, ZoneWalker,
    MAX_CONCURRENCY,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for zonewalk
#[derive(Parser, Debug)]
#[command(name = "zonewalk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Enumerate DNSSEC-signed zones by walking NSEC chains")]
#[command(
    long_about = "Enumerate DNSSEC-signed zones by walking NSEC chains.\n\nSeeds are read from the DOMAIN argument or, one per line, from stdin. Every discovered name is printed once, as soon as it is found."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Seed domain to walk (reads seeds from stdin when omitted)
    #[arg(value_name = "DOMAIN", help_heading = "Input")]
    pub domain: Option<String>,

    /// Number of chains walked at once (default: 20, max: 1000)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Retries per name against other resolvers (default: 3)
    #[arg(
        short = 'r',
        long = "retries",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub retries: Option<u32>,

    /// Per-query timeout, e.g. 500ms, 2s, 1m (default: 2s)
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "DURATION",
        help_heading = "Performance"
    )]
    pub timeout: Option<String>,

    /// Use fully reliable resolvers from the public resolver feed
    #[arg(short = 'o', long = "online", help_heading = "Resolvers")]
    pub online: bool,

    /// Resolver feed to use with --online
    #[arg(long = "feed-url", value_name = "URL", help_heading = "Resolvers")]
    pub feed_url: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Print query diagnostics to stdout along with the discovered names
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,

    /// Print a JSON statistics summary to stderr when done
    #[arg(long = "stats", help_heading = "Configuration")]
    pub stats: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_zonewalk(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(format!(
                "Concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            ));
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '500ms', '2s', '1m'",
                timeout
            ));
        }
    }

    if let Some(url) = &args.feed_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!(
                "Feed URL '{}' must start with http:// or https://",
                url
            ));
        }
    }

    if let Some(domain) = &args.domain {
        validate_domain(domain).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Walk configuration after applying every source.
struct Settings {
    walk: WalkConfig,
    verbose: bool,
}

/// Main walking logic
async fn run_zonewalk(args: Args) -> Result<(), ZoneWalkError> {
    // Config sources may log before the real subscriber exists.
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .without_time()
        .finish();
    let settings = tracing::subscriber::with_default(bootstrap, || build_settings(&args))?;

    init_logging(settings.verbose);

    let config = settings.walk;
    debug!(?config, "resolved configuration");

    // Any failure up to here is fatal and happens before the first query.
    let pool = ResolverPool::from_config(&config).await?;

    let transport = UdpNsecTransport::new(config.query_timeout);

    if settings.verbose {
        ui::print_header(
            pool.len(),
            config.concurrency,
            config.max_retries,
            transport.timeout(),
            config.use_online_resolvers,
        );
    }

    let sink = StdoutSink {
        verbose: settings.verbose,
    };
    let walker = Arc::new(ZoneWalker::new(
        transport,
        pool.clone(),
        sink,
        config.max_retries,
    ));
    let dispatcher = Dispatcher::new(walker, config.concurrency);

    let started = Instant::now();
    let handle = dispatcher.start();

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.domain {
        Some(domain) => Box::new(io::Cursor::new(format!("{}\n", domain).into_bytes())),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    // Work already queued still runs to completion if reading fails.
    let ingest = match ingest_seeds(reader, &pool, &handle).await {
        Ok(summary) => Some(summary),
        Err(e) => {
            error!("{}", e);
            None
        }
    };

    let dispatch = handle.finish().await?;
    let stats = dispatcher.walker().stats();

    if settings.verbose {
        ui::print_summary(&stats, ingest.as_ref(), &dispatch, started.elapsed());
    }

    if args.stats {
        let report = serde_json::json!({
            "stats": stats,
            "ingest": ingest,
            "dispatch": dispatch,
            "elapsed_ms": started.elapsed().as_millis() as u64,
        });
        eprintln!("{}", report);
    }

    Ok(())
}

/// Install the global tracing subscriber.
///
/// Verbose diagnostics are interleaved with the names on stdout; otherwise
/// only warnings reach stderr. `RUST_LOG` overrides either level.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let result = if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stdout)
            .with_target(false)
            .without_time()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("Warning: could not initialize logging: {}", e);
    }
}

/// Filter used when `RUST_LOG` is unset. Verbose mode only raises our own
/// crates to debug so dependencies stay at warn.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,zonewalk_lib=debug,zonewalk=debug"
    } else {
        "warn"
    }
}

/// Build the walk configuration with proper precedence.
///
/// Precedence (highest first):
/// 1. CLI arguments
/// 2. Environment variables (ZW_*)
/// 3. Explicit config file (--config, then ZW_CONFIG), or discovered files:
///    ./zonewalk.toml, ~/.zonewalk.toml, ~/.config/zonewalk/config.toml
/// 4. Built-in defaults
fn build_settings(args: &Args) -> Result<Settings, ZoneWalkError> {
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config(args.verbose);

    let explicit_path = args.config.clone().or_else(|| env_config.config.clone());
    let file_config = match &explicit_path {
        Some(path) => {
            debug!("Using explicit config file: {}", path);
            config_manager.load_file(path)?
        }
        None => config_manager.discover_and_load(),
    };

    let walk = file_config.apply_to(WalkConfig::default())?;
    let walk = env_config.apply_to(walk);
    let walk = apply_cli_args(walk, args)?;

    Ok(Settings {
        verbose: args.verbose || file_verbose(&file_config),
        walk,
    })
}

fn file_verbose(file_config: &FileConfig) -> bool {
    file_config.verbose().unwrap_or(false)
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args(mut config: WalkConfig, args: &Args) -> Result<WalkConfig, ZoneWalkError> {
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(retries) = args.retries {
        config = config.with_retries(retries);
    }
    if let Some(timeout) = &args.timeout {
        let timeout = parse_timeout_string(timeout)
            .ok_or_else(|| ZoneWalkError::config(format!("Invalid timeout '{}'", timeout)))?;
        config = config.with_timeout(timeout);
    }
    // The flag can only switch the feed on; a config file may have done so already.
    if args.online {
        config = config.with_online_resolvers(true);
    }
    if let Some(url) = &args.feed_url {
        config = config.with_feed_url(url.clone());
    }
    Ok(config)
}
