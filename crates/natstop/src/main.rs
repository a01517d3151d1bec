//! natstop - headless broker monitor.
//!
//! Samples a broker's monitoring port on a fixed interval and prints one
//! summary line per snapshot (plus the connection table with `--show-conns`).
//! Exits on Ctrl-C, or with status 1 when the broker becomes unreachable.

use std::process;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use natstop_core::fmt::{nsize, nsize_rate, psize, psize_rate};
use natstop_core::{ConnzOptions, MonitorError, Snapshot, SortOpt, TargetConfig, monitor_stats};

/// Broker monitor.
#[derive(Parser)]
#[command(name = "natstop", about = "Top-style monitor for a NATS server", version = natstop_core::VERSION)]
struct Args {
    /// Monitoring host of the server.
    #[arg(short = 's', long, default_value = "127.0.0.1", env = "NATSTOP_HOST")]
    host: String,

    /// Monitoring port of the server.
    #[arg(short = 'm', long, default_value_t = natstop_core::config::DEFAULT_MONITOR_PORT, env = "NATSTOP_PORT")]
    port: u16,

    /// Delay between samples in seconds.
    #[arg(short, long, default_value = "1", env = "NATSTOP_DELAY")]
    delay: u64,

    /// Request timeout in seconds.
    #[arg(long, default_value = "5")]
    timeout: u64,

    /// Maximum number of connections requested from the server.
    #[arg(short = 'n', long)]
    conns: Option<u32>,

    /// Server-side sort order of the connection table
    /// (cid, subs, pending, msgs_to, msgs_from, bytes_to, bytes_from, last, idle, uptime).
    #[arg(long)]
    sort: Option<SortOpt>,

    /// Request subscription subjects for each connection.
    #[arg(long)]
    subs: bool,

    /// Print the connection table after every summary line.
    #[arg(long = "show-conns")]
    show_conns: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for krate in ["natstop", "natstop_core"] {
        match format!("{}={}", krate, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", krate, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn target_config(args: &Args) -> TargetConfig {
    TargetConfig::new(args.host.clone(), args.port)
        .with_poll_interval(Duration::from_secs(args.delay))
        .with_request_timeout(Duration::from_secs(args.timeout))
        .with_connz(ConnzOptions {
            limit: args.conns,
            offset: None,
            sort: args.sort,
            subscriptions: args.subs,
        })
}

/// One line summarizing a snapshot.
fn describe_snapshot(snapshot: &Snapshot) -> String {
    let varz = &snapshot.varz;
    let rates = &snapshot.rates;
    format!(
        "{} server={} version={} uptime={} cpu={:.1}% mem={} conns={} \
         in: msgs={} bytes={} msgs/s={} bytes/s={} \
         out: msgs={} bytes={} msgs/s={} bytes/s={}",
        snapshot.sampled_at.format("%H:%M:%S"),
        varz.server_id,
        varz.version,
        varz.uptime,
        varz.cpu,
        psize(varz.mem),
        varz.connections,
        nsize(varz.in_msgs),
        psize(varz.in_bytes),
        nsize_rate(rates.in_msgs_per_sec),
        psize_rate(rates.in_bytes_per_sec),
        nsize(varz.out_msgs),
        psize(varz.out_bytes),
        nsize_rate(rates.out_msgs_per_sec),
        psize_rate(rates.out_bytes_per_sec),
    )
}

fn print_connections(snapshot: &Snapshot) {
    let connz = &snapshot.connz;
    println!(
        "  connections: {} shown of {} (limit {})",
        connz.connections.len(),
        connz.num_connections,
        connz.limit
    );
    println!(
        "  {:>6} {:<21} {:<12} {:>5} {:>8} {:>8} {:>8} {:>8} {:>8}  SUBSCRIPTIONS",
        "CID", "ADDRESS", "NAME", "SUBS", "PENDING", "MSGS_TO", "MSGS_FROM", "BYTES_TO", "BYTES_FROM"
    );
    for conn in &connz.connections {
        println!(
            "  {:>6} {:<21} {:<12} {:>5} {:>8} {:>8} {:>8} {:>8} {:>8}  {}",
            conn.cid,
            conn.address(),
            conn.name,
            conn.subscriptions,
            psize(conn.pending_bytes),
            nsize(conn.out_msgs),
            nsize(conn.in_msgs),
            psize(conn.out_bytes),
            psize(conn.in_bytes),
            conn.subscriptions_list.join(", "),
        );
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if args.delay == 0 {
        error!("--delay must be at least 1 second");
        process::exit(2);
    }

    let config = target_config(&args);
    info!(
        "natstop {} monitoring {} every {}s",
        natstop_core::VERSION,
        config.authority(),
        args.delay
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to build tokio runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config, args.show_conns)) {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(config: TargetConfig, show_conns: bool) -> Result<(), MonitorError> {
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        token.cancel();
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let (tx, mut rx) = mpsc::channel(1);
    let sampler = tokio::spawn(async move { monitor_stats(&config, tx, shutdown).await });

    while let Some(snapshot) = rx.recv().await {
        println!("{}", describe_snapshot(&snapshot));
        if show_conns {
            print_connections(&snapshot);
        }
    }

    match sampler.await {
        Ok(result) => result,
        Err(e) => Err(MonitorError::Task {
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use natstop_core::Sampler;
    use natstop_core::mock::MockSource;

    #[test]
    fn test_args_map_onto_target_config() {
        let args = Args::parse_from([
            "natstop", "-s", "10.0.0.5", "-m", "9222", "-d", "3", "-n", "50", "--sort", "bytes_to",
            "--subs",
        ]);
        let config = target_config(&args);
        assert_eq!(config.authority(), "10.0.0.5:9222");
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.connz.limit, Some(50));
        assert_eq!(config.connz.sort, Some(SortOpt::BytesTo));
        assert!(config.connz.subscriptions);
    }

    #[test]
    fn test_unknown_sort_is_rejected() {
        assert!(Args::try_parse_from(["natstop", "--sort", "size"]).is_err());
    }

    #[tokio::test]
    async fn test_describe_snapshot() {
        let mut sampler = Sampler::new(MockSource::busy_server(), Duration::from_secs(1));
        sampler.sample_once().await.unwrap();
        let snapshot = sampler.sample_once().await.unwrap();

        let line = describe_snapshot(&snapshot);
        assert!(line.contains("server=MOCK"));
        assert!(line.contains("mem=16.0M"));
        assert!(line.contains("conns=2"));
        assert!(line.contains("in: msgs=1.0K bytes=128.0K"));
        assert!(line.contains("out: msgs=500 bytes=64.0K"));
    }
}
