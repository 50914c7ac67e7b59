use itertools::Itertools;
use std::fs::OpenOptions;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use bgp_watchlist::{
    BrokerSource, CommitMode, FetchOutcome, FileSink, FileSource, Filter, Interval, LoadOptions,
    OutputFormat, RangeSet, RetryingFetcher, StreamSource, WatchConfig,
};
use clap::Parser;
use env_logger::{Env, Target};
use log::{error, info};

/// bgp-watchlist records the BGP announcements and withdrawals of a list of IP ranges seen by
/// route collectors over a period of time.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Opts {
    /// Watch-list CSV file, local or remote.
    #[clap(short, long)]
    watchlist: String,

    /// Name of the watch-list column holding the CIDR blocks
    #[clap(long, default_value = "CIDR")]
    cidr_column: String,

    /// Only watch the rows of this country (matched against `Country Code` or `Country`)
    #[clap(long)]
    country: Option<String>,

    /// Skip watch-list rows that cannot be parsed instead of exiting
    #[clap(long)]
    skip_invalid_rows: bool,

    /// Start unix timestamp, inclusive
    #[clap(short = 't', long, default_value_t = 1654041600)]
    start: u64,

    /// End unix timestamp, inclusive
    #[clap(short = 'T', long, default_value_t = 1667174400)]
    end: u64,

    /// Route collector to read, repeatable. Defaults to rrc26.
    #[clap(short, long)]
    collector: Vec<String>,

    /// Read these MRT files instead of querying the broker, repeatable
    #[clap(long)]
    mrt_file: Vec<String>,

    /// Use a custom BGPKIT broker instance
    #[clap(long)]
    broker_url: Option<String>,

    /// Match log file, appended to
    #[clap(short, long, default_value = "matched_records.txt")]
    output: PathBuf,

    /// Write matches as JSON lines
    #[clap(long)]
    json: bool,

    /// Only write the matches of the attempt that completes
    #[clap(long)]
    transactional: bool,

    /// Maximum number of passes over the feed
    #[clap(long, default_value_t = 5)]
    max_attempts: u32,

    /// Seconds to wait before retrying a failed pass
    #[clap(long, default_value_t = 5)]
    retry_delay_secs: u64,

    /// Log progress every N records, 0 to disable
    #[clap(long, default_value_t = 100)]
    progress_interval: u64,

    /// Write the diagnostic log to this file instead of stderr
    #[clap(long)]
    log_file: Option<PathBuf>,

    #[clap(flatten)]
    filters: Filters,
}

#[derive(Parser, Debug)]
struct Filters {
    /// Filter by peer IP address
    #[clap(short = 'j', long)]
    peer_ip: Vec<IpAddr>,

    /// Filter by elem type: announce (a) or withdraw (w)
    #[clap(short = 'm', long)]
    elem_type: Option<String>,

    /// Filter by AS path regex string
    #[clap(short = 'a', long)]
    as_path: Option<String>,

    /// Filter by origin AS Number
    #[clap(short = 'O', long)]
    origin_asn: Option<u32>,
}

impl Filters {
    fn build(&self) -> Result<Vec<Filter>, bgp_watchlist::ConfigError> {
        let mut filters = vec![];
        if !self.peer_ip.is_empty() {
            let v = self.peer_ip.iter().map(|p| p.to_string()).join(",");
            filters.push(Filter::new("peer_ips", v.as_str())?);
        }
        if let Some(v) = &self.elem_type {
            filters.push(Filter::new("type", v.as_str())?);
        }
        if let Some(v) = &self.as_path {
            filters.push(Filter::new("as_path", v.as_str())?);
        }
        if let Some(v) = self.origin_asn {
            filters.push(Filter::new("origin_asn", v.to_string().as_str())?);
        }
        Ok(filters)
    }
}

const EXIT_EXHAUSTED: i32 = 1;
const EXIT_CONFIG: i32 = 2;

fn init_logger(log_file: Option<&PathBuf>) -> std::io::Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn build_config(opts: &Opts) -> Result<WatchConfig, bgp_watchlist::ConfigError> {
    let collectors = match (opts.collector.is_empty(), opts.mrt_file.is_empty()) {
        (true, true) => WatchConfig::default().collectors,
        _ => opts.collector.clone(),
    };
    let config = WatchConfig {
        interval: Interval::new(opts.start, opts.end)?,
        collectors,
        mrt_files: opts.mrt_file.clone(),
        max_attempts: opts.max_attempts,
        retry_delay: Duration::from_secs(opts.retry_delay_secs),
        progress_interval: opts.progress_interval,
        commit: match opts.transactional {
            true => CommitMode::OnSuccess,
            false => CommitMode::Incremental,
        },
        format: match opts.json {
            true => OutputFormat::Json,
            false => OutputFormat::Text,
        },
    };
    config.validate()?;
    Ok(config)
}

fn run<S: StreamSource>(
    config: &WatchConfig,
    ranges: &RangeSet,
    filters: &[Filter],
    source: S,
    sink: FileSink,
) -> FetchOutcome {
    RetryingFetcher::new(config, ranges, source, sink)
        .with_filters(filters)
        .run()
}

fn main() {
    let opts: Opts = Opts::parse();

    if let Err(e) = init_logger(opts.log_file.as_ref()) {
        eprintln!("cannot open log file: {}", e);
        std::process::exit(EXIT_CONFIG);
    }

    let config = match build_config(&opts) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let filters = match opts.filters.build() {
        Ok(f) => f,
        Err(e) => {
            error!("{}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let mut load_options = LoadOptions::default()
        .cidr_column(opts.cidr_column.as_str())
        .skip_invalid_rows(opts.skip_invalid_rows);
    if let Some(country) = &opts.country {
        load_options = load_options.country(country.as_str());
    }
    let ranges = match RangeSet::load(opts.watchlist.as_str(), &load_options) {
        Ok(r) => r,
        Err(e) => {
            error!("cannot load watch-list {}: {}", opts.watchlist, e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    if ranges.is_empty() {
        info!("watch-list is empty, no element will match");
    }

    let sink = FileSink::from_config(&opts.output, &config);

    let outcome = if config.uses_files() {
        let source = FileSource::new(config.mrt_files.as_slice());
        run(&config, &ranges, &filters, source, sink)
    } else {
        let mut source = BrokerSource::new();
        if let Some(url) = &opts.broker_url {
            source = source.with_broker_url(url.as_str());
        }
        run(&config, &ranges, &filters, source, sink)
    };

    match outcome {
        FetchOutcome::Succeeded { attempt, stats } => {
            info!(
                "matches written to {} after {} attempt(s): {}",
                opts.output.display(),
                attempt,
                stats
            );
        }
        FetchOutcome::Exhausted { attempts, .. } => {
            error!("giving up after {} attempts", attempts);
            std::process::exit(EXIT_EXHAUSTED);
        }
    }
}
