use std::collections::VecDeque;
use std::net::IpAddr;
use std::str::FromStr;

use bgp_watchlist::{
    AsPath, CommitMode, ElemKind, FeedError, FetchOutcome, FetchState, FileSink, Interval,
    LoadOptions, NoopSleeper, OutputFormat, PipelineError, RangeSet, RetryingFetcher,
    StreamElement, StreamRecord, StreamSource, WatchConfig,
};
use tempfile::TempDir;

/// What one call to `open` does.
enum Script {
    FailOpen(&'static str),
    Yield(Vec<Result<StreamRecord, FeedError>>),
}

/// In-memory feed replaying one script entry per `open` call.
struct ScriptedSource {
    scripts: VecDeque<Script>,
    opened: Vec<(Interval, Vec<String>)>,
}

impl ScriptedSource {
    fn new(scripts: Vec<Script>) -> Self {
        ScriptedSource {
            scripts: scripts.into(),
            opened: vec![],
        }
    }
}

impl StreamSource for ScriptedSource {
    type Records = std::vec::IntoIter<Result<StreamRecord, FeedError>>;

    fn open(
        &mut self,
        interval: &Interval,
        collectors: &[String],
    ) -> Result<Self::Records, FeedError> {
        self.opened.push((*interval, collectors.to_vec()));
        match self.scripts.pop_front() {
            Some(Script::FailOpen(reason)) => Err(FeedError::Other(reason.to_string())),
            Some(Script::Yield(records)) => Ok(records.into_iter()),
            None => Err(FeedError::Other("script exhausted".to_string())),
        }
    }
}

fn setup_test_dir() -> (TempDir, std::path::PathBuf) {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("matched_records.txt");
    (temp_dir, output)
}

fn watchlist(csv: &str) -> RangeSet {
    RangeSet::from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap()
}

fn peer() -> IpAddr {
    IpAddr::from_str("192.0.2.1").unwrap()
}

fn config() -> WatchConfig {
    WatchConfig {
        interval: Interval::new(1654041600, 1667174400).unwrap(),
        collectors: vec!["rrc26".to_string()],
        ..Default::default()
    }
}

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

#[test]
fn test_announcement_written_to_match_log() {
    let (_dir, output) = setup_test_dir();
    let ranges = watchlist("Country Code,CIDR\nPK,10.0.0.0/8\n");
    let elem = StreamElement::new(ElemKind::Announce, peer(), "10.1.2.0/24")
        .with_as_path(AsPath::from_sequence([65001, 65002]));
    let source = ScriptedSource::new(vec![Script::Yield(vec![Ok(StreamRecord::new(
        1654041605,
        vec![elem],
    ))])]);

    let config = config();
    let mut fetcher = RetryingFetcher::new(&config, &ranges, source, FileSink::new(&output))
        .with_sleeper(NoopSleeper);
    let outcome = fetcher.run();
    assert!(outcome.is_success());

    assert_eq!(
        read_lines(&output),
        vec![
            "2022-06-01 00:00:05 A 192.0.2.1 10.1.2.0/24 AS Path: 65001 65002 Next Hop: N/A Communities: N/A"
        ]
    );
    let (interval, collectors) = &fetcher.source().opened[0];
    assert_eq!(interval.start, 1654041600);
    assert_eq!(collectors, &vec!["rrc26".to_string()]);
}

#[test]
fn test_withdrawal_outside_watchlist_writes_nothing() {
    let (_dir, output) = setup_test_dir();
    let ranges = watchlist("CIDR\n10.0.0.0/8\n");
    let elem = StreamElement::new(ElemKind::Withdraw, peer(), "192.168.0.0/16");
    let source = ScriptedSource::new(vec![Script::Yield(vec![Ok(StreamRecord::new(
        1654041605,
        vec![elem],
    ))])]);

    let config = config();
    let mut fetcher = RetryingFetcher::new(&config, &ranges, source, FileSink::new(&output))
        .with_sleeper(NoopSleeper);
    match fetcher.run() {
        FetchOutcome::Succeeded { attempt, stats } => {
            assert_eq!(attempt, 1);
            assert_eq!((stats.records, stats.elements, stats.matches), (1, 1, 0));
        }
        o => panic!("unexpected outcome {o:?}"),
    }
    assert!(read_lines(&output).is_empty());
}

#[test]
fn test_open_fails_three_times_then_succeeds() {
    let (_dir, output) = setup_test_dir();
    let ranges = watchlist("CIDR\n10.0.0.0/8\n2001:db8::/32\n");
    let elem = StreamElement::new(ElemKind::Announce, peer(), "2001:db8:1::/48")
        .with_next_hop(IpAddr::from_str("2001:db8::1").unwrap())
        .with_communities(&["65001:100", "65001:200"]);
    let source = ScriptedSource::new(vec![
        Script::FailOpen("broker unreachable"),
        Script::FailOpen("broker unreachable"),
        Script::FailOpen("broker unreachable"),
        Script::Yield(vec![Ok(StreamRecord::new(1654041600, vec![elem]))]),
    ]);

    let config = config();
    let mut fetcher = RetryingFetcher::new(&config, &ranges, source, FileSink::new(&output))
        .with_sleeper(NoopSleeper);
    match fetcher.run() {
        FetchOutcome::Succeeded { attempt, .. } => assert_eq!(attempt, 4),
        o => panic!("unexpected outcome {o:?}"),
    }
    assert_eq!(fetcher.state(), FetchState::Succeeded);
    assert_eq!(fetcher.source().opened.len(), 4);
    assert_eq!(
        read_lines(&output),
        vec![
            "2022-06-01 00:00:00 A 192.0.2.1 2001:db8:1::/48 AS Path: N/A Next Hop: 2001:db8::1 Communities: 65001:100 65001:200"
        ]
    );
}

#[test]
fn test_every_open_fails() {
    let (_dir, output) = setup_test_dir();
    let ranges = watchlist("CIDR\n10.0.0.0/8\n");
    let source = ScriptedSource::new(vec![]);

    let config = WatchConfig {
        max_attempts: 3,
        ..config()
    };
    let mut fetcher = RetryingFetcher::new(&config, &ranges, source, FileSink::new(&output))
        .with_sleeper(NoopSleeper);
    match fetcher.run() {
        FetchOutcome::Exhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(matches!(last_error, PipelineError::Feed(_)));
        }
        o => panic!("unexpected outcome {o:?}"),
    }
    assert_eq!(fetcher.source().opened.len(), 3);
    assert!(read_lines(&output).is_empty());
}

#[test]
fn test_mid_stream_failure_restarts_from_interval_start() {
    let (_dir, output) = setup_test_dir();
    let ranges = watchlist("CIDR\n10.0.0.0/8\n");
    let first = StreamElement::new(ElemKind::Announce, peer(), "10.1.0.0/16");
    let second = StreamElement::new(ElemKind::Withdraw, peer(), "10.2.0.0/16");
    let full_pass = || {
        vec![
            Ok(StreamRecord::new(1654041600, vec![first.clone()])),
            Ok(StreamRecord::new(1654041700, vec![second.clone()])),
        ]
    };
    let mut broken_pass = full_pass();
    broken_pass.truncate(1);
    broken_pass.push(Err(FeedError::Read {
        url: "updates.20220601.0000.gz".to_string(),
        reason: "connection reset".to_string(),
    }));

    // incremental commit keeps the partial output of the broken pass
    let source = ScriptedSource::new(vec![
        Script::Yield(broken_pass),
        Script::Yield(full_pass()),
    ]);
    let config = config();
    let mut fetcher = RetryingFetcher::new(&config, &ranges, source, FileSink::new(&output))
        .with_sleeper(NoopSleeper);
    assert!(fetcher.run().is_success());
    let lines = read_lines(&output);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], lines[1]);
    for (_, collectors) in &fetcher.source().opened {
        assert_eq!(collectors, &vec!["rrc26".to_string()]);
    }
}

#[test]
fn test_transactional_commit_writes_only_final_pass() {
    let (_dir, output) = setup_test_dir();
    let ranges = watchlist("CIDR\n10.0.0.0/8\n");
    let elem = StreamElement::new(ElemKind::Announce, peer(), "10.1.0.0/16");
    let source = ScriptedSource::new(vec![
        Script::Yield(vec![
            Ok(StreamRecord::new(1654041600, vec![elem.clone()])),
            Err(FeedError::Other("connection reset".to_string())),
        ]),
        Script::Yield(vec![Ok(StreamRecord::new(1654041600, vec![elem]))]),
    ]);

    let config = WatchConfig {
        commit: CommitMode::OnSuccess,
        format: OutputFormat::Json,
        ..config()
    };
    let sink = FileSink::from_config(&output, &config);
    let mut fetcher =
        RetryingFetcher::new(&config, &ranges, source, sink).with_sleeper(NoopSleeper);
    assert!(fetcher.run().is_success());

    let lines = read_lines(&output);
    assert_eq!(lines.len(), 1);
    let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(value["prefix"], "10.1.0.0/16");
    assert_eq!(value["range"], "10.0.0.0/8");
    assert_eq!(value["timestamp"], 1654041600);
}

#[test]
fn test_unwritable_match_log_exhausts_attempts() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("missing-dir").join("matched_records.txt");
    let ranges = watchlist("CIDR\n10.0.0.0/8\n");
    let source = ScriptedSource::new(vec![
        Script::Yield(vec![]),
        Script::Yield(vec![]),
    ]);

    let config = WatchConfig {
        max_attempts: 2,
        ..config()
    };
    let mut fetcher = RetryingFetcher::new(&config, &ranges, source, FileSink::new(&output))
        .with_sleeper(NoopSleeper);
    match fetcher.run() {
        FetchOutcome::Exhausted { last_error, .. } => {
            assert!(matches!(last_error, PipelineError::Sink(_)));
        }
        o => panic!("unexpected outcome {o:?}"),
    }
}

#[test]
fn test_log_is_appended_across_runs() {
    let (_dir, output) = setup_test_dir();
    let ranges = watchlist("CIDR\n10.0.0.0/8\n");
    let elem = StreamElement::new(ElemKind::Announce, peer(), "10.1.0.0/16");
    let config = config();

    for _ in 0..2 {
        let source = ScriptedSource::new(vec![Script::Yield(vec![Ok(StreamRecord::new(
            1654041600,
            vec![elem.clone()],
        ))])]);
        let mut fetcher = RetryingFetcher::new(&config, &ranges, source, FileSink::new(&output))
            .with_sleeper(NoopSleeper);
        assert!(fetcher.run().is_success());
    }
    assert_eq!(read_lines(&output).len(), 2);
}
