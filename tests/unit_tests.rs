use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thermotrace::{
    is_valid_decimal, parse_line, AcquisitionLoop, AcquisitionUpdate, CsvSink, LoopState,
    Measurement, MeasurementSink, MemorySink, MockTransport, MonitorConfig, MonitorError,
    ParseError, SeriesStore, Transport,
};

/// Sink that rejects every record, for exercising the best-effort policy.
struct FailingSink;

impl MeasurementSink for FailingSink {
    fn record(&mut self, _measurement: &Measurement) -> thermotrace::Result<()> {
        Err(MonitorError::persist_error("disk full"))
    }
}

fn collecting_observer() -> (
    Arc<Mutex<Vec<AcquisitionUpdate>>>,
    impl FnMut(&AcquisitionUpdate) + Send,
) {
    let updates: Arc<Mutex<Vec<AcquisitionUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    let observer = move |update: &AcquisitionUpdate| {
        sink.lock().unwrap().push(update.clone());
    };
    (updates, observer)
}

/// Test frame decoding for well-formed lines
#[test]
fn test_parse_well_formed_frames() {
    let m = parse_line("Z25A24.5").unwrap();
    assert_eq!(m.setpoint, 25.0);
    assert_eq!(m.actual, 24.5);

    let m = parse_line("Z25.0A24.7").unwrap();
    assert_eq!(m.setpoint, 25.0);
    assert_eq!(m.actual, 24.7);
}

/// Test frame rejection reasons
#[test]
fn test_parse_rejections() {
    assert_eq!(parse_line("25.0 24.7"), Err(ParseError::MissingMarker));
    assert_eq!(parse_line("Z25.0"), Err(ParseError::MissingMarker));
    assert!(matches!(parse_line("ZfooA24.7"), Err(ParseError::NotANumber(_))));
    assert!(matches!(parse_line("Z25.0Abar"), Err(ParseError::NotANumber(_))));
    assert!(matches!(parse_line("Z-5A24.7"), Err(ParseError::NotANumber(_))));
}

/// Test the outbound value validator
#[test]
fn test_outbound_validation_rules() {
    assert!(is_valid_decimal("30"));
    assert!(is_valid_decimal("27.5"));
    assert!(!is_valid_decimal("-1"));
    assert!(!is_valid_decimal("abc"));
    assert!(!is_valid_decimal("1.2.3"));
}

/// Test snapshot idempotence and append-only growth
#[test]
fn test_series_snapshot_semantics() {
    let mut store = SeriesStore::new();
    for i in 0..4 {
        store.append(Measurement::now(25.0, 20.0 + i as f64));
    }

    let first = store.snapshot();
    let second = store.snapshot();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    for (i, m) in first.iter().enumerate() {
        assert_eq!(m.actual, 20.0 + i as f64);
    }
}

/// Two well-formed lines around a malformed one, driven through one poll
/// cycle each.
#[test]
fn test_end_to_end_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("measurements.csv");

    let transport = MockTransport::with_lines(["Z25.0A24.7", "garbage", "Z25.0A24.9"]);
    let sink = CsvSink::open(&log_path).unwrap();
    let config = MonitorConfig::default().with_log_path(&log_path);

    let (updates, observer) = collecting_observer();
    let mut acquisition = AcquisitionLoop::new(transport, sink, config);
    acquisition.add_observer(observer);

    assert!(acquisition.poll_once().is_some());
    assert!(acquisition.poll_once().is_none()); // malformed, reported and dropped
    assert!(acquisition.poll_once().is_some());
    assert!(acquisition.poll_once().is_none()); // nothing buffered

    assert_eq!(acquisition.series().len(), 2);
    assert_eq!(acquisition.latest_setpoint(), Some(25.0));
    let snapshot = acquisition.series().snapshot();
    assert_eq!(snapshot[0].actual, 24.7);
    assert_eq!(snapshot[1].actual, 24.9);

    // one observer notification per accepted frame, with a growing history
    let updates = updates.lock().unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].history.len(), 1);
    assert_eq!(updates[1].history.len(), 2);
    assert_eq!(updates[1].setpoint, 25.0);

    // durability correspondence: same count, same order, same values
    let contents = fs::read_to_string(&log_path).unwrap();
    let rows: Vec<&str> = contents.lines().collect();
    assert_eq!(rows.len(), 2);
    for (row, m) in rows.iter().zip(snapshot.iter()) {
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[1].parse::<f64>().unwrap(), m.actual);
        assert_eq!(fields[2].parse::<f64>().unwrap(), m.setpoint);
    }
}

/// Empty and whitespace-only lines are skipped without side effects
#[test]
fn test_blank_lines_are_ignored() {
    let transport = MockTransport::with_lines(["", "   ", "Z25.0A24.7"]);
    let mut acquisition = AcquisitionLoop::new(
        transport,
        MemorySink::new(),
        MonitorConfig::default(),
    );

    assert!(acquisition.poll_once().is_none());
    assert!(acquisition.poll_once().is_none());
    assert!(acquisition.poll_once().is_some());
    assert_eq!(acquisition.series().len(), 1);
}

/// A failing sink must not block visibility: the measurement still reaches
/// the series and the observers.
#[test]
fn test_persist_failure_is_non_fatal() {
    let transport = MockTransport::with_lines(["Z25.0A24.7"]);
    let (updates, observer) = collecting_observer();

    let mut acquisition =
        AcquisitionLoop::new(transport, FailingSink, MonitorConfig::default());
    acquisition.add_observer(observer);

    assert!(acquisition.poll_once().is_some());
    assert_eq!(acquisition.series().len(), 1);
    assert_eq!(updates.lock().unwrap().len(), 1);
}

/// Acquisition refuses to start on a transport that never opened
#[test]
fn test_never_starts_without_transport() {
    let mut acquisition = AcquisitionLoop::new(
        MockTransport::closed(),
        MemorySink::new(),
        MonitorConfig::default(),
    );
    let err = acquisition.start().unwrap_err();
    assert!(matches!(err, MonitorError::TransportUnavailable(_)));
    assert_eq!(acquisition.state(), LoopState::Idle);
}

/// Full lifecycle on the spawned task: commands go out, shutdown closes the
/// transport and hands the loop back.
#[tokio::test]
async fn test_spawned_loop_command_and_shutdown() {
    let transport = MockTransport::with_lines(["Z25.0A24.7"]);
    let config = MonitorConfig::default().with_poll_interval_ms(10);

    let acquisition = AcquisitionLoop::new(transport, MemorySink::new(), config);
    let handle = acquisition.spawn().unwrap();

    handle.request_setpoint_change("30").unwrap();
    assert!(matches!(
        handle.request_setpoint_change("-1"),
        Err(MonitorError::CommandRejected(_))
    ));
    assert!(matches!(
        handle.request_setpoint_change("abc"),
        Err(MonitorError::CommandRejected(_))
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let finished = handle.shutdown().await.unwrap();

    assert_eq!(finished.state(), LoopState::Stopped);
    assert!(!finished.transport().is_open());
    assert_eq!(finished.transport().sent(), ["Z30"]);
    assert_eq!(finished.series().len(), 1);
    assert_eq!(finished.sink().records().len(), 1);
}

/// The opt-in consecutive persist-failure limit stops the loop on its own
#[tokio::test]
async fn test_persist_failure_limit_stops_loop() {
    let transport = MockTransport::with_lines(["Z25.0A24.7", "Z25.0A24.8"]);
    let config = MonitorConfig::default()
        .with_poll_interval_ms(10)
        .with_persist_failure_limit(Some(2));

    let acquisition = AcquisitionLoop::new(transport, FailingSink, config);
    let handle = acquisition.spawn().unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(handle.is_finished());

    let finished = handle.shutdown().await.unwrap();
    assert_eq!(finished.state(), LoopState::Stopped);
    assert_eq!(finished.series().len(), 2);
}
