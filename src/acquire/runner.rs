//! The acquisition loop: a periodic, serialized poll cycle over the
//! transport, feeding the parser, the series store, the sink and the
//! registered observers.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::acquire::data::{AcquisitionUpdate, Measurement};
use crate::acquire::frame;
use crate::acquire::series::SeriesStore;
use crate::acquire::traits::UpdateObserver;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::persist::MeasurementSink;
use crate::transport::Transport;

/// Depth of the outbound setpoint-command queue.
const COMMAND_QUEUE_DEPTH: usize = 16;

/// Lifecycle state of the acquisition loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Created but not started
    Idle,
    /// Periodic polling in progress
    Polling,
    /// Shut down; terminal
    Stopped,
}

/// Periodic scheduler that owns the transport, the series store and the sink.
///
/// One instance drives one device. All state lives here; observers only ever
/// see copies, and the outbound command path reaches the transport through
/// the loop rather than touching it directly.
pub struct AcquisitionLoop<T, S> {
    transport: T,
    sink: S,
    config: MonitorConfig,
    series: SeriesStore,
    latest_setpoint: Option<f64>,
    observers: Vec<Box<dyn UpdateObserver>>,
    state: LoopState,
    persist_failures: u32,
}

impl<T, S> AcquisitionLoop<T, S>
where
    T: Transport,
    S: MeasurementSink,
{
    /// Create an idle loop around an already-opened transport and sink.
    pub fn new(transport: T, sink: S, config: MonitorConfig) -> Self {
        let series = SeriesStore::with_retention(config.retention);
        Self {
            transport,
            sink,
            config,
            series,
            latest_setpoint: None,
            observers: Vec::new(),
            state: LoopState::Idle,
            persist_failures: 0,
        }
    }

    /// Register an observer for accepted measurements.
    pub fn add_observer(&mut self, observer: impl UpdateObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The retained series.
    pub fn series(&self) -> &SeriesStore {
        &self.series
    }

    /// Setpoint of the most recently accepted measurement, if any.
    pub fn latest_setpoint(&self) -> Option<f64> {
        self.latest_setpoint
    }

    /// The transport owned by this loop.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The sink owned by this loop.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Begin polling. Fails when the transport is not open; acquisition then
    /// never starts (opening the transport is the caller's concern).
    pub fn start(&mut self) -> Result<()> {
        if self.state == LoopState::Stopped {
            return Err(MonitorError::transport_unavailable(
                "acquisition already stopped",
            ));
        }
        if !self.transport.is_open() {
            return Err(MonitorError::transport_unavailable(
                "transport is not open",
            ));
        }
        self.state = LoopState::Polling;
        Ok(())
    }

    /// Run a single poll cycle: one read attempt, one decode attempt, then
    /// sink, store and observer updates on success. Returns the accepted
    /// measurement, or `None` for empty, timed-out, failed or malformed
    /// reads, none of which stop the loop.
    pub fn poll_once(&mut self) -> Option<Measurement> {
        if !self.transport.has_buffered_line() {
            return None;
        }

        let line = match self.transport.read_line(self.config.read_timeout()) {
            Ok(Some(line)) => line,
            Ok(None) => return None,
            Err(e) => {
                let err = MonitorError::transport_read(e.to_string());
                warn!(error = %err, "serial read failed, retrying next cycle");
                return None;
            }
        };

        let line = line.trim_end();
        if line.is_empty() {
            return None;
        }

        match frame::parse_line(line) {
            Ok(measurement) => {
                debug!(line, "frame accepted");
                self.accept(measurement.clone());
                Some(measurement)
            }
            Err(e) => {
                warn!(line, error = %e, "discarding malformed frame");
                None
            }
        }
    }

    /// Persist, append and notify for one accepted measurement. The durable
    /// write is attempted before the in-memory append; its failure is logged
    /// and does not block visibility.
    fn accept(&mut self, measurement: Measurement) {
        self.latest_setpoint = Some(measurement.setpoint);

        match self.sink.record(&measurement) {
            Ok(()) => self.persist_failures = 0,
            Err(e) => {
                self.persist_failures += 1;
                error!(
                    error = %e,
                    consecutive = self.persist_failures,
                    "failed to persist measurement"
                );
            }
        }

        self.series.append(measurement.clone());

        let update = AcquisitionUpdate {
            setpoint: measurement.setpoint,
            measurement,
            history: self.series.snapshot(),
        };
        for observer in &mut self.observers {
            observer.on_update(&update);
        }
    }

    fn persist_limit_reached(&self) -> bool {
        self.config
            .persist_failure_limit
            .map(|limit| self.persist_failures >= limit)
            .unwrap_or(false)
    }

    /// Write one queued setpoint change. The value has already passed
    /// validation; a write failure is reported and dropped.
    fn send_setpoint(&mut self, value: &str) {
        match self.transport.write_line(&frame::encode_setpoint(value)) {
            Ok(()) => info!(value, "setpoint change sent"),
            Err(e) => error!(value, error = %e, "failed to send setpoint change"),
        }
    }

    fn stop(&mut self) {
        self.transport.close();
        self.state = LoopState::Stopped;
        info!(samples = self.series.len(), "acquisition stopped");
    }
}

impl<T, S> AcquisitionLoop<T, S>
where
    T: Transport + 'static,
    S: MeasurementSink + 'static,
{
    /// Start polling on a background task and return its handle. Cycles are
    /// strictly periodic and serialized: the next tick is only processed
    /// after the previous cycle (parse, persist, append, notify) completes.
    pub fn spawn(mut self) -> Result<AcquisitionHandle<T, S>> {
        self.start()?;

        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(command_rx, stop_rx));

        Ok(AcquisitionHandle {
            commands: command_tx,
            stop: stop_tx,
            task,
        })
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<String>,
        mut stop: watch::Receiver<bool>,
    ) -> Self {
        let mut ticker = time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_ms = self.config.poll_interval_ms,
            "acquisition started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    while let Ok(value) = commands.try_recv() {
                        self.send_setpoint(&value);
                    }
                    self.poll_once();
                    if self.persist_limit_reached() {
                        error!(
                            limit = self.config.persist_failure_limit,
                            "consecutive persist-failure limit reached, stopping"
                        );
                        break;
                    }
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        self.stop();
        self
    }
}

/// Handle to a spawned [`AcquisitionLoop`]: the outbound command path and
/// shutdown control.
pub struct AcquisitionHandle<T, S> {
    commands: mpsc::Sender<String>,
    stop: watch::Sender<bool>,
    task: JoinHandle<AcquisitionLoop<T, S>>,
}

impl<T, S> AcquisitionHandle<T, S> {
    /// Queue a setpoint change for the device.
    ///
    /// The request is rejected locally, and nothing is sent, unless the text
    /// is a syntactically valid non-negative decimal number. Acceptance means
    /// the request is queued; the loop writes it on its next cycle and a
    /// transport failure at that point is reported, not returned here.
    pub fn request_setpoint_change(&self, value: &str) -> Result<()> {
        let value = value.trim();
        if !frame::is_valid_decimal(value) {
            return Err(MonitorError::command_rejected(format!(
                "not a non-negative decimal number: {value:?}"
            )));
        }
        self.commands
            .try_send(value.to_string())
            .map_err(|e| MonitorError::command_rejected(format!("command queue: {e}")))
    }

    /// Whether the loop task has already terminated (explicit shutdown or the
    /// persist-failure limit).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Request shutdown and wait for the loop to finish its current cycle,
    /// close the transport and return itself for inspection.
    pub async fn shutdown(self) -> Result<AcquisitionLoop<T, S>> {
        let _ = self.stop.send(true);
        self.task
            .await
            .map_err(|e| MonitorError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }
}
