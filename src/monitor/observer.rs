//--------------------------------------------------------------------------------------------------
// STRUCTS & FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|-------------------|
// | EventMonitor            | Owns one observer task per log file               | start_observers   |
// |                         |                                                   | stop_observers    |
// | ObserverOptions         | Polling cadence and start position                |                   |
// | LineOutcome             | What happened to one log line                     |                   |
// | process_line            | Parses and dispatches a single log line           |                   |
//--------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::tailer::FileTailer;
use crate::events::{DispatchOutcome, Event, EventDispatcher};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverOptions {
    /// Delay between two reads of the same file
    pub poll_interval: Duration,
    /// Process the content already present when the observer starts
    pub read_from_start: bool,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_from_start: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Dispatched,
    /// No handler for the event type, the line was dropped
    Unhandled,
    /// Not a JSON object, the line was dropped
    Malformed,
    HandlerFailed,
}

/// Parses one log line and routes it through the dispatcher
///
/// Never fails: every problem is logged and reflected in the outcome.
pub async fn process_line(dispatcher: &EventDispatcher, log_type: &str, line: &str) -> LineOutcome {
    let event = match Event::from_json_line(line) {
        Ok(event) => event,
        Err(err) => {
            warn!(log_type, error = %err, "dropping malformed log line");
            return LineOutcome::Malformed;
        }
    };

    match dispatcher.dispatch_event(&event).await {
        Ok(DispatchOutcome::Handled) => LineOutcome::Dispatched,
        Ok(DispatchOutcome::Unhandled) => LineOutcome::Unhandled,
        Err(err) => {
            error!(log_type, event_type = %event.event_type, error = %err, "log event handler failed");
            LineOutcome::HandlerFailed
        }
    }
}

struct Observers {
    stop: CancellationToken,
    tasks: Vec<(String, JoinHandle<()>)>,
}

/// Watches the configured log files and dispatches the events they contain
pub struct EventMonitor {
    log_paths: BTreeMap<String, PathBuf>,
    dispatcher: Arc<EventDispatcher>,
    options: ObserverOptions,
    observers: Mutex<Option<Observers>>,
}

impl EventMonitor {
    pub fn new(
        log_paths: BTreeMap<String, PathBuf>,
        dispatcher: Arc<EventDispatcher>,
        options: ObserverOptions,
    ) -> Self {
        Self {
            log_paths,
            dispatcher,
            options,
            observers: Mutex::new(None),
        }
    }

    pub fn log_paths(&self) -> &BTreeMap<String, PathBuf> {
        &self.log_paths
    }

    /// Number of observer tasks currently owned by the monitor
    pub async fn active_observers(&self) -> usize {
        self.observers
            .lock()
            .await
            .as_ref()
            .map_or(0, |observers| observers.tasks.len())
    }

    /// Starts one observer per existing log file and returns how many started
    ///
    /// Missing files are skipped with a warning. Calling this while observers
    /// are running starts nothing and returns 0.
    pub async fn start_observers(&self) -> usize {
        let mut observers = self.observers.lock().await;
        if observers.is_some() {
            warn!("log observers already running");
            return 0;
        }

        let stop = CancellationToken::new();
        let mut tasks = Vec::with_capacity(self.log_paths.len());

        for (log_type, path) in &self.log_paths {
            let tailer = match FileTailer::open(path, self.options.read_from_start).await {
                Ok(tailer) => tailer,
                Err(err) => {
                    warn!(
                        log_type = %log_type,
                        path = %path.display(),
                        error = %err,
                        "log file not available, skipping observer"
                    );
                    continue;
                }
            };

            let handle = tokio::spawn(observe(
                log_type.clone(),
                tailer,
                Arc::clone(&self.dispatcher),
                self.options.poll_interval,
                stop.child_token(),
            ));
            tasks.push((log_type.clone(), handle));
        }

        let started = tasks.len();
        info!(started, configured = self.log_paths.len(), "log observers started");
        *observers = Some(Observers { stop, tasks });
        started
    }

    /// Signals every observer and waits until all of them have terminated
    pub async fn stop_observers(&self) {
        let Some(Observers { stop, tasks }) = self.observers.lock().await.take() else {
            debug!("no log observers running");
            return;
        };

        stop.cancel();
        let (log_types, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
        for (log_type, result) in log_types.iter().zip(join_all(handles).await) {
            if let Err(err) = result {
                error!(log_type = %log_type, error = %err, "log observer task failed");
            }
        }
        info!(stopped = log_types.len(), "log observers stopped");
    }

    pub async fn process_line(&self, log_type: &str, line: &str) -> LineOutcome {
        process_line(&self.dispatcher, log_type, line).await
    }
}

async fn observe(
    log_type: String,
    mut tailer: FileTailer,
    dispatcher: Arc<EventDispatcher>,
    poll_interval: Duration,
    stop: CancellationToken,
) {
    info!(log_type = %log_type, path = %tailer.path().display(), offset = tailer.offset(), "observing log file");

    let mut ticker = time::interval(poll_interval.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {}
        }

        poll_once(&mut tailer, &dispatcher, &log_type).await;
    }

    debug!(log_type = %log_type, "log observer stopped");
}

/// Reads what was appended since the last poll and dispatches every complete line
///
/// The whole batch is processed even if a stop is requested meanwhile, so the
/// tailer offset never runs ahead of the lines actually handled.
pub(crate) async fn poll_once(
    tailer: &mut FileTailer,
    dispatcher: &EventDispatcher,
    log_type: &str,
) -> usize {
    let lines = match tailer.read_new_lines().await {
        Ok(lines) => lines,
        Err(err) => {
            warn!(log_type, path = %tailer.path().display(), error = %err, "failed to read log file");
            return 0;
        }
    };

    for line in &lines {
        process_line(dispatcher, log_type, line).await;
    }
    lines.len()
}
