use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::api::ApiReply;

/// Unified event type consumed by the app loop. Keys, terminal resizes,
/// timer ticks and network completions all arrive on the same channel, so
/// every handler runs to completion before the next one starts.
#[derive(Clone, Debug)]
pub enum ExamEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Api(ApiReply),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait ExamEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<ExamEvent, RecvTimeoutError>;
}

/// Production event source using crossterm. The same sender is handed to the
/// api worker so network completions interleave with input.
pub struct CrosstermEventSource {
    tx: Sender<ExamEvent>,
    rx: Receiver<ExamEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        let key_tx = tx.clone();
        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if key_tx.send(ExamEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if key_tx.send(ExamEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<ExamEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ExamEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-backed event source for headless tests
pub struct TestEventSource {
    rx: Receiver<ExamEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<ExamEvent>) -> Self {
        Self { rx }
    }
}

impl ExamEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ExamEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: ExamEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: ExamEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> ExamEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => ExamEvent::Tick,
        }
    }
}
