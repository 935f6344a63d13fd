use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy)]
enum Level {
    Info,
    Warn,
    Error,
}

struct Record {
    level: Level,
    msg: String,
}

/// Keeps the tick loop off the logging path: records are queued and a
/// background task forwards them to `bridge`. When the queue is full the
/// record is dropped and counted.
pub struct BufferedLogger {
    sender: mpsc::Sender<Record>,
    dropped: AtomicU64,
}

impl BufferedLogger {
    /// Must be called from within a tokio runtime.
    pub fn spawn(bridge: DynLogger, capacity: usize) -> Arc<Self> {
        let (sender, mut receiver) = mpsc::channel::<Record>(capacity.max(1));
        tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                match record.level {
                    Level::Info => bridge.info(&record.msg),
                    Level::Warn => bridge.warn(&record.msg),
                    Level::Error => bridge.error(&record.msg),
                }
            }
        });
        Arc::new(Self { sender, dropped: AtomicU64::new(0) })
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, level: Level, msg: &str) {
        let record = Record { level, msg: msg.to_string() };
        if self.sender.try_send(record).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl DomainLogger for BufferedLogger {
    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
}

pub fn init_buffered_logger(bridge: DynLogger, capacity: usize) -> DynLogger {
    BufferedLogger::spawn(bridge, capacity)
}
