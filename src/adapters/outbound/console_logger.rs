use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Prints floor records to stdout, errors to stderr.
pub struct ConsoleLogger {
    prefix: String,
}

impl ConsoleLogger {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl DomainLogger for ConsoleLogger {
    fn info(&self, msg: &str) {
        println!("[{}] {}", self.prefix, msg);
    }

    fn warn(&self, msg: &str) {
        println!("[{}] WARN: {}", self.prefix, msg);
    }

    fn error(&self, msg: &str) {
        eprintln!("[{}] ERROR: {}", self.prefix, msg);
    }
}

pub fn init_console_logger() -> DynLogger {
    Arc::new(ConsoleLogger::new("floor"))
}
