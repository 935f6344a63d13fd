use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Forwards every record to each of its targets in order.
pub struct MultiLogger {
    targets: Vec<DynLogger>,
}

impl MultiLogger {
    pub fn new(targets: Vec<DynLogger>) -> Self {
        Self { targets }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.error(msg));
    }
}

/// File plus console when the file backend comes up, console alone when it
/// does not.
pub fn init_combined_logger(path: &str) -> DynLogger {
    let console = super::init_console_logger();
    match super::init_file_logger(path) {
        Ok(file) => Arc::new(MultiLogger::new(vec![file, console])) as DynLogger,
        Err(err) => {
            console.warn(&err);
            console
        }
    }
}
