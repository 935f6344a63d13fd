use std::sync::{Arc, Mutex};
use std::time::Duration;
use winding_floor::adapters::outbound::{init_buffered_logger, init_noop_logger, BufferedLogger, MultiLogger};
use winding_floor::domains::logger::{DomainLogger, DynLogger};

struct BridgeCapture {
    messages: Arc<Mutex<Vec<String>>>,
}

impl BridgeCapture {
    fn new() -> Self { Self { messages: Arc::new(Mutex::new(Vec::new())) } }
}

impl DomainLogger for BridgeCapture {
    fn info(&self, msg: &str) { self.messages.lock().unwrap().push(format!("INFO:{}", msg)); }
    fn warn(&self, msg: &str) { self.messages.lock().unwrap().push(format!("WARN:{}", msg)); }
    fn error(&self, msg: &str) { self.messages.lock().unwrap().push(format!("ERR:{}", msg)); }
}

#[tokio::test]
async fn test_buffered_and_noop_logger() {
    let capture = Arc::new(BridgeCapture::new());
    let bridge = capture.clone() as DynLogger;

    let buffered = init_buffered_logger(bridge.clone(), 8);

    buffered.info("one");
    buffered.warn("two");
    buffered.error("three");

    // Give the background task a moment
    tokio::time::sleep(Duration::from_millis(50)).await;

    let msgs = capture.messages.lock().unwrap();
    assert!(msgs.iter().any(|m| m.contains("INFO:one")));
    assert!(msgs.iter().any(|m| m.contains("WARN:two")));
    assert!(msgs.iter().any(|m| m.contains("ERR:three")));

    let noop = init_noop_logger();
    noop.info("ignored");
    noop.error("ignored-err");
}

#[tokio::test]
async fn test_buffered_logger_counts_overflow() {
    let capture = Arc::new(BridgeCapture::new());
    let buffered = BufferedLogger::spawn(capture.clone() as DynLogger, 1);

    // No await between sends, so the forwarder cannot drain the queue.
    for i in 0..5 {
        buffered.info(&format!("record {}", i));
    }
    assert_eq!(buffered.dropped(), 4);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(capture.messages.lock().unwrap().len(), 1);
}

#[test]
fn test_multi_logger_fans_out() {
    let first = Arc::new(BridgeCapture::new());
    let second = Arc::new(BridgeCapture::new());
    let multi = MultiLogger::new(vec![first.clone() as DynLogger, second.clone() as DynLogger]);
    assert_eq!(multi.len(), 2);

    multi.warn("collision");

    assert_eq!(first.messages.lock().unwrap().as_slice(), ["WARN:collision"]);
    assert_eq!(second.messages.lock().unwrap().as_slice(), ["WARN:collision"]);
}
