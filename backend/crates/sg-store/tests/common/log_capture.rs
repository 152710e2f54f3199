use std::sync::{Mutex, OnceLock};

use log::LevelFilter;

static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());
static INSTALLED: OnceLock<()> = OnceLock::new();

/// Route this crate's warnings into a buffer and empty it.
///
/// The logger is process-global, so callers run `#[serial]`.
pub fn capture_warnings() {
    INSTALLED.get_or_init(|| {
        fern::Dispatch::new()
            .level(LevelFilter::Warn)
            .chain(fern::Output::call(|record| {
                if record.target().starts_with("sg_store") {
                    CAPTURED
                        .lock()
                        .unwrap()
                        .push(record.args().to_string());
                }
            }))
            .apply()
            .expect("Failed to install capturing logger");
    });
    CAPTURED.lock().unwrap().clear();
}

pub fn captured_warnings() -> Vec<String> {
    CAPTURED.lock().unwrap().clone()
}
