use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

/// One key's open window: when its last line went out and how many
/// lines have been dropped since.
#[derive(Default)]
struct Window {
    last_emitted: Option<Instant>,
    dropped: u64,
}

fn windows() -> &'static Mutex<HashMap<String, Window>> {
    static WINDOWS: OnceLock<Mutex<HashMap<String, Window>>> = OnceLock::new();
    WINDOWS.get_or_init(Mutex::default)
}

/// Rate-limits noisy log lines per key. Returns `Some(dropped)` when the
/// line for `key` may be written, with the number of lines swallowed since
/// the previous one; `None` means skip it.
pub fn should_emit(key: &str, interval: Duration) -> Option<u64> {
    let now = Instant::now();
    let mut windows = windows().lock().unwrap_or_else(PoisonError::into_inner);
    let window = windows.entry(key.to_owned()).or_default();

    match window.last_emitted {
        Some(at) if now.duration_since(at) < interval => {
            window.dropped += 1;
            None
        }
        _ => {
            window.last_emitted = Some(now);
            Some(std::mem::take(&mut window.dropped))
        }
    }
}
