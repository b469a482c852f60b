//! Routing for engine warnings (unplaced teams, unknown roster names,
//! ignored sets). The CLI holds them back while a submission runs and prints
//! them under the tier result; library callers get them on stderr.

use std::sync::{Mutex, PoisonError};

static PENDING: Mutex<Option<Vec<String>>> = Mutex::new(None);

/// Start holding warnings back until [`drain`].
pub fn activate() {
    *PENDING.lock().unwrap_or_else(PoisonError::into_inner) = Some(Vec::new());
}

/// Stop holding warnings back and hand over the ones raised so far.
pub fn drain() -> Vec<String> {
    PENDING
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .unwrap_or_default()
}

pub fn warn(msg: String) {
    let mut pending = PENDING.lock().unwrap_or_else(PoisonError::into_inner);
    match pending.as_mut() {
        Some(held) => held.push(msg),
        None => {
            drop(pending);
            eprintln!("{}", msg);
        }
    }
}

/// `eprintln!` for engine warnings; see [`warn`].
#[macro_export]
macro_rules! buffered_eprintln {
    ($($arg:tt)*) => {
        $crate::stderr_buffer::warn(format!($($arg)*))
    };
}
