use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Total attempts (first try included) against the completion service.
pub const MAX_ATTEMPTS: usize = 6;
/// One backoff step; the delay before retry `n` is `2^(n-1)` steps.
pub const BACKOFF_UNIT_MS: u64 = 1_000;
pub const MAX_BACKOFF_MULTIPLIER: u64 = 32;
pub const JITTER_MAX_MS: u64 = 500;
pub const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);
static JITTER_COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn is_transient_status(status: u16) -> bool {
    TRANSIENT_STATUSES.contains(&status)
}

/// Deterministic part of the delay after a failed `attempt` (1-based).
pub fn backoff_delay_ms(attempt: usize, unit_ms: u64) -> u64 {
    let exponent = attempt.saturating_sub(1).min(16) as u32;
    let multiplier = (1_u64 << exponent).min(MAX_BACKOFF_MULTIPLIER);
    unit_ms.saturating_mul(multiplier)
}

fn jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    let seed = JITTER_COUNTER.fetch_add(1, Ordering::Relaxed) ^ nanos;
    let mixed = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(17) ^ 0xA24B_AED4_963E_E407;
    mixed % max_ms.saturating_add(1)
}

/// Backoff plus bounded jitter in `[0, jitter_max_ms]`.
pub fn retry_delay_ms(attempt: usize, unit_ms: u64, jitter_max_ms: u64) -> u64 {
    backoff_delay_ms(attempt, unit_ms).saturating_add(jitter_ms(jitter_max_ms))
}

pub fn new_request_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let count = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("prbridge-{millis}-{count}")
}
