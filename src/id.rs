//! ID generation utilities for batchgen

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a unique item ID for items submitted without one
///
/// Format: `batch-{timestamp_ms}-{random_hex}`
/// Example: `batch-1738300800123-a1b2c3d4`
pub fn generate_item_id() -> String {
    let random: u32 = rand::rng().random();
    format!("batch-{}-{:08x}", now_ms(), random)
}
