//! Human-readable byte sizes.

const UNIT: u64 = 1024;
const PREFIXES: &[u8; 6] = b"KMGTPE";

/// Format a byte count using binary multiples and one decimal place.
///
/// Values below 1 KiB are printed as whole bytes (`"1023 B"`); larger
/// values use the largest unit that keeps the integer part at or above 1
/// (`"1.5 KB"`, `"1.0 MB"`).
pub fn format_size(bytes: u64) -> String {
    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!(
        "{:.1} {}B",
        bytes as f64 / div as f64,
        PREFIXES[exp] as char
    )
}
