//! Byte quantities as the panel reports them, and the GiB figures operators type.

pub const BYTES_PER_GIB: i64 = 1_073_741_824;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Converts an operator-supplied GiB amount into bytes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gib_to_bytes(gib: f64) -> f64 {
    gib * BYTES_PER_GIB as f64
}

/// Converts a byte sum into GiB, rounded to three decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_gib(bytes: i64) -> f64 {
    round3(bytes as f64 / BYTES_PER_GIB as f64)
}

#[must_use]
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[must_use]
pub fn format_size(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = KB * 1024;
    const GB: i64 = MB * 1024;
    const TB: i64 = GB * 1024;

    let magnitude = bytes.abs();

    #[allow(clippy::cast_precision_loss)]
    if magnitude >= TB {
        format!("{:.2} TiB", bytes as f64 / TB as f64)
    } else if magnitude >= GB {
        format!("{:.2} GiB", bytes as f64 / GB as f64)
    } else if magnitude >= MB {
        format!("{:.2} MiB", bytes as f64 / MB as f64)
    } else if magnitude >= KB {
        format!("{:.2} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
