//! Text for times and deltas.
//!
//! Times are truncated toward zero at hundredths of a second, never rounded.

/// Shown wherever a comparison is not applicable
pub const PLACEHOLDER: &str = "-";

/// Truncate toward zero at two decimal places
pub fn truncate_centis(secs: f64) -> f64 {
    whole_centis(secs) as f64 / 100.0 * secs.signum()
}

fn whole_centis(secs: f64) -> u64 {
    let scaled = secs.abs() * 100.0;
    // 0.29 * 100.0 is 28.999999999999996; a value that already is a whole
    // number of hundredths keeps it. Anything else is cut, never rounded up.
    let nearest = scaled.round();
    if nearest / 100.0 == secs.abs() {
        nearest as u64
    } else {
        scaled.trunc() as u64
    }
}

/// `s.ff`, `m:ss.ff` or `h:mm:ss.ff` depending on magnitude, unsigned
pub fn time(secs: f64) -> String {
    let centis = whole_centis(secs);
    let (hours, rest) = (centis / 360_000, centis % 360_000);
    let (minutes, rest) = (rest / 6_000, rest % 6_000);
    let (seconds, hundredths) = (rest / 100, rest % 100);

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}.{hundredths:02}")
    } else if minutes > 0 {
        format!("{minutes}:{seconds:02}.{hundredths:02}")
    } else {
        format!("{seconds}.{hundredths:02}")
    }
}

/// Fixed-width main clock text, `hh:mm:ss.ff`
pub fn clock(secs: f64) -> String {
    let centis = whole_centis(secs);
    let (hours, rest) = (centis / 360_000, centis % 360_000);
    let (minutes, rest) = (rest / 6_000, rest % 6_000);
    let (seconds, hundredths) = (rest / 100, rest % 100);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{hundredths:02}")
}

/// Signed delta: `+` when time was lost, `-` otherwise
pub fn delta(secs: f64) -> String {
    let sign = if secs > 0.0 && whole_centis(secs) > 0 {
        '+'
    } else {
        '-'
    };
    format!("{sign}{}", time(secs))
}

pub fn optional_time(secs: Option<f64>) -> String {
    secs.map(time).unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn optional_delta(secs: Option<f64>) -> String {
    secs.map(delta).unwrap_or_else(|| PLACEHOLDER.to_string())
}
