/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Fixed decimal places. Percentage-style stats drop the leading zero:
/// ".323" rather than "0.323".
pub fn format_ratio(value: f64, places: usize, strip_leading_zero: bool) -> String {
    let text = format!("{value:.places$}");
    if strip_leading_zero {
        text.trim_start_matches('0').to_string()
    } else {
        text
    }
}

/// `value` rounded to its displayed form, for sums of displayed rates.
pub fn rounded(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}

/// Innings pitched as a true fraction, for calculations.
pub fn innings_pitched(outs: u64) -> f64 {
    outs as f64 / 3.0
}

/// Innings pitched in box-score notation: 19 outs is "6.1".
pub fn innings_display(outs: u64) -> String {
    format!("{}.{}", outs / 3, outs % 3)
}
