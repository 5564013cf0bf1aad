/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use worklog_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let factor = 10_f64.powi(decimals as i32);
    let magnitude = value.abs();
    // Nudge exact binary midpoints (1.005 etc.) up before rounding.
    let scaled = (magnitude * factor + f64::EPSILON * magnitude * factor).round();
    let fixed = format!("{:.*}", decimals as usize, scaled / factor);

    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + whole.len() / 3 + 1);
    // A value that rounds to zero prints unsigned, including -0.0.
    if value.is_sign_negative() && scaled != 0.0 {
        out.push('-');
    }
    out.push_str(&group_thousands(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Format an hour amount with one decimal and an `h` suffix.
///
/// ```
/// use worklog_core::formatting::format_hours;
///
/// assert_eq!(format_hours(12.46), "12.5h");
/// assert_eq!(format_hours(1500.0), "1,500.0h");
/// ```
pub fn format_hours(hours: f64) -> String {
    format!("{}h", format_number(hours, 1))
}

/// Format a percentage with one decimal.
///
/// ```
/// use worklog_core::formatting::format_percent;
///
/// assert_eq!(format_percent(55.0), "55.0%");
/// ```
pub fn format_percent(percent: f64) -> String {
    format!("{}%", format_number(percent, 1))
}

/// Insert a comma before every group of three digits counted from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.char_indices() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
