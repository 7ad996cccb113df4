//! Number formatting for axis labels, price readouts and change badges.
//!
//! All helpers insert thousands separators into the integer part.

/// Inserts thousands separators into an already formatted number.
///
/// The fractional part (if any) is kept verbatim.
pub fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Decimal places needed to tell apart labels spaced `step` apart.
pub fn decimals_for_step(step: f64) -> usize {
    if !step.is_finite() || step <= 0.0 || step >= 1.0 {
        return 0;
    }
    (-step.log10()).ceil().min(8.0) as usize
}

/// Fixed-precision price label, zeros kept so labels line up.
pub fn price_label(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.1$}", value, decimals);
    match formatted.strip_prefix('-') {
        // "-0.00" reads badly on an axis
        Some(rest) if !has_nonzero_digit(rest) => group_thousands(rest),
        _ => group_thousands(&formatted),
    }
}

/// Price change with an explicit sign, e.g. `+1,250.50`.
pub fn signed_change(value: f64, decimals: usize) -> String {
    let label = price_label(value.abs(), decimals);
    if !has_nonzero_digit(&label) {
        label
    } else if value > 0.0 {
        format!("+{}", label)
    } else {
        format!("-{}", label)
    }
}

fn has_nonzero_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit() && c != '0')
}

/// Percentage change with sign and two decimals, e.g. `-0.37%`.
pub fn signed_percent(value: f64) -> String {
    format!("{}%", signed_change(value, 2))
}
