//! Display formatting for dashboard figures (en-AU conventions).

pub fn format_currency(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(value.unsigned_abs()))
}

/// Signed percentage with one decimal. Positive values carry an explicit `+`.
pub fn format_percent(value: f64) -> String {
    if value > 0.0 {
        format!("+{value:.1}%")
    } else {
        format!("{value:.1}%")
    }
}

pub fn format_number(value: u64) -> String {
    group_thousands(value)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
