/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    if !val.is_finite() {
        return "—".to_string();
    }
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Round to cents for presentation. Aggregation keeps full precision.
pub fn round_cents(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

/// Shorten a label for chart axes: more than `max` chars become `max` chars + "...".
pub fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() > max {
        let head: String = label.chars().take(max).collect();
        format!("{head}...")
    } else {
        label.to_string()
    }
}

/// Keep at most `max` chars of a string.
pub fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
