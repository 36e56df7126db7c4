use chrono::{DateTime, NaiveDate};

/// Format a phone number for display.
/// Ten-digit numbers (with or without a leading country code 1) become
/// (XXX) XXX-XXXX; anything else is returned unchanged.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 => format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10]),
        11 if digits.starts_with('1') => format!("({}) {}-{}", &digits[1..4], &digits[4..7], &digits[7..11]),
        _ => phone.to_string(),
    }
}

/// Truncate to `max_len` characters, adding an ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Long-form date, e.g. "May 15, 1990".
/// Accepts RFC 3339 timestamps and plain YYYY-MM-DD dates. Anything else is
/// shown as given.
pub fn format_date(date: &str) -> String {
    let parsed = DateTime::parse_from_rfc3339(date)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"));

    match parsed {
        Ok(day) => day.format("%B %-d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

/// Password-style masking, one bullet per character
pub fn mask_secret(value: &str) -> String {
    "•".repeat(value.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("5551234567"), "(555) 123-4567");
        assert_eq!(format_phone("+1-555-123-4567"), "(555) 123-4567");
        assert_eq!(format_phone("123"), "123");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Ünïcödé text", 6), "Ünï...");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("1990-05-15"), "May 15, 1990");
        assert_eq!(format_date("2023-08-01T14:30:00Z"), "August 1, 2023");
        assert_eq!(format_date("2025-05-19T09:15:00.000Z"), "May 19, 2025");
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("someday"), "someday");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abc"), "•••");
        assert_eq!(mask_secret(""), "");
    }
}
