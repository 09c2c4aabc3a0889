use serde::{Deserialize, Serialize};

/// Day-over-day change of a metric, kept signed.
///
/// Storage uses [`SignedDelta::magnitude`]; chart annotations use
/// [`SignedDelta::label`]. Both come from the same signed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedDelta(pub i64);

impl SignedDelta {
    /// Change from `previous` to `current`.
    pub fn between(previous: i64, current: i64) -> Self {
        SignedDelta(current - previous)
    }

    pub fn signed(&self) -> i64 {
        self.0
    }

    /// Absolute value of the change.
    pub fn magnitude(&self) -> i64 {
        self.0.abs()
    }

    /// `"+N"`, `"-N"`, or `"+0"`.
    pub fn label(&self) -> String {
        format_signed_delta(self.0)
    }
}

/// Delta between two cumulative values: `(|second - first|, "+N"/"-N")`.
///
/// # Examples
///
/// ```
/// use covid_core::formatting::calculate_delta;
///
/// assert_eq!(calculate_delta(10, 15), (5, "+5".to_string()));
/// assert_eq!(calculate_delta(15, 12), (3, "-3".to_string()));
/// assert_eq!(calculate_delta(7, 7), (0, "+0".to_string()));
/// ```
pub fn calculate_delta(first: i64, second: i64) -> (i64, String) {
    let delta = SignedDelta::between(first, second);
    (delta.magnitude(), delta.label())
}

/// Format a signed integer with an explicit sign; zero is `"+0"`.
///
/// # Examples
///
/// ```
/// use covid_core::formatting::format_signed_delta;
///
/// assert_eq!(format_signed_delta(12), "+12");
/// assert_eq!(format_signed_delta(-3), "-3");
/// assert_eq!(format_signed_delta(0), "+0");
/// ```
pub fn format_signed_delta(value: i64) -> String {
    format!("{:+}", value)
}

/// Format a count with thousands separators.
///
/// # Examples
///
/// ```
/// use covid_core::formatting::format_count;
///
/// assert_eq!(format_count(1234567), "1,234,567");
/// assert_eq!(format_count(-9876), "-9,876");
/// assert_eq!(format_count(42), "42");
/// ```
pub fn format_count(value: i64) -> String {
    let grouped = group_thousands(&value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
