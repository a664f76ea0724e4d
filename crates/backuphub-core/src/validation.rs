//! Cron expression validation and normalization.
//!
//! Operators write standard five-field expressions (`min hour dom month dow`).
//! Six-field expressions with a leading seconds field and `@` shortcuts such
//! as `@daily` are accepted too. The scheduler always receives the six-field
//! form.

use croner::Cron;
use croner::parser::{CronParser, Seconds};

/// Whether `expression` is a well-formed cron expression.
///
/// Pure and deterministic; no side effects.
pub fn validate_cron_expression(expression: &str) -> bool {
    parse_schedule(expression).is_some()
}

/// Rewrite a valid expression into the six-field form (seconds first).
///
/// Returns `None` for malformed input.
pub fn normalize_cron_expression(expression: &str) -> Option<String> {
    parse_schedule(expression)?;

    let trimmed = expression.trim();
    if trimmed.starts_with('@') {
        return Some(trimmed.to_string());
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    match fields.len() {
        5 => Some(format!("0 {}", fields.join(" "))),
        _ => Some(fields.join(" ")),
    }
}

/// Parses with the same settings the scheduler uses, so anything accepted
/// here is also accepted when the job is registered.
fn parse_schedule(expression: &str) -> Option<Cron> {
    let parser = CronParser::builder().seconds(Seconds::Required).build();
    let trimmed = expression.trim();
    if trimmed.starts_with('@') {
        return parser.parse(trimmed).ok();
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    let candidate = match fields.len() {
        5 => format!("0 {}", fields.join(" ")),
        6 => fields.join(" "),
        _ => return None,
    };

    parser.parse(&candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_standard_five_field() {
        assert!(validate_cron_expression("0 2 * * *"));
        assert!(validate_cron_expression("*/15 * * * *"));
        assert!(validate_cron_expression("30 4 1 * *"));
    }

    #[test]
    fn test_accepts_six_field_and_shortcuts() {
        assert!(validate_cron_expression("0 0 3 * * *"));
        assert!(validate_cron_expression("@daily"));
    }

    #[test]
    fn test_accepts_sunday_and_weekday_ranges() {
        assert!(validate_cron_expression("0 2 * * 0"));
        assert!(validate_cron_expression("0 2 * * 0-6"));
        assert!(validate_cron_expression("0 2 * * 7"));
        assert!(validate_cron_expression("0 2 * * 1-5"));
        assert_eq!(
            normalize_cron_expression("0 2 * * 0").as_deref(),
            Some("0 0 2 * * 0")
        );
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(!validate_cron_expression("* * *"));
        assert!(!validate_cron_expression("not-a-cron"));
        assert!(!validate_cron_expression(""));
        assert!(!validate_cron_expression("61 2 * * *"));
        assert!(!validate_cron_expression("0 25 * * *"));
        assert!(!validate_cron_expression("* * * * * * * *"));
    }

    #[test]
    fn test_validation_is_deterministic() {
        for _ in 0..3 {
            assert!(validate_cron_expression("0 2 * * *"));
            assert!(!validate_cron_expression("* * *"));
        }
    }

    #[test]
    fn test_normalize_prepends_seconds() {
        assert_eq!(
            normalize_cron_expression("0 2 * * *").as_deref(),
            Some("0 0 2 * * *")
        );
        assert_eq!(
            normalize_cron_expression("  0   0 3 * * * ").as_deref(),
            Some("0 0 3 * * *")
        );
        assert_eq!(normalize_cron_expression("not-a-cron"), None);
    }
}
