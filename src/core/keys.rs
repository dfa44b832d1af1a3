//! Composite document keys.
//!
//! These formats are shared with records written by earlier tooling and must
//! stay bit-exact.

/// Identity key of a daily record: `{uid}|{date}|{lowercase(operator)}|{lowercase(route)}`.
#[must_use]
pub fn daily_record_key(uid: &str, date: &str, operator_id: &str, route: &str) -> String {
    format!(
        "{uid}|{date}|{}|{}",
        operator_id.to_lowercase(),
        route.to_lowercase()
    )
}

/// Identity key of a route: both parts lowercased, joined with `_`, then uppercased.
#[must_use]
pub fn route_key(route: &str, operator_id: &str) -> String {
    format!("{}_{}", route.to_lowercase(), operator_id.to_lowercase()).to_uppercase()
}

/// Identity key of a final payout: `{uid}|{start}~{end}`.
#[must_use]
pub fn final_payout_key(uid: &str, start_date: &str, end_date: &str) -> String {
    format!("{uid}|{start_date}~{end_date}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_record_key_lowercases_operator_and_route() {
        assert_eq!(
            daily_record_key("u1", "2024-05-01", "CP1", "B101"),
            "u1|2024-05-01|cp1|b101"
        );
    }

    #[test]
    fn test_daily_record_key_keeps_uid_case() {
        assert_eq!(
            daily_record_key("AbC", "2024-05-01", "cp1", "b101"),
            "AbC|2024-05-01|cp1|b101"
        );
    }

    #[test]
    fn test_route_key_is_uppercase_regardless_of_input_case() {
        assert_eq!(route_key("b101", "cp1"), "B101_CP1");
        assert_eq!(route_key("B101", "Cp1"), "B101_CP1");
    }

    #[test]
    fn test_final_payout_key() {
        assert_eq!(
            final_payout_key("u1", "2024-05-01", "2024-05-31"),
            "u1|2024-05-01~2024-05-31"
        );
    }
}
