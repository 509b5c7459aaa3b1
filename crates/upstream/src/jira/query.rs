use chrono::NaiveDate;

/// Build a JQL query for all issues assigned to one account, optionally
/// bounded by an updated-date window.
///
/// Generates: `assignee = "557058:abc" AND updated >= "2026-02-01" ORDER BY updated ASC`
pub fn build_member_issues_jql(
    account_id: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> String {
    let mut clauses = vec![format!("assignee = {}", escape_jql_value(account_id))];
    if let Some(window) = date_window_clause(start, end) {
        clauses.push(window);
    }
    format!("{} ORDER BY updated ASC", clauses.join(" AND "))
}

/// Build the updated-date window clause, or `None` when no bound is given.
pub fn date_window_clause(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(s) = start {
        parts.push(format!("updated >= \"{}\"", s.format("%Y-%m-%d")));
    }
    if let Some(e) = end {
        parts.push(format!("updated <= \"{}\"", e.format("%Y-%m-%d")));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" AND "))
    }
}

/// Escape a JQL value — wrap in quotes if it contains special characters.
fn escape_jql_value(value: &str) -> String {
    if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn member_jql_without_window() {
        let jql = build_member_issues_jql("abc123", None, None);
        assert_eq!(jql, "assignee = abc123 ORDER BY updated ASC");
    }

    #[test]
    fn member_jql_with_full_window() {
        let jql =
            build_member_issues_jql("abc123", Some(date(2026, 2, 1)), Some(date(2026, 2, 28)));
        assert_eq!(
            jql,
            "assignee = abc123 AND updated >= \"2026-02-01\" AND updated <= \"2026-02-28\" \
             ORDER BY updated ASC"
        );
    }

    #[test]
    fn account_id_with_colon_is_quoted() {
        let jql = build_member_issues_jql("557058:f58131cb", None, None);
        assert!(jql.starts_with("assignee = \"557058:f58131cb\""), "got: {jql}");
    }

    #[test]
    fn window_clause_start_only() {
        let clause = date_window_clause(Some(date(2026, 1, 15)), None).unwrap();
        assert_eq!(clause, "updated >= \"2026-01-15\"");
    }

    #[test]
    fn window_clause_end_only() {
        let clause = date_window_clause(None, Some(date(2026, 1, 31))).unwrap();
        assert_eq!(clause, "updated <= \"2026-01-31\"");
    }

    #[test]
    fn window_clause_empty_when_unbounded() {
        assert!(date_window_clause(None, None).is_none());
    }

    #[test]
    fn plain_alphanumeric_value_not_quoted() {
        assert_eq!(escape_jql_value("DEV"), "DEV");
    }

    #[test]
    fn value_with_quote_is_escaped() {
        assert_eq!(escape_jql_value("a\"b"), "\"a\\\"b\"");
    }
}
