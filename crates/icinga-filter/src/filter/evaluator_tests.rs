//! Tests for filter evaluation.

use super::*;
use crate::filter::{Filter, QueryParser, Record};
use chrono::TimeZone;

// ==================== Test Helpers ====================

fn row(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::from(*v)))
        .collect()
}

fn check(query: &str, row: &Record) -> bool {
    let tree = QueryParser::parse(query).tree;
    let context = FilterContext::new();
    FilterEvaluator::new(&tree, &context).matches(row)
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

// ==================== Wildcards ====================

#[test]
fn test_wildcard_prefix_suffix_and_infix() {
    let r = row(&[("service", "www.icinga.org")]);
    assert!(Filter::where_("service", "www*").matches(&r));
    assert!(Filter::where_("service", "*org").matches(&r));
    assert!(Filter::where_("service", "*icinga*").matches(&r));
    assert!(!Filter::where_("service", "*net").matches(&r));
}

#[test]
fn test_wildcard_is_anchored() {
    let r = row(&[("service", "www.icinga.org")]);
    assert!(!Filter::where_("service", "icinga*").matches(&r));
    assert!(!Filter::where_("service", "*icinga").matches(&r));
}

#[test]
fn test_wildcard_is_case_insensitive() {
    let r = row(&[("service", "WWW.Icinga.org")]);
    assert!(Filter::where_("service", "www*").matches(&r));
}

#[test]
fn test_wildcard_escapes_regex_metacharacters() {
    let r = row(&[("service", "www.icinga.org")]);
    assert!(Filter::where_("service", "www.*").matches(&r));
    assert!(!Filter::where_("service", "w.w*").matches(&r));
    let r = row(&[("service", "a(b)+c")]);
    assert!(Filter::where_("service", "a(b)+*").matches(&r));
}

#[test]
fn test_lone_star_matches_any_present_value() {
    assert!(Filter::where_("host", "*").matches(&row(&[("host", "")])));
    assert!(!Filter::where_("host", "*").matches(&row(&[])));
}

// ==================== Equality ====================

#[test]
fn test_exact_equality_is_case_sensitive() {
    let r = row(&[("host", "localhost")]);
    assert!(Filter::where_("host", "localhost").matches(&r));
    assert!(!Filter::where_("host", "Localhost").matches(&r));
}

#[test]
fn test_numeric_texts_compare_numerically() {
    let r = row(&[("state", "2")]);
    assert!(Filter::where_("state", "2.0").matches(&r));
    assert!(Filter::where_("state", 2).matches(&r));
    assert!(!Filter::where_("state", "02x").matches(&r));
}

#[test]
fn test_large_integer_ids_compare_exactly() {
    let r = row(&[("id", "9007199254740992")]);
    assert!(!Filter::where_("id", "9007199254740993").matches(&r));
    assert!(Filter::where_("id", "9007199254740992").matches(&r));
    assert!(check("id>9007199254740991", &r));
    assert!(!check("id>9007199254740992", &r));
    assert!(check("id<9007199254740993", &r));
}

#[test]
fn test_multi_value_equals_any() {
    let r = row(&[("service", "ping")]);
    assert!(Filter::where_("service", ["ping", "nothing"]).matches(&r));
    assert!(!Filter::where_("service", ["http", "nothing"]).matches(&r));
}

#[test]
fn test_multi_value_equals_not_none() {
    let r = row(&[("service", "ping")]);
    assert!(!Filter::where_op("service", Operator::EqualsNot, ["ping", "http"]).matches(&r));
    assert!(Filter::where_op("service", Operator::EqualsNot, ["ssh", "http"]).matches(&r));
}

#[test]
fn test_boolean_literal_compares_truthiness() {
    assert!(check("problem", &row(&[("problem", "1")])));
    assert!(!check("problem", &row(&[("problem", "0")])));
    assert!(check("!handled", &row(&[("handled", "0")])));
    assert!(!check("!handled", &row(&[("handled", "1")])));
}

// ==================== Missing Fields ====================

#[test]
fn test_missing_field_fails_equals_and_ordering() {
    let r = row(&[("host", "localhost")]);
    assert!(!check("state=1", &r));
    assert!(!check("state>0", &r));
    assert!(!check("state<=9", &r));
    assert!(!check("problem", &r));
}

#[test]
fn test_missing_field_passes_equals_not() {
    let r = row(&[("host", "localhost")]);
    assert!(check("state!=1", &r));
    assert!(check("!problem", &r));
}

#[test]
fn test_null_is_treated_as_missing() {
    let mut r = Record::new();
    r.insert("state".to_string(), Value::Null);
    assert!(check("state!=1", &r));
    assert!(!check("state=1", &r));
}

// ==================== Ordering ====================

#[test]
fn test_ordering_numeric() {
    let r = row(&[("state", "10")]);
    assert!(check("state>9", &r));
    assert!(check("state>=10", &r));
    assert!(!check("state<10", &r));
    assert!(check("state<=10", &r));
}

#[test]
fn test_ordering_falls_back_to_lexical() {
    let r = row(&[("host", "beta")]);
    assert!(check("host>alpha", &r));
    assert!(!check("host>gamma", &r));
}

#[test]
fn test_time_string_ordering() {
    let context = FilterContext::at(fixed_now());
    let filter = Filter::where_time("last_check", Operator::Greater, "-1 day");

    let recent = row(&[("last_check", "1710500000")]);
    let stale = row(&[("last_check", "1710000000")]);
    assert!(filter.matches_with(&recent, &context));
    assert!(!filter.matches_with(&stale, &context));
}

#[test]
fn test_time_string_on_row_values() {
    let context = FilterContext::at(fixed_now()).with_timestamp_columns(["last_check"]);
    let tree = QueryParser::parse("last_check<yesterday").tree;
    let evaluator = FilterEvaluator::new(&tree, &context);

    assert!(evaluator.matches(&row(&[("last_check", "2024-03-01")])));
    assert!(!evaluator.matches(&row(&[("last_check", "2024-03-15 08:00")])));
    assert!(!evaluator.matches(&row(&[("last_check", "not a date")])));
}

#[test]
fn test_unresolvable_time_literal_fails() {
    let context = FilterContext::at(fixed_now());
    let filter = Filter::where_time("last_check", Operator::Greater, "whenever");
    assert!(!filter.matches_with(&row(&[("last_check", "1710500000")]), &context));
}

// ==================== Known Columns ====================

#[test]
fn test_unknown_columns_place_no_constraint() {
    let context = FilterContext::new().with_known_columns(["host"]);
    let tree = QueryParser::parse("host=localhost&secret=1").tree;
    let evaluator = FilterEvaluator::new(&tree, &context);
    assert!(evaluator.matches(&row(&[("host", "localhost")])));
    assert!(!evaluator.matches(&row(&[("host", "web01")])));

    let tree = QueryParser::parse("secret=1").tree;
    let evaluator = FilterEvaluator::new(&tree, &context);
    assert!(evaluator.matches(&row(&[("host", "web01")])));
}

#[test]
fn test_unknown_column_in_or_collapses() {
    let context = FilterContext::new().with_known_columns(["host"]);
    let tree = QueryParser::parse("host=localhost|secret=1").tree;
    let evaluator = FilterEvaluator::new(&tree, &context);
    assert!(!evaluator.matches(&row(&[("host", "web01")])));
}

// ==================== Trees ====================

#[test]
fn test_empty_tree_matches_everything() {
    let tree = Tree::empty();
    assert!(matches(&tree, &row(&[])));
    assert!(matches(&tree, &row(&[("host", "x")])));
}

#[test]
fn test_filter_rows() {
    let rows = vec![
        row(&[("host", "web01")]),
        row(&[("host", "db01")]),
        row(&[("host", "web02")]),
    ];
    let tree = QueryParser::parse("host=web*").tree;
    let context = FilterContext::new();
    let evaluator = FilterEvaluator::new(&tree, &context);
    let hosts: Vec<String> = evaluator
        .filter_rows(&rows)
        .into_iter()
        .map(|r| r["host"].to_string())
        .collect();
    assert_eq!(hosts, vec!["web01", "web02"]);
}

#[test]
fn test_json_rows() {
    let rows = serde_json::json!([
        {"host": {"name": "web01", "state": 0}},
        {"host": {"name": "web02", "state": 2}},
    ]);
    let rows = rows.as_array().unwrap();
    let tree = QueryParser::parse("host.state>0").tree;
    let context = FilterContext::new();
    let matching = FilterEvaluator::new(&tree, &context).filter_rows(rows);
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0]["host"]["name"], "web02");
}

#[test]
fn test_evaluation_is_deterministic() {
    let context = FilterContext::at(fixed_now());
    let tree = QueryParser::parse("host=web*&state>=1|problem").tree;
    let evaluator = FilterEvaluator::new(&tree, &context);
    let r = row(&[("host", "web01"), ("state", "2")]);
    let first = evaluator.matches(&r);
    for _ in 0..10 {
        assert_eq!(evaluator.matches(&r), first);
    }
    assert!(first);
}
