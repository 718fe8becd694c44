//! End-to-end tests for parsing, evaluating and compiling filters.
//!
//! Each query is run through the in-memory evaluator and every backend
//! converter, checking that all of them agree on the same status data.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value as Json};

use icinga_filter::convert::{
    BackendKind, BackendPredicate, ColumnMap, Converter, IdentityMapper, SqlConverter, SqlParam,
};
use icinga_filter::filter::{Filter, FilterContext, FilterEvaluator, ParserOptions, QueryParser};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

fn services() -> Vec<Json> {
    vec![
        json!({"host": "localhost", "service": "ping", "state": 2, "problem": 1, "handled": 1, "last_check": 1_710_503_000}),
        json!({"host": "localhost", "service": "www.icinga.org", "state": 0, "problem": 1, "handled": 0, "last_check": 1_710_300_000}),
        json!({"host": "localhost", "service": "www.icinga.org", "state": 1, "problem": 1, "handled": 0}),
        json!({"host": "nohost01", "service": "ups-battery", "state": 3, "problem": 1, "handled": 0, "last_check": 1_710_500_000}),
        json!({"host": "db01", "service": "mysql", "state": 0, "problem": 0, "handled": 0, "last_check": 1_710_503_500}),
    ]
}

fn matching_services(query: &str) -> Vec<String> {
    let tree = QueryParser::parse(query).tree;
    let context = FilterContext::at(now()).with_timestamp_columns(["last_check"]);
    let rows = services();
    FilterEvaluator::new(&tree, &context)
        .filter_rows(&rows)
        .into_iter()
        .map(|row| format!("{}!{}", row["host"].as_str().unwrap(), row["service"].as_str().unwrap()))
        .collect()
}

#[test]
fn test_e2e_complex_query_against_json_rows() {
    init_logging();
    let query = "host=localhost|nohost*&problem&service=*www*|ups*&state!=1&!handled";
    assert_eq!(
        matching_services(query),
        vec!["localhost!www.icinga.org", "nohost01!ups-battery"]
    );
}

#[test]
fn test_e2e_time_strings_against_json_rows() {
    init_logging();
    assert_eq!(
        matching_services("last_check>-1+hour"),
        vec!["localhost!ping", "db01!mysql"]
    );
    assert_eq!(
        matching_services("last_check<yesterday"),
        vec!["localhost!www.icinga.org"]
    );
}

#[test]
fn test_e2e_statusdat_agrees_with_evaluator() {
    init_logging();
    let queries = [
        "host=localhost|nohost*&problem&service=*www*|ups*&state!=1&!handled",
        "state>=2|service=mysql",
        "!(host=localhost|state=0)",
        "service!=ping|www*",
    ];
    let rows = services();
    for query in queries {
        let tree = QueryParser::parse(query).tree;
        let BackendPredicate::Statusdat(predicate) =
            BackendKind::Statusdat.compile_at(&tree, &IdentityMapper, now())
        else {
            panic!("expected a status.dat predicate");
        };
        let context = FilterContext::at(now());
        let evaluator = FilterEvaluator::new(&tree, &context);
        for row in &rows {
            assert_eq!(predicate.matches(row), evaluator.matches(row), "{query} on {row}");
        }
    }
}

#[test]
fn test_e2e_ido_predicate_for_search_box_query() {
    init_logging();
    let mut columns = ColumnMap::default();
    columns.columns.insert("host".into(), "h.display_name".into());
    columns.columns.insert("service".into(), "s.display_name".into());
    columns.columns.insert("state".into(), "ss.current_state".into());
    columns.columns.insert("handled".into(), "ss.problem_has_been_acknowledged".into());

    let tree = QueryParser::parse("host=web*&service=http|https&state>=1&!handled&internal=1").tree;
    let predicate = SqlConverter::new().convert(&tree, &columns);
    assert_eq!(
        predicate.sql,
        "h.display_name LIKE ? ESCAPE '\\' AND s.display_name IN (?, ?) AND ss.current_state >= ? \
         AND (ss.problem_has_been_acknowledged IS NULL OR ss.problem_has_been_acknowledged = ?)"
    );
    assert_eq!(
        predicate.params,
        vec![
            SqlParam::Text("web%".to_string()),
            SqlParam::Text("http".to_string()),
            SqlParam::Text("https".to_string()),
            SqlParam::Integer(1),
            SqlParam::Integer(0),
        ]
    );
}

#[test]
fn test_e2e_every_backend_compiles() {
    init_logging();
    let tree = QueryParser::parse("host=web*&state>=1").tree;
    for kind in BackendKind::ALL {
        let predicate = kind.compile_at(&tree, &IdentityMapper, now());
        assert_eq!(predicate.kind(), kind);
        assert!(!predicate.is_empty());
        assert!(!predicate.to_string().is_empty());
    }

    let nothing = |_: &str| -> Option<String> { None };
    for kind in BackendKind::ALL {
        assert!(kind.compile_at(&tree, &nothing, now()).is_empty());
    }
}

#[test]
fn test_e2e_predicates_serialize_with_backend_tag() {
    let tree = QueryParser::parse("host=a").tree;
    let predicate = BackendKind::Livestatus.compile_at(&tree, &IdentityMapper, now());
    let json = serde_json::to_value(&predicate).unwrap();
    assert_eq!(json["backend"], "livestatus");
    assert_eq!(json["lines"], json!(["Filter: host = a"]));

    let predicate = BackendKind::Ido.compile_at(&tree, &IdentityMapper, now());
    let json = serde_json::to_value(&predicate).unwrap();
    assert_eq!(json["backend"], "ido");
    assert_eq!(json["params"], json!(["a"]));
}

#[test]
fn test_e2e_specialised_clone_per_backend() {
    let shared = Filter::from_query_string("host=web*&state=2");
    let mut ido = shared.clone();
    ido.rename_column("host", "host_name");

    assert_eq!(shared.to_query_string(), "host=web%2A&state=2");
    assert_eq!(ido.to_query_string(), "host_name=web%2A&state=2");
}

#[test]
fn test_e2e_allow_list_with_suggestions() {
    let options = ParserOptions::default().with_allowed_columns(["host", "service", "state"]);
    let result = QueryParser::parse_with("sevrice=ping&state=1", &options);
    assert_eq!(result.tree.to_string(), "state=1");
    let message = result.issues[0].to_string();
    assert!(message.contains("did you mean 'service'?"), "{message}");
}
