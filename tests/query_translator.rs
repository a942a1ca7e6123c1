// End-to-end translator coverage: URL-style parameters in, parameterized
// SQL out. No database required.

use anyhow::Result;

use campdir::query::sql;
use campdir::query::{Comparator, Pagination, QueryDescriptor, QueryError};

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn bracket_comparators_become_bind_parameters() -> Result<()> {
    let descriptor = QueryDescriptor::from_params(&params(&[
        ("averageCost[lte]", "10000"),
        ("housing", "true"),
    ]))?;

    let sql = sql::build(&descriptor, "bootcamps");
    assert!(sql.data_sql.contains(r#""averageCost" <= $1"#), "{}", sql.data_sql);
    assert!(sql.data_sql.contains(r#""housing" = $2"#), "{}", sql.data_sql);
    assert_eq!(sql.params.len(), 2);
    assert_eq!(sql.params[0], serde_json::json!(10000));
    assert_eq!(sql.params[1], serde_json::json!(true));
    Ok(())
}

#[test]
fn count_query_ignores_pagination() -> Result<()> {
    let descriptor = QueryDescriptor::from_params(&params(&[
        ("careers[in]", "Business,UI/UX"),
        ("page", "3"),
        ("limit", "5"),
    ]))?;

    let sql = sql::build(&descriptor, "bootcamps");
    assert!(sql.data_sql.contains("LIMIT 5 OFFSET 10"), "{}", sql.data_sql);
    assert!(!sql.count_sql.contains("LIMIT"), "{}", sql.count_sql);
    assert!(!sql.count_sql.contains("OFFSET"), "{}", sql.count_sql);
    // Same WHERE clause feeds both queries
    assert!(sql.count_sql.contains("IN ($1, $2)"), "{}", sql.count_sql);
    Ok(())
}

#[test]
fn array_column_filters_render_as_membership_tests() -> Result<()> {
    let mut descriptor = QueryDescriptor::from_params(&params(&[
        ("careers[in]", "Business,Data Science"),
        ("housing", "true"),
    ]))?;
    descriptor.array_columns(&["careers"]);

    let sql = sql::build(&descriptor, "bootcamps");
    assert!(
        sql.data_sql.contains(r#""careers" && ARRAY[$"#),
        "{}",
        sql.data_sql
    );
    assert!(sql.data_sql.contains(r#""housing" = $"#), "{}", sql.data_sql);
    assert_eq!(sql.params.len(), 3);
    Ok(())
}

#[test]
fn select_and_sort_are_projected_into_the_inner_query() -> Result<()> {
    let descriptor = QueryDescriptor::from_params(&params(&[
        ("select", "name,description"),
        ("sort", "-name"),
    ]))?;

    let sql = sql::build(&descriptor, "bootcamps");
    assert!(sql.data_sql.contains(r#"SELECT "id", "name", "description" FROM"#), "{}", sql.data_sql);
    assert!(sql.data_sql.contains(r#"ORDER BY "name" DESC"#), "{}", sql.data_sql);
    Ok(())
}

#[test]
fn unknown_comparator_is_rejected() {
    let err = QueryDescriptor::from_params(&params(&[("price[regex]", "x")])).unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedComparator { .. }));
}

#[test]
fn sql_metacharacters_in_field_names_are_rejected() {
    for field in ["name;drop table users", "a b", "name\"", "1name"] {
        let pairs = params(&[(&format!("{}[gte]", field), "1")]);
        assert!(
            QueryDescriptor::from_params(&pairs).is_err(),
            "accepted hostile field {:?}",
            field
        );
    }
}

#[test]
fn values_never_appear_in_generated_sql() -> Result<()> {
    let hostile = "'; DROP TABLE bootcamps; --";
    let descriptor = QueryDescriptor::from_params(&params(&[("name", hostile)]))?;

    let sql = sql::build(&descriptor, "bootcamps");
    assert!(!sql.data_sql.contains("DROP"), "{}", sql.data_sql);
    assert_eq!(sql.params[0], serde_json::json!(hostile));
    Ok(())
}

#[test]
fn malformed_pagination_coerces_to_defaults() -> Result<()> {
    let descriptor = QueryDescriptor::from_params(&params(&[
        ("page", "banana"),
        ("limit", "-3"),
    ]))?;

    assert_eq!(descriptor.page, 1);
    assert_eq!(descriptor.limit, campdir::config::config().query.default_limit);
    Ok(())
}

#[test]
fn comparator_parsing_covers_the_full_set() {
    for (name, sql) in [
        ("eq", "="),
        ("gt", ">"),
        ("gte", ">="),
        ("lt", "<"),
        ("lte", "<="),
    ] {
        let c = Comparator::parse(name).unwrap();
        assert_eq!(c.to_sql(), sql);
    }
    assert!(Comparator::parse("ne").is_none());
}

// Pagination envelope properties: next iff more rows exist past this page,
// prev iff we are past the first page.

#[test]
fn pagination_middle_page_has_both_links() {
    let p = Pagination::compute(2, 10, 35);
    let next = p.next.expect("next");
    let prev = p.prev.expect("prev");
    assert_eq!(next.page, 3);
    assert_eq!(prev.page, 1);
}

#[test]
fn pagination_boundaries() {
    // Exactly consumed: page 2 of 20 with limit 10 has no next
    let p = Pagination::compute(2, 10, 20);
    assert!(p.next.is_none());
    assert!(p.prev.is_some());

    // First page of a small result set has neither
    let p = Pagination::compute(1, 25, 10);
    assert!(p.next.is_none());
    assert!(p.prev.is_none());

    // Page beyond the data still reports prev only
    let p = Pagination::compute(9, 10, 35);
    assert!(p.next.is_none());
    assert_eq!(p.prev.unwrap().page, 8);
}
