use serde_json::Value;

use super::descriptor::QueryDescriptor;
use super::types::Comparator;

/// Parameterized SQL for one list request: the page query, the matching
/// COUNT query, and the shared bind parameters.
#[derive(Debug, Clone)]
pub struct SqlQuery {
    pub data_sql: String,
    pub count_sql: String,
    pub params: Vec<Value>,
}

/// Render a descriptor against a table. Field names were validated when the
/// descriptor was built, so generation cannot fail; values travel as `$n`
/// bind parameters.
pub fn build(descriptor: &QueryDescriptor, table: &str) -> SqlQuery {
    let mut params: Vec<Value> = vec![];
    let where_clause = build_where(descriptor, &mut params);
    let order_clause = build_order(descriptor);
    let select_clause = build_select(descriptor);

    let data_sql = format!(
        "SELECT row_to_json(t) AS item FROM (SELECT {} FROM \"{}\"{}{} LIMIT {} OFFSET {}) t",
        select_clause,
        table,
        where_clause,
        order_clause,
        descriptor.limit,
        descriptor.offset(),
    );

    // Same predicate, no pagination: the total the Pagination Result needs
    let count_sql = format!(
        "SELECT COUNT(*) AS count FROM \"{}\"{}",
        table, where_clause
    );

    SqlQuery {
        data_sql,
        count_sql,
        params,
    }
}

fn build_where(descriptor: &QueryDescriptor, params: &mut Vec<Value>) -> String {
    let mut conditions: Vec<String> = vec![];

    for filter in &descriptor.filters {
        let quoted = format!("\"{}\"", filter.field);
        let is_array_column = descriptor
            .array_columns
            .contains(&filter.field.as_str());
        match filter.comparator {
            Comparator::In => match &filter.value {
                Value::Array(values) if values.is_empty() => {
                    conditions.push("1=0".to_string());
                }
                Value::Array(values) => {
                    let placeholders: Vec<String> = values
                        .iter()
                        .map(|v| push_param(params, v.clone()))
                        .collect();
                    if is_array_column {
                        // Overlap test: any requested value present in the
                        // stored array
                        conditions.push(format!(
                            "{} && ARRAY[{}]",
                            quoted,
                            placeholders.join(", ")
                        ));
                    } else {
                        conditions.push(format!("{} IN ({})", quoted, placeholders.join(", ")));
                    }
                }
                other => {
                    let p = push_param(params, other.clone());
                    conditions.push(scalar_condition(&quoted, "=", &p, is_array_column));
                }
            },
            comparator => {
                let p = push_param(params, filter.value.clone());
                conditions.push(scalar_condition(
                    &quoted,
                    comparator.to_sql(),
                    &p,
                    is_array_column,
                ));
            }
        }
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn build_order(descriptor: &QueryDescriptor) -> String {
    if descriptor.sort.is_empty() {
        // Default: newest first
        return " ORDER BY \"created_at\" DESC".to_string();
    }
    let parts: Vec<String> = descriptor
        .sort
        .iter()
        .map(|k| format!("\"{}\" {}", k.field, k.direction.to_sql()))
        .collect();
    format!(" ORDER BY {}", parts.join(", "))
}

fn build_select(descriptor: &QueryDescriptor) -> String {
    if descriptor.select.is_empty() {
        return "*".to_string();
    }

    // `id` always rides along, and population needs its foreign key present
    let mut columns: Vec<&str> = vec!["id"];
    for col in &descriptor.select {
        if !columns.contains(&col.as_str()) {
            columns.push(col);
        }
    }
    if let Some(populate) = &descriptor.populate {
        if !columns.contains(&populate.foreign_key) {
            columns.push(populate.foreign_key);
        }
    }

    columns
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_param(params: &mut Vec<Value>, value: Value) -> String {
    params.push(value);
    format!("${}", params.len())
}

/// Equality against an array column means element membership. Ordering
/// comparators keep their scalar form; the database rejects them and the
/// error mapping turns that into a 400.
fn scalar_condition(quoted: &str, op: &str, placeholder: &str, is_array_column: bool) -> String {
    if is_array_column && op == "=" {
        format!("{} = ANY({})", placeholder, quoted)
    } else {
        format!("{} {} {}", quoted, op, placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(pairs: &[(&str, &str)]) -> QueryDescriptor {
        let params: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        QueryDescriptor::from_params(&params).unwrap()
    }

    #[test]
    fn range_filter_generates_numbered_params() {
        let d = descriptor(&[("price[gte]", "100"), ("price[lte]", "500")]);
        let q = build(&d, "courses");
        assert!(q.data_sql.contains("\"price\" >= $1 AND \"price\" <= $2"));
        assert_eq!(q.params, vec![json!(100), json!(500)]);
        assert!(q.count_sql.contains("\"price\" >= $1 AND \"price\" <= $2"));
        assert!(!q.count_sql.contains("LIMIT"));
    }

    #[test]
    fn in_filter_expands_placeholders() {
        let d = descriptor(&[("careers[in]", "Business,Data Science")]);
        let q = build(&d, "bootcamps");
        assert!(q.data_sql.contains("\"careers\" IN ($1, $2)"));
        assert_eq!(q.params, vec![json!("Business"), json!("Data Science")]);
    }

    #[test]
    fn in_filter_on_array_column_uses_overlap() {
        let mut d = descriptor(&[("careers[in]", "Business,Data Science")]);
        d.array_columns(&["careers"]);
        let q = build(&d, "bootcamps");
        assert!(q.data_sql.contains("\"careers\" && ARRAY[$1, $2]"));
        assert!(q.count_sql.contains("\"careers\" && ARRAY[$1, $2]"));
        assert_eq!(q.params, vec![json!("Business"), json!("Data Science")]);
    }

    #[test]
    fn equality_on_array_column_uses_membership() {
        let mut d = descriptor(&[("careers", "Business")]);
        d.array_columns(&["careers"]);
        let q = build(&d, "bootcamps");
        assert!(q.data_sql.contains("$1 = ANY(\"careers\")"));
        assert_eq!(q.params, vec![json!("Business")]);
    }

    #[test]
    fn array_columns_do_not_affect_scalar_fields() {
        let mut d = descriptor(&[("careers", "Business"), ("name", "Devworks")]);
        d.array_columns(&["careers"]);
        let q = build(&d, "bootcamps");
        assert!(q.data_sql.contains("\"name\" = $"));
        assert!(!q.data_sql.contains("ANY(\"name\")"));
    }

    #[test]
    fn default_sort_is_created_at_desc() {
        let d = descriptor(&[]);
        let q = build(&d, "bootcamps");
        assert!(q.data_sql.contains("ORDER BY \"created_at\" DESC"));
    }

    #[test]
    fn explicit_sort_overrides_default() {
        let d = descriptor(&[("sort", "-tuition,title")]);
        let q = build(&d, "courses");
        assert!(q
            .data_sql
            .contains("ORDER BY \"tuition\" DESC, \"title\" ASC"));
    }

    #[test]
    fn pagination_arithmetic() {
        let d = descriptor(&[("page", "3"), ("limit", "10")]);
        let q = build(&d, "bootcamps");
        assert!(q.data_sql.contains("LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn select_keeps_id_and_quotes_columns() {
        let d = descriptor(&[("select", "name,description")]);
        let q = build(&d, "bootcamps");
        assert!(q
            .data_sql
            .contains("SELECT \"id\", \"name\", \"description\" FROM"));
    }

    #[test]
    fn select_includes_populate_foreign_key() {
        use crate::query::types::PopulateSpec;

        let mut d = descriptor(&[("select", "title")]);
        d.populate(PopulateSpec {
            relation: "bootcamp",
            table: "bootcamps",
            foreign_key: "bootcamp_id",
            fields: &["name", "description"],
        });
        let q = build(&d, "courses");
        assert!(q.data_sql.contains("\"bootcamp_id\""));
    }

    #[test]
    fn no_filters_means_no_where_clause() {
        let d = descriptor(&[]);
        let q = build(&d, "reviews");
        assert!(!q.data_sql.contains("WHERE"));
        assert!(q.params.is_empty());
    }
}
