use serde_json::Value;

use super::error::QueryError;
use super::types::{Comparator, FieldFilter, PopulateSpec, SortDirection, SortKey};
use crate::config;

/// Reserved parameter names, never treated as filters
const RESERVED: [&str; 4] = ["select", "sort", "page", "limit"];

/// Structured form of a list request's query string: filters, projection,
/// sort keys and pagination. Built fresh per request, used once, discarded.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    pub filters: Vec<FieldFilter>,
    pub select: Vec<String>,
    pub sort: Vec<SortKey>,
    pub page: i64,
    pub limit: i64,
    pub populate: Option<PopulateSpec>,
    /// Columns of the target table with Postgres array types; filters on
    /// these render as membership tests instead of scalar comparisons
    pub array_columns: &'static [&'static str],
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self {
            filters: vec![],
            select: vec![],
            sort: vec![],
            page: 1,
            limit: config::config().query.default_limit,
            populate: None,
            array_columns: &[],
        }
    }
}

impl QueryDescriptor {
    /// Parse raw query-string pairs (repeated keys allowed, bracketed
    /// comparator suffixes rewritten to tagged filters).
    ///
    /// Malformed `page`/`limit` values coerce to their defaults rather than
    /// erroring; unknown comparators and unsafe field names are rejected.
    pub fn from_params(params: &[(String, String)]) -> Result<Self, QueryError> {
        let mut descriptor = Self::default();

        for (key, value) in params {
            match key.as_str() {
                "select" => {
                    descriptor.select = split_fields(value)
                        .map(|f| validate_identifier(f).map(str::to_string))
                        .collect::<Result<_, _>>()?;
                }
                "sort" => {
                    descriptor.sort = split_fields(value)
                        .map(parse_sort_key)
                        .collect::<Result<_, _>>()?;
                }
                "page" => {
                    descriptor.page = coerce_positive(value, 1);
                }
                "limit" => {
                    let default = config::config().query.default_limit;
                    descriptor.limit =
                        coerce_positive(value, default).min(config::config().query.max_limit);
                }
                field => {
                    descriptor.filters.push(parse_filter(field, value)?);
                }
            }
        }

        Ok(descriptor)
    }

    /// Add an equality constraint, used by nested routes to scope the
    /// listing to a parent resource.
    pub fn and_eq(&mut self, field: &'static str, value: Value) -> &mut Self {
        self.filters.push(FieldFilter {
            field: field.to_string(),
            comparator: Comparator::Eq,
            value,
        });
        self
    }

    pub fn populate(&mut self, spec: PopulateSpec) -> &mut Self {
        self.populate = Some(spec);
        self
    }

    pub fn array_columns(&mut self, columns: &'static [&'static str]) -> &mut Self {
        self.array_columns = columns;
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Rewrite one raw parameter into a filter entry. `price[gte]=100` becomes
/// (price, Gte, 100); bare `key=value` is an equality filter.
fn parse_filter(key: &str, value: &str) -> Result<FieldFilter, QueryError> {
    let (field, comparator) = match key.find('[') {
        Some(open) if key.ends_with(']') => {
            let op = &key[open + 1..key.len() - 1];
            let comparator = Comparator::parse(op)
                .ok_or_else(|| QueryError::UnsupportedComparator(op.to_string()))?;
            (&key[..open], comparator)
        }
        Some(_) => return Err(QueryError::MalformedParameter(key.to_string())),
        None => (key, Comparator::Eq),
    };

    validate_identifier(field)?;

    let value = if comparator == Comparator::In {
        Value::Array(value.split(',').map(str::trim).map(coerce_scalar).collect())
    } else {
        coerce_scalar(value)
    };

    Ok(FieldFilter {
        field: field.to_string(),
        comparator,
        value,
    })
}

fn parse_sort_key(token: &str) -> Result<SortKey, QueryError> {
    let (field, direction) = match token.strip_prefix('-') {
        Some(rest) => (rest, SortDirection::Desc),
        None => (token, SortDirection::Asc),
    };
    validate_identifier(field)?;
    Ok(SortKey {
        field: field.to_string(),
        direction,
    })
}

fn split_fields(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Query values arrive as strings; coerce so numeric and boolean columns
/// compare with the right Postgres types.
fn coerce_scalar(s: &str) -> Value {
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::from(f);
    }
    match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(s.to_string()),
    }
}

/// Permissive pagination policy: non-numeric or out-of-range input falls
/// back to the default instead of erroring.
fn coerce_positive(s: &str, default: i64) -> i64 {
    match s.trim().parse::<i64>() {
        Ok(n) if n >= 1 => n,
        _ => default,
    }
}

/// Field names are interpolated into SQL as quoted identifiers, so they are
/// restricted to `[A-Za-z_][A-Za-z0-9_]*`.
fn validate_identifier(name: &str) -> Result<&str, QueryError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(QueryError::InvalidField(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bare_key_becomes_equality_filter() {
        let d = QueryDescriptor::from_params(&params(&[("housing", "true")])).unwrap();
        assert_eq!(d.filters.len(), 1);
        assert_eq!(d.filters[0].field, "housing");
        assert_eq!(d.filters[0].comparator, Comparator::Eq);
        assert_eq!(d.filters[0].value, Value::Bool(true));
    }

    #[test]
    fn bracketed_comparator_is_rewritten() {
        let d = QueryDescriptor::from_params(&params(&[
            ("price[gte]", "100"),
            ("price[lte]", "500"),
        ]))
        .unwrap();
        assert_eq!(d.filters.len(), 2);
        assert_eq!(d.filters[0].comparator, Comparator::Gte);
        assert_eq!(d.filters[0].value, Value::from(100));
        assert_eq!(d.filters[1].comparator, Comparator::Lte);
        assert_eq!(d.filters[1].value, Value::from(500));
    }

    #[test]
    fn in_comparator_splits_comma_list() {
        let d =
            QueryDescriptor::from_params(&params(&[("careers[in]", "Business,UI/UX")])).unwrap();
        assert_eq!(d.filters[0].comparator, Comparator::In);
        assert_eq!(
            d.filters[0].value,
            serde_json::json!(["Business", "UI/UX"])
        );
    }

    #[test]
    fn unknown_comparator_is_rejected() {
        let err = QueryDescriptor::from_params(&params(&[("price[regex]", "x")])).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedComparator(op) if op == "regex"));
    }

    #[test]
    fn reserved_keys_never_become_filters() {
        let d = QueryDescriptor::from_params(&params(&[
            ("select", "name,description"),
            ("sort", "-created_at,name"),
            ("page", "2"),
            ("limit", "10"),
        ]))
        .unwrap();
        assert!(d.filters.is_empty());
        assert_eq!(d.select, vec!["name", "description"]);
        assert_eq!(d.sort.len(), 2);
        assert_eq!(d.sort[0].field, "created_at");
        assert_eq!(d.sort[0].direction, SortDirection::Desc);
        assert_eq!(d.sort[1].direction, SortDirection::Asc);
        assert_eq!(d.page, 2);
        assert_eq!(d.limit, 10);
        assert_eq!(d.offset(), 10);
    }

    #[test]
    fn malformed_page_falls_back_to_default() {
        let d = QueryDescriptor::from_params(&params(&[("page", "abc"), ("limit", "-5")])).unwrap();
        assert_eq!(d.page, 1);
        assert_eq!(d.limit, config::config().query.default_limit);
    }

    #[test]
    fn zero_page_falls_back_to_default() {
        let d = QueryDescriptor::from_params(&params(&[("page", "0")])).unwrap();
        assert_eq!(d.page, 1);
    }

    #[test]
    fn oversized_limit_is_capped() {
        let d = QueryDescriptor::from_params(&params(&[("limit", "9999999")])).unwrap();
        assert_eq!(d.limit, config::config().query.max_limit);
    }

    #[test]
    fn unsafe_field_names_are_rejected() {
        let err =
            QueryDescriptor::from_params(&params(&[("name\"; DROP TABLE x; --", "1")]))
                .unwrap_err();
        assert!(matches!(err, QueryError::InvalidField(_)));

        let err = QueryDescriptor::from_params(&params(&[("select", "name,bad-col")])).unwrap_err();
        assert!(matches!(err, QueryError::InvalidField(_)));
    }

    #[test]
    fn scoping_adds_equality_filter() {
        let mut d = QueryDescriptor::default();
        d.and_eq("bootcamp_id", Value::String("abc".into()));
        assert_eq!(d.filters.len(), 1);
        assert_eq!(d.filters[0].comparator, Comparator::Eq);
    }
}
