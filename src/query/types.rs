use serde::Serialize;
use serde_json::Value;

/// Comparators accepted in bracketed query parameters, e.g. `price[gte]=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Comparator {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "eq" => Comparator::Eq,
            "gt" => Comparator::Gt,
            "gte" => Comparator::Gte,
            "lt" => Comparator::Lt,
            "lte" => Comparator::Lte,
            "in" => Comparator::In,
            _ => return None,
        })
    }

    pub fn to_sql(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::In => "IN",
        }
    }
}

/// One field-comparator-value condition. For `In` the value is an array.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub comparator: Comparator,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Projection of a single related entity into each result document,
/// restricted to a caller-supplied list of safe fields.
#[derive(Debug, Clone, Copy)]
pub struct PopulateSpec {
    /// Key the populated object lands under (e.g. "bootcamp")
    pub relation: &'static str,
    /// Table the related rows live in
    pub table: &'static str,
    /// Foreign key column on the queried table
    pub foreign_key: &'static str,
    /// Columns of the related table exposed to clients
    pub fields: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

/// Position of the current page within the full result set.
/// `next` is present iff `page * limit < total`; `prev` iff `page > 1`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn compute(page: i64, limit: i64, total: i64) -> Self {
        Self {
            next: (page * limit < total).then_some(PageRef {
                page: page + 1,
                limit,
            }),
            prev: (page > 1).then_some(PageRef {
                page: page - 1,
                limit,
            }),
        }
    }
}

/// One page of results plus its pagination metadata
#[derive(Debug, Serialize)]
pub struct Page {
    pub count: usize,
    pub total: i64,
    pub pagination: Pagination,
    pub data: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_present_only_when_more_rows_exist() {
        let p = Pagination::compute(1, 25, 100);
        assert_eq!(p.next, Some(PageRef { page: 2, limit: 25 }));
        assert_eq!(p.prev, None);

        let p = Pagination::compute(4, 25, 100);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageRef { page: 3, limit: 25 }));
    }

    #[test]
    fn exact_boundary_has_no_next() {
        // page * limit == total means the last row is on this page
        let p = Pagination::compute(2, 10, 20);
        assert!(p.next.is_none());
        assert!(p.prev.is_some());
    }

    #[test]
    fn single_page_results() {
        let p = Pagination::compute(1, 25, 10);
        assert!(p.next.is_none());
        assert!(p.prev.is_none());
    }
}
