use std::collections::HashMap;

use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::descriptor::QueryDescriptor;
use super::sql;
use super::types::{Page, Pagination, PopulateSpec};

impl QueryDescriptor {
    /// Execute against a table: run the page query and its COUNT twin,
    /// optionally populate one related entity, and return the page plus
    /// pagination metadata. Database errors propagate untouched.
    pub async fn fetch_page(&self, table: &str, pool: &PgPool) -> Result<Page, sqlx::Error> {
        let query = sql::build(self, table);

        let mut data_query = sqlx::query(&query.data_sql);
        for param in &query.params {
            data_query = bind_value(data_query, param);
        }
        let rows = data_query.fetch_all(pool).await?;

        let mut documents: Vec<Value> = rows
            .iter()
            .map(|row| row.try_get::<Value, _>("item"))
            .collect::<Result<_, _>>()?;

        let mut count_query = sqlx::query(&query.count_sql);
        for param in &query.params {
            count_query = bind_value(count_query, param);
        }
        let total: i64 = count_query.fetch_one(pool).await?.try_get("count")?;

        if let Some(spec) = &self.populate {
            populate(&mut documents, spec, pool).await?;
        }

        Ok(Page {
            count: documents.len(),
            total,
            pagination: Pagination::compute(self.page, self.limit, total),
            data: documents,
        })
    }
}

/// Inline the related entity under its relation name, projecting only the
/// caller-supplied safe fields. One `id = ANY($1)` query for the whole page.
async fn populate(
    documents: &mut [Value],
    spec: &PopulateSpec,
    pool: &PgPool,
) -> Result<(), sqlx::Error> {
    let mut ids: Vec<Uuid> = documents
        .iter()
        .filter_map(|doc| doc.get(spec.foreign_key))
        .filter_map(|v| v.as_str())
        .filter_map(|s| Uuid::parse_str(s).ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Ok(());
    }

    let columns = std::iter::once("id")
        .chain(spec.fields.iter().copied())
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");
    let related_sql = format!(
        "SELECT row_to_json(t) AS item FROM (SELECT {} FROM \"{}\" WHERE id = ANY($1)) t",
        columns, spec.table
    );

    let rows = sqlx::query(&related_sql).bind(&ids).fetch_all(pool).await?;

    let mut by_id: HashMap<String, Value> = HashMap::with_capacity(rows.len());
    for row in rows {
        let item: Value = row.try_get("item")?;
        if let Some(id) = item.get("id").and_then(|v| v.as_str()) {
            by_id.insert(id.to_string(), item);
        }
    }

    for doc in documents.iter_mut() {
        let Some(obj) = doc.as_object_mut() else {
            continue;
        };
        let related = obj
            .get(spec.foreign_key)
            .and_then(|v| v.as_str())
            .and_then(|id| by_id.get(id))
            .cloned();
        if let Some(related) = related {
            obj.insert(spec.relation.to_string(), related);
        }
    }

    Ok(())
}

/// Bind a coerced JSON value as its natural Postgres type. Uuid-shaped
/// strings bind as `uuid` so id columns filter correctly.
fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => match Uuid::parse_str(s) {
            Ok(uuid) => q.bind(uuid),
            Err(_) => q.bind(s),
        },
        // Arrays are expanded into IN lists before binding; objects never
        // come out of a query string
        Value::Array(_) | Value::Object(_) => q,
    }
}
