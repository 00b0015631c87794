use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{Executor, Pool, Postgres, QueryBuilder};
use std::marker::PhantomData;
use tracing::trace;

use crate::collection::{Collection, SliceQuery};
use crate::query::{Attributes, Filter, Include, Operator};

#[derive(Debug, thiserror::Error)]
pub enum PgCollectionError {
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("operator {op:?} can't take operand {value}")]
    InvalidOperand { op: Operator, value: Value },
    #[error("negative window: offset {offset}, limit {limit}")]
    NegativeWindow { offset: i64, limit: i64 },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("failed to decode row: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A PostgreSQL table read through a connection pool.
///
/// Rows are selected as `jsonb` so the same projection rules apply to every
/// entity type, then deserialized into `E`.
#[derive(Debug, Clone)]
pub struct PgCollection<E = Value> {
    pool: Pool<Postgres>,
    table: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E> PgCollection<E> {
    /// Creates a collection over `table`.
    ///
    /// # Errors
    /// Returns `InvalidIdentifier` if the table name isn't a plain or
    /// schema-qualified SQL identifier.
    pub fn new(pool: Pool<Postgres>, table: &str) -> Result<Self, PgCollectionError> {
        Ok(Self {
            pool,
            table: quote_identifier(table)?,
            _entity: PhantomData,
        })
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    async fn count_with<'e, X>(
        &self,
        executor: X,
        filter: Option<&Filter>,
        include: Option<&Include>,
    ) -> Result<i64, PgCollectionError>
    where
        X: Executor<'e, Database = Postgres>,
    {
        let mut builder = build_count(&self.table, filter, include)?;
        trace!(sql = builder.sql(), "count");
        Ok(builder.build_query_scalar::<i64>().fetch_one(executor).await?)
    }

    async fn fetch_with<'e, X>(
        &self,
        executor: X,
        query: &SliceQuery<'_>,
    ) -> Result<Vec<E>, PgCollectionError>
    where
        X: Executor<'e, Database = Postgres>,
        E: DeserializeOwned,
    {
        let mut builder = build_slice(&self.table, query)?;
        trace!(sql = builder.sql(), "fetch slice");
        let rows: Vec<Value> = builder.build_query_scalar::<Value>().fetch_all(executor).await?;

        rows.into_iter()
            .map(|row| -> Result<E, PgCollectionError> { Ok(serde_json::from_value(row)?) })
            .collect()
    }
}

#[async_trait]
impl<E> Collection for PgCollection<E>
where
    E: DeserializeOwned + Send + 'static,
{
    type Entity = E;
    type Error = PgCollectionError;

    async fn count(
        &self,
        filter: Option<&Filter>,
        include: Option<&Include>,
    ) -> Result<i64, Self::Error> {
        self.count_with(&self.pool, filter, include).await
    }

    async fn fetch_slice(&self, query: &SliceQuery<'_>) -> Result<Vec<E>, Self::Error> {
        self.fetch_with(&self.pool, query).await
    }

    /// Reads the count and the page from one `REPEATABLE READ` snapshot.
    async fn count_and_fetch_slice(
        &self,
        query: &SliceQuery<'_>,
    ) -> Result<(i64, Vec<E>), Self::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let count = self.count_with(&mut *tx, query.filter, query.include).await?;
        let entities = self.fetch_with(&mut *tx, query).await?;
        tx.commit().await?;

        Ok((count, entities))
    }
}

/// Validates an identifier (optionally dotted) and double-quotes each segment.
fn quote_identifier(name: &str) -> Result<String, PgCollectionError> {
    let valid_segment = |segment: &str| {
        let mut chars = segment.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    if !name.split('.').all(valid_segment) {
        return Err(PgCollectionError::InvalidIdentifier(name.to_string()));
    }

    Ok(name
        .split('.')
        .map(|segment| format!("\"{segment}\""))
        .collect::<Vec<_>>()
        .join("."))
}

fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn build_count(
    table: &str,
    filter: Option<&Filter>,
    include: Option<&Include>,
) -> Result<QueryBuilder<'static, Postgres>, PgCollectionError> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM ");
    builder.push(table).push(" AS base");
    push_where(&mut builder, filter, include)?;
    Ok(builder)
}

fn build_slice(
    table: &str,
    query: &SliceQuery<'_>,
) -> Result<QueryBuilder<'static, Postgres>, PgCollectionError> {
    if query.offset < 0 || query.limit < 0 {
        return Err(PgCollectionError::NegativeWindow {
            offset: query.offset,
            limit: query.limit,
        });
    }

    let mut builder = QueryBuilder::new("SELECT ");
    push_projection(&mut builder, query.attributes)?;
    builder.push(" AS entity FROM ").push(table).push(" AS base");
    push_where(&mut builder, query.filter, query.include)?;

    if !query.order.is_empty() {
        builder.push(" ORDER BY ");
        for (i, order) in query.order.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder
                .push("base.")
                .push(quote_identifier(&order.field)?)
                .push(" ")
                .push(order.direction.as_sql());
        }
    }

    builder.push(" LIMIT ").push_bind(query.limit);
    builder.push(" OFFSET ").push_bind(query.offset);
    Ok(builder)
}

fn push_projection(
    builder: &mut QueryBuilder<'static, Postgres>,
    attributes: Option<&Attributes>,
) -> Result<(), PgCollectionError> {
    match attributes {
        None => {
            builder.push("to_jsonb(base)");
        }
        Some(Attributes::Exclude(fields)) => {
            builder.push("to_jsonb(base)");
            for field in fields {
                // validated identifiers contain no quotes
                quote_identifier(field)?;
                builder.push(format!(" - '{field}'::text"));
            }
        }
        Some(Attributes::Only(fields)) if fields.is_empty() => {
            builder.push("'{}'::jsonb");
        }
        Some(Attributes::Only(fields)) => {
            builder.push("jsonb_build_object(");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                let column = quote_identifier(field)?;
                builder.push(format!("'{field}', base.{column}"));
            }
            builder.push(")");
        }
    }
    Ok(())
}

fn push_where(
    builder: &mut QueryBuilder<'static, Postgres>,
    filter: Option<&Filter>,
    include: Option<&Include>,
) -> Result<(), PgCollectionError> {
    let mut first = true;
    let mut next_clause = |builder: &mut QueryBuilder<'static, Postgres>| {
        builder.push(if first { " WHERE " } else { " AND " });
        first = false;
    };

    if let Some(filter) = filter {
        next_clause(builder);
        push_filter(builder, filter, "base")?;
    }

    for relation in include.map(Include::relations).unwrap_or_default() {
        next_clause(builder);
        builder
            .push("EXISTS (SELECT 1 FROM ")
            .push(quote_identifier(&relation.table)?)
            .push(" AS rel WHERE rel.")
            .push(quote_identifier(&relation.foreign_key)?)
            .push(" = base.")
            .push(quote_identifier(&relation.local_key)?);
        if let Some(filter) = &relation.filter {
            builder.push(" AND ");
            push_filter(builder, filter, "rel")?;
        }
        builder.push(")");
    }
    Ok(())
}

fn push_filter(
    builder: &mut QueryBuilder<'static, Postgres>,
    filter: &Filter,
    qualifier: &str,
) -> Result<(), PgCollectionError> {
    match filter {
        Filter::And(filters) | Filter::Or(filters) if filters.is_empty() => {
            builder.push(if matches!(filter, Filter::And(_)) { "TRUE" } else { "FALSE" });
        }
        Filter::And(filters) | Filter::Or(filters) => {
            let joiner = if matches!(filter, Filter::And(_)) { " AND " } else { " OR " };
            builder.push("(");
            for (i, filter) in filters.iter().enumerate() {
                if i > 0 {
                    builder.push(joiner);
                }
                push_filter(builder, filter, qualifier)?;
            }
            builder.push(")");
        }
        Filter::Not(filter) => {
            builder.push("NOT (");
            push_filter(builder, filter, qualifier)?;
            builder.push(")");
        }
        Filter::Compare { field, op, value } => {
            let column = format!("{qualifier}.{}", quote_identifier(field)?);
            push_compare(builder, &column, *op, value)?;
        }
    }
    Ok(())
}

fn invalid(op: Operator, value: &Value) -> PgCollectionError {
    PgCollectionError::InvalidOperand {
        op,
        value: value.clone(),
    }
}

fn push_scalar(
    builder: &mut QueryBuilder<'static, Postgres>,
    op: Operator,
    value: &Value,
) -> Result<(), PgCollectionError> {
    match value {
        Value::Bool(b) => {
            builder.push_bind(*b);
        }
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => {
                builder.push_bind(i);
            }
            (None, Some(f)) => {
                builder.push_bind(f);
            }
            _ => return Err(invalid(op, value)),
        },
        Value::String(s) => {
            builder.push_bind(s.clone());
        }
        _ => return Err(invalid(op, value)),
    }
    Ok(())
}

fn push_compare(
    builder: &mut QueryBuilder<'static, Postgres>,
    column: &str,
    op: Operator,
    value: &Value,
) -> Result<(), PgCollectionError> {
    builder.push(column);
    match op {
        Operator::Eq if value.is_null() => {
            builder.push(" IS NULL");
        }
        Operator::Ne if value.is_null() => {
            builder.push(" IS NOT NULL");
        }
        Operator::Eq | Operator::Ne | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            let symbol = match op {
                Operator::Eq => " = ",
                Operator::Ne => " <> ",
                Operator::Gt => " > ",
                Operator::Gte => " >= ",
                Operator::Lt => " < ",
                _ => " <= ",
            };
            builder.push(symbol);
            push_scalar(builder, op, value)?;
        }
        Operator::Is => {
            builder.push(match value {
                Value::Null => " IS NULL",
                Value::Bool(true) => " IS TRUE",
                Value::Bool(false) => " IS FALSE",
                _ => return Err(invalid(op, value)),
            });
        }
        Operator::Between | Operator::NotBetween => {
            let Value::Array(bounds) = value else {
                return Err(invalid(op, value));
            };
            if bounds.len() != 2 {
                return Err(invalid(op, value));
            }
            builder.push(if op == Operator::Between { " BETWEEN " } else { " NOT BETWEEN " });
            push_scalar(builder, op, &bounds[0])?;
            builder.push(" AND ");
            push_scalar(builder, op, &bounds[1])?;
        }
        Operator::In | Operator::NotIn => {
            let Value::Array(candidates) = value else {
                return Err(invalid(op, value));
            };
            if candidates.is_empty() {
                // nothing is in an empty list
                builder.push(if op == Operator::In { " IS NOT NULL AND FALSE" } else { " IS NOT NULL" });
                return Ok(());
            }
            builder.push(if op == Operator::In { " IN (" } else { " NOT IN (" });
            for (i, candidate) in candidates.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_scalar(builder, op, candidate)?;
            }
            builder.push(")");
        }
        Operator::Like | Operator::NotLike | Operator::StartsWith | Operator::EndsWith => {
            let Value::String(text) = value else {
                return Err(invalid(op, value));
            };
            let pattern = match op {
                Operator::StartsWith => format!("{}%", escape_like(text)),
                Operator::EndsWith => format!("%{}", escape_like(text)),
                _ => text.clone(),
            };
            builder.push(if op == Operator::NotLike { " NOT LIKE " } else { " LIKE " });
            builder.push_bind(pattern);
        }
    }
    Ok(())
}
