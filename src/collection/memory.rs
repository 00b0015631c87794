use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;

use crate::collection::{Collection, SliceQuery};
use crate::query::{Direction, Filter, Include, Operator, Order};

type Row = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum MemoryCollectionError {
    #[error("row is not a JSON object: {0}")]
    NotAnObject(Value),
    #[error("operator {op:?} can't take operand {value}")]
    InvalidOperand { op: Operator, value: Value },
    #[error("relation table '{0}' is not registered")]
    UnknownRelation(String),
    #[error("negative window: offset {offset}, limit {limit}")]
    NegativeWindow { offset: i64, limit: i64 },
    #[error("failed to decode row: {0}")]
    Decode(#[from] serde_json::Error),
}

/// An in-process table of JSON rows.
///
/// Filtering, ordering and projection follow PostgreSQL semantics closely
/// enough that pages read here match pages read from [`super::PgCollection`]:
/// comparisons against `null` never match, `null` sorts last ascending and
/// first descending.
#[derive(Debug, Clone)]
pub struct MemoryCollection<E = Value> {
    rows: Vec<Row>,
    relation_tables: HashMap<String, Vec<Row>>,
    _entity: PhantomData<fn() -> E>,
}

fn into_row(value: Value) -> Result<Row, MemoryCollectionError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(MemoryCollectionError::NotAnObject(other)),
    }
}

impl<E> MemoryCollection<E> {
    pub fn from_rows(rows: impl IntoIterator<Item = Value>) -> Result<Self, MemoryCollectionError> {
        Ok(Self {
            rows: rows.into_iter().map(into_row).collect::<Result<_, _>>()?,
            relation_tables: HashMap::new(),
            _entity: PhantomData,
        })
    }

    pub fn from_entities<T: Serialize>(
        entities: impl IntoIterator<Item = T>,
    ) -> Result<Self, MemoryCollectionError> {
        let rows = entities
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(rows)
    }

    /// Registers a table that `Include` relations can refer to by name.
    pub fn with_relation_table(
        mut self,
        name: impl Into<String>,
        rows: impl IntoIterator<Item = Value>,
    ) -> Result<Self, MemoryCollectionError> {
        let rows = rows.into_iter().map(into_row).collect::<Result<_, _>>()?;
        self.relation_tables.insert(name.into(), rows);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn matching(
        &self,
        filter: Option<&Filter>,
        include: Option<&Include>,
    ) -> Result<Vec<&Row>, MemoryCollectionError> {
        let mut matched = Vec::new();
        for row in &self.rows {
            if let Some(filter) = filter {
                if !filter_matches(filter, row)? {
                    continue;
                }
            }
            if let Some(include) = include {
                if !self.relations_match(include, row)? {
                    continue;
                }
            }
            matched.push(row);
        }
        Ok(matched)
    }

    fn relations_match(&self, include: &Include, row: &Row) -> Result<bool, MemoryCollectionError> {
        for relation in include.relations() {
            let related = self
                .relation_tables
                .get(&relation.table)
                .ok_or_else(|| MemoryCollectionError::UnknownRelation(relation.table.clone()))?;
            let local = field_value(row, &relation.local_key);

            let mut found = false;
            for related_row in related {
                let foreign = field_value(related_row, &relation.foreign_key);
                if compare_values(local, foreign) != Some(Ordering::Equal) {
                    continue;
                }
                if let Some(filter) = &relation.filter {
                    if !filter_matches(filter, related_row)? {
                        continue;
                    }
                }
                found = true;
                break;
            }
            if !found {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl<E> Collection for MemoryCollection<E>
where
    E: DeserializeOwned + Send + 'static,
{
    type Entity = E;
    type Error = MemoryCollectionError;

    async fn count(
        &self,
        filter: Option<&Filter>,
        include: Option<&Include>,
    ) -> Result<i64, Self::Error> {
        Ok(self.matching(filter, include)?.len() as i64)
    }

    async fn fetch_slice(&self, query: &SliceQuery<'_>) -> Result<Vec<E>, Self::Error> {
        if query.offset < 0 || query.limit < 0 {
            return Err(MemoryCollectionError::NegativeWindow {
                offset: query.offset,
                limit: query.limit,
            });
        }

        let mut rows = self.matching(query.filter, query.include)?;
        rows.sort_by(|a, b| compare_rows(a, b, query.order));

        rows.into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .map(|row| -> Result<E, MemoryCollectionError> {
                let projected = match query.attributes {
                    Some(attributes) => attributes.project(row),
                    None => row.clone(),
                };
                Ok(serde_json::from_value(Value::Object(projected))?)
            })
            .collect()
    }
}

static NULL: Value = Value::Null;

fn field_value<'a>(row: &'a Row, field: &str) -> &'a Value {
    row.get(field).unwrap_or(&NULL)
}

/// SQL-style comparison: `None` when either side is null or the types differ.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Integers compare exactly; floats only when either side isn't one.
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (a.as_i64(), b.as_i64(), a.as_u64(), b.as_u64()) {
        (Some(a), Some(b), _, _) => Some(a.cmp(&b)),
        (_, _, Some(a), Some(b)) => Some(a.cmp(&b)),
        // one side above i64::MAX, the other negative
        (Some(_), None, _, Some(_)) => Some(Ordering::Less),
        (None, Some(_), Some(_), _) => Some(Ordering::Greater),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn compare_rows(a: &Row, b: &Row, order: &[Order]) -> Ordering {
    for entry in order {
        let ordering = match (field_value(a, &entry.field), field_value(b, &entry.field)) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (a, b) => compare_values(a, b).unwrap_or(Ordering::Equal),
        };
        let ordering = match entry.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn invalid(op: Operator, value: &Value) -> MemoryCollectionError {
    MemoryCollectionError::InvalidOperand {
        op,
        value: value.clone(),
    }
}

fn filter_matches(filter: &Filter, row: &Row) -> Result<bool, MemoryCollectionError> {
    match filter {
        Filter::And(filters) => {
            for filter in filters {
                if !filter_matches(filter, row)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Filter::Or(filters) => {
            for filter in filters {
                if filter_matches(filter, row)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Filter::Not(filter) => Ok(!filter_matches(filter, row)?),
        Filter::Compare { field, op, value } => compare_matches(field_value(row, field), *op, value),
    }
}

fn compare_matches(field: &Value, op: Operator, value: &Value) -> Result<bool, MemoryCollectionError> {
    let matched = match op {
        Operator::Eq if value.is_null() => field.is_null(),
        Operator::Ne if value.is_null() => !field.is_null(),
        Operator::Eq => compare_values(field, value) == Some(Ordering::Equal),
        Operator::Ne => matches!(compare_values(field, value), Some(o) if o != Ordering::Equal),
        Operator::Is => match value {
            Value::Null | Value::Bool(_) => field == value,
            _ => return Err(invalid(op, value)),
        },
        Operator::Gt => compare_values(field, value) == Some(Ordering::Greater),
        Operator::Gte => matches!(compare_values(field, value), Some(Ordering::Greater | Ordering::Equal)),
        Operator::Lt => compare_values(field, value) == Some(Ordering::Less),
        Operator::Lte => matches!(compare_values(field, value), Some(Ordering::Less | Ordering::Equal)),
        Operator::Between | Operator::NotBetween => {
            let [low, high] = match value {
                Value::Array(bounds) if bounds.len() == 2 => [&bounds[0], &bounds[1]],
                _ => return Err(invalid(op, value)),
            };
            let inside = match (compare_values(field, low), compare_values(field, high)) {
                (Some(lo), Some(hi)) => Some(lo != Ordering::Less && hi != Ordering::Greater),
                _ => None,
            };
            match op {
                Operator::Between => inside == Some(true),
                _ => inside == Some(false),
            }
        }
        Operator::In | Operator::NotIn => {
            let Value::Array(candidates) = value else {
                return Err(invalid(op, value));
            };
            if field.is_null() {
                false
            } else {
                let found = candidates
                    .iter()
                    .any(|candidate| compare_values(field, candidate) == Some(Ordering::Equal));
                if op == Operator::In { found } else { !found }
            }
        }
        Operator::Like | Operator::NotLike | Operator::StartsWith | Operator::EndsWith => {
            let Value::String(pattern) = value else {
                return Err(invalid(op, value));
            };
            let Value::String(text) = field else {
                return Ok(false);
            };
            match op {
                Operator::Like => like_matches(text, pattern),
                Operator::NotLike => !like_matches(text, pattern),
                Operator::StartsWith => text.starts_with(pattern.as_str()),
                _ => text.ends_with(pattern.as_str()),
            }
        }
    };
    Ok(matched)
}

enum LikeToken {
    AnyRun,
    AnyChar,
    Literal(char),
}

fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyChar,
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            c => LikeToken::Literal(c),
        });
    }
    tokens
}

/// SQL `LIKE` with `%`, `_` and backslash escapes.
fn like_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    // reachable[j]: the tokens consumed so far match text[..j]
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;

    for token in like_tokens(pattern) {
        let mut next = vec![false; text.len() + 1];
        match token {
            LikeToken::AnyRun => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= reachable[j];
                    next[j] = seen;
                }
            }
            LikeToken::AnyChar => {
                for j in 1..=text.len() {
                    next[j] = reachable[j - 1];
                }
            }
            LikeToken::Literal(c) => {
                for j in 1..=text.len() {
                    next[j] = reachable[j - 1] && text[j - 1] == c;
                }
            }
        }
        reachable = next;
    }
    reachable[text.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Attributes, Relation};
    use serde_json::json;

    fn counters() -> MemoryCollection {
        MemoryCollection::from_rows(vec![
            json!({"id": 1, "counter": 4, "title": "alpha"}),
            json!({"id": 2, "counter": 4, "title": "beta"}),
            json!({"id": 3, "counter": 1, "title": "gamma"}),
            json!({"id": 4, "counter": 3, "title": "delta"}),
            json!({"id": 5, "counter": 2, "title": null}),
        ])
        .unwrap()
    }

    fn ids(rows: &[Value]) -> Vec<i64> {
        rows.iter().map(|row| row["id"].as_i64().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_count_with_disjunction() {
        let filter = Filter::field("counter").gt(3).or(Filter::field("counter").eq(1));
        let count = counters().count(Some(&filter), None).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_fetch_orders_and_windows() {
        let order = [Order::asc("counter"), Order::asc("id")];
        let query = SliceQuery {
            filter: None,
            include: None,
            attributes: None,
            order: &order,
            offset: 2,
            limit: 2,
        };
        let rows = counters().fetch_slice(&query).await.unwrap();
        assert_eq!(ids(&rows), vec![4, 1]);
    }

    #[tokio::test]
    async fn test_nulls_sort_last_ascending_first_descending() {
        let asc = [Order::asc("title")];
        let desc = [Order::desc("title")];
        let mut query = SliceQuery {
            filter: None,
            include: None,
            attributes: None,
            order: &asc,
            offset: 0,
            limit: 10,
        };
        let rows = counters().fetch_slice(&query).await.unwrap();
        assert_eq!(ids(&rows).last(), Some(&5));

        query.order = &desc;
        let rows = counters().fetch_slice(&query).await.unwrap();
        assert_eq!(ids(&rows).first(), Some(&5));
    }

    #[tokio::test]
    async fn test_projection_applies_to_entities() {
        let order = [Order::asc("id")];
        let attributes = Attributes::only(["id"]);
        let query = SliceQuery {
            filter: None,
            include: None,
            attributes: Some(&attributes),
            order: &order,
            offset: 0,
            limit: 1,
        };
        let rows = counters().fetch_slice(&query).await.unwrap();
        assert_eq!(rows, vec![json!({"id": 1})]);
    }

    #[tokio::test]
    async fn test_negative_window_is_rejected() {
        let query = SliceQuery {
            filter: None,
            include: None,
            attributes: None,
            order: &[],
            offset: 0,
            limit: -1,
        };
        let err = counters().fetch_slice(&query).await.unwrap_err();
        assert!(matches!(err, MemoryCollectionError::NegativeWindow { limit: -1, .. }));
    }

    #[tokio::test]
    async fn test_include_keeps_rows_with_related_matches() {
        let collection = counters()
            .with_relation_table(
                "tags",
                vec![
                    json!({"article_id": 1, "tag": "rust"}),
                    json!({"article_id": 3, "tag": "go"}),
                    json!({"article_id": 4, "tag": "rust"}),
                ],
            )
            .unwrap();
        let include = Include::new(vec![
            Relation::new("tags", "id", "article_id").with_filter(Filter::field("tag").eq("rust")),
        ]);

        assert_eq!(collection.count(None, Some(&include)).await.unwrap(), 2);

        let unknown = Include::new(vec![Relation::new("missing", "id", "article_id")]);
        let err = collection.count(None, Some(&unknown)).await.unwrap_err();
        assert!(matches!(err, MemoryCollectionError::UnknownRelation(name) if name == "missing"));
    }

    #[test]
    fn test_null_comparisons_never_match() {
        let null = Value::Null;
        assert!(!compare_matches(&null, Operator::Gt, &json!(1)).unwrap());
        assert!(!compare_matches(&null, Operator::Ne, &json!(1)).unwrap());
        assert!(!compare_matches(&null, Operator::NotIn, &json!([1])).unwrap());
        assert!(compare_matches(&null, Operator::Eq, &Value::Null).unwrap());
        assert!(compare_matches(&null, Operator::Is, &Value::Null).unwrap());
    }

    #[test]
    fn test_between_bounds_are_inclusive() {
        assert!(compare_matches(&json!(3), Operator::Between, &json!([1, 3])).unwrap());
        assert!(!compare_matches(&json!(3), Operator::NotBetween, &json!([1, 3])).unwrap());
        assert!(compare_matches(&json!(4), Operator::NotBetween, &json!([1, 3])).unwrap());
        assert!(compare_matches(&json!(4), Operator::Between, &json!(4)).is_err());
    }

    #[tokio::test]
    async fn test_large_integers_compare_exactly() {
        let low = 1_i64 << 53;
        let collection =
            MemoryCollection::<Value>::from_rows(vec![json!({"id": low + 1}), json!({"id": low})]).unwrap();
        let order = [Order::asc("id")];
        let query = SliceQuery {
            filter: None,
            include: None,
            attributes: None,
            order: &order,
            offset: 0,
            limit: 1,
        };

        let rows = collection.fetch_slice(&query).await.unwrap();
        assert_eq!(rows, vec![json!({"id": low})]);

        let exact = Filter::field("id").eq(low + 1);
        assert_eq!(collection.count(Some(&exact), None).await.unwrap(), 1);
        assert_eq!(compare_values(&json!(u64::MAX), &json!(-1)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(2), &json!(2.5)), Some(Ordering::Less));
    }

    #[test]
    fn test_like_patterns() {
        assert!(like_matches("title12", "title%"));
        assert!(like_matches("title12", "%12"));
        assert!(like_matches("abc", "a_c"));
        assert!(!like_matches("abbc", "a_c"));
        assert!(like_matches("100%", "100\\%"));
        assert!(!like_matches("1000", "100\\%"));
        assert!(like_matches("", "%"));
    }

    #[test]
    fn test_non_object_rows_are_rejected() {
        let err = MemoryCollection::<Value>::from_rows(vec![json!(1)]).unwrap_err();
        assert!(matches!(err, MemoryCollectionError::NotAnObject(_)));
    }
}
