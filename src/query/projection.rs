use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query::Filter;

/// Which columns of a record are returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Attributes {
    Only(Vec<String>),
    Exclude(Vec<String>),
}

impl Attributes {
    pub fn only<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Attributes::Only(fields.into_iter().map(Into::into).collect())
    }

    pub fn exclude<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Attributes::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Applies the projection to a row object. Fields named by `Only` that the
    /// row doesn't carry are skipped.
    pub fn project(&self, row: &Map<String, Value>) -> Map<String, Value> {
        match self {
            Attributes::Only(fields) => fields
                .iter()
                .filter_map(|field| row.get(field).map(|value| (field.clone(), value.clone())))
                .collect(),
            Attributes::Exclude(fields) => row
                .iter()
                .filter(|(key, _)| !fields.contains(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

/// A related table a base record must have at least one match in.
///
/// `local_key` is a column of the base table, `foreign_key` the column of
/// `table` that references it. `filter` further restricts the related rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub table: String,
    pub local_key: String,
    pub foreign_key: String,
    #[serde(default)]
    pub filter: Option<Filter>,
}

impl Relation {
    pub fn new(
        table: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            local_key: local_key.into(),
            foreign_key: foreign_key.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Relations joined into both the count and the fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Include(pub Vec<Relation>);

impl Include {
    pub fn new(relations: Vec<Relation>) -> Self {
        Self(relations)
    }

    pub fn relations(&self) -> &[Relation] {
        &self.0
    }
}
