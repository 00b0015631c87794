use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Comparison operators a `Filter` can apply to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Ne,
    Is,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    NotBetween,
    In,
    NotIn,
    Like,
    NotLike,
    StartsWith,
    EndsWith,
}

impl Operator {
    /// Human readable phrase for the operator, used when echoing filters back
    /// to people instead of programs.
    pub fn humanize(self) -> &'static str {
        match self {
            Operator::Eq => "equal",
            Operator::Ne => "not equal",
            Operator::Is => "is",
            Operator::Gt => "greater than",
            Operator::Gte => "greater than or equal",
            Operator::Lt => "less than",
            Operator::Lte => "less than or equal",
            Operator::Between => "between",
            Operator::NotBetween => "not between",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::StartsWith => "starts with",
            Operator::EndsWith => "ends with",
        }
    }
}

/// Backend-agnostic predicate restricting which records are counted and fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    Compare {
        field: String,
        op: Operator,
        value: Value,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

/// A field reference waiting for its comparison, see [`Filter::field`].
#[derive(Debug, Clone)]
pub struct FieldRef {
    field: String,
}

impl FieldRef {
    fn compare(self, op: Operator, value: Value) -> Filter {
        Filter::Compare {
            field: self.field,
            op,
            value,
        }
    }

    pub fn eq(self, value: impl Into<Value>) -> Filter {
        self.compare(Operator::Eq, value.into())
    }

    pub fn ne(self, value: impl Into<Value>) -> Filter {
        self.compare(Operator::Ne, value.into())
    }

    pub fn is_null(self) -> Filter {
        self.compare(Operator::Is, Value::Null)
    }

    pub fn is(self, value: Option<bool>) -> Filter {
        self.compare(Operator::Is, value.map_or(Value::Null, Value::Bool))
    }

    pub fn gt(self, value: impl Into<Value>) -> Filter {
        self.compare(Operator::Gt, value.into())
    }

    pub fn gte(self, value: impl Into<Value>) -> Filter {
        self.compare(Operator::Gte, value.into())
    }

    pub fn lt(self, value: impl Into<Value>) -> Filter {
        self.compare(Operator::Lt, value.into())
    }

    pub fn lte(self, value: impl Into<Value>) -> Filter {
        self.compare(Operator::Lte, value.into())
    }

    /// Inclusive range check.
    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Filter {
        self.compare(Operator::Between, Value::Array(vec![low.into(), high.into()]))
    }

    pub fn not_between(self, low: impl Into<Value>, high: impl Into<Value>) -> Filter {
        self.compare(
            Operator::NotBetween,
            Value::Array(vec![low.into(), high.into()]),
        )
    }

    pub fn in_<T: Into<Value>>(self, values: impl IntoIterator<Item = T>) -> Filter {
        let values = values.into_iter().map(Into::into).collect();
        self.compare(Operator::In, Value::Array(values))
    }

    pub fn not_in<T: Into<Value>>(self, values: impl IntoIterator<Item = T>) -> Filter {
        let values = values.into_iter().map(Into::into).collect();
        self.compare(Operator::NotIn, Value::Array(values))
    }

    /// SQL `LIKE` pattern: `%` matches any run, `_` a single character.
    pub fn like(self, pattern: &str) -> Filter {
        self.compare(Operator::Like, Value::from(pattern))
    }

    pub fn not_like(self, pattern: &str) -> Filter {
        self.compare(Operator::NotLike, Value::from(pattern))
    }

    pub fn starts_with(self, prefix: &str) -> Filter {
        self.compare(Operator::StartsWith, Value::from(prefix))
    }

    pub fn ends_with(self, suffix: &str) -> Filter {
        self.compare(Operator::EndsWith, Value::from(suffix))
    }
}

impl Filter {
    pub fn field(name: impl Into<String>) -> FieldRef {
        FieldRef { field: name.into() }
    }

    /// Conjunction, flattening nested `And` nodes.
    pub fn and(self, other: Filter) -> Filter {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            filter => Filter::And(vec![filter, other]),
        }
    }

    /// Disjunction, flattening nested `Or` nodes.
    pub fn or(self, other: Filter) -> Filter {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            filter => Filter::Or(vec![filter, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    /// Renders the filter as a JSON tree keyed by field names and operator
    /// phrases, e.g. `{"counter": {"greater than": 3}}`.
    pub fn humanize(&self) -> Value {
        match self {
            Filter::Compare { field, op, value } => {
                let mut condition = Map::new();
                condition.insert(op.humanize().to_string(), value.clone());
                let mut node = Map::new();
                node.insert(field.clone(), Value::Object(condition));
                Value::Object(node)
            }
            Filter::And(filters) => {
                let mut node = Map::new();
                node.insert(
                    "and".to_string(),
                    Value::Array(filters.iter().map(Filter::humanize).collect()),
                );
                Value::Object(node)
            }
            Filter::Or(filters) => {
                let mut node = Map::new();
                node.insert(
                    "or".to_string(),
                    Value::Array(filters.iter().map(Filter::humanize).collect()),
                );
                Value::Object(node)
            }
            Filter::Not(filter) => {
                let mut node = Map::new();
                node.insert("not".to_string(), filter.humanize());
                Value::Object(node)
            }
        }
    }
}
