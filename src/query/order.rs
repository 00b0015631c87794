use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Sort direction of one order entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sort direction '{0}', expected 'asc' or 'desc'")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Asc => write!(f, "asc"),
            Direction::Desc => write!(f, "desc"),
        }
    }
}

/// One `(field, direction)` entry of a sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl Order {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// Returns `orders` with the primary key appended as the final tie-break,
/// unless an entry for the primary key is already present.
///
/// The input is never modified, so callers can reuse the same orders across
/// calls without them growing.
pub fn with_tie_break(orders: &[Order], primary_key_field: &str, primary_desc: bool) -> Vec<Order> {
    let mut effective = orders.to_vec();
    if !orders.iter().any(|order| order.field == primary_key_field) {
        effective.push(Order {
            field: primary_key_field.to_string(),
            direction: if primary_desc {
                Direction::Desc
            } else {
                Direction::Asc
            },
        });
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_break_appended_when_missing() {
        let orders = vec![Order::asc("counter")];
        let effective = with_tie_break(&orders, "id", false);

        assert_eq!(effective, vec![Order::asc("counter"), Order::asc("id")]);
        // caller's orders are untouched
        assert_eq!(orders, vec![Order::asc("counter")]);
    }

    #[test]
    fn test_tie_break_follows_primary_desc() {
        let effective = with_tie_break(&[], "id", true);
        assert_eq!(effective, vec![Order::desc("id")]);
    }

    #[test]
    fn test_explicit_primary_key_order_wins() {
        let orders = vec![Order::desc("id"), Order::asc("counter")];
        let effective = with_tie_break(&orders, "id", false);

        assert_eq!(effective, orders);
    }

    #[test]
    fn test_repeated_calls_do_not_grow() {
        let orders = vec![Order::asc("title")];
        let first = with_tie_break(&orders, "id", false);
        let second = with_tie_break(&orders, "id", false);

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_direction_parse_is_case_insensitive() {
        assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Desc);
        assert_eq!("Asc".parse::<Direction>().unwrap(), Direction::Asc);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_order_direction_defaults_to_asc() {
        let order: Order = serde_json::from_str(r#"{"field": "counter"}"#).unwrap();
        assert_eq!(order, Order::asc("counter"));
    }
}
