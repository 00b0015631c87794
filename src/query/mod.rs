//! Query vocabulary shared by the paginator and its collections.

mod filter;
mod order;
mod projection;

pub use filter::{FieldRef, Filter, Operator};
pub use order::{Direction, Order, ParseDirectionError, with_tie_break};
pub use projection::{Attributes, Include, Relation};
