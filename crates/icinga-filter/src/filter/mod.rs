//! Filter expression parser, serializer and evaluator.
//!
//! Filters are written in a URL query-string style and parsed into a binary
//! expression [`Tree`] that can be evaluated against rows in memory or handed
//! to a [backend converter](crate::convert).
//!
//! # Syntax
//!
//! ## Conditions
//! - `column=value` - equals (`*` is a wildcard: `service=www*`)
//! - `column!=value` - not equals
//! - `column>value`, `column>=value`, `column<value`, `column<=value`
//! - `column=a|b|c` - equals any of the values
//! - `column` - the column is truthy, `!column` - it is not
//!
//! ## Boolean Operators
//! - `&` - AND (binds tighter than OR by default)
//! - `|` - OR
//! - `!` - NOT, applied with De Morgan's laws
//! - `()` - Grouping
//!
//! Columns and values are form-URL-encoded: `Hans+Wurst` is `Hans Wurst`.
//!
//! # Example
//!
//! ```
//! use icinga_filter::filter::{FilterContext, FilterEvaluator, QueryParser, Record, Value};
//!
//! let result = QueryParser::parse("host=localhost&state!=0|problem");
//! assert!(result.is_complete());
//!
//! let context = FilterContext::new();
//! let evaluator = FilterEvaluator::new(&result.tree, &context);
//!
//! let rows: Vec<Record> = vec![];
//! assert!(evaluator.filter_rows(&rows).is_empty());
//! ```

mod combinator;
mod error;
mod evaluator;
mod lexer;
mod node;
mod parser;
mod proposals;
mod search;
mod serializer;
mod timestring;
mod value;

pub use combinator::{Conjunction, Filter};
pub use error::{FilterError, FilterResult};
pub use evaluator::{matches, FilterContext, FilterEvaluator};
pub use lexer::{Lexer, PositionedToken, QueryToken};
pub use node::{Condition, Node, NodeType, Operator, Tree, ValueContext};
pub use parser::{ParseResult, ParserOptions, Precedence, QueryParser, MAX_NESTING_DEPTH};
pub use proposals::{propose, Proposal, ProposalKind};
pub use search::{
    BooleanSearch, SearchAttribute, SearchBox, SearchDomain, SearchResult, SearchType, TextSearch,
    TimeRangeSearch,
};
pub use serializer::{decode_component, encode_component, Serializer};
pub use timestring::{resolve_timestamp, resolve_value};
pub use value::{IntoValues, Record, Row, Value};

pub(crate) use evaluator::wildcard_regex_source;
pub(crate) use value::parse_number;
