//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```
//! use icinga_filter::prelude::*;
//!
//! // Now you have access to:
//! // - Filter, Tree, Node, Condition, Operator (building filters)
//! // - QueryParser, ParserOptions, Serializer (query strings)
//! // - FilterEvaluator, FilterContext, Row, Value (in-memory evaluation)
//! // - Converter, BackendKind, ColumnMapper (backend predicates)
//! ```

// Filter model
pub use crate::filter::{Condition, Conjunction, Filter, Node, NodeType, Operator, Tree, ValueContext};

// Query strings
pub use crate::filter::{
    FilterError, FilterResult, ParseResult, ParserOptions, Precedence, QueryParser, Serializer,
};

// Evaluation
pub use crate::filter::{FilterContext, FilterEvaluator, IntoValues, Record, Row, Value};

// Backend converters
pub use crate::convert::{
    BackendKind, BackendPredicate, ColumnMap, ColumnMapper, Converter, IdentityMapper,
    LivestatusConverter, Placeholder, SqlConverter, SqlParam, SqlPredicate, StatusdatConverter,
    StatusdatPredicate,
};
