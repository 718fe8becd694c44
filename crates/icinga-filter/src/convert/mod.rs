//! Backend converters.
//!
//! A converter walks a filter [`Tree`] and emits the predicate a data source
//! understands natively, without evaluating anything itself. Columns are
//! translated through a [`ColumnMapper`]; conditions on columns the mapper
//! does not know are skipped, the same way the in-memory evaluator ignores
//! columns outside its known set.
//!
//! # Example
//!
//! ```
//! use icinga_filter::convert::{BackendKind, BackendPredicate, ColumnMap};
//! use icinga_filter::filter::QueryParser;
//!
//! let tree = QueryParser::parse("host=web*&state!=0").tree;
//! let mut mapper = ColumnMap::default();
//! mapper.columns.insert("host".into(), "h.display_name".into());
//! mapper.columns.insert("state".into(), "hs.current_state".into());
//!
//! let BackendPredicate::Ido(predicate) = BackendKind::Ido.compile(&tree, &mapper) else {
//!     unreachable!()
//! };
//! assert_eq!(
//!     predicate.sql,
//!     "h.display_name LIKE ? ESCAPE '\\' AND hs.current_state != ?"
//! );
//! ```

mod livestatus;
mod sql;
mod statusdat;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::Tree;

pub use livestatus::{LivestatusConverter, LivestatusQuery};
pub use sql::{Placeholder, SqlConverter, SqlParam, SqlPredicate};
pub use statusdat::{StatusdatConverter, StatusdatPredicate};

/// Translates filter columns into backend columns.
pub trait ColumnMapper {
    /// Returns the backend column for `column`, or `None` if the backend
    /// has no such column.
    fn map_column(&self, column: &str) -> Option<String>;

    /// Returns true if values of `column` are timestamps, so time strings
    /// such as `-1 day` are resolved before comparing.
    fn is_timestamp(&self, _column: &str) -> bool {
        false
    }
}

/// Maps every column to itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl ColumnMapper for IdentityMapper {
    fn map_column(&self, column: &str) -> Option<String> {
        Some(column.to_string())
    }
}

impl<F> ColumnMapper for F
where
    F: Fn(&str) -> Option<String>,
{
    fn map_column(&self, column: &str) -> Option<String> {
        self(column)
    }
}

/// A column mapping loaded from configuration.
///
/// ```toml
/// passthrough = false
/// timestamps = ["last_check"]
///
/// [columns]
/// host = "h.display_name"
/// last_check = "hs.last_check"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    /// Filter column to backend column.
    #[serde(default)]
    pub columns: BTreeMap<String, String>,

    /// Filter columns holding timestamps.
    #[serde(default)]
    pub timestamps: BTreeSet<String>,

    /// If true, columns without an explicit mapping map to themselves.
    #[serde(default)]
    pub passthrough: bool,
}

impl ColumnMapper for ColumnMap {
    fn map_column(&self, column: &str) -> Option<String> {
        match self.columns.get(column) {
            Some(mapped) => Some(mapped.clone()),
            None if self.passthrough => Some(column.to_string()),
            None => None,
        }
    }

    fn is_timestamp(&self, column: &str) -> bool {
        self.timestamps.contains(column)
    }
}

/// Turns a filter tree into a backend-native predicate.
pub trait Converter {
    /// The predicate type this converter produces.
    type Output;

    /// Converts `tree`, translating columns through `mapper`.
    fn convert<M: ColumnMapper + ?Sized>(&self, tree: &Tree, mapper: &M) -> Self::Output;
}

/// Errors from the converter registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    /// The backend name is not known.
    #[error("unknown backend '{0}' (expected ido, livestatus or statusdat)")]
    UnknownBackend(String),
}

/// The supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// IDO database, queried with SQL.
    Ido,
    /// Livestatus socket, queried with `Filter:` headers.
    Livestatus,
    /// status.dat file, filtered in memory.
    Statusdat,
}

impl BackendKind {
    /// All backends.
    pub const ALL: [BackendKind; 3] = [BackendKind::Ido, BackendKind::Livestatus, BackendKind::Statusdat];

    /// Returns the configuration name of the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Ido => "ido",
            BackendKind::Livestatus => "livestatus",
            BackendKind::Statusdat => "statusdat",
        }
    }

    /// Compiles `tree` for this backend, resolving time strings against the current time.
    pub fn compile<M: ColumnMapper + ?Sized>(self, tree: &Tree, mapper: &M) -> BackendPredicate {
        self.compile_at(tree, mapper, Utc::now())
    }

    /// Compiles `tree` for this backend with a fixed reference time.
    pub fn compile_at<M: ColumnMapper + ?Sized>(
        self,
        tree: &Tree,
        mapper: &M,
        now: DateTime<Utc>,
    ) -> BackendPredicate {
        match self {
            BackendKind::Ido => BackendPredicate::Ido(SqlConverter::new().at(now).convert(tree, mapper)),
            BackendKind::Livestatus => {
                BackendPredicate::Livestatus(LivestatusConverter::new().at(now).convert(tree, mapper))
            }
            BackendKind::Statusdat => {
                BackendPredicate::Statusdat(StatusdatConverter::new().at(now).convert(tree, mapper))
            }
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ido" | "sql" => Ok(BackendKind::Ido),
            "livestatus" => Ok(BackendKind::Livestatus),
            "statusdat" | "status.dat" => Ok(BackendKind::Statusdat),
            _ => Err(ConvertError::UnknownBackend(s.to_string())),
        }
    }
}

/// A compiled predicate for one of the backends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BackendPredicate {
    /// SQL `WHERE` fragment with bound parameters.
    Ido(SqlPredicate),
    /// Livestatus filter header lines.
    Livestatus(LivestatusQuery),
    /// In-memory predicate over status.dat objects.
    Statusdat(StatusdatPredicate),
}

impl BackendPredicate {
    /// Returns the backend this predicate was compiled for.
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendPredicate::Ido(_) => BackendKind::Ido,
            BackendPredicate::Livestatus(_) => BackendKind::Livestatus,
            BackendPredicate::Statusdat(_) => BackendKind::Statusdat,
        }
    }

    /// Returns true if the predicate places no constraint.
    pub fn is_empty(&self) -> bool {
        match self {
            BackendPredicate::Ido(predicate) => predicate.is_empty(),
            BackendPredicate::Livestatus(query) => query.is_empty(),
            BackendPredicate::Statusdat(predicate) => predicate.is_empty(),
        }
    }
}

impl fmt::Display for BackendPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendPredicate::Ido(predicate) => predicate.fmt(f),
            BackendPredicate::Livestatus(query) => query.fmt(f),
            BackendPredicate::Statusdat(predicate) => predicate.fmt(f),
        }
    }
}
