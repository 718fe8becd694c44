//! Filter expression engine for monitoring queries
//!
//! Parses URL-style filter strings such as `host=web*&state!=0` into an
//! expression tree, evaluates trees against rows in memory and compiles them
//! into backend predicates (SQL, Livestatus, status.dat).
//!
//! # Quick Start
//!
//! For convenient imports, use the prelude:
//!
//! ```
//! use icinga_filter::prelude::*;
//!
//! let filter = Filter::from_query_string("service=www*&state>=1");
//! let predicate = SqlConverter::new().convert(filter.tree(), &IdentityMapper);
//! assert_eq!(predicate.sql, "service LIKE ? ESCAPE '\\' AND state >= ?");
//! ```

pub mod convert;
pub mod filter;
pub mod prelude;
