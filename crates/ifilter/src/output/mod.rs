//! Output formatting utilities for the ifilter CLI.
//!
//! This module provides functions for formatting results as text or JSON.
//! It is organized into submodules by command:
//!
//! - [`parse`] - Parsed trees and dropped fragments
//! - [`rows`] - Matching rows
//! - [`predicates`] - Compiled backend predicates
//! - [`proposals`] - Completion proposals
//! - [`helpers`] - Common formatting utilities (headers, tree rendering)

pub mod helpers;
mod parse;
mod predicates;
mod proposals;
mod rows;

pub use parse::{format_parse_json, format_parse_table};
pub use predicates::{format_predicate_json, format_predicate_table};
pub use proposals::{format_proposals_json, format_proposals_table};
pub use rows::{format_count, format_rows_json, format_rows_table};
