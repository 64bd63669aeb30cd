//! # Crucible CLI
//!
//! A thin command-line wrapper composing `crucible-query`'s parser and
//! interpreter: the "outer entry wrapper" spec.md §1 places explicitly out
//! of the core's scope. It owns none of the query language's invariants —
//! it only loads a JSON target and a JSON query, hands them to
//! `crucible-query`, and prints the result.

pub mod cli;
pub mod io;
