//! # jq Query Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) that the diagram
//! builder walks. It models the subset of jq that matters for drawing a
//! pipeline: operators, terms, indexes, function calls and constructors.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Binary operators (pipe, comma, arithmetic, comparison, logical, assignment)
//! - **[terms]** - Terms, indexes, suffixes, function calls, object entries, control constructs
//! - **[query]** - The query tree itself
//! - **[display]** - Compact jq text for any node
//!
//! ## Core Concepts
//!
//! ### Query vs Term
//!
//! A [`Query`] node is either a binary operator over two sub-queries or a
//! single [`Term`]. The two never mix:
//!
//! ```text
//! .items | length       // Binary { op: Pipe, left: .items, right: length }
//! "hello"               // Term(String("hello"))
//! ```
//!
//! ### Suffixes
//!
//! Indexing after a term is kept as a list of suffixes so that `.[2:5]` and
//! `.items[2:5]` expose the same [`Index::Slice`] shape:
//!
//! ```text
//! .[2:5]          // Term { kind: Index(Slice), suffixes: [] }
//! .items[2:5]     // Term { kind: Index(Name("items")), suffixes: [Index(Slice)] }
//! ```
//!
//! ### Control constructs
//!
//! `if`, `try`, `reduce`, `foreach`, `label`, `break` and `as` bindings are
//! parsed structurally into [`Control`] but the diagram draws them as a
//! single stage labelled with their jq text.
pub mod display;
pub mod operators;
pub mod query;
pub mod terms;
pub mod tokens;

pub use operators::Operator;
pub use query::Query;
pub use terms::{Control, FuncCall, Index, ObjectEntry, ObjectKey, Suffix, Term, TermKind};
pub use tokens::Token;
