pub mod ast;
pub mod cli;
pub mod container;
pub mod diagram;
pub mod emitter;
pub mod infer;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod render;
pub mod traverse;

pub use ast::{Operator, Query, Term, TermKind, Token};
pub use diagram::{Board, Diagram, Edge, Node, ScopePath, Shape};
pub use emitter::{Attribute, GraphBuilder, GraphError};
pub use infer::ValueType;
pub use lexer::{LexError, Lexer, Position};
pub use output::to_d2;
pub use parser::{ParseError, Parser, parse_query};
pub use render::{OutputKind, RenderError, RenderOptions, Renderer, draw};
pub use traverse::{Cursor, TraverseError, build_diagram};
