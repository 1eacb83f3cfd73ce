//! Compact jq text for AST nodes.
//!
//! This is the raw textual form used wherever the diagram does not model a
//! construct's structure (control flow, comma, unusual shapes).

use std::fmt::{self, Display, Formatter, Write};

use crate::ast::{Control, FuncCall, Index, ObjectEntry, ObjectKey, Operator, Query, Suffix, Term, TermKind};

fn precedence(op: Operator) -> u8 {
    match op {
        Operator::Pipe => 0,
        Operator::Comma => 1,
        Operator::Alternative => 2,
        op if op.is_assignment() => 3,
        Operator::Or => 4,
        Operator::And => 5,
        op if op.is_comparison() => 6,
        Operator::Add | Operator::Sub => 7,
        _ => 8,
    }
}

fn right_associative(op: Operator) -> bool {
    matches!(op, Operator::Pipe | Operator::Alternative)
}

/// Whether `name` can be written as `.name` without quoting.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// JSON-style quoting for string literals.
pub fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn write_operand(f: &mut Formatter<'_>, parent: Operator, child: &Query, is_left: bool) -> fmt::Result {
    let needs_parens = match child {
        Query::Binary { op, .. } => {
            let (p, c) = (precedence(parent), precedence(*op));
            c < p || (c == p && (right_associative(parent) == is_left))
        }
        Query::Term(_) => false,
    };
    if needs_parens {
        write!(f, "({})", child)
    } else {
        write!(f, "{}", child)
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term(term) => write!(f, "{}", term),
            Query::Binary { op, left, right } => {
                write_operand(f, *op, left, true)?;
                match op {
                    Operator::Comma => f.write_str(", ")?,
                    op => write!(f, " {} ", op)?,
                }
                write_operand(f, *op, right, false)
            }
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for suffix in &self.suffixes {
            write!(f, "{}", suffix)?;
        }
        Ok(())
    }
}

fn write_bounds(f: &mut Formatter<'_>, start: &Option<Box<Query>>, end: &Option<Box<Query>>) -> fmt::Result {
    f.write_char('[')?;
    if let Some(start) = start {
        write!(f, "{}", start)?;
    }
    f.write_char(':')?;
    if let Some(end) = end {
        write!(f, "{}", end)?;
    }
    f.write_char(']')
}

impl Display for TermKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TermKind::Identity => f.write_char('.'),
            TermKind::Recurse => f.write_str(".."),
            TermKind::Null => f.write_str("null"),
            TermKind::Boolean(b) => write!(f, "{}", b),
            TermKind::Number(n) => write!(f, "{}", n),
            TermKind::String(s) => f.write_str(&quote(s)),
            TermKind::Format(name, None) => write!(f, "@{}", name),
            TermKind::Format(name, Some(s)) => write!(f, "@{} {}", name, quote(s)),
            TermKind::Variable(name) => write!(f, "${}", name),
            TermKind::Index(Index::Name(name)) if is_identifier(name) => write!(f, ".{}", name),
            TermKind::Index(Index::Name(name)) => write!(f, ".{}", quote(name)),
            TermKind::Index(Index::Expr(q)) => write!(f, ".[{}]", q),
            TermKind::Index(Index::Slice { start, end }) => {
                f.write_char('.')?;
                write_bounds(f, start, end)
            }
            TermKind::Func(call) => write!(f, "{}", call),
            TermKind::Array(None) => f.write_str("[]"),
            TermKind::Array(Some(q)) => write!(f, "[{}]", q),
            TermKind::Object(entries) => {
                f.write_char('{')?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", entry)?;
                }
                f.write_char('}')
            }
            TermKind::Paren(q) => write!(f, "({})", q),
            TermKind::Control(control) => write!(f, "{}", control),
        }
    }
}

impl Display for FuncCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_char('(')?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_char(')')
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKey::Name(name) if is_identifier(name) => f.write_str(name),
            ObjectKey::Name(name) => f.write_str(&quote(name)),
            ObjectKey::Variable(name) => write!(f, "${}", name),
            ObjectKey::Computed(q) => write!(f, "({})", q),
        }
    }
}

impl Display for ObjectEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if let Some(value) = &self.value {
            // comma binds looser than an entry value
            match value {
                Query::Binary { op: Operator::Pipe | Operator::Comma, .. } => write!(f, ": ({})", value)?,
                _ => write!(f, ": {}", value)?,
            }
        }
        Ok(())
    }
}

impl Display for Suffix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Suffix::Index(Index::Name(name)) if is_identifier(name) => write!(f, ".{}", name),
            Suffix::Index(Index::Name(name)) => write!(f, ".{}", quote(name)),
            Suffix::Index(Index::Expr(q)) => write!(f, "[{}]", q),
            Suffix::Index(Index::Slice { start, end }) => write_bounds(f, start, end),
            Suffix::Iterate => f.write_str("[]"),
            Suffix::Optional => f.write_char('?'),
        }
    }
}

impl Display for Control {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Control::If {
                branches,
                otherwise,
            } => {
                for (i, (cond, then)) in branches.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { " elif" };
                    write!(f, "{} {} then {}", keyword, cond, then)?;
                }
                if let Some(otherwise) = otherwise {
                    write!(f, " else {}", otherwise)?;
                }
                f.write_str(" end")
            }
            Control::Try { body, catch } => {
                write!(f, "try {}", body)?;
                if let Some(catch) = catch {
                    write!(f, " catch {}", catch)?;
                }
                Ok(())
            }
            Control::Reduce {
                source,
                variable,
                init,
                update,
            } => write!(f, "reduce {} as ${} ({}; {})", source, variable, init, update),
            Control::Foreach {
                source,
                variable,
                init,
                update,
                extract,
            } => {
                write!(f, "foreach {} as ${} ({}; {}", source, variable, init, update)?;
                if let Some(extract) = extract {
                    write!(f, "; {}", extract)?;
                }
                f.write_char(')')
            }
            Control::Label { name, body } => write!(f, "label ${} | {}", name, body),
            Control::Break(name) => write!(f, "break ${}", name),
            Control::Bind {
                source,
                variable,
                body,
            } => write!(f, "{} as ${} | {}", source, variable, body),
        }
    }
}
