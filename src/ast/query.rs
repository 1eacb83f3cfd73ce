use crate::ast::{Control, Index, ObjectKey, Operator, Suffix, Term, TermKind};

/// A parsed query.
///
/// A node is either a term or a binary operator over two sub-queries;
/// never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Term(Term),
    Binary {
        op: Operator,
        left: Box<Query>,
        right: Box<Query>,
    },
}

impl Query {
    pub fn term(kind: TermKind) -> Self {
        Query::Term(Term::new(kind))
    }

    pub fn binary(op: Operator, left: Query, right: Query) -> Self {
        Query::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Whether a function call appears anywhere inside this query.
    pub fn contains_call(&self) -> bool {
        match self {
            Query::Binary { left, right, .. } => left.contains_call() || right.contains_call(),
            Query::Term(term) => term_contains_call(term),
        }
    }
}

fn term_contains_call(term: &Term) -> bool {
    let in_suffixes = term.suffixes.iter().any(|suffix| match suffix {
        Suffix::Index(index) => index_contains_call(index),
        Suffix::Iterate | Suffix::Optional => false,
    });
    if in_suffixes {
        return true;
    }

    match &term.kind {
        TermKind::Func(_) => true,
        TermKind::Identity
        | TermKind::Recurse
        | TermKind::Null
        | TermKind::Boolean(_)
        | TermKind::Number(_)
        | TermKind::String(_)
        | TermKind::Format(..)
        | TermKind::Variable(_) => false,
        TermKind::Index(index) => index_contains_call(index),
        TermKind::Array(inner) => inner.as_ref().is_some_and(|q| q.contains_call()),
        TermKind::Object(entries) => entries.iter().any(|entry| {
            let key = match &entry.key {
                ObjectKey::Computed(q) => q.contains_call(),
                ObjectKey::Name(_) | ObjectKey::Variable(_) => false,
            };
            key || entry.value.as_ref().is_some_and(Query::contains_call)
        }),
        TermKind::Paren(inner) => inner.contains_call(),
        TermKind::Control(control) => control_contains_call(control),
    }
}

fn index_contains_call(index: &Index) -> bool {
    match index {
        Index::Name(_) => false,
        Index::Expr(q) => q.contains_call(),
        Index::Slice { start, end } => {
            start.as_ref().is_some_and(|q| q.contains_call())
                || end.as_ref().is_some_and(|q| q.contains_call())
        }
    }
}

fn control_contains_call(control: &Control) -> bool {
    match control {
        Control::If {
            branches,
            otherwise,
        } => {
            branches
                .iter()
                .any(|(cond, then)| cond.contains_call() || then.contains_call())
                || otherwise.as_ref().is_some_and(|q| q.contains_call())
        }
        Control::Try { body, catch } => {
            body.contains_call() || catch.as_ref().is_some_and(|q| q.contains_call())
        }
        Control::Reduce {
            source,
            init,
            update,
            ..
        } => term_contains_call(source) || init.contains_call() || update.contains_call(),
        Control::Foreach {
            source,
            init,
            update,
            extract,
            ..
        } => {
            term_contains_call(source)
                || init.contains_call()
                || update.contains_call()
                || extract.as_ref().is_some_and(|q| q.contains_call())
        }
        Control::Label { body, .. } => body.contains_call(),
        Control::Break(_) => false,
        Control::Bind { source, body, .. } => term_contains_call(source) || body.contains_call(),
    }
}
