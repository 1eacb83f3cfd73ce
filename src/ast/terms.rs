use rust_decimal::Decimal;

use crate::ast::Query;

/// A term with its postfix suffixes.
///
/// # Examples
/// ```text
/// .items[0]      // Term { kind: Index(Name("items")), suffixes: [Index(Expr(0))] }
/// keys[]         // Term { kind: Func(keys), suffixes: [Iterate] }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub kind: TermKind,
    pub suffixes: Vec<Suffix>,
}

impl Term {
    pub fn new(kind: TermKind) -> Self {
        Term {
            kind,
            suffixes: Vec::new(),
        }
    }

    /// The first slice in this term, whether it is the bare index or a suffix.
    pub fn slice(&self) -> Option<(Option<&Query>, Option<&Query>)> {
        let bare = match &self.kind {
            TermKind::Index(index) => Some(index),
            _ => None,
        };
        bare.into_iter()
            .chain(self.suffixes.iter().filter_map(|suffix| match suffix {
                Suffix::Index(index) => Some(index),
                _ => None,
            }))
            .find_map(|index| match index {
                Index::Slice { start, end } => Some((start.as_deref(), end.as_deref())),
                _ => None,
            })
    }
}

/// Term kinds. Closed set; every traversal matches it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum TermKind {
    /// Identity (`.`)
    Identity,

    /// Recursive descent (`..`)
    Recurse,

    // Literals
    /// Null literal
    Null,

    /// Boolean literal
    Boolean(bool),

    /// Number literal
    ///
    /// # Example
    /// ```text
    /// 42
    /// 1.50
    /// ```
    Number(Decimal),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// "hello"
    /// ```
    String(String),

    /// Format string, optionally applied to a string literal
    ///
    /// # Example
    /// ```text
    /// @base64
    /// @csv "\(.a)"
    /// ```
    Format(String, Option<String>),

    /// Variable reference (`$name`)
    Variable(String),

    /// Bare index on the input
    ///
    /// # Examples
    /// ```text
    /// .name
    /// .[0]
    /// .[2:5]
    /// ```
    Index(Index),

    /// Function call
    ///
    /// # Examples
    /// ```text
    /// length
    /// ltrimstr("x")
    /// sub("a"; "b")
    /// ```
    Func(FuncCall),

    /// Array constructor (`[]` or `[query]`)
    Array(Option<Box<Query>>),

    /// Object constructor
    ///
    /// # Example
    /// ```text
    /// {name: .user, total: (.items | length)}
    /// ```
    Object(Vec<ObjectEntry>),

    /// Parenthesized query
    Paren(Box<Query>),

    /// Control constructs, rendered generically
    Control(Control),
}

/// Index forms, shared between bare indexes and suffixes.
#[derive(Debug, Clone, PartialEq)]
pub enum Index {
    /// `.name` or `."name"`
    Name(String),

    /// `.[query]`
    Expr(Box<Query>),

    /// `.[start:end]`, either bound may be absent
    Slice {
        start: Option<Box<Query>>,
        end: Option<Box<Query>>,
    },
}

/// Postfix suffixes.
#[derive(Debug, Clone, PartialEq)]
pub enum Suffix {
    Index(Index),
    /// `[]`
    Iterate,
    /// `?`
    Optional,
}

/// Function call: name plus argument queries.
///
/// Each argument is a full, independent query, not a value.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub name: String,
    pub args: Vec<Query>,
}

/// One `key: value` pair of an object constructor.
///
/// `value` is `None` for the `{name}` and `{$x}` shorthands.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub key: ObjectKey,
    pub value: Option<Query>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKey {
    /// Identifier, keyword or string key
    Name(String),
    /// `$x` key
    Variable(String),
    /// `(query)` key
    Computed(Box<Query>),
}

/// Control constructs. The diagram does not model their structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    If {
        branches: Vec<(Query, Query)>,
        otherwise: Option<Box<Query>>,
    },
    Try {
        body: Box<Query>,
        catch: Option<Box<Query>>,
    },
    Reduce {
        source: Box<Term>,
        variable: String,
        init: Box<Query>,
        update: Box<Query>,
    },
    Foreach {
        source: Box<Term>,
        variable: String,
        init: Box<Query>,
        update: Box<Query>,
        extract: Option<Box<Query>>,
    },
    Label {
        name: String,
        body: Box<Query>,
    },
    Break(String),
    /// `term as $x | body`
    Bind {
        source: Box<Term>,
        variable: String,
        body: Box<Query>,
    },
}

impl Control {
    /// Short name of the construct.
    pub fn kind(&self) -> &'static str {
        match self {
            Control::If { .. } => "if",
            Control::Try { .. } => "try",
            Control::Reduce { .. } => "reduce",
            Control::Foreach { .. } => "foreach",
            Control::Label { .. } => "label",
            Control::Break(_) => "break",
            Control::Bind { .. } => "as",
        }
    }
}
