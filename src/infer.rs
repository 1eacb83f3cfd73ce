//! Display labels and coarse output types derived from AST shape.
//!
//! Everything here is pure: no graph access, no mutation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{FuncCall, Index, ObjectEntry, ObjectKey, Operator, Query, Suffix, Term, TermKind};

/// Prefix shared by every slice label.
pub const SLICE_PREFIX: &str = "Slice ";

/// Words the diagram language reserves; bare edge labels must avoid them.
pub const RESERVED_LABELS: [&str; 9] = [
    "array", "object", "string", "number", "boolean", "bool", "null", "true", "false",
];

static CODEC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(encode|decode)$").unwrap());
static BASE_HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(base|hex)").unwrap());
static HASH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(md5|sha1|sha224|sha256|sha384|sha512|sha3_224|sha3_256|sha3_384|sha3_512|blake2b|blake2s|blake3|crc32|adler32|fnv1a|murmur3|xxhash|xxh3|ripemd160)$",
    )
    .unwrap()
});
static COUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(length|keys)$").unwrap());

/// Coarse value type flowing along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Null,
    Array,
    Object,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Null => "null",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Output types
// ============================================================================

/// Output type of a whole query, `None` when unknown.
pub fn output_type(query: &Query) -> Option<ValueType> {
    match query {
        Query::Term(term) => term_type(term),
        Query::Binary { op, right, .. } => match op {
            Operator::Pipe => output_type(right),
            op => operator_type(*op),
        },
    }
}

/// Output type produced by a binary operator node.
pub fn operator_type(op: Operator) -> Option<ValueType> {
    if op.is_arithmetic() {
        Some(ValueType::Number)
    } else if op.is_comparison() || op.is_logical() {
        Some(ValueType::Boolean)
    } else {
        None
    }
}

/// Output type of a term. Indexing or iterating the result makes it unknown.
pub fn term_type(term: &Term) -> Option<ValueType> {
    let reshaped = term
        .suffixes
        .iter()
        .any(|suffix| !matches!(suffix, Suffix::Optional));
    if reshaped {
        return None;
    }

    match &term.kind {
        TermKind::Null => Some(ValueType::Null),
        TermKind::Boolean(_) => Some(ValueType::Boolean),
        TermKind::Number(_) => Some(ValueType::Number),
        TermKind::String(_) | TermKind::Format(..) => Some(ValueType::String),
        TermKind::Array(_) => Some(ValueType::Array),
        TermKind::Object(_) => Some(ValueType::Object),
        TermKind::Func(call) => function_type(&call.name),
        TermKind::Paren(inner) => output_type(inner),
        TermKind::Identity
        | TermKind::Recurse
        | TermKind::Variable(_)
        | TermKind::Index(_)
        | TermKind::Control(_) => None,
    }
}

/// Name-pattern table for function results.
pub fn function_type(name: &str) -> Option<ValueType> {
    if CODEC_RE.is_match(name) || BASE_HEX_RE.is_match(name) || HASH_RE.is_match(name) {
        Some(ValueType::String)
    } else if COUNT_RE.is_match(name) {
        Some(ValueType::Number)
    } else {
        None
    }
}

// ============================================================================
// Labels
// ============================================================================

/// Label for any query rendered compactly (used inside other labels).
pub fn compact(query: &Query) -> String {
    match query {
        Query::Term(term) => term_label(term),
        Query::Binary { op, left, right } => match op {
            Operator::Comma => format!("{}, {}", compact(left), compact(right)),
            op => format!("{} {} {}", compact(left), op, compact(right)),
        },
    }
}

/// `Slice [start:end]`, omitting absent bounds.
pub fn slice_label(start: Option<&Query>, end: Option<&Query>) -> String {
    format!(
        "{}[{}:{}]",
        SLICE_PREFIX,
        start.map(compact).unwrap_or_default(),
        end.map(compact).unwrap_or_default()
    )
}

/// Display label of a term.
///
/// Any slice, bare or suffixed, wins over every other rendering so the same
/// logical slice always gets the same label.
pub fn term_label(term: &Term) -> String {
    if let Some((start, end)) = term.slice() {
        return slice_label(start, end);
    }

    let mut label = kind_label(&term.kind);
    for suffix in &term.suffixes {
        label.push_str(&suffix_label(suffix));
    }
    label
}

/// Label for the container node standing in for a call or object.
pub fn container_label(term: &Term) -> String {
    let mut label = match &term.kind {
        TermKind::Func(call) => format!("{}()", call.name),
        kind => kind_label(kind),
    };
    for suffix in &term.suffixes {
        label.push_str(&suffix_label(suffix));
    }
    label
}

fn kind_label(kind: &TermKind) -> String {
    match kind {
        TermKind::Identity => ".".to_string(),
        TermKind::Recurse => "..".to_string(),
        TermKind::Func(call) => call_label(call),
        TermKind::Array(None) => "[]".to_string(),
        TermKind::Array(Some(inner)) => format!("[{}]", compact(inner)),
        TermKind::Object(entries) => object_label(entries),
        TermKind::Paren(inner) => format!("({})", compact(inner)),
        TermKind::Index(Index::Expr(q)) => format!(".[{}]", compact(q)),
        // literals, names, variables and control constructs print as jq text
        kind => kind.to_string(),
    }
}

fn call_label(call: &FuncCall) -> String {
    let args: Vec<String> = call.args.iter().map(compact).collect();
    format!("{}({})", call.name, args.join(", "))
}

fn object_label(entries: &[ObjectEntry]) -> String {
    let discoverable = entries
        .iter()
        .any(|entry| entry.value.as_ref().is_some_and(Query::contains_call));
    if !discoverable {
        return "Object".to_string();
    }

    let pairs: Vec<String> = entries
        .iter()
        .map(|entry| {
            let key = match &entry.key {
                ObjectKey::Computed(q) => format!("({})", compact(q)),
                key => key.to_string(),
            };
            match &entry.value {
                Some(value) => format!("{}: {}", key, compact(value)),
                None => key,
            }
        })
        .collect();
    format!("{{{}}}", pairs.join(", "))
}

fn suffix_label(suffix: &Suffix) -> String {
    match suffix {
        Suffix::Index(Index::Expr(q)) => format!("[{}]", compact(q)),
        suffix => suffix.to_string(),
    }
}

/// Name of the construct when the diagram only draws it as raw text.
pub fn unmodeled_kind(query: &Query) -> Option<&'static str> {
    match query {
        Query::Binary {
            op: Operator::Comma,
            ..
        } => Some("comma"),
        Query::Term(Term {
            kind: TermKind::Control(control),
            ..
        }) => Some(control.kind()),
        _ => None,
    }
}

// ============================================================================
// Edge labels
// ============================================================================

/// Trim quotes and whitespace; drop labels that collide with reserved words.
pub fn sanitize_edge_label(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim();
    if trimmed.is_empty()
        || RESERVED_LABELS
            .iter()
            .any(|word| word.eq_ignore_ascii_case(trimmed))
    {
        return None;
    }
    Some(trimmed.to_string())
}

/// Edge label for a value type.
///
/// Reserved words are suppressed as bare labels by [`sanitize_edge_label`]
/// and emitted quoted instead.
pub fn type_edge_label(ty: Option<ValueType>) -> Option<String> {
    let ty = ty?;
    Some(sanitize_edge_label(ty.as_str()).unwrap_or_else(|| format!("\"{}\"", ty.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitizer_rejects_reserved_words_in_any_case() {
        for word in ["Array", " OBJECT ", "\"string\"", "'Bool'", "null", "TRUE", "false"] {
            assert_eq!(sanitize_edge_label(word), None, "{word}");
        }
        assert_eq!(sanitize_edge_label("  \"bytes\" "), Some("bytes".to_string()));
        assert_eq!(sanitize_edge_label("\"\""), None);
    }

    #[test]
    fn test_type_edge_labels_are_quoted() {
        assert_eq!(type_edge_label(Some(ValueType::String)).as_deref(), Some("\"string\""));
        assert_eq!(type_edge_label(None), None);
    }

    #[test]
    fn test_function_table() {
        assert_eq!(function_type("base64_encode"), Some(ValueType::String));
        assert_eq!(function_type("url_decode"), Some(ValueType::String));
        assert_eq!(function_type("base32"), Some(ValueType::String));
        assert_eq!(function_type("hex"), Some(ValueType::String));
        assert_eq!(function_type("sha256"), Some(ValueType::String));
        assert_eq!(function_type("length"), Some(ValueType::Number));
        assert_eq!(function_type("keys"), Some(ValueType::Number));
        assert_eq!(function_type("map"), None);
        assert_eq!(function_type("sha256sum"), None);
    }
}
