use std::fmt;

/// Runtime values. The language has exactly three shapes: signed integers,
/// escape-decoded UTF-8 strings, and nil. Values are immutable once produced;
/// there are no composite values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    Nil,
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Nil => "nil",
        }
    }

    /// Boolean coercion used by `if` and `while`: nil is false, zero and the
    /// empty string are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Int(n) => *n != 0,
            Value::Str(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Nil => write!(f, "nil"),
        }
    }
}

/// One parsed unit of source.
///
/// Call arguments are kept as unevaluated nodes: the invoked function decides
/// whether and in what order to evaluate them, which is what lets `if`,
/// `while`, `set` and `defun` skip or repeat evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A literal produced directly by the reader (numbers, strings, `nil`).
    Literal(Value),
    /// A variable reference, resolved at evaluation time.
    Symbol(String),
    /// A function invocation by name.
    Call { name: String, args: Vec<Node> },
}

/// An ordered sequence of top-level nodes.
pub type Program = Vec<Node>;
