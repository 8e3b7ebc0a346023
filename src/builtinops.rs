//! Built-in function registry.
//!
//! Every builtin is a native function receiving the calling environment and
//! the call's *raw, unevaluated* argument nodes. Most evaluate their
//! arguments left to right; the control-flow and binding forms (`if`,
//! `while`, `set`, `let`, `defun`, `scope`) evaluate selectively or not at
//! all, which is the whole point of passing nodes instead of values.
//!
//! Operations are declared once in the `BUILTIN_OPS` table with their name
//! aliases and an [`Arity`] that is validated at dispatch, then installed
//! into the root environment's function table at interpreter startup.
//!
//! To add a new operation:
//!
//! 1. Implement a function with the [`NativeFn`] signature.
//! 2. Add an entry to `BUILTIN_OPS` with its names and arity.
//! 3. Add tests covering the edge cases and error conditions.

use std::rc::Rc;

use crate::ast::{Node, Value};
use crate::evaluator::{Function, Interpreter, ScopeId};
use crate::LispError;

/// Signature shared by every builtin: calling environment plus raw argument
/// nodes in, value or error out.
pub type NativeFn =
    fn(&mut Interpreter<'_>, ScopeId, &[Node]) -> Result<Value, LispError>;

/// Represents the expected number of arguments for an operation
#[derive(Debug, Clone, PartialEq)]
pub enum Arity {
    /// Exactly n arguments required
    Exact(usize),
    /// At least n arguments required
    AtLeast(usize),
    /// Any number of arguments (0 or more)
    Any,
}

impl Arity {
    /// Check if the given number of arguments is valid for this constraint
    pub fn validate(&self, name: &str, got: usize) -> Result<(), LispError> {
        let valid = match self {
            Arity::Exact(n) => got == *n,
            Arity::AtLeast(n) => got >= *n,
            Arity::Any => true,
        };

        if valid {
            Ok(())
        } else {
            Err(LispError::ArityError {
                name: name.to_string(),
                expected: self.clone(),
                got,
            })
        }
    }
}

/// Definition of a built-in operation
pub struct BuiltinOp {
    /// All names this operation is registered under (first one is canonical)
    pub names: &'static [&'static str],
    /// Expected number of arguments, validated before dispatch
    pub arity: Arity,
    /// The implementation
    pub func: NativeFn,
}

/// Register every builtin (under each of its aliases) into the root
/// environment's function table.
pub(crate) fn install(interp: &mut Interpreter<'_>) {
    let root = interp.root();
    for op in BUILTIN_OPS {
        for &name in op.names {
            interp.register_function(root, name, Rc::new(Function::Native(op)));
        }
    }
}

//
// Helpers
//

fn invalid_type(expected: &str, actual: &Value) -> LispError {
    LispError::TypeError(format!("{} expected but {} given", expected, actual.type_name()))
}

fn eval_args(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Vec<Value>, LispError> {
    let mut values = Vec::with_capacity(args.len());
    for node in args {
        values.push(interp.eval(node, scope)?);
    }
    Ok(values)
}

/// The binding forms take a literal symbol reference, not an evaluated value.
fn symbol_name<'a>(node: &'a Node, context: &str) -> Result<&'a str, LispError> {
    match node {
        Node::Symbol(name) => Ok(name),
        _ => Err(LispError::TypeError(format!("{} requires a symbol", context))),
    }
}

//
// Builtin function implementations
//

/// `+`/`add`: integer addition, or concatenation when the first argument is a
/// string (an integer on the right is stringified first).
pub fn builtin_add(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let values = eval_args(interp, scope, args)?;
    match (&values[0], &values[1]) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| LispError::EvalError("integer overflow in addition".to_string())),
        (Value::Int(_), other) => Err(invalid_type("int", other)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Str(a), Value::Int(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Str(_), other) => Err(invalid_type("int or string", other)),
        (other, _) => Err(invalid_type("int or string", other)),
    }
}

pub fn builtin_sub(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let values = eval_args(interp, scope, args)?;
    match (&values[0], &values[1]) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_sub(*b)
            .map(Value::Int)
            .ok_or_else(|| LispError::EvalError("integer overflow in subtraction".to_string())),
        (Value::Int(_), other) => Err(invalid_type("int", other)),
        (other, _) => Err(invalid_type("int", other)),
    }
}

pub fn builtin_mul(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let values = eval_args(interp, scope, args)?;
    match (&values[0], &values[1]) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_mul(*b)
            .map(Value::Int)
            .ok_or_else(|| LispError::EvalError("integer overflow in multiplication".to_string())),
        (Value::Int(_), other) => Err(invalid_type("int", other)),
        (other, _) => Err(invalid_type("int", other)),
    }
}

/// `/`/`div`: integer division truncating toward zero. Division by zero is a
/// native fault, not a caught condition.
pub fn builtin_div(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let values = eval_args(interp, scope, args)?;
    match (&values[0], &values[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a / b)),
        (Value::Int(_), other) => Err(invalid_type("int", other)),
        (other, _) => Err(invalid_type("int", other)),
    }
}

/// `==`: 1 when both values have the same variant and content, else 0.
/// No type coercion.
pub fn builtin_eq(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let values = eval_args(interp, scope, args)?;
    Ok(Value::Int(i64::from(values[0] == values[1])))
}

/// `set`: bind via the chain-search rule (mutate the nearest environment
/// defining the name, else create in the current one). Returns the value.
pub fn builtin_set(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let name = symbol_name(&args[0], "set")?;
    let value = interp.eval(&args[1], scope)?;
    interp.set_variable(scope, name, value.clone());
    Ok(value)
}

/// `get`: chain-resolved variable value, same as evaluating a bare symbol.
pub fn builtin_get(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let name = symbol_name(&args[0], "get")?;
    Ok(interp.lookup_variable(scope, name))
}

/// `let`: bind in the current environment only, shadowing outer bindings.
pub fn builtin_let(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let name = symbol_name(&args[0], "let")?;
    let value = interp.eval(&args[1], scope)?;
    interp.bind_local(scope, name, value.clone());
    Ok(value)
}

/// `scope`: evaluate the body in a fresh child environment. A non-nil
/// variable named `_return` in the child's own table overrides the value of
/// the last expression.
pub fn builtin_scope(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let mark = interp.scope_mark();
    let inner = interp.new_scope(scope);

    let mut last = Value::Nil;
    for node in args {
        match interp.eval(node, inner) {
            Ok(value) => last = value,
            Err(e) => {
                interp.drop_scopes(mark);
                return Err(e);
            }
        }
    }

    let result = match interp.local_variable(inner, "_return") {
        Some(value) if *value != Value::Nil => value.clone(),
        _ => last,
    };
    interp.drop_scopes(mark);
    Ok(result)
}

/// `stat`: evaluate each argument in the current environment, no new scope.
pub fn builtin_stat(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let mut last = Value::Nil;
    for node in args {
        last = interp.eval(node, scope)?;
    }
    Ok(last)
}

/// `defun`: register a function into the environment executing the defun.
/// First argument names the function, middle arguments name the formals, the
/// last argument is the unevaluated body.
pub fn builtin_defun(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let name = symbol_name(&args[0], "defun")?.to_string();

    let mut params = Vec::with_capacity(args.len() - 2);
    for node in &args[1..args.len() - 1] {
        params.push(symbol_name(node, "defun parameter")?.to_string());
    }
    let body = args[args.len() - 1].clone();

    let function = Rc::new(Function::Defined {
        name: name.clone(),
        params,
        body,
    });
    interp.register_function(scope, &name, function);
    Ok(Value::Nil)
}

/// `if`: evaluate the condition for truthiness, then exactly one branch.
pub fn builtin_if(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let condition = interp.eval(&args[0], scope)?;
    if condition.is_truthy() {
        interp.eval(&args[1], scope)
    } else {
        interp.eval(&args[2], scope)
    }
}

/// `while`: one child environment shared across iterations. Returns the last
/// body value, or nil if the loop never ran.
pub fn builtin_while(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let mark = interp.scope_mark();
    let inner = interp.new_scope(scope);

    let mut last = Value::Nil;
    let result = loop {
        match interp.eval(&args[0], inner) {
            Err(e) => break Err(e),
            Ok(condition) if !condition.is_truthy() => break Ok(last),
            Ok(_) => match interp.eval(&args[1], inner) {
                Ok(value) => last = value,
                Err(e) => break Err(e),
            },
        }
    };
    interp.drop_scopes(mark);
    result
}

/// `print`: integers in decimal, strings verbatim, nil as a placeholder,
/// concatenated with no separator. Returns the last printed value.
pub fn builtin_print(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    let mut values = eval_args(interp, scope, args)?;
    for value in &values {
        let rendered = match value {
            Value::Int(n) => n.to_string(),
            Value::Str(s) => s.clone(),
            Value::Nil => "nil".to_string(),
        };
        interp
            .output()
            .write_all(rendered.as_bytes())
            .map_err(|e| LispError::IoError(e.to_string()))?;
    }
    Ok(values.pop().unwrap_or(Value::Nil))
}

/// `getline`: one line from the input source, without its terminator.
pub fn builtin_getline(
    interp: &mut Interpreter<'_>,
    _scope: ScopeId,
    _args: &[Node],
) -> Result<Value, LispError> {
    interp.read_line().map(Value::Str)
}

/// `int`: identity on integers, decimal parse on strings.
pub fn builtin_int(
    interp: &mut Interpreter<'_>,
    scope: ScopeId,
    args: &[Node],
) -> Result<Value, LispError> {
    match interp.eval(&args[0], scope)? {
        Value::Int(n) => Ok(Value::Int(n)),
        Value::Str(s) => s
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| LispError::EvalError(format!("cannot parse {:?} as an integer", s))),
        other => Err(invalid_type("int or string", &other)),
    }
}

/// Global registry of all built-in operations
static BUILTIN_OPS: &[BuiltinOp] = &[
    // Arithmetic
    BuiltinOp {
        names: &["+", "add"],
        arity: Arity::Exact(2),
        func: builtin_add,
    },
    BuiltinOp {
        names: &["-", "sub"],
        arity: Arity::Exact(2),
        func: builtin_sub,
    },
    BuiltinOp {
        names: &["*", "mult"],
        arity: Arity::Exact(2),
        func: builtin_mul,
    },
    BuiltinOp {
        names: &["/", "div"],
        arity: Arity::Exact(2),
        func: builtin_div,
    },
    // Comparison
    BuiltinOp {
        names: &["=="],
        arity: Arity::Exact(2),
        func: builtin_eq,
    },
    // Bindings
    BuiltinOp {
        names: &["set"],
        arity: Arity::Exact(2),
        func: builtin_set,
    },
    BuiltinOp {
        names: &["get"],
        arity: Arity::Exact(1),
        func: builtin_get,
    },
    BuiltinOp {
        names: &["let"],
        arity: Arity::Exact(2),
        func: builtin_let,
    },
    // Sequencing and scoping
    BuiltinOp {
        names: &["scope"],
        arity: Arity::Any,
        func: builtin_scope,
    },
    BuiltinOp {
        names: &["stat"],
        arity: Arity::Any,
        func: builtin_stat,
    },
    BuiltinOp {
        names: &["defun"],
        arity: Arity::AtLeast(2),
        func: builtin_defun,
    },
    // Control flow
    BuiltinOp {
        names: &["if"],
        arity: Arity::Exact(3),
        func: builtin_if,
    },
    BuiltinOp {
        names: &["while"],
        arity: Arity::Exact(2),
        func: builtin_while,
    },
    // I/O
    BuiltinOp {
        names: &["print"],
        arity: Arity::Any,
        func: builtin_print,
    },
    BuiltinOp {
        names: &["getline"],
        arity: Arity::Exact(0),
        func: builtin_getline,
    },
    // Conversion
    BuiltinOp {
        names: &["int"],
        arity: Arity::Exact(1),
        func: builtin_int,
    },
];
