use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::rc::Rc;

use crate::ast::{Node, Value};
use crate::builtinops::{self, Arity, BuiltinOp};
use crate::LispError;

/// Index of an environment record in the interpreter's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// One environment record: a variable table and a function table, plus an
/// optional parent link. The two tables are independent, so a symbol `x` and
/// a call `(x ...)` never collide.
#[derive(Default)]
struct Scope {
    parent: Option<ScopeId>,
    variables: HashMap<String, Value>,
    functions: HashMap<String, Rc<Function>>,
}

/// A callable registered in a function table. Defined functions capture no
/// environment: only the formal parameter names and the body node are fixed
/// at definition time, and free names resolve against the caller's chain at
/// call time (dynamic scoping).
pub enum Function {
    Native(&'static BuiltinOp),
    Defined {
        name: String,
        params: Vec<String>,
        body: Node,
    },
}

/// Tree-walking interpreter: an arena of environment records chained by
/// parent index, plus the output sink and input source shared by every scope
/// in the run.
///
/// The arena grows as `scope`/`while`/function calls open child environments
/// and is truncated when the construct finishes. Truncation is safe because
/// nothing outlives its nesting: values are plain data and functions hold no
/// scope references.
pub struct Interpreter<'io> {
    scopes: Vec<Scope>,
    out: &'io mut dyn Write,
    input: &'io mut dyn BufRead,
}

impl<'io> Interpreter<'io> {
    /// Create a root environment with all builtins installed.
    pub fn new(out: &'io mut dyn Write, input: &'io mut dyn BufRead) -> Self {
        let mut interp = Interpreter {
            scopes: vec![Scope::default()],
            out,
            input,
        };
        builtinops::install(&mut interp);
        interp
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Evaluate each top-level node in order, stopping at the first error.
    /// Returns the value of the last node, or nil for an empty program.
    pub fn run(&mut self, program: &[Node]) -> Result<Value, LispError> {
        let mut last = Value::Nil;
        for node in program {
            last = self.eval(node, self.root())?;
        }
        Ok(last)
    }

    pub fn eval(&mut self, node: &Node, scope: ScopeId) -> Result<Value, LispError> {
        match node {
            Node::Literal(value) => Ok(value.clone()),
            // An unbound symbol evaluates to nil, not an error
            Node::Symbol(name) => Ok(self.lookup_variable(scope, name)),
            Node::Call { name, args } => {
                let function = self
                    .find_function(scope, name)
                    .ok_or_else(|| LispError::FunctionNotFound(name.clone()))?;
                self.apply(&function, scope, args)
            }
        }
    }

    /// Invoke a function with the caller's environment and the raw argument
    /// nodes. Argument evaluation belongs entirely to the invoked function.
    fn apply(
        &mut self,
        function: &Function,
        caller: ScopeId,
        args: &[Node],
    ) -> Result<Value, LispError> {
        match function {
            Function::Native(op) => {
                op.arity.validate(op.names[0], args.len())?;
                (op.func)(self, caller, args)
            }
            Function::Defined { name, params, body } => {
                if args.len() != params.len() {
                    return Err(LispError::ArityError {
                        name: name.clone(),
                        expected: Arity::Exact(params.len()),
                        got: args.len(),
                    });
                }

                // Actuals evaluate in the caller's environment, then bind to
                // the formals in a fresh child of that same environment.
                let mut bound = Vec::with_capacity(args.len());
                for arg in args {
                    bound.push(self.eval(arg, caller)?);
                }

                let mark = self.scope_mark();
                let local = self.new_scope(caller);
                for (param, value) in params.iter().zip(bound) {
                    self.bind_local(local, param, value);
                }
                let result = self.eval(body, local);
                self.drop_scopes(mark);
                result
            }
        }
    }

    //
    // Environment chain operations
    //

    pub(crate) fn new_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        id
    }

    pub(crate) fn scope_mark(&self) -> usize {
        self.scopes.len()
    }

    pub(crate) fn drop_scopes(&mut self, mark: usize) {
        self.scopes.truncate(mark);
    }

    /// Walk the parent chain for a variable; a total miss yields nil.
    pub(crate) fn lookup_variable(&self, scope: ScopeId, name: &str) -> Value {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(value) = self.scopes[id.0].variables.get(name) {
                return value.clone();
            }
            current = self.scopes[id.0].parent;
        }
        Value::Nil
    }

    /// A binding in this scope's own table, ignoring the chain.
    pub(crate) fn local_variable(&self, scope: ScopeId, name: &str) -> Option<&Value> {
        self.scopes[scope.0].variables.get(name)
    }

    /// "set" semantics: mutate the nearest environment in the chain that
    /// already defines the name, or create it in the current one.
    pub(crate) fn set_variable(&mut self, scope: ScopeId, name: &str, value: Value) {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scopes[id.0].variables.contains_key(name) {
                self.scopes[id.0].variables.insert(name.to_string(), value);
                return;
            }
            current = self.scopes[id.0].parent;
        }
        self.scopes[scope.0].variables.insert(name.to_string(), value);
    }

    /// Bind in the current environment only, shadowing any outer binding.
    /// Used for `let` and function-parameter binding.
    pub(crate) fn bind_local(&mut self, scope: ScopeId, name: &str, value: Value) {
        self.scopes[scope.0].variables.insert(name.to_string(), value);
    }

    pub(crate) fn find_function(&self, scope: ScopeId, name: &str) -> Option<Rc<Function>> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(function) = self.scopes[id.0].functions.get(name) {
                return Some(Rc::clone(function));
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    pub(crate) fn register_function(&mut self, scope: ScopeId, name: &str, function: Rc<Function>) {
        self.scopes[scope.0]
            .functions
            .insert(name.to_string(), function);
    }

    //
    // I/O handles shared by every scope in the run
    //

    pub(crate) fn output(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    /// Read one line, excluding the terminator. End of input yields an empty
    /// string (which is falsey); only real I/O failures error.
    pub(crate) fn read_line(&mut self) -> Result<String, LispError> {
        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .map_err(|e| LispError::IoError(e.to_string()))?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }
}

/// Run a parsed program against a fresh root environment.
pub fn run(
    program: &[Node],
    out: &mut dyn Write,
    input: &mut dyn BufRead,
) -> Result<Value, LispError> {
    Interpreter::new(out, input).run(program)
}
