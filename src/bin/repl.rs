use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io;

use dynlisp::{parser, Interpreter, Value};

fn main() {
    println!("dynlisp v0.1.0");
    println!("Type expressions to evaluate them, or Ctrl+D to exit.");
    println!();

    let mut rl = DefaultEditor::new().unwrap();
    let mut out = io::stdout();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    // One root environment for the whole session, so top-level bindings
    // persist across lines.
    let mut interp = Interpreter::new(&mut out, &mut input);

    loop {
        match rl.readline("lisp> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                match parser::parse(line) {
                    Ok(program) => {
                        let mut last = Ok(Value::Nil);
                        for node in &program {
                            last = interp.eval(node, interp.root());
                            if last.is_err() {
                                break;
                            }
                        }
                        match last {
                            Ok(result) => println!("{}", result),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted. Use Ctrl+D or :quit to exit.");
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
}

fn print_help() {
    println!("dynlisp commands:");
    println!("  :help    - Show this help message");
    println!("  :quit    - Exit the interpreter");
    println!("  :exit    - Exit the interpreter");
    println!();
    println!("Language:");
    println!("  Values: 42, -5, \"hello\", nil");
    println!("  Arithmetic: +, -, *, / (aliases add, sub, mult, div)");
    println!("  Comparison: ==");
    println!("  Bindings: set, get, let");
    println!("  Scoping: scope, stat");
    println!("  Control flow: if, while");
    println!("  Functions: defun");
    println!("  I/O: print, getline, int");
    println!();
    println!("Examples:");
    println!("  (+ 1 2)");
    println!("  (set x 42)");
    println!("  (if (== x 42) \"yes\" \"no\")");
    println!("  (defun square x (* x x))");
    println!("  (square 5)");
}
