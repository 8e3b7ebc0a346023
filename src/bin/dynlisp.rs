use std::fs;
use std::io::{self, Read};
use std::process;

use dynlisp::{evaluator, parser};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: dynlisp <file>... (use - for stdin)");
        process::exit(2);
    }

    let mut source = String::new();
    for name in &args {
        if name == "-" {
            if let Err(err) = io::stdin().read_to_string(&mut source) {
                eprintln!("stdin: {}", err);
                process::exit(1);
            }
        } else {
            match fs::read_to_string(name) {
                Ok(text) => source.push_str(&text),
                Err(err) => {
                    eprintln!("{}: {}", name, err);
                    process::exit(1);
                }
            }
        }
        source.push('\n');
    }

    let program = match parser::parse(&source) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    let mut out = io::stdout();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    if let Err(err) = evaluator::run(&program, &mut out, &mut input) {
        eprintln!("{}", err);
        process::exit(1);
    }
}
