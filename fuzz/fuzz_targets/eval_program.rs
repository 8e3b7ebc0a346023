#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        if let Ok(program) = dynlisp::parser::parse(source) {
            let mut out = std::io::sink();
            let mut input = std::io::empty();
            let _ = dynlisp::evaluator::run(&program, &mut out, &mut input);
        }
    }
});
