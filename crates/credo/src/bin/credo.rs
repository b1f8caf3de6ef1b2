//! Batch driver: run script files and report assertion results.
//!
//! Exit code 0 if every `Assert` held and every `Refute` failed as
//! expected; 1 otherwise (including parse and configuration errors).

use credo::{parse_script, run, Context, MemorySink, Outcome};
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} [options] <script>...", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --trace    Emit the event log as JSON lines after each script");
        std::process::exit(1);
    }

    let mut trace = false;
    let mut files: Vec<&String> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "--trace" => trace = true,
            _ => files.push(arg),
        }
    }

    let mut all_ok = true;
    for file in files {
        match run_file(file, trace) {
            Ok(passed) => all_ok &= passed,
            Err(e) => {
                eprintln!("{}: {}", file, e);
                all_ok = false;
            }
        }
    }
    std::process::exit(if all_ok { 0 } else { 1 });
}

fn run_file(path: &str, trace: bool) -> Result<bool, credo::Error> {
    let text =
        fs::read_to_string(path).map_err(|e| credo::Error::Parse(format!("{}: {}", path, e)))?;
    let directives = parse_script(&text)?;

    let sink = Rc::new(RefCell::new(MemorySink::default()));
    let mut ctx = Context::with_sink(Box::new(sink.clone()));

    let mut passed = true;
    for d in &directives {
        match run(&mut ctx, d)? {
            Outcome::Done => {}
            Outcome::KbAdded { ok, formula } => {
                if !ok {
                    eprintln!("{}: axiom rejected: {}", path, formula);
                }
            }
            Outcome::Check {
                expected,
                holds,
                formula,
            } => {
                let ok = expected == holds;
                println!(
                    "{} {}  [{}]",
                    if expected { "Assert:" } else { "Refute:" },
                    formula,
                    if ok { "ok" } else { "FAILED" }
                );
                passed &= ok;
            }
        }
    }

    if trace {
        for event in &sink.borrow().events {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("{}: cannot serialize event: {}", path, e),
            }
        }
    }

    Ok(passed)
}
