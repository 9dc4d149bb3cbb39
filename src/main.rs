use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process,
};

use clap::Parser;
use patlang::{
    interpreter::{evaluator::core::Interp, value::core::Value},
    run_source,
};

/// patlang is a small, expression-oriented scripting language with patterns,
/// named return tuples and file-based modules.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, disable_version_flag = true)]
struct Args {
    /// Script file to run. Without one, an interactive REPL starts.
    file: Option<PathBuf>,

    /// Print version information.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,
}

fn main() {
    let args = Args::parse();

    match &args.file {
        Some(path) => process::exit(run_file(path)),
        None => repl(),
    }
}

/// Runs a script file. Exit code 0 on success, 1 on a missing file or any
/// parse or runtime error.
fn run_file(path: &Path) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            return 1;
        },
    };

    let mut stdout = io::stdout();
    let mut interp = Interp::new(&mut stdout);
    match run_source(&source, &mut interp) {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("{e}");
            1
        },
    }
}

/// The interactive REPL: one line at a time against a persistent
/// interpreter, printing each line's last non-null value. Errors are
/// reported and the session continues.
fn repl() {
    println!("patlang {} (type 'exit' to quit)", env!("CARGO_PKG_VERSION"));

    let mut stdout = io::stdout();
    let mut interp = Interp::new(&mut stdout);
    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {},
        }
        if line.starts_with("exit") {
            break;
        }

        match run_source(&line, &mut interp) {
            Ok(value) => {
                if !matches!(value, Value::Null) {
                    println!("{value}");
                }
            },
            Err(e) => eprintln!("{e}"),
        }
    }
}
