mod repl;

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;
use tinyc::command::run_script;
use tinyc::logging::init_logging;
use tinyc::storage::LimitedStorage;
use tinyc::symbol_table::{SymbolTable, TableConfig};

fn print_help() {
    println!(
        r#"tinyc - symbol table inspector v{}

Drives the scope-stack symbol table of the tinyc front end by hand:
open and close scopes, declare names, and watch shadowing resolve.

USAGE:
    tinyc                   Start the REPL (interactive mode)
    tinyc <file>            Run a command script
    tinyc -e "commands"     Run commands directly
    tinyc -                 Read and run a script from stdin
    tinyc [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -v, --version           Print version information
    -i, --repl              Start the REPL (interactive mode)
    -e <commands>           Run commands directly
    --capacity <n>          Initial entry capacity of each scope (default: 10)
    --max-capacity <n>      Refuse to grow any scope beyond n entries
    --verbose               Log scope and symbol events (same as RUST_LOG=debug)

EXAMPLE:
    tinyc -e "int x; {{ float x; lookup x }}; lookup x; dump"
"#,
        tinyc::VERSION
    );
}

fn parse_count(flag: &str, value: Option<&String>) -> usize {
    let Some(value) = value else {
        eprintln!("Error: {} requires a value", flag);
        process::exit(1);
    };
    match value.parse::<usize>() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Error: {} value must be a non-negative integer", flag);
            process::exit(1);
        }
    }
}

fn run_source(table: &mut SymbolTable<LimitedStorage>, source: &str) {
    let mut stdout = io::stdout();
    match run_script(table, source, &mut stdout) {
        Ok(0) => {}
        Ok(failures) => {
            eprintln!("{} command(s) failed", failures);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error writing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_file(table: &mut SymbolTable<LimitedStorage>, filename: &str) {
    let source = match fs::read_to_string(filename) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", filename, e);
            process::exit(1);
        }
    };

    run_source(table, &source);
}

fn run_stdin(table: &mut SymbolTable<LimitedStorage>) {
    let mut source = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut source) {
        eprintln!("Error reading stdin: {}", e);
        process::exit(1);
    }

    run_source(table, &source);
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Table options can appear anywhere; pull them out first
    let mut config = TableConfig::default();
    let mut max_capacity = usize::MAX;
    let mut verbose = false;
    let mut rest = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--capacity" => {
                config.initial_capacity = parse_count("--capacity", args.get(i + 1));
                i += 2;
            }
            "--max-capacity" => {
                max_capacity = parse_count("--max-capacity", args.get(i + 1));
                i += 2;
            }
            "--verbose" => {
                verbose = true;
                i += 1;
            }
            _ => {
                rest.push(args[i].clone());
                i += 1;
            }
        }
    }
    let args = rest;

    if config.initial_capacity > max_capacity {
        eprintln!(
            "Error: --capacity ({}) cannot exceed --max-capacity ({})",
            config.initial_capacity, max_capacity
        );
        process::exit(1);
    }

    init_logging(if verbose { "debug" } else { "warn" });
    let mut table = SymbolTable::with_storage(config, LimitedStorage::new(max_capacity));

    // No arguments - start REPL
    if args.len() < 2 {
        repl::run_repl(&mut table);
        return;
    }

    match args[1].as_str() {
        "-h" | "--help" => {
            print_help();
        }
        "-v" | "--version" => {
            println!("tinyc {}", tinyc::VERSION);
        }
        "-i" | "--repl" => {
            repl::run_repl(&mut table);
        }
        "-e" => {
            if args.len() < 3 {
                eprintln!("Error: -e requires a command argument");
                eprintln!("Usage: tinyc -e \"int x; lookup x\"");
                process::exit(1);
            }
            run_source(&mut table, &args[2]);
        }
        "-" => {
            run_stdin(&mut table);
        }
        filename => {
            run_file(&mut table, filename);
        }
    }
}
