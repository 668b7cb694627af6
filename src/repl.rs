use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::fs;
use tinyc::command::{execute, run_script, split_script, Command, HELP};
use tinyc::storage::Storage;
use tinyc::symbol_table::SymbolTable;

const BANNER: &str = r#"
  _   _
 | |_(_)_ __  _   _  ___
 | __| | '_ \| | | |/ __|
 | |_| | | | | |_| | (__
  \__|_|_| |_|\__, |\___|
              |___/
"#;

pub fn run_repl<S: Storage>(table: &mut SymbolTable<S>) {
    println!("{}", BANNER);
    println!("tinyc symbol table inspector v{}", tinyc::VERSION);
    println!("Type .help for commands, .exit to quit.");
    println!("Use arrow keys for history.\n");

    if let Err(e) = repl_loop(table) {
        eprintln!("REPL error: {}", e);
    }
}

fn repl_loop<S: Storage>(table: &mut SymbolTable<S>) -> RlResult<()> {
    let mut rl = DefaultEditor::new()?;

    let history_path = dirs_history_path();
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = match table.current_level() {
            Some(level) => format!("tinyc[{}]> ", level),
            None => "tinyc[-]> ".to_string(),
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                if trimmed.starts_with('.') {
                    if handle_command(trimmed, table) {
                        break;
                    }
                    continue;
                }

                execute_input(table, trimmed);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

fn dirs_history_path() -> Option<String> {
    dirs::home_dir().map(|mut path| {
        path.push(".tinyc_history");
        path.to_string_lossy().to_string()
    })
}

/// Handle a REPL meta-command. Returns true if the REPL should exit.
fn handle_command<S: Storage>(cmd: &str, table: &mut SymbolTable<S>) -> bool {
    let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
    let command = parts[0];
    let arg = parts.get(1).map(|s| s.trim());

    match command {
        ".exit" | ".quit" | ".q" => {
            println!("Goodbye!");
            return true;
        }
        ".help" | ".h" => {
            print_repl_help();
        }
        ".clear" => {
            table.reset();
            println!("State cleared.");
        }
        ".load" => {
            if let Some(filename) = arg {
                load_file(table, filename);
            } else {
                eprintln!("Usage: .load <filename>");
            }
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Type .help for available commands.");
        }
    }

    false
}

fn load_file<S: Storage>(table: &mut SymbolTable<S>, filename: &str) {
    match fs::read_to_string(filename) {
        Ok(source) => {
            let mut stdout = std::io::stdout();
            match run_script(table, &source, &mut stdout) {
                Ok(0) => {}
                Ok(failures) => eprintln!("{} command(s) failed in {}", failures, filename),
                Err(e) => eprintln!("Error writing output: {}", e),
            }
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", filename, e);
        }
    }
}

fn execute_input<S: Storage>(table: &mut SymbolTable<S>, input: &str) {
    for line in split_script(input) {
        match line.parse::<Command>().and_then(|command| execute(table, &command)) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("error: {}", e),
        }
    }
}

fn print_repl_help() {
    println!(
        r#"
REPL Commands:
    .help, .h          Show this help message
    .exit, .quit, .q   Exit the REPL
    .clear             Drop all scopes and reopen the root
    .load <file>       Run a command script against the current table

Navigation:
    Up/Down arrows     Navigate command history
    Ctrl-C             Cancel current input
    Ctrl-D             Exit REPL
{}
History is saved to ~/.tinyc_history"#,
        HELP
    );
}
