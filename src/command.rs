//! Line-oriented commands for driving a symbol table by hand, shared by
//! the REPL and script runner.

use crate::storage::Storage;
use crate::symbol_table::{DataType, SymbolEntry, SymbolError, SymbolTable, UnknownType};
use std::io::{self, Write};
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = r#"
Commands:
    open, {                  Open a nested scope
    close, }                 Close the current scope
    insert <name> <type>     Declare a name in the current scope (alias: decl)
    <type> <name>            Same as insert, e.g. `int x`
    lookup <name>            Resolve a name, innermost scope first
    local <name>             Resolve a name in the current scope only
    dump                     Print every open scope
    state                    Show whether any scope is open
    reset                    Drop all scopes and reopen the root
    help                     Show this message

Types: int, float, char, void, undefined
Separate commands with newlines or `;`. `#` and `//` start a comment.
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Insert(String, DataType),
    Lookup(String),
    Local(String),
    Dump,
    State,
    Reset,
    Help,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Type(#[from] UnknownType),
    #[error(transparent)]
    Symbol(#[from] SymbolError),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["open"] | ["{"] => Ok(Command::Open),
            ["close"] | ["}"] => Ok(Command::Close),
            ["insert" | "decl", name, ty] => Ok(Command::Insert(name.to_string(), ty.parse()?)),
            ["insert" | "decl", ..] => Err(CommandError::Usage("insert <name> <type>")),
            ["lookup", name] => Ok(Command::Lookup(name.to_string())),
            ["lookup", ..] => Err(CommandError::Usage("lookup <name>")),
            ["local", name] => Ok(Command::Local(name.to_string())),
            ["local", ..] => Err(CommandError::Usage("local <name>")),
            ["dump"] => Ok(Command::Dump),
            ["state"] => Ok(Command::State),
            ["reset"] => Ok(Command::Reset),
            ["help"] => Ok(Command::Help),
            // Declaration shorthand: `int x`
            [ty, name] if ty.parse::<DataType>().is_ok() => {
                Ok(Command::Insert(name.to_string(), ty.parse()?))
            }
            _ => Err(CommandError::Unknown(line.trim().to_string())),
        }
    }
}

fn describe(entry: &SymbolEntry) -> String {
    format!("{}: {} (level {})", entry.name, entry.data_type, entry.scope_level)
}

/// Apply one command to `table` and return the text to show for it.
pub fn execute<S: Storage>(table: &mut SymbolTable<S>, command: &Command) -> Result<String, CommandError> {
    match command {
        Command::Open => Ok(format!("Opened scope level {}", table.open_scope())),
        Command::Close => Ok(format!("Closed scope level {}", table.close_scope()?)),
        Command::Insert(name, data_type) => {
            let entry = table.insert(name, *data_type)?;
            Ok(format!(
                "Inserted '{}' ({}) at level {}",
                entry.name, entry.data_type, entry.scope_level
            ))
        }
        Command::Lookup(name) => Ok(describe(table.resolve(name)?)),
        Command::Local(name) => table
            .lookup_current_scope(name)
            .map(describe)
            .ok_or_else(|| SymbolError::NotFound(name.clone()).into()),
        Command::Dump => Ok(table.to_string().trim().to_string()),
        Command::State => Ok(match table.current_level() {
            Some(level) => format!("Active: {} open scope(s), current level {}", table.depth(), level),
            None => "Degenerate: no active scope".to_string(),
        }),
        Command::Reset => {
            table.reset();
            Ok("Symbol table reset".to_string())
        }
        Command::Help => Ok(HELP.trim().to_string()),
    }
}

fn strip_comment(line: &str) -> &str {
    let end = [line.find('#'), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

/// Split script text into command lines. Newlines and `;` separate
/// commands and braces always stand alone, so `{ int x; }` is three
/// commands.
pub fn split_script(source: &str) -> Vec<String> {
    let mut commands = Vec::new();
    for line in source.lines() {
        let code = strip_comment(line).replace('{', ";{;").replace('}', ";};");
        for part in code.split(';') {
            let part = part.trim();
            if !part.is_empty() {
                commands.push(part.to_string());
            }
        }
    }
    commands
}

/// Run every command in `source`, writing results and errors to `out`.
/// Failures are reported and skipped; returns how many there were.
pub fn run_script<S: Storage, W: Write>(
    table: &mut SymbolTable<S>,
    source: &str,
    out: &mut W,
) -> io::Result<usize> {
    let mut failures = 0;
    for line in split_script(source) {
        let result = line.parse::<Command>().and_then(|command| execute(table, &command));
        match result {
            Ok(text) => writeln!(out, "{}", text)?,
            Err(e) => {
                failures += 1;
                writeln!(out, "error: {}", e)?;
            }
        }
    }
    Ok(failures)
}
