//! Read-only views of the symbol table for debugging.

use crate::storage::Storage;
use crate::symbol_table::SymbolTable;
use std::fmt;
use std::io;

const RULE: &str = "------------------------------------------------------";

impl<S: Storage> fmt::Display for SymbolTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "----- Symbol Table (Current View from Innermost Scope) -----")?;

        let mut scopes = self.scopes().peekable();
        if scopes.peek().is_none() {
            writeln!(f, "  (No active scope)")?;
        }
        while let Some(scope) = scopes.next() {
            writeln!(
                f,
                "Scope Level: {} (Capacity: {}, Count: {})",
                scope.level(),
                scope.capacity(),
                scope.len()
            )?;
            writeln!(f, "{}", RULE)?;
            if scope.is_empty() {
                writeln!(f, "  (Scope is empty)")?;
            }
            for entry in scope.entries() {
                writeln!(
                    f,
                    "  Name: {:<15} | Type: {:<10} | Defined Scope: {}",
                    entry.name, entry.data_type, entry.scope_level
                )?;
            }
            writeln!(f, "{}", RULE)?;
            if scopes.peek().is_some() {
                writeln!(f, "  |")?;
                writeln!(f, "  V (Enclosing Scope)")?;
            }
        }

        writeln!(f, "--- End Symbol Table ---")?;
        writeln!(f)
    }
}

impl<S: Storage> SymbolTable<S> {
    /// Write the open scopes, innermost first, to `out`.
    pub fn dump<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self)
    }
}
