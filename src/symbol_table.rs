//! Lexically scoped symbol table.
//!
//! The table is a stack of scopes, innermost on top. Declarations go into
//! the top scope only; lookups walk from the top outward, so an inner
//! declaration shadows an outer one for as long as its scope is open.
//! Scope levels come from a counter that only ever increases, so a level
//! is never handed out twice during the table's lifetime.

use crate::storage::{Storage, SystemStorage};
use std::alloc::{handle_alloc_error, Layout};
use std::fmt;
use std::process;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, error, warn};

pub const INITIAL_SCOPE_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
    Char,
    Void,
    Undefined,
}

impl DataType {
    pub fn name(self) -> &'static str {
        match self {
            DataType::Int => "INT",
            DataType::Float => "FLOAT",
            DataType::Char => "CHAR",
            DataType::Void => "VOID",
            DataType::Undefined => "UNDEFINED",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown type: {0}")]
pub struct UnknownType(pub String);

impl FromStr for DataType {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" => Ok(DataType::Int),
            "float" => Ok(DataType::Float),
            "char" => Ok(DataType::Char),
            "void" => Ok(DataType::Void),
            "undefined" => Ok(DataType::Undefined),
            _ => Err(UnknownType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub data_type: DataType,
    pub scope_level: u32, // Level of the declaring scope
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("Redeclaration of '{name}' in scope level {level}")]
    Redeclaration { name: String, level: u32 },
    #[error("Undeclared identifier: {0}")]
    NotFound(String),
    #[error("No active scope")]
    NoActiveScope,
    #[error("Scope level {level} cannot grow beyond {capacity} entries")]
    StorageGrowth { level: u32, capacity: usize },
}

/// One lexical region: its entries in declaration order.
#[derive(Debug)]
pub struct Scope {
    entries: Vec<SymbolEntry>,
    capacity: usize,
    level: u32,
    enclosing: Option<u32>,
}

impl Scope {
    fn new(level: u32, enclosing: Option<u32>, entries: Vec<SymbolEntry>, capacity: usize) -> Self {
        Scope {
            entries,
            capacity,
            level,
            enclosing,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Level of the scope directly below this one, `None` for a root.
    pub fn enclosing_level(&self) -> Option<u32> {
        self.enclosing
    }

    /// Number of slots the scope may fill before it has to grow.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// At least one scope is open.
    Active,
    /// Every scope, root included, has been closed. Declarations are
    /// refused until a scope is opened again.
    Degenerate,
}

#[derive(Debug, Clone, Copy)]
pub struct TableConfig {
    /// Slots reserved for a freshly opened scope.
    pub initial_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            initial_capacity: INITIAL_SCOPE_CAPACITY,
        }
    }
}

pub struct SymbolTable<S: Storage = SystemStorage> {
    scopes: Vec<Scope>, // Root first, innermost last
    next_level: Option<u32>, // None once every level has been handed out
    config: TableConfig,
    storage: S,
}

impl SymbolTable {
    /// A table on the system heap with the root scope (level 0) open.
    pub fn new() -> Self {
        SymbolTable::with_storage(TableConfig::default(), SystemStorage)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl<S: Storage> SymbolTable<S> {
    pub fn with_storage(config: TableConfig, storage: S) -> Self {
        let mut table = SymbolTable {
            scopes: Vec::new(),
            next_level: Some(0),
            config,
            storage,
        };
        table.open_scope();
        debug!("Symbol table initialized, global scope (level 0) opened");
        table
    }

    pub fn state(&self) -> TableState {
        if self.scopes.is_empty() {
            TableState::Degenerate
        } else {
            TableState::Active
        }
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_level(&self) -> Option<u32> {
        self.scopes.last().map(Scope::level)
    }

    pub fn current_scope(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    /// Open scopes from innermost to outermost.
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> + '_ {
        self.scopes.iter().rev()
    }

    /// Push a new scope and return its level. Works from the degenerate
    /// state too; the level keeps counting from where it left off.
    ///
    /// Aborts if the scope's initial slots cannot be allocated or if every
    /// level has already been used.
    pub fn open_scope(&mut self) -> u32 {
        let Some(level) = self.next_level else {
            error!("Scope levels exhausted; refusing to reuse a level");
            process::abort();
        };
        self.next_level = level.checked_add(1);

        let capacity = self.config.initial_capacity;
        let mut entries: Vec<SymbolEntry> = Vec::new();
        if self.storage.allocate_scope(capacity).is_err() || entries.try_reserve_exact(capacity).is_err() {
            error!("Out of memory creating scope level {} with {} slots", level, capacity);
            handle_alloc_error(Layout::array::<SymbolEntry>(capacity).unwrap_or(Layout::new::<Scope>()));
        }

        let enclosing = self.current_level();
        self.scopes.push(Scope::new(level, enclosing, entries, capacity));
        debug!("Opened scope level {}", level);
        level
    }

    /// Pop the top scope, releasing its entries, and return its level.
    pub fn close_scope(&mut self) -> Result<u32, SymbolError> {
        let Some(scope) = self.scopes.pop() else {
            warn!("No scope to close");
            return Err(SymbolError::NoActiveScope);
        };
        if scope.enclosing.is_none() {
            warn!(
                "Root scope (level {}) closed; new declarations are refused until a scope is opened",
                scope.level
            );
        }
        debug!("Closed scope level {} ({} entries)", scope.level, scope.len());
        Ok(scope.level)
    }

    /// Declare `name` in the current scope.
    ///
    /// Fails with `Redeclaration` if the current scope already holds the
    /// name (outer scopes are not consulted), `NoActiveScope` when every
    /// scope has been closed, and `StorageGrowth` when a full scope cannot
    /// double its capacity. None of these failures change the table.
    pub fn insert(&mut self, name: &str, data_type: DataType) -> Result<&SymbolEntry, SymbolError> {
        let storage = &mut self.storage;
        let Some(scope) = self.scopes.last_mut() else {
            warn!("Cannot insert '{}', no current scope", name);
            return Err(SymbolError::NoActiveScope);
        };

        if scope.lookup(name).is_some() {
            return Err(SymbolError::Redeclaration {
                name: name.to_string(),
                level: scope.level,
            });
        }

        if scope.entries.len() >= scope.capacity {
            let requested = scope.capacity.saturating_mul(2).max(1);
            let additional = requested - scope.entries.len();
            let grown = storage.grow(scope.capacity, requested).is_ok()
                && scope.entries.try_reserve_exact(additional).is_ok();
            if !grown {
                warn!(
                    "Scope level {} could not grow from {} to {} entries",
                    scope.level, scope.capacity, requested
                );
                return Err(SymbolError::StorageGrowth {
                    level: scope.level,
                    capacity: scope.capacity,
                });
            }
            scope.capacity = requested;
        }

        if storage.allocate_entry(name.len()).is_err() {
            error!("Out of memory creating symbol entry for '{}'", name);
            handle_alloc_error(Layout::new::<SymbolEntry>());
        }

        let index = scope.entries.len();
        scope.entries.push(SymbolEntry {
            name: name.to_string(),
            data_type,
            scope_level: scope.level,
        });
        debug!("Inserted '{}' ({}) into scope level {}", name, data_type, scope.level);
        Ok(&scope.entries[index])
    }

    /// Search the current scope only.
    pub fn lookup_current_scope(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes.last()?.lookup(name)
    }

    /// Search from the current scope outward; the innermost match wins.
    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes.iter().rev().find_map(|scope| scope.lookup(name))
    }

    pub fn resolve(&self, name: &str) -> Result<&SymbolEntry, SymbolError> {
        self.lookup(name)
            .ok_or_else(|| SymbolError::NotFound(name.to_string()))
    }

    /// Drop every scope and start over from a fresh root at level 0.
    pub fn reset(&mut self) {
        self.scopes.clear();
        self.next_level = Some(0);
        self.open_scope();
        debug!("Symbol table reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LimitedStorage;

    #[test]
    fn test_new_table_has_root_scope() {
        let table = SymbolTable::new();
        assert_eq!(table.state(), TableState::Active);
        assert_eq!(table.depth(), 1);
        assert_eq!(table.current_level(), Some(0));
        let root = table.current_scope().unwrap();
        assert_eq!(root.enclosing_level(), None);
        assert_eq!(root.capacity(), INITIAL_SCOPE_CAPACITY);
        assert!(root.is_empty());
    }

    #[test]
    fn test_insert_records_scope_level() {
        let mut table = SymbolTable::new();
        table.open_scope();
        let entry = table.insert("count", DataType::Int).unwrap();
        assert_eq!(entry.name, "count");
        assert_eq!(entry.data_type, DataType::Int);
        assert_eq!(entry.scope_level, 1);
    }

    #[test]
    fn test_open_scope_links_enclosing() {
        let mut table = SymbolTable::new();
        let level = table.open_scope();
        assert_eq!(level, 1);
        assert_eq!(table.current_scope().unwrap().enclosing_level(), Some(0));
    }

    #[test]
    fn test_lookup_current_scope_ignores_outer() {
        let mut table = SymbolTable::new();
        table.insert("g", DataType::Char).unwrap();
        table.open_scope();
        assert!(table.lookup_current_scope("g").is_none());
        assert_eq!(table.lookup("g").unwrap().scope_level, 0);
    }

    #[test]
    fn test_shadowing_is_not_redeclaration() {
        let mut table = SymbolTable::new();
        table.insert("x", DataType::Int).unwrap();
        table.open_scope();
        assert!(table.insert("x", DataType::Float).is_ok());
    }

    #[test]
    fn test_redeclaration_reports_level() {
        let mut table = SymbolTable::new();
        table.open_scope();
        table.open_scope();
        table.insert("y", DataType::Int).unwrap();
        let err = table.insert("y", DataType::Void).unwrap_err();
        assert_eq!(err, SymbolError::Redeclaration { name: "y".to_string(), level: 2 });
        assert_eq!(table.current_scope().unwrap().len(), 1);
    }

    #[test]
    fn test_capacity_doubles_when_full() {
        let mut table = SymbolTable::new();
        for i in 0..INITIAL_SCOPE_CAPACITY {
            table.insert(&format!("v{}", i), DataType::Int).unwrap();
        }
        assert_eq!(table.current_scope().unwrap().capacity(), INITIAL_SCOPE_CAPACITY);

        table.insert("overflow", DataType::Int).unwrap();
        let scope = table.current_scope().unwrap();
        assert_eq!(scope.capacity(), INITIAL_SCOPE_CAPACITY * 2);
        assert_eq!(scope.len(), INITIAL_SCOPE_CAPACITY + 1);
    }

    #[test]
    fn test_growth_failure_keeps_scope_intact() {
        let config = TableConfig { initial_capacity: 4 };
        let mut table = SymbolTable::with_storage(config, LimitedStorage::new(4));
        for name in ["a", "b", "c", "d"] {
            table.insert(name, DataType::Int).unwrap();
        }

        let err = table.insert("e", DataType::Int).unwrap_err();
        assert_eq!(err, SymbolError::StorageGrowth { level: 0, capacity: 4 });

        let scope = table.current_scope().unwrap();
        assert_eq!(scope.capacity(), 4);
        let names: Vec<&str> = scope.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert!(table.lookup("e").is_none());
    }

    #[test]
    fn test_growth_failure_is_per_scope() {
        let config = TableConfig { initial_capacity: 2 };
        let mut table = SymbolTable::with_storage(config, LimitedStorage::new(2));
        table.insert("a", DataType::Int).unwrap();
        table.insert("b", DataType::Int).unwrap();
        assert!(table.insert("c", DataType::Int).is_err());

        table.open_scope();
        assert!(table.insert("c", DataType::Int).is_ok());
    }

    #[test]
    fn test_zero_initial_capacity_still_grows() {
        let config = TableConfig { initial_capacity: 0 };
        let mut table = SymbolTable::with_storage(config, SystemStorage);
        table.insert("a", DataType::Int).unwrap();
        table.insert("b", DataType::Int).unwrap();
        assert_eq!(table.current_scope().unwrap().capacity(), 2);
    }

    #[test]
    fn test_closing_root_degenerates() {
        let mut table = SymbolTable::new();
        table.insert("x", DataType::Int).unwrap();
        assert_eq!(table.close_scope(), Ok(0));
        assert_eq!(table.state(), TableState::Degenerate);
        assert_eq!(table.insert("x", DataType::Int).unwrap_err(), SymbolError::NoActiveScope);
        assert!(table.lookup("x").is_none());
        assert!(table.lookup_current_scope("x").is_none());
    }

    #[test]
    fn test_reopen_from_degenerate_continues_levels() {
        let mut table = SymbolTable::new();
        table.open_scope();
        table.close_scope().unwrap();
        table.close_scope().unwrap();
        assert_eq!(table.open_scope(), 2);
        assert_eq!(table.state(), TableState::Active);
        assert_eq!(table.current_scope().unwrap().enclosing_level(), None);
        assert_eq!(table.insert("z", DataType::Float).unwrap().scope_level, 2);
    }

    #[test]
    fn test_last_level_is_usable() {
        let mut table = SymbolTable::new();
        table.next_level = Some(u32::MAX);
        assert_eq!(table.open_scope(), u32::MAX);
        assert_eq!(table.next_level, None);
        assert_eq!(table.insert("edge", DataType::Int).unwrap().scope_level, u32::MAX);
    }

    #[test]
    fn test_scope_within_storage_ceiling() {
        let config = TableConfig { initial_capacity: 3 };
        let mut table = SymbolTable::with_storage(config, LimitedStorage::new(3));
        assert_eq!(table.open_scope(), 1);
        assert_eq!(table.current_scope().unwrap().capacity(), 3);
    }

    #[test]
    fn test_resolve_not_found() {
        let table = SymbolTable::new();
        assert_eq!(
            table.resolve("missing").unwrap_err(),
            SymbolError::NotFound("missing".to_string())
        );
    }

    #[test]
    fn test_reset_restarts_levels() {
        let mut table = SymbolTable::new();
        table.open_scope();
        table.insert("a", DataType::Int).unwrap();
        table.reset();
        assert_eq!(table.depth(), 1);
        assert_eq!(table.current_level(), Some(0));
        assert!(table.lookup("a").is_none());
    }

    #[test]
    fn test_parse_data_type() {
        assert_eq!("int".parse::<DataType>(), Ok(DataType::Int));
        assert_eq!("FLOAT".parse::<DataType>(), Ok(DataType::Float));
        assert_eq!("Undefined".parse::<DataType>(), Ok(DataType::Undefined));
        assert_eq!("bool".parse::<DataType>(), Err(UnknownType("bool".to_string())));
    }

    #[test]
    fn test_data_type_padding() {
        assert_eq!(format!("[{:<6}]", DataType::Int), "[INT   ]");
    }
}
