pub mod ast;
pub mod command;
pub mod diagnostics;
pub mod logging;
pub mod storage;
pub mod symbol_table;

pub const VERSION: &str = "0.1.0";
