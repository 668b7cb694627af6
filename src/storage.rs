//! Memory model consumed by the symbol table.
//!
//! Scope storage can fail in two distinct ways. Failing to grow a scope's
//! entry array is recoverable: the insert is refused and the scope keeps
//! what it had. Failing to allocate an entry at all is not, and the table
//! aborts through the standard allocation-error handler, as it does when
//! a new scope cannot get its initial slots.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("allocation of {requested} slots refused")]
pub struct AllocError {
    pub requested: usize,
}

/// Source of scope storage for a [`SymbolTable`](crate::symbol_table::SymbolTable).
pub trait Storage {
    /// Grant a freshly opened scope its initial `capacity` slots.
    fn allocate_scope(&mut self, capacity: usize) -> Result<(), AllocError>;

    /// Grant a scope's entry array growth from `current` to `requested`
    /// slots.
    fn grow(&mut self, current: usize, requested: usize) -> Result<(), AllocError>;

    /// Grant the allocation of one entry with a name of `name_len` bytes.
    fn allocate_entry(&mut self, name_len: usize) -> Result<(), AllocError>;
}

/// Plain heap storage; only the real allocator can refuse growth.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemStorage;

impl Storage for SystemStorage {
    fn allocate_scope(&mut self, _capacity: usize) -> Result<(), AllocError> {
        Ok(())
    }

    fn grow(&mut self, _current: usize, _requested: usize) -> Result<(), AllocError> {
        Ok(())
    }

    fn allocate_entry(&mut self, _name_len: usize) -> Result<(), AllocError> {
        Ok(())
    }
}

/// Heap storage with a ceiling on the number of slots any one scope may
/// hold. Growth past the ceiling is refused.
#[derive(Debug, Clone, Copy)]
pub struct LimitedStorage {
    pub max_slots: usize,
}

impl LimitedStorage {
    pub fn new(max_slots: usize) -> Self {
        LimitedStorage { max_slots }
    }
}

impl Storage for LimitedStorage {
    fn allocate_scope(&mut self, capacity: usize) -> Result<(), AllocError> {
        if capacity > self.max_slots {
            return Err(AllocError { requested: capacity });
        }
        Ok(())
    }

    fn grow(&mut self, _current: usize, requested: usize) -> Result<(), AllocError> {
        if requested > self.max_slots {
            return Err(AllocError { requested });
        }
        Ok(())
    }

    fn allocate_entry(&mut self, _name_len: usize) -> Result<(), AllocError> {
        Ok(())
    }
}
