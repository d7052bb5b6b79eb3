use lasso::{Spur, ThreadedRodeo};
use std::sync::OnceLock;

/// A unique identifier for an interned name (atom or variable display name).
/// This is an interned string ID for fast equality comparison.
pub type NameId = Spur;

/// Thread-safe symbol store for interning atom and variable names.
///
/// Guarantees:
/// - Same string always produces same NameId
/// - Different strings always produce different NameIds
/// - NameId can be resolved back to the original string
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
}

impl SymbolStore {
    /// Create a new empty symbol store.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Intern a name, returning its unique NameId.
    /// If the name was already interned, returns the existing NameId.
    pub fn intern(&self, name: &str) -> NameId {
        self.rodeo.get_or_intern(name)
    }

    /// Resolve a NameId back to its string representation.
    pub fn resolve(&self, id: NameId) -> &str {
        self.rodeo.resolve(&id)
    }

    /// Get the NameId for a name if it exists, without interning.
    pub fn get(&self, name: &str) -> Option<NameId> {
        self.rodeo.get(name)
    }

    /// Check if a name has already been interned.
    pub fn contains(&self, name: &str) -> bool {
        self.rodeo.contains(name)
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide symbol store.
///
/// Terms are self-contained values that print and compare by name, so the
/// interner backing them is shared by every machine in the process. It is
/// append-only and lock-free for readers.
pub fn symbols() -> &'static SymbolStore {
    static STORE: OnceLock<SymbolStore> = OnceLock::new();
    STORE.get_or_init(SymbolStore::new)
}
