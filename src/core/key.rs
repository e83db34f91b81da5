// ============================================================================
// spark-lists - Slot Keys
// Stable string identities for list slots, independent of position
// ============================================================================

use std::borrow::Borrow;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// KEY
// =============================================================================

/// The stable identity of one slot.
///
/// Keys are strings so that a grouped projection's group keys can double as
/// the slot keys of its `.groups` list. Cloning is a reference-count bump.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Rc<str>);

impl Key {
    /// Create a key from any string-like value.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Rc::from(key.as_ref()))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", &*self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(Rc::from(value))
    }
}

impl From<&String> for Key {
    fn from(value: &String) -> Self {
        Self(Rc::from(value.as_str()))
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

// =============================================================================
// KEY GENERATOR
// =============================================================================

/// Mints keys for one list.
///
/// The counter only ever grows, so a key is never handed out twice even after
/// its slot has been removed.
#[derive(Debug, Default)]
pub struct KeyGenerator {
    next: Cell<u64>,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next key.
    pub fn next_key(&self) -> Key {
        let id = self.next.get();
        self.next.set(id + 1);
        Key::from(id.to_string())
    }

    /// Number of keys minted so far.
    pub fn minted(&self) -> u64 {
        self.next.get()
    }
}

// =============================================================================
// TESTS
// =============================================================================
