//! MSI-probed string intern table.
//!
//! Interning collapses equal strings to one canonical span, so comparisons
//! downstream are cheap and every consumer shares one copy of each path or
//! identifier. The table is open-addressed with the probe step derived from
//! the hash's top bits (see [`crate::hash::msi_lookup`]); it grows by one
//! exponent whenever occupancy crosses 50%.

use std::ptr::NonNull;

use crate::arena::LinearArena;
use crate::hash::{fnv1a, msi_lookup};

/// Canonical interned span. Cheap to copy and compare; the fast path is
/// pointer identity, falling back to a byte compare for spans from
/// different tables.
///
/// An `Istr` borrows storage owned by its [`StringTable`] and must not
/// outlive it.
#[derive(Clone, Copy)]
pub struct Istr {
    ptr: NonNull<u8>,
    len: u32,
}

// SAFETY: interned bytes are written once on insert and never mutated or
// freed before the table drops.
unsafe impl Send for Istr {}
unsafe impl Sync for Istr {}

impl Istr {
    pub fn as_str(&self) -> &str {
        // SAFETY: spans are only created from `&str` input in `intern`.
        unsafe {
            std::str::from_utf8_unchecked(std::slice::from_raw_parts(
                self.ptr.as_ptr(),
                self.len as usize,
            ))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq for Istr {
    fn eq(&self, other: &Istr) -> bool {
        self.ptr == other.ptr || self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Istr {}

impl std::hash::Hash for Istr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl std::fmt::Debug for Istr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl std::fmt::Display for Istr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open-addressed intern table keyed by byte content.
pub struct StringTable {
    bytes: LinearArena,
    slots: Vec<Option<Istr>>,
    exponent: u32,
    size: usize,
}

/// Address-space reservation for interned bytes: 256 MiB.
const BYTES_RESERVE: usize = 256 << 20;

impl StringTable {
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    pub fn with_capacity(initial_capacity: usize) -> Self {
        let capacity = initial_capacity.max(128).next_power_of_two();
        Self {
            bytes: LinearArena::with_capacity(BYTES_RESERVE, 4096)
                .expect("failed to reserve the intern arena"),
            slots: vec![None; capacity],
            exponent: capacity.trailing_zeros(),
            size: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the canonical span for `value`, copying it into the table on
    /// first sight. The stored copy is NUL-terminated for consumers that
    /// hand spans to C-style interfaces.
    pub fn intern(&mut self, value: &str) -> Istr {
        let hash = fnv1a(value.as_bytes());
        let mut idx = hash;
        loop {
            idx = msi_lookup(hash, self.exponent, idx);
            match self.slots[idx as usize] {
                None => {
                    let interned = self.store(value);
                    self.slots[idx as usize] = Some(interned);
                    self.size += 1;

                    // The table may fill to 50%; past that, rehash one
                    // exponent up. The fresh entry is already installed, so
                    // a rehash right at the threshold is safe.
                    let threshold = (1usize << self.exponent) >> 1;
                    if self.size > threshold {
                        self.rehash();
                    }
                    return interned;
                }
                Some(existing) if existing.as_bytes() == value.as_bytes() => return existing,
                Some(_) => {}
            }
        }
    }

    fn store(&self, value: &str) -> Istr {
        assert!(value.len() < u32::MAX as usize, "intern span too large");
        let ptr = self
            .bytes
            .alloc_bytes(value.len() + 1, 1)
            .expect("intern arena exhausted");
        // SAFETY: fresh allocation of len + 1 bytes.
        unsafe {
            std::ptr::copy_nonoverlapping(value.as_ptr(), ptr.as_ptr(), value.len());
            ptr.as_ptr().add(value.len()).write(0);
        }
        Istr {
            ptr,
            len: value.len() as u32,
        }
    }

    fn rehash(&mut self) {
        let new_exponent = self.exponent + 1;
        let mut new_slots = vec![None; 1usize << new_exponent];
        for interned in self.slots.iter().flatten() {
            let hash = fnv1a(interned.as_bytes());
            let mut idx = hash;
            loop {
                idx = msi_lookup(hash, new_exponent, idx);
                if new_slots[idx as usize].is_none() {
                    new_slots[idx as usize] = Some(*interned);
                    break;
                }
            }
        }
        self.slots = new_slots;
        self.exponent = new_exponent;
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}
