//! Size-classed block pool over a linear arena.

use std::cell::Cell;
use std::ptr::NonNull;

use crate::arena::LinearArena;

const MIN_CLASS: usize = 32;
const MAX_CLASS: usize = 4096;
const CLASS_COUNT: usize = 8; // 32, 64, 128, 256, 512, 1024, 2048, 4096

struct FreeBlock {
    next: Option<NonNull<FreeBlock>>,
}

/// Free-list pool with power-of-two classes from 32 to 4096 bytes.
/// Requests above 4096 bytes go straight to the arena, and freeing them is a
/// no-op: the bytes leak into the arena, which is bulk-freed anyway.
pub struct BlockPool<'a> {
    arena: &'a LinearArena,
    free: [Cell<Option<NonNull<FreeBlock>>>; CLASS_COUNT],
}

fn class_index(bytes: usize) -> Option<usize> {
    let rounded = bytes.max(MIN_CLASS).next_power_of_two();
    if rounded > MAX_CLASS {
        return None;
    }
    Some(rounded.trailing_zeros() as usize - MIN_CLASS.trailing_zeros() as usize)
}

fn class_size(index: usize) -> usize {
    MIN_CLASS << index
}

impl<'a> BlockPool<'a> {
    pub fn new(arena: &'a LinearArena) -> Self {
        Self {
            arena,
            free: [const { Cell::new(None) }; CLASS_COUNT],
        }
    }

    /// Pops a recycled block of the smallest class that fits, or carves a
    /// fresh one from the arena. `None` only on arena exhaustion.
    pub fn allocate(&self, bytes: usize) -> Option<NonNull<u8>> {
        let Some(index) = class_index(bytes) else {
            return self.arena.alloc_bytes(bytes, MIN_CLASS);
        };
        if let Some(block) = self.free[index].get() {
            // SAFETY: blocks on the free list were written by `free` and are
            // not aliased once popped.
            self.free[index].set(unsafe { block.as_ref().next });
            return Some(block.cast());
        }
        self.arena.alloc_bytes(class_size(index), MIN_CLASS)
    }

    /// Returns a block to its class free-list. `bytes` must be the size the
    /// block was requested with.
    pub fn free(&self, ptr: NonNull<u8>, bytes: usize) {
        let Some(index) = class_index(bytes) else {
            return; // oversized blocks stay in the arena
        };
        let block = ptr.cast::<FreeBlock>();
        // SAFETY: every class holds at least 32 bytes, room for the header;
        // the caller hands back exclusive ownership.
        unsafe {
            block.as_ptr().write(FreeBlock {
                next: self.free[index].get(),
            });
        }
        self.free[index].set(Some(block));
    }
}
