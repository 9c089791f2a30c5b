//! Abstract allocator capability.
//!
//! Components that allocate through an [`Allocator`] must not assume which
//! backing they were handed; in particular `free` may be a no-op.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::arena::LinearArena;

#[derive(Clone, Copy)]
pub enum Allocator<'a> {
    /// Bump allocation from a linear arena. `free` is a no-op.
    Arena(&'a LinearArena),
    /// The process allocator.
    Heap,
}

impl Allocator<'_> {
    /// Arena-backed instance over `arena`.
    pub fn arena(arena: &LinearArena) -> Allocator<'_> {
        Allocator::Arena(arena)
    }

    /// Process-allocator instance.
    pub fn heap() -> Allocator<'static> {
        Allocator::Heap
    }

    pub fn alloc_bytes(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        match self {
            Allocator::Arena(arena) => arena.alloc_bytes(size, align),
            Allocator::Heap => {
                if size == 0 {
                    return Some(NonNull::dangling());
                }
                let layout = Layout::from_size_align(size, align.max(1).next_power_of_two()).ok()?;
                // SAFETY: non-zero size, valid layout.
                NonNull::new(unsafe { std::alloc::alloc(layout) })
            }
        }
    }

    /// Releases a block previously produced by `alloc_bytes` with the same
    /// size and alignment.
    pub fn free(&self, ptr: NonNull<u8>, size: usize, align: usize) {
        match self {
            Allocator::Arena(_) => {}
            Allocator::Heap => {
                if size == 0 {
                    return;
                }
                if let Ok(layout) = Layout::from_size_align(size, align.max(1).next_power_of_two())
                {
                    // SAFETY: the block came from `std::alloc::alloc` with
                    // this exact layout.
                    unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
                }
            }
        }
    }
}
