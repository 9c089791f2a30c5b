//! Reserve-once, commit-on-demand linear arena.
//!
//! A [`LinearArena`] reserves a large contiguous address range up front
//! through an anonymous mapping and hands out bump allocations from it. The
//! OS backs pages lazily; the arena tracks a committed watermark in
//! power-of-two steps so exhaustion surfaces as `None` instead of a fault.
//! `reset` rewinds the bump offset without releasing pages, which is the
//! whole point: a re-parse reuses the already-touched memory of the previous
//! parse.

use std::cell::Cell;
use std::ptr::NonNull;

use memmap2::MmapMut;

/// Default address-range reservation: 1 GiB.
pub const DEFAULT_RESERVE: usize = 1 << 30;

/// Smallest permitted commit step: 8 KiB.
pub const MIN_COMMIT_STEP: usize = 8 * 1024;

const PAGE_SIZE: usize = 4096;

pub struct LinearArena {
    base: NonNull<u8>,
    offset: Cell<usize>,
    committed: Cell<usize>,
    commit_step: usize,
    // Keeps the reservation alive; the mapping's address is stable for the
    // lifetime of this struct even when the struct itself moves.
    map: MmapMut,
}

// SAFETY: the arena exclusively owns its mapping; `base` points into memory
// owned by `map`, so moving the arena to another thread moves sole access.
unsafe impl Send for LinearArena {}

impl LinearArena {
    /// Reserves `reserve` bytes of address space, committing on demand in
    /// steps of at least `min_commit` (rounded up to a power of two and to
    /// the page size).
    pub fn with_capacity(reserve: usize, min_commit: usize) -> std::io::Result<Self> {
        let reserve = reserve.max(PAGE_SIZE);
        let mut map = MmapMut::map_anon(reserve)?;
        let base = NonNull::new(map.as_mut_ptr()).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::OutOfMemory, "anonymous mapping is null")
        })?;
        let commit_step = min_commit
            .max(MIN_COMMIT_STEP)
            .next_power_of_two()
            .max(PAGE_SIZE);
        Ok(Self {
            base,
            offset: Cell::new(0),
            committed: Cell::new(0),
            commit_step,
            map,
        })
    }

    /// 1 GiB reservation with the minimum commit step.
    pub fn new() -> std::io::Result<Self> {
        Self::with_capacity(DEFAULT_RESERVE, MIN_COMMIT_STEP)
    }

    /// Bump-allocates `size` bytes at `align` (rounded up to a power of
    /// two). Returns `None` when the reservation is exhausted.
    pub fn alloc_bytes(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let align = align.max(1).next_power_of_two();
        let start = self.offset.get().checked_add(align - 1)? & !(align - 1);
        let end = start.checked_add(size)?;
        if end > self.map.len() {
            return None;
        }
        if end > self.committed.get() {
            let step = self.commit_step;
            let target = end.checked_add(step - 1)? & !(step - 1);
            self.committed.set(target.min(self.map.len()));
        }
        self.offset.set(end);
        // SAFETY: start + size lies inside the mapping and start is aligned.
        Some(unsafe { NonNull::new_unchecked(self.base.as_ptr().add(start)) })
    }

    /// Allocates and writes a single value.
    pub fn alloc<T: Copy>(&self, value: T) -> Option<&mut T> {
        let ptr = self.alloc_bytes(size_of::<T>(), align_of::<T>())?.cast::<T>();
        // SAFETY: freshly allocated, properly aligned, exclusively ours.
        unsafe {
            ptr.as_ptr().write(value);
            Some(&mut *ptr.as_ptr())
        }
    }

    /// Copies a slice into the arena.
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> Option<&mut [T]> {
        if src.is_empty() {
            return Some(&mut []);
        }
        let ptr = self
            .alloc_bytes(size_of_val(src), align_of::<T>())?
            .cast::<T>();
        // SAFETY: destination is a fresh allocation of the right size.
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), ptr.as_ptr(), src.len());
            Some(std::slice::from_raw_parts_mut(ptr.as_ptr(), src.len()))
        }
    }

    /// Allocates `len` copies of `value` as a contiguous slice.
    pub fn alloc_slice_fill<T: Copy>(&self, len: usize, value: T) -> Option<&mut [T]> {
        if len == 0 {
            return Some(&mut []);
        }
        let bytes = size_of::<T>().checked_mul(len)?;
        let ptr = self.alloc_bytes(bytes, align_of::<T>())?.cast::<T>();
        // SAFETY: fresh allocation of `len` elements.
        unsafe {
            for i in 0..len {
                ptr.as_ptr().add(i).write(value);
            }
            Some(std::slice::from_raw_parts_mut(ptr.as_ptr(), len))
        }
    }

    /// Copies a string into the arena.
    pub fn alloc_str(&self, src: &str) -> Option<&str> {
        let bytes = self.alloc_slice_copy(src.as_bytes())?;
        // SAFETY: a byte-for-byte copy of valid UTF-8.
        Some(unsafe { std::str::from_utf8_unchecked(bytes) })
    }

    /// Rewinds the bump offset to zero. No pages are decommitted.
    pub fn reset(&mut self) {
        self.offset.set(0);
    }

    /// Offset of `ptr` from the arena base, or `None` if the pointer does
    /// not belong to the allocated region.
    pub fn byte_offset(&self, ptr: *const u8) -> Option<usize> {
        let base = self.base.as_ptr() as usize;
        let addr = ptr as usize;
        if addr < base || addr > base + self.offset.get() {
            return None;
        }
        Some(addr - base)
    }

    /// Stable base address of the reservation.
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Bytes handed out so far (including alignment padding).
    pub fn offset(&self) -> usize {
        self.offset.get()
    }

    /// Committed watermark in bytes.
    pub fn committed(&self) -> usize {
        self.committed.get()
    }

    /// Total reserved bytes.
    pub fn reserved(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn rewind_to(&self, offset: usize) {
        debug_assert!(offset <= self.offset.get(), "rewind past the live offset");
        self.offset.set(offset);
    }
}

impl std::fmt::Debug for LinearArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearArena")
            .field("offset", &self.offset.get())
            .field("committed", &self.committed.get())
            .field("reserved", &self.map.len())
            .finish()
    }
}
