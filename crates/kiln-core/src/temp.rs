//! Temporary arena with scoped rollback, and the per-thread instance.

use std::ops::Deref;

use crate::arena::LinearArena;

/// Reservation for the thread-local temp arena: 1 GiB.
pub const THREAD_RESERVE: usize = 1 << 30;

/// Commit step for the thread-local temp arena: 64 KiB.
pub const THREAD_COMMIT_STEP: usize = 64 * 1024;

/// A [`LinearArena`] with mark/rollback. Deep call sites allocate scratch,
/// then rewind to the mark; nothing is ever individually freed.
pub struct TempArena {
    arena: LinearArena,
}

/// Opaque rollback point. Only meaningful for the arena that produced it.
#[derive(Clone, Copy, Debug)]
pub struct TempMark {
    offset: usize,
}

impl TempArena {
    pub fn with_capacity(reserve: usize, min_commit: usize) -> std::io::Result<Self> {
        Ok(Self {
            arena: LinearArena::with_capacity(reserve, min_commit)?,
        })
    }

    pub fn mark(&self) -> TempMark {
        TempMark {
            offset: self.arena.offset(),
        }
    }

    pub fn rollback_to(&self, mark: TempMark) {
        self.arena.rewind_to(mark.offset);
    }

    /// Marks now and rolls back when the guard drops, on every exit path.
    pub fn scope(&self) -> TempScope<'_> {
        TempScope {
            temp: self,
            mark: self.mark(),
        }
    }
}

impl Deref for TempArena {
    type Target = LinearArena;

    fn deref(&self) -> &LinearArena {
        &self.arena
    }
}

/// RAII rollback guard returned by [`TempArena::scope`].
pub struct TempScope<'t> {
    temp: &'t TempArena,
    mark: TempMark,
}

impl<'t> TempScope<'t> {
    pub fn arena(&self) -> &'t TempArena {
        self.temp
    }
}

impl Deref for TempScope<'_> {
    type Target = TempArena;

    fn deref(&self) -> &TempArena {
        self.temp
    }
}

impl Drop for TempScope<'_> {
    fn drop(&mut self) {
        self.temp.rollback_to(self.mark);
    }
}

thread_local! {
    static THREAD_TEMP: TempArena =
        TempArena::with_capacity(THREAD_RESERVE, THREAD_COMMIT_STEP)
            .expect("failed to reserve the thread-local temp arena");
}

/// Runs `f` with this thread's temp arena. Callers MUST bound their usage
/// with [`TempArena::scope`]; allocations made outside a scope live until
/// the thread exits.
pub fn with_thread_temp<R>(f: impl FnOnce(&TempArena) -> R) -> R {
    THREAD_TEMP.with(|temp| f(temp))
}
