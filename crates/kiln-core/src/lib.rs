//! Allocation substrate and core collections for the Kiln compiler.
//!
//! Everything downstream of the driver allocates through the types in this
//! crate: per-file [`LinearArena`]s own tokens, nodes and parse results, the
//! thread-local [`TempArena`] serves transient scratch, and the
//! [`BlockPool`] recycles small transient structures. Collections here are
//! deliberately plain: non-owning views, fixed buffers, arena pages and a
//! dense bitset, plus the MSI-probed string intern table shared across parse
//! jobs.

pub mod alloc;
pub mod arena;
pub mod collections;
pub mod hash;
pub mod intern;
pub mod pool;
pub mod temp;


pub use alloc::Allocator;
pub use arena::LinearArena;
pub use collections::{CheckedArray, FixedPodList, LongBoolMap, PagedList};
pub use intern::{Istr, StringTable};
pub use pool::BlockPool;
pub use temp::{TempArena, TempMark, with_thread_temp};
