//! Incremental compilation driver.
//!
//! The driver owns the set of known source files and decides, run by run,
//! which of them need re-parsing: it enumerates sources through a
//! [`FileSystem`], diffs the result against the previous run by interned
//! absolute path, propagates invalidation through the file dependency
//! graph, and schedules one parse job per changed file on a worker pool.
//! Parse jobs are independent; each owns a file-scoped arena that is
//! recycled on re-parse.
//!
//! The driver is library-shaped: embedders construct a [`Compiler`] from a
//! list of [`AssemblyInfo`] entries (or a JSON manifest) and call
//! [`Compiler::compile`] whenever they want the file set refreshed.

pub mod compiler;
pub mod files;
pub mod manifest;
pub mod vfs;

#[cfg(test)]
mod vfs_tests;

pub use compiler::{Compiler, CompilerOptions, RunSummary};
pub use files::{AssemblyInfo, ParsedFile, SourceFileInfo, VirtualFileInfo};
pub use manifest::load_manifest;
pub use vfs::{FileSystem, MemoryFileSystem, RealFileSystem};

/// Fatal driver failures. Per-file syntax errors are not errors at this
/// level; they live in each file's parse result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to reserve a parse arena")]
    Arena(#[source] std::io::Error),

    #[error(transparent)]
    Syntax(#[from] kiln_syntax::Error),
}
