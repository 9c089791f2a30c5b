//! Per-file driver state.

use kiln_core::{Istr, LinearArena};
use kiln_syntax::ParseResult;

/// A named collection of source files compiled together. The assembly name
/// participates in fully-qualified names, so moving a file between
/// assemblies invalidates it like an edit would.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyInfo {
    pub name: String,
    pub root_path: String,
}

/// One enumerated source file, as reported by the filesystem scan.
#[derive(Clone, Copy, Debug)]
pub struct VirtualFileInfo {
    pub assembly: Istr,
    pub absolute_path: Istr,
    /// Last edit time in milliseconds since the Unix epoch.
    pub last_edit_time: u64,
}

/// A finished parse bundled with the arena that owns every byte of it.
///
/// The result's views borrow the boxed arena. The arena is heap-pinned and
/// never touched while the result is alive, so the pair can move freely;
/// [`ParsedFile::into_arena`] drops the views, rewinds the arena and hands
/// it back for the next parse of the same file.
pub struct ParsedFile {
    arena: Box<LinearArena>,
    result: ParseResult<'static>,
}

impl ParsedFile {
    /// Parses `src` into `arena`. On syntax errors the parse still
    /// succeeds; only arena exhaustion fails.
    pub fn parse(src: &str, arena: Box<LinearArena>) -> Result<ParsedFile, crate::Error> {
        let result = kiln_syntax::parse(src, &arena)?;
        // SAFETY: `result` borrows `arena`, which is heap-allocated, owned
        // by the returned value, and neither moved out nor reset while
        // `result` exists. The lifetime is erased only to store the pair
        // together.
        let result =
            unsafe { std::mem::transmute::<ParseResult<'_>, ParseResult<'static>>(result) };
        Ok(ParsedFile { arena, result })
    }

    pub fn result(&self) -> &ParseResult<'_> {
        &self.result
    }

    /// Tears down the views and returns the rewound arena for reuse.
    pub fn into_arena(self) -> Box<LinearArena> {
        let ParsedFile { mut arena, result } = self;
        drop(result);
        arena.reset();
        arena
    }
}

/// Driver-side record for one known source file, keyed by interned
/// absolute path. Created on first observation and retained across runs;
/// removed at the end of a run that did not touch it.
pub struct SourceFileInfo {
    pub path: Istr,
    pub assembly: Istr,
    pub last_edit_time: u64,

    /// Run state: the file appeared in this run's enumeration.
    pub was_touched: bool,
    /// Run state: the file is new, edited, moved between assemblies, or a
    /// transitive dependant of such a file.
    pub was_changed: bool,

    /// Paths this file depends on. Maintained by the semantic layer
    /// through [`crate::Compiler::set_dependencies`]; the driver only
    /// consumes them.
    pub dependencies: Vec<Istr>,
    /// Reverse edges, recomputed from `dependencies` every run.
    pub(crate) dependants: Vec<usize>,

    pub(crate) artifacts: Option<ParsedFile>,
    /// Arena kept warm between invalidation and the next parse.
    pub(crate) spare_arena: Option<Box<LinearArena>>,
}

impl SourceFileInfo {
    pub(crate) fn new(path: Istr, assembly: Istr, last_edit_time: u64) -> SourceFileInfo {
        SourceFileInfo {
            path,
            assembly,
            last_edit_time,
            was_touched: true,
            was_changed: true,
            dependencies: Vec::new(),
            dependants: Vec::new(),
            artifacts: None,
            spare_arena: None,
        }
    }

    /// Latest parse outputs, if the file has been parsed since its last
    /// invalidation.
    pub fn parse_result(&self) -> Option<&ParseResult<'_>> {
        self.artifacts.as_ref().map(ParsedFile::result)
    }

    /// Drops parse artifacts, recycling the file's arena.
    pub(crate) fn invalidate(&mut self) {
        if let Some(parsed) = self.artifacts.take() {
            self.spare_arena = Some(parsed.into_arena());
        }
    }

    /// Takes the warm arena, if any.
    pub(crate) fn take_arena(&mut self) -> Option<Box<LinearArena>> {
        self.spare_arena.take()
    }
}
