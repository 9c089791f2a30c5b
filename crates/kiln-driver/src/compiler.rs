//! The incremental run protocol.

use kiln_core::hash::{fnv1a, msi_lookup};
use kiln_core::{with_thread_temp, Istr, LinearArena, LongBoolMap, StringTable};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::files::{AssemblyInfo, ParsedFile, SourceFileInfo, VirtualFileInfo};
use crate::vfs::FileSystem;

const EMPTY_SLOT: u32 = u32::MAX;

pub struct CompilerOptions {
    /// Recognized source file extensions, without the dot.
    pub extensions: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> CompilerOptions {
        CompilerOptions {
            extensions: vec!["kn".to_string()],
        }
    }
}

/// Counters describing one compilation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_files: usize,
    pub new_files: usize,
    pub changed_files: usize,
    pub removed_files: usize,
    pub parsed_files: usize,
    pub files_with_errors: usize,
    pub failed_reads: usize,
}

pub struct Compiler {
    fs: Box<dyn FileSystem>,
    assemblies: Vec<AssemblyInfo>,
    options: CompilerOptions,
    /// Shared across parse jobs; inserts serialize behind the mutex.
    interner: Mutex<StringTable>,
    files: Vec<SourceFileInfo>,
    /// Arenas recycled from removed files, handed to new ones.
    retired_arenas: Vec<Box<LinearArena>>,
}

impl Compiler {
    pub fn new(
        fs: Box<dyn FileSystem>,
        assemblies: Vec<AssemblyInfo>,
        options: CompilerOptions,
    ) -> Compiler {
        Compiler {
            fs,
            assemblies,
            options,
            interner: Mutex::new(StringTable::new()),
            files: Vec::new(),
            retired_arenas: Vec::new(),
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Replaces the assembly set for subsequent runs. Files whose assembly
    /// changes are invalidated on the next run.
    pub fn set_assemblies(&mut self, assemblies: Vec<AssemblyInfo>) {
        self.assemblies = assemblies;
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFileInfo> {
        self.files.iter()
    }

    pub fn file(&self, path: &str) -> Option<&SourceFileInfo> {
        self.files.iter().find(|file| file.path.as_str() == path)
    }

    /// Records the forward dependency edges of `path`. Called by the
    /// semantic layer between runs; the next run derives reverse edges and
    /// invalidation from them.
    pub fn set_dependencies(&mut self, path: &str, dependencies: &[&str]) {
        let interned: Vec<Istr> = {
            let mut interner = self.interner.lock();
            dependencies
                .iter()
                .map(|dependency| interner.intern(dependency))
                .collect()
        };
        if let Some(file) = self.files.iter_mut().find(|file| file.path.as_str() == path) {
            file.dependencies = interned;
        }
    }

    /// Runs one compilation: enumerate, diff, invalidate, remove, parse.
    ///
    /// Runs are strictly sequential per compiler; a parse job never
    /// observes another job's file state.
    pub fn compile(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();

        // 1. Enumerate current sources.
        let mut sources: Vec<VirtualFileInfo> = Vec::new();
        {
            let mut interner = self.interner.lock();
            for assembly in &self.assemblies {
                self.fs.scan_sources(
                    assembly,
                    &self.options.extensions,
                    &mut interner,
                    &mut sources,
                );
            }
        }

        // 2. Clear per-file run state.
        for file in &mut self.files {
            file.was_touched = false;
            file.was_changed = false;
            file.dependants.clear();
        }

        self.diff_against_lookup(&sources, &mut summary);

        // 6. Changed or removed files invalidate their transitive
        // dependants; the visited map makes cycles terminate.
        let mut visited = LongBoolMap::new(self.files.len());
        for index in 0..self.files.len() {
            let file = &self.files[index];
            if (file.was_changed || !file.was_touched) && !visited.get(index) {
                self.mark_changed_dependants(index, &mut visited);
            }
        }

        // 7. Remove untouched files and drop stale artifacts.
        let mut index = 0;
        while index < self.files.len() {
            if !self.files[index].was_touched {
                let mut removed = self.files.swap_remove(index);
                tracing::debug!(path = %removed.path, "source removed");
                removed.invalidate();
                if let Some(arena) = removed.take_arena() {
                    self.retired_arenas.push(arena);
                }
                summary.removed_files += 1;
            } else {
                if self.files[index].was_changed {
                    self.files[index].invalidate();
                }
                index += 1;
            }
        }

        // 8. Parse every changed file. Reads block here, in the driver;
        // the jobs themselves touch nothing shared.
        self.run_parse_jobs(&mut summary);

        summary.total_files = self.files.len();
        summary.changed_files = self
            .files
            .iter()
            .filter(|file| file.was_changed)
            .count();

        tracing::info!(
            total = summary.total_files,
            new = summary.new_files,
            changed = summary.changed_files,
            removed = summary.removed_files,
            parsed = summary.parsed_files,
            errors = summary.files_with_errors,
            "compilation run finished"
        );

        summary
    }

    /// Steps 3–5: reverse edges and the path diff, both through one MSI
    /// lookup table built on the thread-local temp arena.
    fn diff_against_lookup(&mut self, sources: &[VirtualFileInfo], summary: &mut RunSummary) {
        with_thread_temp(|temp| {
            let scope = temp.scope();

            // Load factor stays at or below 50%.
            let capacity = (self.files.len().max(1) * 2).next_power_of_two().max(16);
            let exponent = capacity.trailing_zeros();
            let slots = scope
                .alloc_slice_fill(capacity, EMPTY_SLOT)
                .expect("thread-local temp arena exhausted");

            for (index, file) in self.files.iter().enumerate() {
                let hash = fnv1a(file.path.as_bytes());
                let mut slot = hash;
                loop {
                    slot = msi_lookup(hash, exponent, slot);
                    if slots[slot as usize] == EMPTY_SLOT {
                        slots[slot as usize] = index as u32;
                        break;
                    }
                }
            }

            // 3. Recompute reverse edges.
            let mut edges: Vec<(usize, usize)> = Vec::new();
            for (index, file) in self.files.iter().enumerate() {
                for &dependency in &file.dependencies {
                    if let Some(target) = probe(slots, exponent, &self.files, dependency) {
                        edges.push((target, index));
                    }
                }
            }
            for (target, source) in edges {
                self.files[target].dependants.push(source);
            }

            // 5. Probe each enumerated source.
            for vfile in sources {
                match probe(slots, exponent, &self.files, vfile.absolute_path) {
                    None => {
                        tracing::debug!(path = %vfile.absolute_path, "new source");
                        self.files.push(SourceFileInfo::new(
                            vfile.absolute_path,
                            vfile.assembly,
                            vfile.last_edit_time,
                        ));
                        summary.new_files += 1;
                    }
                    Some(index) => {
                        let file = &mut self.files[index];
                        file.was_touched = true;

                        if file.assembly != vfile.assembly {
                            // Fully-qualified names depend on the assembly.
                            file.assembly = vfile.assembly;
                            file.was_changed = true;
                        }
                        if file.last_edit_time != vfile.last_edit_time {
                            file.last_edit_time = vfile.last_edit_time;
                            file.was_changed = true;
                        }
                        if file.was_changed {
                            tracing::debug!(path = %file.path, "source changed");
                        }
                    }
                }
            }
        });
    }

    fn mark_changed_dependants(&mut self, start: usize, visited: &mut LongBoolMap) {
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            if !visited.try_set(index) {
                continue;
            }
            self.files[index].was_changed = true;
            stack.extend(self.files[index].dependants.iter().copied());
        }
    }

    fn run_parse_jobs(&mut self, summary: &mut RunSummary) {
        struct ParseJob {
            index: usize,
            text: String,
            arena: Box<LinearArena>,
        }

        let mut jobs: Vec<ParseJob> = Vec::new();
        for index in 0..self.files.len() {
            if !self.files[index].was_changed {
                continue;
            }

            let path = self.files[index].path;
            let text = match self.fs.read_file_text(path.as_str()) {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(path = %path, %error, "failed to read source");
                    summary.failed_reads += 1;
                    continue;
                }
            };

            let arena = match self.files[index]
                .take_arena()
                .or_else(|| self.retired_arenas.pop())
            {
                Some(arena) => arena,
                None => match LinearArena::new() {
                    Ok(arena) => Box::new(arena),
                    Err(error) => {
                        tracing::error!(path = %path, %error, "failed to reserve a parse arena");
                        continue;
                    }
                },
            };

            jobs.push(ParseJob { index, text, arena });
        }

        // Jobs are embarrassingly parallel: each owns its text and arena
        // and writes only its own file's outputs.
        let outcomes: Vec<(usize, Result<ParsedFile, crate::Error>)> = jobs
            .into_par_iter()
            .map(|job| (job.index, ParsedFile::parse(&job.text, job.arena)))
            .collect();

        for (index, outcome) in outcomes {
            match outcome {
                Ok(parsed) => {
                    summary.parsed_files += 1;
                    if !parsed.result().is_clean() {
                        summary.files_with_errors += 1;
                    }
                    self.files[index].artifacts = Some(parsed);
                }
                Err(error) => {
                    tracing::error!(path = %self.files[index].path, %error, "parse aborted");
                }
            }
        }
    }
}

/// MSI probe over the temp-arena lookup table. `None` means the path is
/// not in the pre-run file set.
fn probe(slots: &[u32], exponent: u32, files: &[SourceFileInfo], path: Istr) -> Option<usize> {
    let hash = fnv1a(path.as_bytes());
    let mut slot = hash;
    loop {
        slot = msi_lookup(hash, exponent, slot);
        let entry = slots[slot as usize];
        if entry == EMPTY_SLOT {
            return None;
        }
        if files[entry as usize].path == path {
            return Some(entry as usize);
        }
    }
}
