//! Source discovery and file reading.
//!
//! The real filesystem walks assembly roots recursively; the in-memory
//! variant serves injected sources through the same interface so driver
//! behavior is testable without touching disk.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

use kiln_core::StringTable;
use walkdir::WalkDir;

use crate::files::{AssemblyInfo, VirtualFileInfo};

pub trait FileSystem: Send + Sync {
    /// Appends one [`VirtualFileInfo`] per regular file under the
    /// assembly's root whose extension is in `extensions`. Paths are
    /// canonical absolute paths, interned through `interner`.
    fn scan_sources(
        &self,
        assembly: &AssemblyInfo,
        extensions: &[String],
        interner: &mut StringTable,
        out: &mut Vec<VirtualFileInfo>,
    );

    /// Reads a file's text. Invalid UTF-8 is replaced, which the tokenizer
    /// then reports as bad characters.
    fn read_file_text(&self, absolute_path: &str) -> io::Result<String>;
}

impl<F: FileSystem + ?Sized> FileSystem for std::sync::Arc<F> {
    fn scan_sources(
        &self,
        assembly: &AssemblyInfo,
        extensions: &[String],
        interner: &mut StringTable,
        out: &mut Vec<VirtualFileInfo>,
    ) {
        (**self).scan_sources(assembly, extensions, interner, out)
    }

    fn read_file_text(&self, absolute_path: &str) -> io::Result<String> {
        (**self).read_file_text(absolute_path)
    }
}

fn extension_matches(path: &Path, extensions: &[String]) -> bool {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some(extension) => extensions.iter().any(|candidate| candidate == extension),
        None => false,
    }
}

/// Disk-backed source discovery.
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn scan_sources(
        &self,
        assembly: &AssemblyInfo,
        extensions: &[String],
        interner: &mut StringTable,
        out: &mut Vec<VirtualFileInfo>,
    ) {
        let assembly_name = interner.intern(&assembly.name);

        for entry in WalkDir::new(&assembly.root_path)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() || !extension_matches(entry.path(), extensions) {
                continue;
            }

            let Ok(absolute) = entry.path().canonicalize() else {
                continue;
            };
            let Some(absolute) = absolute.to_str() else {
                tracing::warn!(path = %absolute.display(), "skipping non-UTF-8 path");
                continue;
            };

            let last_edit_time = entry
                .metadata()
                .ok()
                .and_then(|metadata| metadata.modified().ok())
                .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
                .map(|duration| duration.as_millis() as u64)
                .unwrap_or(0);

            out.push(VirtualFileInfo {
                assembly: assembly_name,
                absolute_path: interner.intern(absolute),
                last_edit_time,
            });
        }
    }

    fn read_file_text(&self, absolute_path: &str) -> io::Result<String> {
        let bytes = std::fs::read(absolute_path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

struct MemoryFile {
    text: String,
    last_edit_time: u64,
}

/// In-memory source injection for tests and embedders. Paths are treated
/// as opaque absolute paths; a file belongs to an assembly when its path
/// starts with the assembly's root.
#[derive(Default)]
pub struct MemoryFileSystem {
    files: parking_lot::Mutex<HashMap<String, MemoryFile>>,
}

impl MemoryFileSystem {
    pub fn new() -> MemoryFileSystem {
        MemoryFileSystem::default()
    }

    pub fn add_file(&self, path: &str, text: &str, last_edit_time: u64) {
        self.files.lock().insert(
            path.to_string(),
            MemoryFile {
                text: text.to_string(),
                last_edit_time,
            },
        );
    }

    /// Replaces a file's content and bumps its edit time.
    pub fn update_file(&self, path: &str, text: &str, last_edit_time: u64) {
        self.add_file(path, text, last_edit_time);
    }

    pub fn remove_file(&self, path: &str) {
        self.files.lock().remove(path);
    }
}

impl FileSystem for MemoryFileSystem {
    fn scan_sources(
        &self,
        assembly: &AssemblyInfo,
        extensions: &[String],
        interner: &mut StringTable,
        out: &mut Vec<VirtualFileInfo>,
    ) {
        let assembly_name = interner.intern(&assembly.name);
        let files = self.files.lock();

        let mut paths: Vec<&String> = files
            .keys()
            .filter(|path| path.starts_with(&assembly.root_path))
            .filter(|path| extension_matches(Path::new(path.as_str()), extensions))
            .collect();
        // Deterministic enumeration order keeps runs reproducible.
        paths.sort();

        for path in paths {
            let file = &files[path.as_str()];
            out.push(VirtualFileInfo {
                assembly: assembly_name,
                absolute_path: interner.intern(path),
                last_edit_time: file.last_edit_time,
            });
        }
    }

    fn read_file_text(&self, absolute_path: &str) -> io::Result<String> {
        self.files
            .lock()
            .get(absolute_path)
            .map(|file| file.text.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, absolute_path.to_string()))
    }
}
