use std::sync::Arc;

use kiln_core::StringTable;

use crate::files::AssemblyInfo;
use crate::manifest::load_manifest;
use crate::vfs::{FileSystem, MemoryFileSystem, RealFileSystem};

fn assembly(name: &str, root: &str) -> AssemblyInfo {
    AssemblyInfo {
        name: name.to_string(),
        root_path: root.to_string(),
    }
}

fn extensions() -> Vec<String> {
    vec!["kn".to_string()]
}

#[test]
fn memory_scan_filters_by_root_and_extension() {
    let fs = MemoryFileSystem::new();
    fs.add_file("proj/a.kn", "class A { }", 1);
    fs.add_file("proj/sub/b.kn", "class B { }", 2);
    fs.add_file("proj/notes.txt", "not source", 3);
    fs.add_file("other/c.kn", "class C { }", 4);

    let mut interner = StringTable::new();
    let mut out = Vec::new();
    fs.scan_sources(&assembly("game", "proj/"), &extensions(), &mut interner, &mut out);

    let paths: Vec<&str> = out.iter().map(|file| file.absolute_path.as_str()).collect();
    assert_eq!(paths, vec!["proj/a.kn", "proj/sub/b.kn"]);
    assert_eq!(out[0].assembly.as_str(), "game");
    assert_eq!(out[1].last_edit_time, 2);
}

#[test]
fn memory_read_round_trips() {
    let fs = MemoryFileSystem::new();
    fs.add_file("proj/a.kn", "class A { }", 1);
    assert_eq!(fs.read_file_text("proj/a.kn").unwrap(), "class A { }");
    assert!(fs.read_file_text("proj/missing.kn").is_err());
}

#[test]
fn arc_wrapper_delegates() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.add_file("proj/a.kn", "class A { }", 1);

    let mut interner = StringTable::new();
    let mut out = Vec::new();
    fs.scan_sources(&assembly("game", "proj/"), &extensions(), &mut interner, &mut out);
    assert_eq!(out.len(), 1);
}

#[test]
fn real_scan_walks_recursively_and_canonicalizes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir(root.join("nested")).unwrap();
    std::fs::write(root.join("a.kn"), "class A { }").unwrap();
    std::fs::write(root.join("nested/b.kn"), "class B { }").unwrap();
    std::fs::write(root.join("skip.txt"), "not source").unwrap();

    let fs = RealFileSystem;
    let mut interner = StringTable::new();
    let mut out = Vec::new();
    fs.scan_sources(
        &assembly("game", root.to_str().unwrap()),
        &extensions(),
        &mut interner,
        &mut out,
    );

    assert_eq!(out.len(), 2);
    for file in &out {
        let path = std::path::Path::new(file.absolute_path.as_str());
        assert!(path.is_absolute(), "paths must be canonical absolute paths");
        assert!(file.last_edit_time > 0, "edit time is recorded in millis");
    }

    let text = fs
        .read_file_text(out[0].absolute_path.as_str())
        .unwrap();
    assert!(text.starts_with("class"));
}

#[test]
fn scan_interns_paths_canonically() {
    let fs = MemoryFileSystem::new();
    fs.add_file("proj/a.kn", "class A { }", 1);

    let mut interner = StringTable::new();
    let mut first = Vec::new();
    let mut second = Vec::new();
    fs.scan_sources(&assembly("game", "proj/"), &extensions(), &mut interner, &mut first);
    fs.scan_sources(&assembly("game", "proj/"), &extensions(), &mut interner, &mut second);

    // Two scans of the same path yield the same canonical span.
    assert_eq!(
        first[0].absolute_path.as_str().as_ptr(),
        second[0].absolute_path.as_str().as_ptr()
    );
}

#[test]
fn manifest_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kiln.json");
    std::fs::write(
        &path,
        r#"[
            { "name": "game", "rootPath": "src" },
            { "name": "engine", "rootPath": "engine/src" }
        ]"#,
    )
    .unwrap();

    let assemblies = load_manifest(&path).unwrap();
    assert_eq!(assemblies.len(), 2);
    assert_eq!(assemblies[0].name, "game");
    assert_eq!(assemblies[1].root_path, "engine/src");
}

#[test]
fn malformed_manifest_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kiln.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_manifest(&path).is_err());
}
