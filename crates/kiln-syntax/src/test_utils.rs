//! Shared helpers for syntax tests.

use kiln_core::LinearArena;

use crate::node::NodeId;
use crate::result::ParseResult;
use crate::tree::SyntaxTree;

/// Parses with a fresh output arena and hands the result to `f`.
pub(crate) fn with_parse<R>(src: &str, f: impl FnOnce(&ParseResult<'_>) -> R) -> R {
    let arena = LinearArena::new().unwrap();
    let result = crate::parse(src, &arena).expect("output arena exhausted");
    f(&result)
}

/// Live nodes of the given kind, in production (pre-order) order.
pub(crate) fn find_nodes(result: &ParseResult<'_>, kind_name: &str) -> Vec<NodeId> {
    let mut found = Vec::new();
    for &entry in result.production.iter() {
        if entry > 0 {
            let node = result.node(NodeId(entry as u32));
            if node.kind_name() == kind_name {
                found.push(node.index);
            }
        }
    }
    found
}

pub(crate) fn count_nodes(result: &ParseResult<'_>, kind_name: &str) -> usize {
    find_nodes(result, kind_name).len()
}

pub(crate) fn assert_clean(result: &ParseResult<'_>) {
    assert!(
        result.is_clean(),
        "unexpected errors:\n{}",
        result.errors_to_string()
    );
}

/// The CST must reproduce the input byte-exactly.
pub(crate) fn assert_round_trip(result: &ParseResult<'_>) {
    let tree = SyntaxTree::build(result);
    assert_eq!(tree.reconstruct_source(), result.src, "CST round-trip mismatch");
}

/// `(depth, kind)` pairs of the abstract tree in pre-order, recovered from
/// the dump so tests stay independent of token numbering.
pub(crate) fn ast_shape(result: &ParseResult<'_>) -> Vec<(usize, String)> {
    let tree = SyntaxTree::build(result);
    tree.ast_to_string()
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let depth = (line.len() - trimmed.len()) / 2;
            let kind = trimmed.split('(').next().unwrap_or("").to_string();
            (depth, kind)
        })
        .collect()
}

pub(crate) fn shape(entries: &[(usize, &str)]) -> Vec<(usize, String)> {
    entries
        .iter()
        .map(|(depth, kind)| (*depth, (*kind).to_string()))
        .collect()
}
