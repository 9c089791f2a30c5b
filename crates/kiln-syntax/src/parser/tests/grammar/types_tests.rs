use crate::node::NodeData;
use crate::test_utils::{assert_clean, assert_round_trip, count_nodes, find_nodes, with_parse};

#[test]
fn nested_generic_arguments() {
    with_parse("class C { List<List<int>> matrix; }", |result| {
        assert_clean(result);
        assert_round_trip(result);
        // Outer list over `List<int>`, inner over `int`.
        assert_eq!(count_nodes(result, "TypeArgumentList"), 2);
        assert_eq!(count_nodes(result, "TypePath"), 3);
    });
}

#[test]
fn nullable_and_array_types() {
    with_parse("class C { int? maybe; int[] many; int[]? either; }", |result| {
        assert_clean(result);

        let paths = find_nodes(result, "TypePath");
        assert_eq!(paths.len(), 3);

        let NodeData::TypePath { nullable, array_rank, .. } = result.node(paths[0]).data else {
            unreachable!();
        };
        assert!(nullable);
        assert!(!array_rank.is_valid());

        let NodeData::TypePath { nullable, array_rank, .. } = result.node(paths[1]).data else {
            unreachable!();
        };
        assert!(!nullable);
        assert!(array_rank.is_valid());

        let NodeData::TypePath { array_rank, .. } = result.node(paths[2]).data else {
            unreachable!();
        };
        let NodeData::ArrayRank { nullable } = result.node(array_rank).data else {
            unreachable!();
        };
        assert!(nullable, "`int[]?` marks the rank nullable");
    });
}

#[test]
fn multi_dimensional_ranks_are_rejected() {
    with_parse("class C { int[3] fixed; }", |result| {
        assert!(!result.is_clean());
        assert!(result
            .errors
            .iter()
            .any(|error| error.message.contains("multi-dimensional")));
        assert_round_trip(result);
    });
}

#[test]
fn builtin_heads_are_recorded() {
    with_parse("class C { float3 position; Widget custom; }", |result| {
        assert_clean(result);
        let paths = find_nodes(result, "TypePath");

        let NodeData::TypePath { builtin, .. } = result.node(paths[0]).data else {
            unreachable!();
        };
        assert_eq!(builtin, Some(crate::keywords::Keyword::Float3));

        let NodeData::TypePath { builtin, .. } = result.node(paths[1]).data else {
            unreachable!();
        };
        assert_eq!(builtin, None);
    });
}

#[test]
fn scoped_type_paths() {
    with_parse("class C { Game::Core::Registry registry; }", |result| {
        assert_clean(result);
        let paths = find_nodes(result, "TypePath");
        assert_eq!(paths.len(), 1);
        // Three identifiers chained through the path.
        assert_eq!(count_nodes(result, "Identifier"), 3 + 2); // path + class name + field name
    });
}

#[test]
fn unmatched_angle_bracket_recovers() {
    with_parse("class C { List<int items; }", |result| {
        assert!(!result.is_clean());
        assert!(result
            .errors
            .iter()
            .any(|error| error.message.contains("isn't matched by >")));
        assert_round_trip(result);
    });
}

#[test]
fn generic_type_parameters_on_types() {
    with_parse("class Cache<K, V> { }", |result| {
        assert_clean(result);
        let lists = find_nodes(result, "TypeParameterList");
        assert_eq!(lists.len(), 1);
        // K and V plus the class name.
        assert_eq!(count_nodes(result, "Identifier"), 3);
    });
}

#[test]
fn keyword_as_identifier_is_reported() {
    with_parse("class class { }", |result| {
        assert!(!result.is_clean());
        assert!(result
            .errors
            .iter()
            .any(|error| error.message.contains("cannot be used as an identifier")));
    });
}
