use indoc::indoc;

use crate::test_utils::{assert_round_trip, count_nodes, with_parse};

#[test]
fn missing_semicolon_recovers_between_fields() {
    with_parse("class C { int x int y; }", |result| {
        assert_eq!(count_nodes(result, "FieldDeclaration"), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors.get(0).message, "Expected ';'");
        assert_round_trip(result);
    });
}

#[test]
fn garbage_member_recovers_to_the_next_declaration() {
    let src = indoc! {"
        class C {
            int first;
            ??? not a member
            public int second;
        }
    "};
    with_parse(src, |result| {
        assert!(!result.is_clean());
        // Recovery anchors on the `public` modifier keyword.
        assert_eq!(count_nodes(result, "FieldDeclaration"), 2);
        assert_round_trip(result);
    });
}

#[test]
fn stray_block_in_class_body_is_wrapped() {
    with_parse("class C { { int x; } int y; }", |result| {
        assert_eq!(count_nodes(result, "InvalidDeclaration"), 1);
        // The stray block's content parses as statements, not members.
        assert_eq!(count_nodes(result, "LocalVariableDeclaration"), 1);
        assert_eq!(count_nodes(result, "FieldDeclaration"), 1);
        assert_round_trip(result);
    });
}

#[test]
fn parser_stuck_forces_progress() {
    with_parse("@ @ class C { }", |result| {
        assert!(result
            .errors
            .iter()
            .any(|error| error.message == "parser stuck"));
        assert_eq!(count_nodes(result, "ClassDeclaration"), 1);
        assert_round_trip(result);
    });
}

#[test]
fn statement_recovery_anchors_on_semicolons() {
    let src = indoc! {"
        class C {
            void run() {
                int good = 1;
                ??? broken ???;
                int also = 2;
            }
        }
    "};
    with_parse(src, |result| {
        assert!(!result.is_clean());
        assert_eq!(count_nodes(result, "LocalVariableDeclaration"), 2);
        assert_round_trip(result);
    });
}

#[test]
fn expression_error_does_not_cascade() {
    with_parse("class C { void run() { total = 1 + ; next = 2; } }", |result| {
        assert!(!result.is_clean());
        // The second statement survives intact.
        assert_eq!(count_nodes(result, "AssignmentExpression"), 2);
        assert_round_trip(result);
    });
}

#[test]
fn unmatched_delimiters_abort_before_parsing() {
    with_parse("class C { int x;", |result| {
        assert!(result.has_unmatched_delimiters);
        assert!(!result.is_clean());
        assert_eq!(count_nodes(result, "ClassDeclaration"), 0);
        // The node arena still carries the seeded root.
        assert_eq!(result.root().kind_name(), "File");
    });
}

#[test]
fn bad_characters_abort_before_parsing() {
    with_parse("class C { int \u{1}x; }", |result| {
        assert!(result.has_bad_characters);
        assert!(result.production.is_empty());
        assert!(result
            .errors
            .iter()
            .any(|error| error.message == "bad character"));
    });
}

#[test]
fn every_token_is_consumed_even_with_errors() {
    let sources = [
        "class",
        "class C",
        "class C {  } trailing garbage ;;;",
        "using ;",
        "namespace { }",
        "class C { public }",
        "class C { void f( { } }",
    ];
    for src in sources {
        with_parse(src, |result| {
            // The parse must terminate and reconstruct regardless of shape.
            if !result.production.is_empty() {
                assert_round_trip(result);
            }
        });
    }
}
