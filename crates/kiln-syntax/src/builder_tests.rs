use kiln_core::LinearArena;

use crate::builder::PsiBuilder;
use crate::node::{NodeData, NodeId};
use crate::test_utils::with_parse;
use crate::tokens::{TokenFlags, TokenKind};

fn identifier_data() -> NodeData {
    NodeData::Identifier {
        type_arguments: NodeId::INVALID,
    }
}

#[test]
fn trivia_only_input_has_no_content() {
    with_parse("  // nothing here\n\t", |result| {
        assert!(!result.has_non_trivial_content);
        assert!(result.is_clean());
    });
}

#[test]
fn projection_tags_trivia_adjacency() {
    let builder = PsiBuilder::new("a b");
    // `a` is followed by whitespace before `b`.
    assert!(builder.token().flags.contains(TokenFlags::FOLLOWED_BY_TRIVIA));

    let builder = PsiBuilder::new("a<<b");
    assert!(!builder.token().flags.contains(TokenFlags::FOLLOWED_BY_TRIVIA));
}

#[test]
fn unmatched_open_brace_fails_initialization() {
    with_parse("class C { int x;", |result| {
        assert!(result.has_unmatched_delimiters);
        assert!(result.production.is_empty());
        assert!(result
            .errors
            .iter()
            .any(|error| error.message == "unmatched curly bracket open {"));
    });
}

#[test]
fn mismatched_closer_is_flagged() {
    with_parse("( ]", |result| {
        assert!(result.has_unmatched_delimiters);
        assert!(result
            .errors
            .iter()
            .any(|error| error.message == "unmatched paren open ("));
        assert!(result
            .errors
            .iter()
            .any(|error| error.message == "unmatched square brace close ]"));
    });
}

#[test]
fn crossed_pairs_still_match_outer() {
    // `( [ ) ]`: the `[` is skipped over when `)` matches `(`; both square
    // braces end up unmatched.
    with_parse("([)]", |result| {
        assert!(result.has_unmatched_delimiters);
        assert!(result
            .errors
            .iter()
            .any(|error| error.message == "unmatched square brace open ["));
    });
}

#[test]
fn bad_character_runs_coalesce_into_one_error() {
    with_parse("a \\\\\\ b", |result| {
        assert!(result.has_bad_characters);
        let bad: Vec<_> = result
            .errors
            .iter()
            .filter(|error| error.message == "bad character")
            .collect();
        assert_eq!(bad.len(), 1, "one error per run of bad characters");
    });
}

#[test]
fn token_limit_boundary() {
    // 65,535 non-trivial tokens are fine.
    let just_right = "a ".repeat(65_535);
    with_parse(&just_right, |result| {
        assert!(!result.has_too_many_tokens);
    });

    // One more crosses the limit and produces exactly one over-limit error.
    let too_many = "a ".repeat(65_536);
    with_parse(&too_many, |result| {
        assert!(result.has_too_many_tokens);
        assert!(result.production.is_empty());
        let over_limit: Vec<_> = result
            .errors
            .iter()
            .filter(|error| error.message.contains("too many tokens"))
            .collect();
        assert_eq!(over_limit.len(), 1);
    });
}

#[test]
fn mark_done_produces_balanced_production() {
    let mut builder = PsiBuilder::new("a b");
    let marker = builder.mark();
    builder.advance();
    let id = builder.done(marker, identifier_data());
    builder.advance(); // b
    builder.advance(); // sentinel

    let arena = LinearArena::new().unwrap();
    let result = builder.finalize(&arena).unwrap();
    assert_eq!(
        result.production.as_slice(),
        &[1, id.0 as i32, -(id.0 as i32), -1]
    );

    let node = result.node(id);
    assert_eq!(node.token_start, 0);
    assert_eq!(node.token_end, 2); // exclusive: past `a`, landing on `b`
}

#[test]
fn precede_wraps_the_completed_node() {
    let mut builder = PsiBuilder::new("a b");
    let marker = builder.mark();
    builder.advance();
    let inner = builder.done(marker, identifier_data());

    let wrapper = builder.precede(inner);
    builder.advance();
    let outer = builder.done(wrapper, identifier_data());

    builder.advance(); // sentinel

    let arena = LinearArena::new().unwrap();
    let result = builder.finalize(&arena).unwrap();
    assert_eq!(
        result.production.as_slice(),
        &[
            1,
            outer.0 as i32,
            inner.0 as i32,
            -(inner.0 as i32),
            -(outer.0 as i32),
            -1,
        ]
    );
    // The wrapper inherits the wrapped node's start.
    assert_eq!(result.node(outer).token_start, result.node(inner).token_start);
}

#[test]
fn rollback_restores_cursor_production_and_node_count() {
    let mut builder = PsiBuilder::new("a b c d");

    builder.advance(); // sit on `b`
    let cursor_before = builder.token_index();
    let production_before = builder.production_len();
    let nodes_before = builder.node_count();

    let marker = builder.mark();
    builder.advance();
    let inner = builder.mark();
    builder.advance();
    let _ = builder.done(inner, identifier_data());
    builder.inline_error("scratch");

    builder.rollback(marker);

    assert_eq!(builder.token_index(), cursor_before);
    assert_eq!(builder.production_len(), production_before);
    assert_eq!(builder.node_count(), nodes_before);
}

#[test]
fn freed_slots_are_reused_by_later_marks() {
    let mut builder = PsiBuilder::new("a b c");
    let marker = builder.mark();
    let id = marker.id();
    builder.rollback(marker);

    let again = builder.mark();
    assert_eq!(again.id(), id, "rollback returns slots to the free-list");
    let _ = builder.done(again, identifier_data());
}

#[test]
fn drop_marker_erases_the_open_entry() {
    let mut builder = PsiBuilder::new("a b");
    let before = builder.production_len();
    let marker = builder.mark();
    builder.drop_marker(marker);
    assert_eq!(builder.production_len(), before);
}

#[test]
fn sub_stream_is_a_partner_lookup() {
    let mut builder = PsiBuilder::new("( a )");
    let stream = builder.try_sub_stream(TokenKind::OpenParen).unwrap();
    assert_eq!(stream.start, 1);
    assert_eq!(stream.end, 2);

    builder.push_stream(stream);
    assert_eq!(builder.token_kind(), TokenKind::KeywordOrIdentifier);
    builder.advance();
    assert!(builder.end_of_input());
    builder.pop_stream();

    // The pop stepped over the closer.
    assert_eq!(builder.token_kind(), TokenKind::EndOfInput);
}

#[test]
fn pop_stream_reports_unconsumed_content() {
    let mut builder = PsiBuilder::new("( a b )");
    let stream = builder.try_sub_stream(TokenKind::OpenParen).unwrap();
    builder.push_stream(stream);
    builder.advance(); // consume only `a`
    builder.pop_stream();
    builder.advance(); // sentinel

    let arena = LinearArena::new().unwrap();
    let result = builder.finalize(&arena).unwrap();
    assert!(result
        .errors
        .iter()
        .any(|error| error.message == "invalid content"));
}

#[test]
fn scan_sub_stream_respects_nesting() {
    let mut builder = PsiBuilder::new("< a < b > c >");
    let stream = builder
        .try_scan_sub_stream(TokenKind::AngleBracketOpen, TokenKind::AngleBracketClose)
        .unwrap();
    assert_eq!(stream.start, 1);
    assert_eq!(stream.end, 6, "outer close, not the nested one");
}

#[test]
fn scan_sub_stream_restores_cursor_on_failure() {
    let mut builder = PsiBuilder::new("< a b");
    let before = builder.token_index();
    assert!(builder
        .try_scan_sub_stream(TokenKind::AngleBracketOpen, TokenKind::AngleBracketClose)
        .is_none());
    assert_eq!(builder.token_index(), before);
}

#[test]
fn has_error_after_sees_error_nodes() {
    let mut builder = PsiBuilder::new("a b");
    let marker = builder.mark();
    assert!(!builder.has_error_after(marker));
    builder.inline_error("oops");
    assert!(builder.has_error_after(marker));
    let _ = builder.done(marker, identifier_data());
}

#[test]
fn zero_width_errors_attach_to_the_previous_token() {
    // The error is emitted while sitting on `int` of the second field; it
    // must attach to the `x` before the whitespace.
    with_parse("class C { int x int y; }", |result| {
        let error = result
            .errors
            .iter()
            .find(|error| error.message == "Expected ';'")
            .expect("missing semicolon error");
        let token = result.tokens.get(error.token_start as usize);
        assert_eq!(result.token_text(error.token_start as usize), "x");
        assert_eq!(token.kind, TokenKind::KeywordOrIdentifier);
    });
}
