//! Marker/production builder.
//!
//! The builder owns the token vector, its non-trivial projection, the node
//! arena and the production stream. The parser drives it through markers:
//! `mark` opens a node slot at the cursor, `done` stamps the payload and
//! closes it, `precede` retroactively wraps an already-completed node, and
//! `rollback` rewinds everything emitted since a marker opened. Delimiter
//! pairs are matched once during initialization, so acquiring a sub-stream
//! over `()`, `[]` or `{}` is a constant-time partner lookup.

use kiln_core::LinearArena;

use crate::lexer::{self, token_text};
use crate::node::{Node, NodeData, NodeId};
use crate::result::{ParseError, ParseResult};
use crate::tokens::{Token, TokenFlags, TokenKind};
use crate::Error;

/// Hard cap on non-trivial tokens per file.
pub const MAX_TOKENS: usize = 65_535;

const NO_MATCH: u32 = u32::MAX;

/// Projection entry: a non-trivial token plus its absolute index and, for
/// delimiters, the projection index of its partner.
#[derive(Clone, Copy)]
struct NtToken {
    token: Token,
    token_index: u32,
    match_index: u32,
}

/// Open node slot whose close has not been emitted yet.
#[derive(Clone, Copy)]
#[must_use = "a marker must be completed, dropped or rolled back"]
pub struct Marker {
    id: NodeId,
}

impl Marker {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Window over the non-trivial projection bounded by a delimiter pair:
/// `[start, end)` where `start - 1` holds the opener and `end` the closer.
#[derive(Clone, Copy)]
pub struct SubStream {
    pub start: usize,
    pub end: usize,
}

impl SubStream {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Copy)]
struct StreamFrame {
    start: usize,
    end: usize,
}

struct PreError {
    message: &'static str,
    token_start: u32,
    token_end: u32,
    source_start: u32,
    source_end: u32,
}

pub struct PsiBuilder<'s> {
    src: &'s str,
    tokens: Vec<Token>,
    nt: Vec<NtToken>,
    cursor: usize,
    stream_start: usize,
    stream_end: usize,
    stream_stack: Vec<StreamFrame>,
    production: Vec<i32>,
    nodes: Vec<Node>,
    free_slots: Vec<u32>,
    messages: String,
    pre_errors: Vec<PreError>,
    valid: bool,
    has_too_many_tokens: bool,
    has_bad_characters: bool,
    has_unmatched_delimiters: bool,
    has_non_trivial_content: bool,
}

impl<'s> PsiBuilder<'s> {
    /// Tokenizes, projects, pre-matches delimiters and seeds the node
    /// arena. A builder is single-use: one parse, then [`finalize`].
    ///
    /// [`finalize`]: PsiBuilder::finalize
    pub fn new(src: &'s str) -> PsiBuilder<'s> {
        let mut tokens = Vec::with_capacity(1024);
        let clean = lexer::tokenize(src, &mut tokens);

        let mut builder = PsiBuilder {
            src,
            tokens,
            nt: Vec::new(),
            cursor: 0,
            stream_start: 0,
            stream_end: 0,
            stream_stack: Vec::new(),
            production: Vec::with_capacity(512),
            nodes: Vec::with_capacity(512),
            free_slots: Vec::new(),
            messages: String::new(),
            pre_errors: Vec::new(),
            valid: false,
            has_too_many_tokens: false,
            has_bad_characters: !clean,
            has_unmatched_delimiters: false,
            has_non_trivial_content: false,
        };

        builder.build_projection();
        builder.match_delimiters();
        builder.record_pre_errors();

        // The projection always ends with the end-of-input sentinel, which
        // does not count against the limit.
        builder.has_too_many_tokens = builder.nt.len() > MAX_TOKENS + 1;
        if builder.has_too_many_tokens {
            let last = builder.tokens.len() - 1;
            builder.pre_errors.push(PreError {
                message: "too many tokens in file, at most 65535 are supported",
                token_start: 0,
                token_end: last as u32,
                source_start: builder.tokens[0].position,
                source_end: builder.tokens[last].position,
            });
        }

        // Slot 0 is the invalid sentinel, slot 1 the file root; the root's
        // open entry starts the production stream.
        builder.nodes.push(Node {
            token_start: 0,
            token_end: 0,
            index: NodeId::INVALID,
            next: NodeId::INVALID,
            data: NodeData::Invalid,
        });
        builder.nodes.push(Node {
            token_start: 0,
            token_end: builder.tokens.len() as u32,
            index: NodeId::ROOT,
            next: NodeId::INVALID,
            data: NodeData::File {
                first_declaration: NodeId::INVALID,
            },
        });
        builder.production.push(1);

        builder.stream_start = 0;
        builder.stream_end = builder.nt.len();

        builder.valid = !builder.has_bad_characters
            && !builder.has_too_many_tokens
            && !builder.has_unmatched_delimiters;
        builder
    }

    fn build_projection(&mut self) {
        let first_non_trivial = self.tokens.iter().position(|token| !token.is_trivia());

        // A sole end-of-input sentinel means the file held nothing but
        // trivia.
        self.has_non_trivial_content = match first_non_trivial {
            Some(index) => self.tokens[index].kind != TokenKind::EndOfInput,
            None => false,
        };

        let Some(first) = first_non_trivial else {
            return;
        };

        self.nt.reserve(self.tokens.len() - first);
        for index in first..self.tokens.len() {
            let token = self.tokens[index];
            if token.is_trivia() {
                // Remember trivia adjacency on the preceding entry; the
                // shift-operator check needs it once trivia is projected
                // away.
                if let Some(last) = self.nt.last_mut() {
                    last.token.flags.insert(TokenFlags::FOLLOWED_BY_TRIVIA);
                }
            } else {
                self.nt.push(NtToken {
                    token,
                    token_index: index as u32,
                    match_index: NO_MATCH,
                });
            }
        }
    }

    fn match_delimiters(&mut self) {
        let mut stack: Vec<usize> = Vec::new();

        for index in 0..self.nt.len() {
            let kind = self.nt[index].token.kind;
            match kind {
                TokenKind::OpenParen | TokenKind::CurlyBraceOpen | TokenKind::SquareBraceOpen => {
                    stack.push(index);
                }
                TokenKind::CloseParen | TokenKind::CurlyBraceClose | TokenKind::SquareBraceClose => {
                    let open_kind = match kind {
                        TokenKind::CloseParen => TokenKind::OpenParen,
                        TokenKind::CurlyBraceClose => TokenKind::CurlyBraceOpen,
                        _ => TokenKind::SquareBraceOpen,
                    };

                    let matched = stack
                        .iter()
                        .rposition(|&open| self.nt[open].token.kind == open_kind);

                    match matched {
                        Some(position) => {
                            // Openers skipped over never got a partner.
                            for &orphan in &stack[position + 1..] {
                                self.nt[orphan].token.flags.insert(TokenFlags::INVALID_MATCH);
                            }
                            let open = stack[position];
                            self.nt[open].match_index = index as u32;
                            self.nt[index].match_index = open as u32;
                            stack.truncate(position);
                        }
                        None => {
                            self.nt[index].token.flags.insert(TokenFlags::INVALID_MATCH);
                        }
                    }
                }
                _ => {}
            }
        }

        for &orphan in &stack {
            self.nt[orphan].token.flags.insert(TokenFlags::INVALID_MATCH);
        }

        // Write the projection's flags back so the raw token vector is the
        // single source of truth for the result.
        for index in 0..self.nt.len() {
            let nt = self.nt[index];
            self.tokens[nt.token_index as usize].flags = nt.token.flags;
        }

        self.has_unmatched_delimiters = self
            .tokens
            .iter()
            .any(|token| token.flags.contains(TokenFlags::INVALID_MATCH));
    }

    fn record_pre_errors(&mut self) {
        if self.has_unmatched_delimiters {
            for (index, token) in self.tokens.iter().enumerate() {
                if !token.flags.contains(TokenFlags::INVALID_MATCH) {
                    continue;
                }
                let message = match token.kind {
                    TokenKind::OpenParen => "unmatched paren open (",
                    TokenKind::CloseParen => "unmatched paren close )",
                    TokenKind::CurlyBraceOpen => "unmatched curly bracket open {",
                    TokenKind::CurlyBraceClose => "unmatched curly bracket close }",
                    TokenKind::SquareBraceOpen => "unmatched square brace open [",
                    TokenKind::SquareBraceClose => "unmatched square brace close ]",
                    TokenKind::StringStart | TokenKind::MultiLineStringStart => {
                        "unclosed string literal"
                    }
                    TokenKind::OpenCharacter => "unclosed character literal",
                    TokenKind::OpenStyle => "unclosed style literal",
                    _ => "unmatched delimiter",
                };
                self.pre_errors.push(PreError {
                    message,
                    token_start: index as u32,
                    token_end: index as u32 + 1,
                    source_start: token.position,
                    source_end: token.position + 1,
                });
            }
        }

        if self.has_bad_characters {
            let mut index = 0;
            while index < self.tokens.len() {
                if self.tokens[index].kind != TokenKind::BadCharacter {
                    index += 1;
                    continue;
                }
                let mut end = index + 1;
                while end < self.tokens.len() && self.tokens[end].kind == TokenKind::BadCharacter {
                    end += 1;
                }
                self.pre_errors.push(PreError {
                    message: "bad character",
                    token_start: index as u32,
                    token_end: end as u32,
                    source_start: self.tokens[index].position,
                    source_end: self.tokens[end].position,
                });
                index = end;
            }
        }
    }

    /// False when tokenization found bad characters, the token limit was
    /// exceeded, or a delimiter is unmatched; the caller then finalizes
    /// without parsing.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn has_non_trivial_content(&self) -> bool {
        self.has_non_trivial_content
    }

    /// Entries currently in the production stream.
    pub fn production_len(&self) -> usize {
        self.production.len()
    }

    /// Live node slots (allocated minus freed).
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_slots.len()
    }

    /// Size of the non-trivial projection.
    pub fn non_trivial_len(&self) -> usize {
        self.nt.len()
    }

    pub fn src(&self) -> &'s str {
        self.src
    }

    // ----- cursor -----

    pub fn end_of_input(&self) -> bool {
        self.cursor >= self.stream_end
    }

    pub fn token_kind(&self) -> TokenKind {
        if self.end_of_input() {
            TokenKind::EndOfInput
        } else {
            self.nt[self.cursor].token.kind
        }
    }

    pub fn keyword(&self) -> Option<crate::keywords::Keyword> {
        if self.end_of_input() {
            None
        } else {
            self.nt[self.cursor].token.keyword
        }
    }

    pub fn token(&self) -> Token {
        let index = self.cursor.min(self.nt.len().saturating_sub(1));
        match self.nt.get(index) {
            Some(nt) => nt.token,
            None => Token::new(TokenKind::EndOfInput, self.src.len() as u32),
        }
    }

    /// Lookahead clamped to the projection, like the cursor itself.
    pub fn peek(&self, steps: usize) -> Token {
        let index = (self.cursor + steps).min(self.nt.len().saturating_sub(1));
        match self.nt.get(index) {
            Some(nt) => nt.token,
            None => Token::new(TokenKind::EndOfInput, self.src.len() as u32),
        }
    }

    pub fn advance(&mut self) {
        if self.cursor < self.stream_end {
            self.cursor += 1;
        }
    }

    pub fn token_index(&self) -> usize {
        self.cursor
    }

    pub fn set_token_index(&mut self, index: usize) {
        self.cursor = index.min(self.nt.len());
    }

    pub fn advance_to_stream_end(&mut self) {
        self.cursor = self.stream_end;
    }

    /// Text of the current token.
    pub fn token_source(&self) -> &'s str {
        if self.end_of_input() {
            return "";
        }
        token_text(self.src, &self.tokens, self.nt[self.cursor].token_index as usize)
    }

    // ----- sub-streams -----

    /// Constant-time sub-stream acquisition over a pre-matched pair. The
    /// cursor must sit on the opener; `None` means the opener has no
    /// partner (only possible for invalid parses or `<`).
    pub fn try_sub_stream(&self, open: TokenKind) -> Option<SubStream> {
        if self.token_kind() != open {
            return None;
        }
        let close = self.nt[self.cursor].match_index;
        if close == NO_MATCH {
            return None;
        }
        Some(SubStream {
            start: self.cursor + 1,
            end: close as usize,
        })
    }

    /// Scanning acquisition for pairs that are not pre-matched (angle
    /// brackets). Restores the cursor on failure.
    pub fn try_scan_sub_stream(&mut self, open: TokenKind, close: TokenKind) -> Option<SubStream> {
        let start = self.cursor;
        if self.token_kind() != open {
            return None;
        }
        let mut level = 1u32;
        self.advance();
        while !self.end_of_input() {
            let kind = self.token_kind();
            if kind == open {
                level += 1;
            } else if kind == close {
                level -= 1;
                if level == 0 {
                    let stream = SubStream {
                        start: start + 1,
                        end: self.cursor,
                    };
                    self.cursor = start + 1;
                    return Some(stream);
                }
            }
            self.advance();
        }
        self.cursor = start;
        None
    }

    pub fn push_stream(&mut self, stream: SubStream) {
        self.stream_stack.push(StreamFrame {
            start: self.stream_start,
            end: self.stream_end,
        });
        self.stream_start = stream.start;
        self.stream_end = stream.end;
        self.cursor = stream.start;
    }

    /// Restores the enclosing stream and steps over the closing delimiter.
    /// Unconsumed inner tokens become an "invalid content" error.
    pub fn pop_stream(&mut self) {
        if self.cursor != self.stream_end {
            let marker = self.mark();
            self.cursor = self.stream_end;
            self.error(marker, "invalid content");
        }
        self.cursor = self.stream_end + 1;
        let frame = self
            .stream_stack
            .pop()
            .expect("pop_stream without matching push_stream");
        self.stream_start = frame.start;
        self.stream_end = frame.end;
    }

    /// Drops all stream frames; used when file-level recovery bails out of
    /// an arbitrarily deep parse position.
    pub fn clear_streams(&mut self) {
        self.stream_stack.clear();
        self.stream_start = 0;
        self.stream_end = self.nt.len();
    }

    // ----- markers and production -----

    fn current_absolute_index(&self) -> u32 {
        match self.nt.get(self.cursor) {
            Some(nt) => nt.token_index,
            // Clamp to the end-of-input sentinel.
            None => self.tokens.len() as u32 - 1,
        }
    }

    fn allocate(&mut self, token_start: u32) -> NodeId {
        let id = match self.free_slots.pop() {
            Some(slot) => NodeId(slot),
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(Node {
                    token_start: 0,
                    token_end: 0,
                    index: id,
                    next: NodeId::INVALID,
                    data: NodeData::Invalid,
                });
                id
            }
        };
        let node = &mut self.nodes[id.index()];
        node.token_start = token_start;
        node.token_end = token_start;
        node.index = id;
        node.next = NodeId::INVALID;
        node.data = NodeData::Invalid;
        id
    }

    fn release(&mut self, id: NodeId) {
        debug_assert!(id.is_valid() && id.index() < self.nodes.len());
        let node = &mut self.nodes[id.index()];
        node.data = NodeData::Invalid;
        node.next = NodeId::INVALID;
        self.free_slots.push(id.0);
    }

    fn last_index_of(&self, value: i32) -> Option<usize> {
        self.production.iter().rposition(|&entry| entry == value)
    }

    /// Opens a node slot at the cursor and records the open entry.
    pub fn mark(&mut self) -> Marker {
        let id = self.allocate(self.current_absolute_index());
        self.production.push(id.0 as i32);
        Marker { id }
    }

    /// Opens a node slot bound to an earlier projection position. The open
    /// entry is still appended at the current production position.
    pub fn mark_from_token(&mut self, nt_index: usize) -> Marker {
        let absolute = self.nt[nt_index].token_index;
        let id = self.allocate(absolute);
        self.production.push(id.0 as i32);
        Marker { id }
    }

    /// Completes the marker: stamps the payload, sets the exclusive token
    /// end to the cursor, and records the close entry.
    pub fn done(&mut self, marker: Marker, data: NodeData) -> NodeId {
        let id = marker.id;
        let end = self.current_absolute_index();
        let node = &mut self.nodes[id.index()];
        node.token_end = end.max(node.token_start);
        node.data = data;
        self.production.push(-(id.0 as i32));
        id
    }

    /// Erases the marker's open entry (and close entry, if completed) and
    /// returns the slot to the free-list. Only legal for markers with no
    /// completed children.
    pub fn drop_marker(&mut self, marker: Marker) {
        let id = marker.id.0 as i32;
        if let Some(close) = self.last_index_of(-id) {
            self.production.remove(close);
        }
        if let Some(open) = self.last_index_of(id) {
            self.production.remove(open);
        }
        self.release(marker.id);
    }

    /// Opens a new marker that will wrap `existing`: its open entry is
    /// spliced in directly before `existing`'s open entry and it inherits
    /// `existing`'s token start. Completing it encloses the wrapped node.
    pub fn precede(&mut self, existing: NodeId) -> Marker {
        debug_assert!(existing.is_valid());
        let token_start = self.nodes[existing.index()].token_start;
        let id = self.allocate(token_start);
        let position = self
            .last_index_of(existing.0 as i32)
            .expect("precede target is not in the production stream");
        self.production.insert(position, id.0 as i32);
        Marker { id }
    }

    /// Rewinds the production stream, node arena and cursor to the moment
    /// `marker` was created. Every node opened since is freed.
    pub fn rollback(&mut self, marker: Marker) {
        let target = self.nodes[marker.id.index()].token_start;

        // token_start is absolute; walk the projection backwards to find
        // the corresponding cursor position.
        let mut search = (target as usize).min(self.nt.len().saturating_sub(1));
        loop {
            if self.nt[search].token_index == target {
                self.cursor = search;
                break;
            }
            debug_assert!(search > 0, "rollback target not in the projection");
            search -= 1;
        }

        let open = self
            .last_index_of(marker.id.0 as i32)
            .expect("rollback target is not in the production stream");
        for position in (open..self.production.len()).rev() {
            let entry = self.production[position];
            if entry > 0 {
                self.release(NodeId(entry as u32));
            }
        }
        self.production.truncate(open);
    }

    /// True if any error node was completed after `marker` opened.
    pub fn has_error_after(&self, marker: Marker) -> bool {
        let Some(open) = self.last_index_of(marker.id.0 as i32) else {
            return false;
        };
        self.production[open + 1..].iter().any(|&entry| {
            entry > 0 && self.nodes[entry as usize].data.is_error()
        })
    }

    // ----- nodes -----

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn set_next(&mut self, id: NodeId, next: NodeId) {
        debug_assert!(id.is_valid());
        self.nodes[id.index()].next = next;
    }

    pub fn set_file_first_declaration(&mut self, first: NodeId) {
        if let NodeData::File { first_declaration } = &mut self.nodes[NodeId::ROOT.index()].data {
            *first_declaration = first;
        }
    }

    pub fn file_first_declaration(&self) -> NodeId {
        match self.nodes[NodeId::ROOT.index()].data {
            NodeData::File { first_declaration } => first_declaration,
            _ => NodeId::INVALID,
        }
    }

    // ----- errors -----

    /// Completes `marker` as an error node with the given message.
    pub fn error(&mut self, marker: Marker, message: &str) -> NodeId {
        let message_start = self.messages.len() as u32;
        self.messages.push_str(message);
        self.done(
            marker,
            NodeData::Error {
                message_start,
                message_len: message.len() as u32,
            },
        )
    }

    /// Zero-width error node at the cursor; finalization attaches it to
    /// the preceding non-trivial token.
    pub fn inline_error(&mut self, message: &str) -> NodeId {
        let marker = self.mark();
        self.error(marker, message)
    }

    // ----- finalization -----

    /// Appends the end-of-input sentinel (closing the root), materializes
    /// errors and copies the parse outputs into `output`.
    pub fn finalize<'out>(mut self, output: &'out LinearArena) -> Result<ParseResult<'out>, Error> {
        self.production.push(-1);

        let mut errors: Vec<ParseError<'out>> = Vec::new();

        for pre in &self.pre_errors {
            errors.push(ParseError {
                message: output
                    .alloc_str(pre.message)
                    .ok_or(Error::OutputArenaExhausted)?,
                node: NodeId::INVALID,
                token_start: pre.token_start,
                token_end: pre.token_end,
                source_start: pre.source_start,
                source_end: pre.source_end,
            });
        }

        for &entry in &self.production {
            if entry <= 0 {
                continue;
            }
            let node = self.nodes[entry as usize];
            let NodeData::Error {
                message_start,
                message_len,
            } = node.data
            else {
                continue;
            };

            let message_range =
                message_start as usize..(message_start + message_len) as usize;
            let message = output
                .alloc_str(&self.messages[message_range])
                .ok_or(Error::OutputArenaExhausted)?;

            let mut token_start = node.token_start;
            let mut token_end = node.token_end.min(self.tokens.len() as u32 - 1);

            let (source_start, source_end);
            if token_start == token_end && token_start > 0 {
                // Zero-width errors visually attach to the previous
                // non-trivial token.
                let mut offset = 1;
                while offset < token_start as usize
                    && self.tokens[token_start as usize - offset].is_trivia()
                {
                    offset += 1;
                }
                token_start -= offset as u32;
                token_end -= offset as u32;
                source_start = self.tokens[token_start as usize].position;
                source_end = self.tokens[token_end as usize + 1].position;
            } else {
                source_start = self.tokens[token_start as usize].position;
                source_end = self.tokens[token_end as usize].position;
            }

            errors.push(ParseError {
                message,
                node: node.index,
                token_start,
                token_end,
                source_start,
                source_end,
            });
        }

        let src = output.alloc_str(self.src).ok_or(Error::OutputArenaExhausted)?;
        let tokens = output
            .alloc_slice_copy(&self.tokens)
            .ok_or(Error::OutputArenaExhausted)?;
        let production: &[i32] = if self.valid {
            output
                .alloc_slice_copy(&self.production)
                .ok_or(Error::OutputArenaExhausted)?
        } else {
            &[]
        };
        let nodes = output
            .alloc_slice_copy(&self.nodes)
            .ok_or(Error::OutputArenaExhausted)?;
        let errors = output
            .alloc_slice_copy(&errors)
            .ok_or(Error::OutputArenaExhausted)?;

        Ok(ParseResult::new(
            src,
            tokens,
            production,
            nodes,
            errors,
            self.has_too_many_tokens,
            self.has_bad_characters,
            self.has_unmatched_delimiters,
            self.has_non_trivial_content,
        ))
    }
}
