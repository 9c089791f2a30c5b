//! Stateful tokenizer.
//!
//! Produces the flat token stream, trivia included, terminated by an
//! end-of-input sentinel at offset = source length. String-like content is
//! handled by a bounded state stack: entering a string/character/style
//! literal pushes a state, `${` inside a string pushes an interpolation
//! state that lexes ordinary tokens until its braces rebalance. Tokens only
//! record their starting offset; text is recovered from the gap to the next
//! token.

use kiln_core::FixedPodList;

use crate::keywords::match_keyword;
use crate::tokens::{Token, TokenFlags, TokenKind};

/// Deepest allowed nesting of string/interpolation states.
pub const STATE_STACK_LIMIT: usize = 128;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
enum LexState {
    #[default]
    Default,
    String,
    MultiLineString,
    Character,
    Style,
    StringInterpolation,
}

#[derive(Clone, Copy, Default)]
struct StateFrame {
    state: LexState,
    brace_depth: u16,
}

/// Tokenizes `src` into `out`. Returns true iff no bad-character tokens
/// were emitted. The output always ends with an `EndOfInput` sentinel.
pub fn tokenize(src: &str, out: &mut Vec<Token>) -> bool {
    assert!(src.len() <= u32::MAX as usize, "source exceeds 4 GiB");
    let mut frames = [StateFrame::default(); STATE_STACK_LIMIT];
    let mut lexer = Lexer {
        text: src,
        bytes: src.as_bytes(),
        pos: 0,
        state: LexState::Default,
        brace_depth: 0,
        stack: FixedPodList::new(&mut frames),
        has_bad_characters: false,
    };
    lexer.run(out);
    out.push(Token::new(TokenKind::EndOfInput, src.len() as u32));
    !lexer.has_bad_characters
}

/// Text of the token at `index`, given the full token slice and source.
/// The sentinel closes off the final token's range.
pub fn token_text<'s>(src: &'s str, tokens: &[Token], index: usize) -> &'s str {
    let start = tokens[index].position as usize;
    let end = tokens
        .get(index + 1)
        .map_or(src.len(), |next| next.position as usize);
    &src[start..end]
}

struct Lexer<'s, 'f> {
    text: &'s str,
    bytes: &'s [u8],
    pos: usize,
    state: LexState,
    brace_depth: u16,
    stack: FixedPodList<'f, StateFrame>,
    has_bad_characters: bool,
}

impl Lexer<'_, '_> {
    fn run(&mut self, out: &mut Vec<Token>) {
        while self.pos < self.bytes.len() {
            match self.state {
                LexState::Default | LexState::StringInterpolation => self.default_step(out),
                LexState::String => self.string_step(out),
                LexState::MultiLineString => self.multi_line_string_step(out),
                LexState::Character => self.opaque_step(
                    out,
                    b'\'',
                    TokenKind::RegularCharacterPart,
                    TokenKind::CloseCharacter,
                ),
                LexState::Style => self.opaque_step(
                    out,
                    b'`',
                    TokenKind::RegularStylePart,
                    TokenKind::CloseStyle,
                ),
            }
        }
    }

    fn loc(&self) -> u32 {
        self.pos as u32
    }

    fn byte(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn peek_byte(&self, lookahead: usize) -> u8 {
        self.bytes
            .get(self.pos + lookahead)
            .copied()
            .unwrap_or(0)
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn push_state(&mut self, state: LexState) {
        let pushed = self.stack.push(StateFrame {
            state: self.state,
            brace_depth: self.brace_depth,
        });
        debug_assert!(pushed, "tokenizer state stack overflow");
        self.state = state;
        self.brace_depth = 0;
    }

    fn pop_state(&mut self) {
        let frame = self.stack.pop().unwrap_or_default();
        self.state = frame.state;
        self.brace_depth = frame.brace_depth;
    }

    // ----- default / interpolation -----

    fn default_step(&mut self, out: &mut Vec<Token>) {
        if self.state == LexState::StringInterpolation {
            match self.byte() {
                b'{' => {
                    self.brace_depth += 1;
                    out.push(Token::new(TokenKind::CurlyBraceOpen, self.loc()));
                    self.pos += 1;
                    return;
                }
                b'}' => {
                    if self.brace_depth == 0 {
                        self.pop_state();
                        out.push(Token::new(TokenKind::LongStringInterpolationEnd, self.loc()));
                    } else {
                        self.brace_depth -= 1;
                        out.push(Token::new(TokenKind::CurlyBraceClose, self.loc()));
                    }
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
        }

        if self.try_read_comment(out) || self.try_read_whitespace(out) {
            return;
        }

        match self.byte() {
            // `$"` opens the same string state as `"`; interpolation
            // markers are recognized inside either way.
            b'$' if self.peek_byte(1) == b'"' => {
                if self.bytes[self.pos + 1..].starts_with(b"\"\"\"") {
                    out.push(Token::new(TokenKind::MultiLineStringStart, self.loc()));
                    self.pos += 4;
                    self.push_state(LexState::MultiLineString);
                } else {
                    out.push(Token::new(TokenKind::StringStart, self.loc()));
                    self.pos += 2;
                    self.push_state(LexState::String);
                }
            }
            b'"' => {
                if self.bytes[self.pos..].starts_with(b"\"\"\"") {
                    out.push(Token::new(TokenKind::MultiLineStringStart, self.loc()));
                    self.pos += 3;
                    self.push_state(LexState::MultiLineString);
                } else {
                    out.push(Token::new(TokenKind::StringStart, self.loc()));
                    self.pos += 1;
                    self.push_state(LexState::String);
                }
            }
            b'`' => {
                out.push(Token::new(TokenKind::OpenStyle, self.loc()));
                self.pos += 1;
                self.push_state(LexState::Style);
            }
            b'\'' => {
                out.push(Token::new(TokenKind::OpenCharacter, self.loc()));
                self.pos += 1;
                self.push_state(LexState::Character);
            }
            _ => {
                if let Some(token) = self.try_read_identifier_or_keyword() {
                    out.push(token);
                } else if let Some(token) = self.try_read_number() {
                    out.push(token);
                } else if let Some(token) = self.try_read_operator() {
                    out.push(token);
                } else {
                    out.push(Token::new(TokenKind::BadCharacter, self.loc()));
                    self.bump_char();
                    self.has_bad_characters = true;
                }
            }
        }
    }

    fn try_read_whitespace(&mut self, out: &mut Vec<Token>) -> bool {
        let start = self.loc();
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
        if self.loc() == start {
            return false;
        }
        out.push(Token::new(TokenKind::Whitespace, start));
        true
    }

    fn try_read_comment(&mut self, out: &mut Vec<Token>) -> bool {
        if self.byte() != b'/' || self.peek_byte(1) != b'/' {
            return false;
        }
        let start = self.loc();
        self.pos += 2;
        // The terminating newline belongs to the comment.
        while let Some(ch) = self.bump_char() {
            if is_newline(ch) {
                break;
            }
        }
        out.push(Token::new(TokenKind::Comment, start));
        true
    }

    fn try_read_identifier_or_keyword(&mut self) -> Option<Token> {
        let first = self.peek_char()?;
        if !first.is_alphabetic() && first != '_' {
            return None;
        }
        let start = self.pos;
        self.pos += first.len_utf8();
        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        let keyword = match_keyword(&self.bytes[start..self.pos]);
        Some(Token::with_keyword(
            TokenKind::KeywordOrIdentifier,
            keyword,
            start as u32,
        ))
    }

    // ----- numbers -----

    fn try_read_number(&mut self) -> Option<Token> {
        if !self.peek_byte(0).is_ascii_digit() {
            return None;
        }

        let start = self.pos;

        let int_kind = self.read_integer_literal();
        let int_end = self.pos;

        self.pos = start;
        let real_kind = self.read_real_literal();
        let real_end = self.pos;

        // Take the longer spelling; ties go to the integer reading.
        match (int_kind, real_kind) {
            (Some(kind), Some(real)) => {
                if int_end >= real_end {
                    self.pos = int_end;
                    Some(Token::new(kind, start as u32))
                } else {
                    self.pos = real_end;
                    Some(Token::new(real, start as u32))
                }
            }
            (Some(kind), None) => {
                self.pos = int_end;
                Some(Token::new(kind, start as u32))
            }
            (None, Some(real)) => {
                self.pos = real_end;
                Some(Token::new(real, start as u32))
            }
            (None, None) => {
                self.pos = start;
                None
            }
        }
    }

    fn read_integer_literal(&mut self) -> Option<TokenKind> {
        if !self.peek_byte(0).is_ascii_digit() {
            return None;
        }
        let is_zero = self.byte() == b'0';
        self.pos += 1;

        if is_zero {
            match self.peek_byte(0) {
                b'b' | b'B' => {
                    self.pos += 1;
                    while matches!(self.peek_byte(0), b'0' | b'1' | b'_') {
                        self.pos += 1;
                    }
                    return Some(TokenKind::BinaryNumberLiteral);
                }
                b'x' | b'X' => {
                    self.pos += 1;
                    while self.peek_byte(0).is_ascii_hexdigit() {
                        self.pos += 1;
                    }
                    return Some(TokenKind::HexLiteral);
                }
                _ => {}
            }
        }

        while self.peek_byte(0).is_ascii_digit() || self.peek_byte(0) == b'_' {
            self.pos += 1;
        }
        // A trailing separator is not part of the literal.
        if self.bytes[self.pos - 1] == b'_' {
            self.pos -= 1;
        }

        Some(self.read_integer_suffix())
    }

    fn read_integer_suffix(&mut self) -> TokenKind {
        match self.peek_byte(0) {
            b'u' | b'U' => {
                self.pos += 1;
                if matches!(self.peek_byte(0), b'l' | b'L') {
                    self.pos += 1;
                    TokenKind::UInt64Literal
                } else {
                    TokenKind::UInt32Literal
                }
            }
            b'l' | b'L' => {
                self.pos += 1;
                TokenKind::Int64Literal
            }
            _ => TokenKind::Int32Literal,
        }
    }

    fn read_digits(&mut self) -> bool {
        let mut read = false;
        while self.peek_byte(0).is_ascii_digit() {
            self.pos += 1;
            read = true;
        }
        read
    }

    fn read_real_suffix(&mut self) -> Option<TokenKind> {
        match self.peek_byte(0) {
            b'f' | b'F' => {
                self.pos += 1;
                Some(TokenKind::FloatLiteral)
            }
            b'd' | b'D' => {
                self.pos += 1;
                Some(TokenKind::DoubleLiteral)
            }
            _ => None,
        }
    }

    fn read_real_literal(&mut self) -> Option<TokenKind> {
        if !self.read_digits() {
            return None;
        }

        match self.peek_byte(0) {
            b'.' => {
                self.pos += 1;
                if !self.read_digits() {
                    return None;
                }
                if matches!(self.peek_byte(0), b'e' | b'E') {
                    let mark = self.pos;
                    self.pos += 1;
                    if matches!(self.peek_byte(0), b'+' | b'-') {
                        self.pos += 1;
                    }
                    if !self.read_digits() {
                        self.pos = mark;
                    }
                }
                Some(self.read_real_suffix().unwrap_or(TokenKind::FloatLiteral))
            }
            b'e' | b'E' => {
                self.pos += 1;
                if matches!(self.peek_byte(0), b'+' | b'-') {
                    self.pos += 1;
                }
                if !self.read_digits() {
                    return None;
                }
                Some(self.read_real_suffix().unwrap_or(TokenKind::FloatLiteral))
            }
            _ => self.read_real_suffix(),
        }
    }

    // ----- operators -----

    fn try_read_operator(&mut self) -> Option<Token> {
        use TokenKind::*;

        let start = self.loc();
        let (kind, width) = match self.byte() {
            b'@' => (At, 1),
            b'#' => (HashTag, 1),
            b',' => (Comma, 1),
            b';' => (SemiColon, 1),
            b'~' => (BinaryNot, 1),
            b'{' => (CurlyBraceOpen, 1),
            b'}' => (CurlyBraceClose, 1),
            b'[' => (SquareBraceOpen, 1),
            b']' => (SquareBraceClose, 1),
            b'(' => (OpenParen, 1),
            b')' => (CloseParen, 1),
            b'&' => match self.peek_byte(1) {
                b'&' => (ConditionalAnd, 2),
                b'=' => (AndAssign, 2),
                _ => (BinaryAnd, 1),
            },
            b'|' => match self.peek_byte(1) {
                b'|' => (ConditionalOr, 2),
                b'=' => (OrAssign, 2),
                _ => (BinaryOr, 1),
            },
            b'^' => match self.peek_byte(1) {
                b'=' => (XorAssign, 2),
                _ => (BinaryXor, 1),
            },
            b'?' => match (self.peek_byte(1), self.peek_byte(2)) {
                (b'?', b'=') => (CoalesceAssign, 3),
                (b'?', _) => (Coalesce, 2),
                (b'.', _) => (ConditionalAccess, 2),
                _ => (QuestionMark, 1),
            },
            b'=' => match self.peek_byte(1) {
                b'>' => (FatArrow, 2),
                b'=' => (ConditionalEquals, 2),
                _ => (Assign, 1),
            },
            b'!' => match self.peek_byte(1) {
                b'=' => (ConditionalNotEquals, 2),
                _ => (Not, 1),
            },
            b'+' => match self.peek_byte(1) {
                b'=' => (AddAssign, 2),
                b'+' => (Increment, 2),
                _ => (Plus, 1),
            },
            b'-' => match self.peek_byte(1) {
                b'=' => (SubtractAssign, 2),
                b'-' => (Decrement, 2),
                b'>' => (ThinArrow, 2),
                _ => (Minus, 1),
            },
            b'*' => match self.peek_byte(1) {
                b'=' => (MultiplyAssign, 2),
                _ => (Multiply, 1),
            },
            b'/' => match self.peek_byte(1) {
                b'=' => (DivideAssign, 2),
                _ => (Divide, 1),
            },
            b'%' => match self.peek_byte(1) {
                b'=' => (ModAssign, 2),
                _ => (Modulus, 1),
            },
            b':' => match self.peek_byte(1) {
                b':' => (DoubleColon, 2),
                _ => (Colon, 1),
            },
            // `<<` and `>>` are never single tokens; generic argument lists
            // need the individual angle brackets. Only the compound assigns
            // fuse.
            b'<' => match (self.peek_byte(1), self.peek_byte(2)) {
                (b'=', _) => (LessThanEqualTo, 2),
                (b'<', b'=') => (LeftShiftAssign, 3),
                _ => (AngleBracketOpen, 1),
            },
            b'>' => match (self.peek_byte(1), self.peek_byte(2)) {
                (b'=', _) => (GreaterThanEqualTo, 2),
                (b'>', b'=') => (RightShiftAssign, 3),
                _ => (AngleBracketClose, 1),
            },
            b'.' => match (self.peek_byte(1), self.peek_byte(2)) {
                (b'.', b'.') => (Splat, 3),
                _ => (Dot, 1),
            },
            _ => return None,
        };
        self.pos += width;
        Some(Token::new(kind, start))
    }

    // ----- string states -----

    fn string_step(&mut self, out: &mut Vec<Token>) {
        // The opener is the token pushed when this state was entered.
        let opener_index = out.len() - 1;
        let mut part_start = self.loc();

        loop {
            let Some(ch) = self.peek_char() else {
                // Unterminated at end of input.
                out.push(Token::new(TokenKind::RegularStringPart, part_start));
                out[opener_index].flags.insert(TokenFlags::INVALID_MATCH);
                self.pop_state();
                return;
            };

            if is_newline(ch) {
                // A newline closes a single-line string; the opener is
                // marked so an error can be reported against it.
                out.push(Token::new(TokenKind::RegularStringPart, part_start));
                out[opener_index].flags.insert(TokenFlags::INVALID_MATCH);
                self.pop_state();
                self.pos += ch.len_utf8();
                return;
            }

            if ch == '"' {
                out.push(Token::new(TokenKind::RegularStringPart, part_start));
                out.push(Token::new(TokenKind::StringEnd, self.loc()));
                self.pop_state();
                self.pos += 1;
                return;
            }

            if ch == '$' && self.bytes[self.pos - 1] != b'\\' {
                self.pos += 1;

                if self.peek_byte(0) == b'{' {
                    self.pos += 1;
                    out.push(Token::new(TokenKind::RegularStringPart, part_start));
                    // Scoot back so the token covers the `${`.
                    out.push(Token::new(
                        TokenKind::LongStringInterpolationStart,
                        self.loc() - 2,
                    ));
                    self.push_state(LexState::StringInterpolation);
                    return;
                }

                if let Some(identifier) = self.try_read_identifier_or_keyword() {
                    out.push(Token::new(TokenKind::RegularStringPart, part_start));
                    // Scoot back so the token covers the `$`.
                    out.push(Token::with_keyword(
                        TokenKind::ShortStringInterpolation,
                        identifier.keyword,
                        identifier.position - 1,
                    ));
                    part_start = self.loc();
                }
                // A lonely `$` stays part of the text run.
                continue;
            }

            self.pos += ch.len_utf8();
        }
    }

    fn multi_line_string_step(&mut self, out: &mut Vec<Token>) {
        let mut part_start = self.loc();

        loop {
            let Some(ch) = self.peek_char() else {
                // Unterminated at end of input; flag the opener.
                out.push(Token::new(TokenKind::RegularStringPart, part_start));
                self.flag_last_opener(out, TokenKind::MultiLineStringStart);
                self.pop_state();
                return;
            };

            if self.bytes[self.pos..].starts_with(b"\"\"\"") {
                out.push(Token::new(TokenKind::RegularStringPart, part_start));
                out.push(Token::new(TokenKind::MultiLineStringEnd, self.loc()));
                self.pop_state();
                self.pos += 3;
                return;
            }

            if ch == '$' && self.bytes[self.pos - 1] != b'\\' {
                self.pos += 1;

                if self.peek_byte(0) == b'{' {
                    self.pos += 1;
                    out.push(Token::new(TokenKind::RegularStringPart, part_start));
                    out.push(Token::new(
                        TokenKind::LongStringInterpolationStart,
                        self.loc() - 2,
                    ));
                    self.push_state(LexState::StringInterpolation);
                    return;
                }

                if let Some(identifier) = self.try_read_identifier_or_keyword() {
                    out.push(Token::new(TokenKind::RegularStringPart, part_start));
                    out.push(Token::with_keyword(
                        TokenKind::ShortStringInterpolation,
                        identifier.keyword,
                        identifier.position - 1,
                    ));
                    part_start = self.loc();
                }
                continue;
            }

            if is_newline(ch) {
                // Newlines inside a multi-line string surface as whitespace
                // tokens so the line/column accounting stays uniform.
                out.push(Token::new(TokenKind::RegularStringPart, part_start));
                out.push(Token::new(TokenKind::Whitespace, self.loc()));
                self.pos += ch.len_utf8();
                part_start = self.loc();
                continue;
            }

            self.pos += ch.len_utf8();
        }
    }

    /// Character and style literals are opaque: everything up to the
    /// closing delimiter (or an unterminating newline) is one part token.
    fn opaque_step(&mut self, out: &mut Vec<Token>, close: u8, part: TokenKind, end: TokenKind) {
        let opener_index = out.len() - 1;
        let part_start = self.loc();

        loop {
            let Some(ch) = self.peek_char() else {
                out.push(Token::new(part, part_start));
                out[opener_index].flags.insert(TokenFlags::INVALID_MATCH);
                self.pop_state();
                return;
            };

            if ch as u32 == close as u32 {
                out.push(Token::new(part, part_start));
                out.push(Token::new(end, self.loc()));
                self.pop_state();
                self.pos += 1;
                return;
            }

            if is_newline(ch) {
                out.push(Token::new(part, part_start));
                out[opener_index].flags.insert(TokenFlags::INVALID_MATCH);
                self.pop_state();
                self.pos += ch.len_utf8();
                return;
            }

            self.pos += ch.len_utf8();
        }
    }

    fn flag_last_opener(&self, out: &mut [Token], kind: TokenKind) {
        for token in out.iter_mut().rev() {
            if token.kind == kind {
                token.flags.insert(TokenFlags::INVALID_MATCH);
                return;
            }
        }
    }
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}
