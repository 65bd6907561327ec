/// Classification of a lexical unit of SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Keyword or bare identifier, including `@@globals`.
    Word,
    /// Named parameter such as `@name`; the text excludes the `@`.
    Placeholder,
    /// String literal or quoted identifier.
    Quoted,
    Comment,
    OpenParen,
    CloseParen,
    Punct,
}

/// A token produced by [`Scanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the token in the scanned text, `@` included for placeholders.
    pub start: usize,
    /// Byte offset one past the token.
    pub end: usize,
    /// Parenthesis nesting level the token sits at.
    pub depth: usize,
}

impl Token<'_> {
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }
}

/// Splits SQL text into tokens while tracking parenthesis depth.
///
/// The scanner is dialect agnostic: `'…'` literals, `"…"`, `[…]` and `` `…` ``
/// quoted identifiers, `--` and `/* */` comments are all recognised so keywords
/// and placeholders inside them are never reported as such. Unterminated
/// literals and comments run to the end of the text.
pub struct Scanner<'a> {
    sql: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(sql: &'a str) -> Self {
        Self {
            sql,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.sql.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek(0).is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_word(&mut self) {
        while self.peek(0).is_some_and(is_word_byte) {
            self.pos += 1;
        }
    }

    fn take_until(&mut self, close: u8, doubled_escapes: bool) {
        while let Some(b) = self.peek(0) {
            self.pos += 1;

            if b != close {
                continue;
            }

            if doubled_escapes && self.peek(0) == Some(close) {
                self.pos += 1;
                continue;
            }

            return;
        }
    }

    fn take_line(&mut self) {
        while let Some(b) = self.peek(0) {
            if b == b'\n' {
                return;
            }
            self.pos += 1;
        }
    }

    fn take_block_comment(&mut self) {
        self.pos += 2;
        while self.peek(0).is_some() {
            if self.peek(0) == Some(b'*') && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();

        let start = self.pos;
        let first = self.peek(0)?;
        let depth = self.depth;

        let kind = match first {
            b'\'' | b'"' | b'`' => {
                self.pos += 1;
                self.take_until(first, true);
                TokenKind::Quoted
            }
            b'[' => {
                self.pos += 1;
                self.take_until(b']', false);
                TokenKind::Quoted
            }
            b'-' if self.peek(1) == Some(b'-') => {
                self.take_line();
                TokenKind::Comment
            }
            b'/' if self.peek(1) == Some(b'*') => {
                self.take_block_comment();
                TokenKind::Comment
            }
            b'(' => {
                self.pos += 1;
                self.depth += 1;
                TokenKind::OpenParen
            }
            b')' => {
                self.pos += 1;
                self.depth = self.depth.saturating_sub(1);
                TokenKind::CloseParen
            }
            b'@' if self.peek(1) == Some(b'@') => {
                self.pos += 2;
                self.take_word();
                TokenKind::Word
            }
            b'@' if self.peek(1).is_some_and(is_word_byte) => {
                self.pos += 1;
                self.take_word();

                return Some(Token {
                    kind: TokenKind::Placeholder,
                    text: &self.sql[start + 1..self.pos],
                    start,
                    end: self.pos,
                    depth,
                });
            }
            b if is_word_byte(b) => {
                self.take_word();
                TokenKind::Word
            }
            _ => {
                self.pos += 1;
                TokenKind::Punct
            }
        };

        Some(Token {
            kind,
            text: &self.sql[start..self.pos],
            start,
            end: self.pos,
            depth,
        })
    }
}

// Bytes >= 0x80 belong to multi-byte characters; treating them as word bytes
// keeps every token boundary on a char boundary.
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'#' || b >= 0x80
}
