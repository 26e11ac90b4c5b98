//! Minimal keyword scanner for hand-written SELECT statements.
//!
//! This is not a parser. It walks the statement once, skipping quoted
//! literals, quoted identifiers, comments and parenthesized groups, and
//! records the byte span of every word at nesting depth 0. Keyword lookups
//! then only ever see the outermost statement, so a `WHERE` or `LIMIT`
//! inside a subquery or a string literal is never mistaken for a splice
//! point.

/// Byte span of one depth-0 word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Word {
    pub(super) start: usize,
    pub(super) end: usize,
    /// End of the last code byte before the word. Whitespace and comments
    /// between the two are not code, so text spliced here stays out of them.
    pub(super) before: usize,
}

/// Depth-0 words of a statement plus the end of its last code byte.
#[derive(Debug)]
pub(super) struct Scan<'a> {
    sql: &'a str,
    words: Vec<Word>,
    code_end: usize,
}

impl<'a> Scan<'a> {
    pub(super) fn new(sql: &'a str) -> Self {
        let bytes = sql.as_bytes();
        let len = bytes.len();
        let mut words = Vec::new();
        let mut depth = 0usize;
        let mut code_end = 0usize;
        let mut i = 0usize;

        while i < len {
            let b = bytes[i];
            let next = bytes.get(i + 1).copied();
            match b {
                b'\'' | b'"' | b'`' => {
                    i = skip_quoted(bytes, i, b);
                    code_end = i;
                },
                b'-' if next == Some(b'-') => {
                    while i < len && bytes[i] != b'\n' {
                        i += 1;
                    }
                },
                b'/' if next == Some(b'*') => {
                    i += 2;
                    while i < len && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                        i += 1;
                    }
                    i = (i + 2).min(len);
                },
                b'(' => {
                    depth += 1;
                    i += 1;
                    code_end = i;
                },
                b')' => {
                    depth = depth.saturating_sub(1);
                    i += 1;
                    code_end = i;
                },
                // Statement terminator is not part of the statement
                b';' if depth == 0 => i += 1,
                b if is_word_byte(b) => {
                    let start = i;
                    let before = code_end;
                    while i < len && is_word_byte(bytes[i]) {
                        i += 1;
                    }
                    let qualified = start > 0 && bytes[start - 1] == b'.';
                    if depth == 0 && !qualified {
                        words.push(Word {
                            start,
                            end: i,
                            before,
                        });
                    }
                    code_end = i;
                },
                b if b.is_ascii_whitespace() => i += 1,
                _ => {
                    i += 1;
                    code_end = i;
                },
            }
        }

        Self {
            sql,
            words,
            code_end,
        }
    }

    /// Byte offset just past the last code byte, ignoring trailing
    /// whitespace, comments and semicolons.
    pub(super) const fn code_end(&self) -> usize {
        self.code_end
    }

    /// Whether `word` spells `keyword`, ignoring ASCII case.
    pub(super) fn is(&self, word: Word, keyword: &str) -> bool {
        self.sql
            .get(word.start..word.end)
            .is_some_and(|text| text.eq_ignore_ascii_case(keyword))
    }

    /// Depth-0 words starting at or after `after` and before `before`.
    pub(super) fn words_between(
        &self,
        after: usize,
        before: usize,
    ) -> impl Iterator<Item = Word> + '_ {
        self.words
            .iter()
            .copied()
            .filter(move |w| w.start >= after && w.end <= before)
    }

    /// First occurrence of `keyword` starting at or after `after`.
    pub(super) fn first(&self, keyword: &str, after: usize) -> Option<Word> {
        self.words
            .iter()
            .copied()
            .find(|w| w.start >= after && self.is(*w, keyword))
    }

    /// First occurrence of the two-word keyword `first second`
    /// (e.g. `GROUP BY`) starting at or after `after`.
    pub(super) fn first_pair(&self, first: &str, second: &str, after: usize) -> Option<(Word, Word)> {
        self.words
            .windows(2)
            .find_map(|pair| self.pair_at(pair, first, second, after))
    }

    /// Last occurrence of the two-word keyword `first second`.
    pub(super) fn last_pair(&self, first: &str, second: &str, after: usize) -> Option<(Word, Word)> {
        self.words
            .windows(2)
            .rev()
            .find_map(|pair| self.pair_at(pair, first, second, after))
    }

    fn pair_at(&self, pair: &[Word], first: &str, second: &str, after: usize) -> Option<(Word, Word)> {
        match *pair {
            [a, b] if a.start >= after && self.is(a, first) && self.is(b, second) => Some((a, b)),
            _ => None,
        }
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || !b.is_ascii()
}

/// Skip a quoted run starting at `start`. A doubled quote is an escaped quote.
/// Returns the offset just past the closing quote, or the end of input.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}
