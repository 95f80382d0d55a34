// Heavily inspired and referenced from `rustc_lexer` and adapted to suit the project.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

/// Forward-only view over the source text.
pub struct Cursor<'a> {
    len_remaining: usize,
    /// Index that the cursor is pointing to in the source
    curr_pt: usize,
    /// 1-based line of `curr_pt`
    line: usize,
    chars: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Cursor<'a> {
        Cursor {
            len_remaining: input.len(),
            curr_pt: 0,
            line: 1,
            chars: input,
        }
    }

    /// Source is fully consumed
    pub fn is_eof(&self) -> bool {
        self.len_remaining == 0
    }

    /// Return slice of input starting at the current point of the cursor
    pub fn at_curr_pt(&self) -> &'a str {
        &self.chars[self.curr_pt..]
    }

    /// Character under the cursor, if any
    pub fn first(&self) -> Option<char> {
        self.at_curr_pt().chars().next()
    }

    /// Move cursor ahead in the input by given amount, counting line breaks passed over
    pub fn advance(&mut self, amt: usize) {
        let passed = &self.chars[self.curr_pt..self.curr_pt + amt];
        self.line += passed.matches('\n').count();
        self.curr_pt += amt;
        self.len_remaining -= amt;
    }

    /// Returns current cursor position
    pub fn curr_pt(&self) -> usize {
        self.curr_pt
    }

    /// Returns current line number
    pub fn line(&self) -> usize {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::Cursor;

    #[test]
    fn counts_lines() {
        let mut cur = Cursor::new("ab\ncd\n\nef");
        cur.advance(3);
        assert_eq!(cur.line(), 2);
        assert_eq!(cur.first(), Some('c'));
        cur.advance(4);
        assert_eq!(cur.line(), 4);
        assert_eq!(cur.at_curr_pt(), "ef");
        cur.advance(2);
        assert!(cur.is_eof());
        assert_eq!(cur.first(), None);
    }
}
