// The shared scanner object described in §5: `pos`/`input`/`peek`/`rest`/
// `fatal`, reused sequentially by the fragment tokenizer and the stache
// callback it hands control to. Modeled as a `&mut Cursor` borrow passed
// down the call stack rather than shared/aliased state.

use crate::error::{CompileError, Located, Location};

pub(crate) struct Cursor<'a> {
    pub input: &'a str,
    pub pos: usize,
    pub source_name: Option<&'a str>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str, source_name: Option<&'a str>) -> Self {
        Cursor {
            input,
            pos: 0,
            source_name,
        }
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Builds a located, fatal `CompileError` at the cursor's current
    /// position (§4.2 "Fatal errors").
    pub fn fatal(&self, message: impl Into<String>) -> CompileError {
        CompileError::UnexpectedTag {
            message: message.into(),
            at: Located::new(Location::from_offset(self.input, self.pos), self.source_name),
        }
    }
}
