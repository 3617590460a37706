// Compiler error type.
//
// Every variant carries the 1-based line / 0-based byte-offset-from-line-start
// location required by the spec's "line <n>, offset <m>[ in <sourceName>]" wire
// format (§6). `Located` composes that suffix once so every `#[error(...)]`
// template below can just interpolate `{at}`.

use std::fmt;

/// A located point in the source being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 0-based byte offset from the start of `line`.
    pub column: usize,
}

impl Location {
    /// Computes the line/column of a byte offset into `input`.
    pub(crate) fn from_offset(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let mut line = 1;
        let mut line_start = 0;
        for (i, b) in input.as_bytes().iter().enumerate() {
            if i >= offset {
                break;
            }
            if *b == b'\n' {
                line += 1;
                line_start = i + 1;
            }
        }
        Location {
            line,
            column: offset - line_start,
        }
    }
}

/// A `Location` plus the optional `sourceName` from `§6`'s error wire format.
/// `Display` renders `"line <n>, offset <m>[ in <sourceName>]"` exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub location: Location,
    pub source_name: Option<String>,
}

impl Located {
    pub(crate) fn new(location: Location, source_name: Option<&str>) -> Self {
        Located {
            location,
            source_name: source_name.map(str::to_owned),
        }
    }
}

impl fmt::Display for Located {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, offset {}", self.location.line, self.location.column)?;
        if let Some(name) = &self.source_name {
            write!(f, " in {name}")?;
        }
        Ok(())
    }
}

/// Errors that can occur while compiling a stache-tagged HTML template.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Lex failure: unknown stache opener, unexpected token in an argument
    /// position, unclosed comment, unterminated bracketed path segment,
    /// missing `}}`/`}}}`, missing whitespace between arguments.
    #[error("{message}, {at}")]
    Lex { message: String, at: Located },

    /// `{{else}}` or `{{/x}}` encountered outside of a block.
    #[error("{message}, {at}")]
    UnexpectedTag { message: String, at: Located },

    /// A block's open and close tag paths stringify differently.
    //
    // REDESIGN FLAG R1: the distilled source concatenates
    // `'... found ' + + blockName2` (double `+`), coercing the close-tag name
    // to `NaN`. We emit the actual name instead (single concatenation).
    #[error("Block close does not match block open: {opened} found {closed}, {at}")]
    BlockMismatch {
        opened: String,
        closed: String,
        at: Located,
    },

    /// A block was opened but the input ended before a matching close tag.
    #[error("Unclosed block: {opened}, {at}")]
    UnclosedBlock { opened: String, at: Located },

    /// An `INCLUSION` tag had more than one positional argument.
    #[error("Only one positional argument is allowed here, {at}")]
    TooManyPositionalArgs { at: Located },

    /// An internal invariant was violated (a bug in this crate, not in the
    /// input template): `EmitCode` reaching the HTML materializer, or a
    /// function value reaching the code emitter.
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

pub(crate) type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_from_offset_first_line() {
        let loc = Location::from_offset("hello world", 6);
        assert_eq!(loc, Location { line: 1, column: 6 });
    }

    #[test]
    fn location_from_offset_second_line() {
        let loc = Location::from_offset("foo\nbar baz", 8);
        assert_eq!(loc, Location { line: 2, column: 4 });
    }

    #[test]
    fn display_includes_source_name() {
        let err = CompileError::Lex {
            message: "Unknown stache tag".into(),
            at: Located::new(Location { line: 1, column: 3 }, Some("tmpl.html")),
        };
        assert_eq!(
            err.to_string(),
            "Unknown stache tag, line 1, offset 3 in tmpl.html"
        );
    }

    #[test]
    fn block_mismatch_never_emits_nan() {
        let err = CompileError::BlockMismatch {
            opened: "a".into(),
            closed: "b".into(),
            at: Located::new(Location { line: 1, column: 0 }, None),
        };
        let msg = err.to_string();
        assert!(!msg.contains("NaN"));
        assert!(msg.contains("a found b"));
    }
}
