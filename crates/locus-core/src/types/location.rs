//! Source-location and instruction-offset types.

use std::fmt;

/// Line number compilers emit for instructions with no meaningful source
/// mapping (compiler-generated code).
pub const HIDDEN_LINE: u32 = 0x00fe_efee;

/// Metadata token identifying a method definition inside one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodToken(u32);

impl MethodToken
{
    /// Wrap a raw metadata token.
    pub const fn new(raw: u32) -> Self
    {
        Self(raw)
    }

    /// Raw token value.
    pub const fn raw(self) -> u32
    {
        self.0
    }
}

impl From<u32> for MethodToken
{
    fn from(raw: u32) -> Self
    {
        Self(raw)
    }
}

impl fmt::Display for MethodToken
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Provider-supplied record associating an IL offset with a source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePoint
{
    /// Method-relative IL offset where this point starts.
    pub offset: i32,
    /// First source line covered.
    pub start_line: u32,
    /// Last source line covered.
    pub end_line: u32,
    /// First column covered.
    pub start_column: u32,
    /// Column just past the covered range.
    pub end_column: u32,
    /// Source document path.
    pub document: String,
}

impl SequencePoint
{
    /// Single-line point with unknown columns.
    pub fn new(offset: i32, line: u32, document: impl Into<String>) -> Self
    {
        Self {
            offset,
            start_line: line,
            end_line: line,
            start_column: 0,
            end_column: 0,
            document: document.into(),
        }
    }

    #[must_use]
    pub fn with_columns(mut self, start_column: u32, end_column: u32) -> Self
    {
        self.start_column = start_column;
        self.end_column = end_column;
        self
    }

    /// Whether this point marks compiler-generated code.
    pub fn is_hidden(&self) -> bool
    {
        self.start_line == HIDDEN_LINE
    }
}

/// Half-open, method-relative IL interval treated as one source line while
/// single-stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRange
{
    pub start_offset: u32,
    pub end_offset: u32,
}

impl StepRange
{
    pub const fn new(start_offset: u32, end_offset: u32) -> Self
    {
        Self {
            start_offset,
            end_offset,
        }
    }

    /// `true` when the provider could not narrow the range at all.
    pub const fn is_empty(self) -> bool
    {
        self.start_offset == self.end_offset
    }

    pub const fn contains(self, offset: u32) -> bool
    {
        offset >= self.start_offset && offset < self.end_offset
    }
}

/// How precisely a native instruction pointer mapped back to an IL offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingQuality
{
    /// The IP sits exactly on an IL instruction boundary.
    Exact,
    /// The IP is inside the code generated for an IL instruction.
    Approximate,
    /// The IP is in the method prolog.
    Prolog,
    /// The IP is in the method epilog.
    Epilog,
    /// The runtime had no mapping; the offset is a guess.
    Unmapped,
}
