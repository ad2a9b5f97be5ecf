// ABOUTME: Source location tracking for tokens, parsed values, and diagnostics

use std::rc::Rc;

/// A location in a source file: row and column are 1-based, `len` is a byte count.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLoc {
    pub file: Rc<str>,
    pub row: usize,
    pub col: usize,
    pub len: usize,
}

impl SourceLoc {
    pub fn new(file: Rc<str>, row: usize, col: usize, len: usize) -> Self {
        SourceLoc { file, row, col, len }
    }

    /// Synthesize a location spanning a sequence of located values, using the first
    /// value's file/row/col and the sum of every participating length.
    pub fn from_range<'a, I>(locs: I) -> Option<SourceLoc>
    where
        I: IntoIterator<Item = &'a Option<SourceLoc>>,
    {
        let mut file: Option<Rc<str>> = None;
        let mut row = 0;
        let mut col = 0;
        let mut len = 0;
        for loc in locs.into_iter().flatten() {
            len += loc.len;
            if file.is_none() {
                file = Some(loc.file.clone());
                row = loc.row;
                col = loc.col;
            }
        }
        file.map(|file| SourceLoc { file, row, col, len })
    }
}

impl std::fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.row, self.col)
    }
}
