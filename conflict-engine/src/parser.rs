//! Line scanner that splits a document into plain lines and conflict blocks.
//!
//! Lines are kept as slices of the input *including* their terminator, so
//! writing the segments back out reproduces the input byte for byte.
//!
//! A block that never reaches its end marker is not a conflict: its lines,
//! markers included, come back as plain lines. A start marker inside an open
//! block abandons the open block the same way and starts a new one.

use crate::types::{Strategy, BASE_MARKER, END_MARKER, SEPARATOR_MARKER, START_MARKER};

/// One piece of a scanned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A line outside any conflict block, terminator included.
    Line(&'a str),
    /// A complete conflict block.
    Block(ConflictBlock<'a>),
}

/// A complete conflict block. Side lines include their terminators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictBlock<'a> {
    /// 0-based line index of the start marker.
    pub start: usize,
    /// 0-based line index of the end marker.
    pub end: usize,
    pub ours: Vec<&'a str>,
    pub base: Vec<&'a str>,
    pub theirs: Vec<&'a str>,
    /// Whether the end marker line carried a line terminator.
    pub end_terminated: bool,
}

impl<'a> ConflictBlock<'a> {
    pub fn side(&self, strategy: Strategy) -> &[&'a str] {
        match strategy {
            Strategy::Ours => &self.ours,
            Strategy::Theirs => &self.theirs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Ours,
    Base,
    Theirs,
}

/// A block whose end marker has not been seen yet.
struct OpenBlock<'a> {
    start: usize,
    raw: Vec<&'a str>,
    section: Section,
    ours: Vec<&'a str>,
    base: Vec<&'a str>,
    theirs: Vec<&'a str>,
}

impl<'a> OpenBlock<'a> {
    fn new(start: usize, marker_line: &'a str) -> Self {
        Self {
            start,
            raw: vec![marker_line],
            section: Section::Ours,
            ours: Vec::new(),
            base: Vec::new(),
            theirs: Vec::new(),
        }
    }

    fn push(&mut self, line: &'a str) {
        match self.section {
            Section::Ours => self.ours.push(line),
            Section::Base => self.base.push(line),
            Section::Theirs => self.theirs.push(line),
        }
    }

    fn finish(self, end: usize, marker_line: &str) -> ConflictBlock<'a> {
        ConflictBlock {
            start: self.start,
            end,
            ours: self.ours,
            base: self.base,
            theirs: self.theirs,
            end_terminated: marker_line.ends_with('\n'),
        }
    }
}

/// Split `text` into plain lines and complete conflict blocks.
pub fn parse(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut open: Option<OpenBlock<'_>> = None;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let body = strip_line_ending(line);

        let Some(mut block) = open.take() else {
            if body.starts_with(START_MARKER) {
                open = Some(OpenBlock::new(idx, line));
            } else {
                segments.push(Segment::Line(line));
            }
            continue;
        };

        if body.starts_with(START_MARKER) {
            // Nested start: the open block was never closed.
            segments.extend(block.raw.into_iter().map(Segment::Line));
            open = Some(OpenBlock::new(idx, line));
            continue;
        }

        if body.starts_with(END_MARKER) {
            segments.push(Segment::Block(block.finish(idx, line)));
            continue;
        }

        block.raw.push(line);
        if body.starts_with(SEPARATOR_MARKER) {
            block.section = Section::Theirs;
        } else if body.starts_with(BASE_MARKER) && block.section == Section::Ours {
            block.section = Section::Base;
        } else {
            block.push(line);
        }
        open = Some(block);
    }

    if let Some(block) = open {
        segments.extend(block.raw.into_iter().map(Segment::Line));
    }

    segments
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
