//! Strategy-driven conflict resolution.
//!
//! Every complete block collapses to the side picked by the [`Strategy`];
//! the other side, the diff3 base section and the three marker lines are
//! dropped. Everything else, line terminators included, is copied through
//! unchanged, so a document without conflict blocks comes back identical.

use crate::parser::{self, Segment};
use crate::types::{ConflictRegion, Strategy};

/// Collapse every conflict block in `text` to the side chosen by `strategy`.
pub fn resolve(text: &str, strategy: Strategy) -> String {
    let mut out = String::with_capacity(text.len());

    for segment in parser::parse(text) {
        match segment {
            Segment::Line(line) => out.push_str(line),
            Segment::Block(block) => {
                for line in block.side(strategy) {
                    out.push_str(line);
                }
                // The end marker was the unterminated last line; keep the
                // document without a trailing newline.
                if !block.end_terminated {
                    trim_line_ending(&mut out);
                }
            }
        }
    }

    out
}

/// Locate every complete conflict block in `text`.
pub fn scan(text: &str) -> Vec<ConflictRegion> {
    parser::parse(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Block(block) => Some(ConflictRegion {
                start_line: block.start + 1,
                end_line: block.end + 1,
                ours_lines: block.ours.len(),
                base_lines: block.base.len(),
                theirs_lines: block.theirs.len(),
            }),
            Segment::Line(_) => None,
        })
        .collect()
}

/// Whether `text` holds at least one complete conflict block.
pub fn has_conflicts(text: &str) -> bool {
    parser::parse(text)
        .iter()
        .any(|segment| matches!(segment, Segment::Block(_)))
}

fn trim_line_ending(out: &mut String) {
    if out.ends_with('\n') {
        out.pop();
        if out.ends_with('\r') {
            out.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "a\n<<<<<<< HEAD\nours1\nours2\n=======\ntheirs1\ntheirs2\n>>>>>>> feature\nz";

    #[test]
    fn test_resolve_ours() {
        assert_eq!(resolve(SAMPLE, Strategy::Ours), "a\nours1\nours2\nz");
    }

    #[test]
    fn test_resolve_theirs() {
        assert_eq!(resolve(SAMPLE, Strategy::Theirs), "a\ntheirs1\ntheirs2\nz");
    }

    #[test]
    fn test_no_markers_is_identity() {
        for input in ["hello\nworld", "hello\r\nworld\r\n", "", "\n\n"] {
            assert_eq!(resolve(input, Strategy::Ours), input);
            assert_eq!(resolve(input, Strategy::Theirs), input);
        }
    }

    #[test]
    fn test_multiple_blocks_resolve_independently() {
        let multi = [
            "a",
            "<<<<<<< HEAD",
            "x1",
            "=======",
            "y1",
            ">>>>>>> br",
            "b",
            "<<<<<<< HEAD",
            "x2",
            "=======",
            "y2",
            ">>>>>>> br",
            "c",
        ]
        .join("\n");
        assert_eq!(resolve(&multi, Strategy::Theirs), "a\ny1\nb\ny2\nc");
        assert_eq!(resolve(&multi, Strategy::Ours), "a\nx1\nb\nx2\nc");
    }

    #[test]
    fn test_crlf_endings_are_preserved() {
        let text = "a\r\n<<<<<<< HEAD\r\nx\r\n=======\r\ny\r\n>>>>>>> br\r\nz\r\n";
        assert_eq!(resolve(text, Strategy::Ours), "a\r\nx\r\nz\r\n");
    }

    #[test]
    fn test_block_at_end_without_newline() {
        let text = "a\n<<<<<<< HEAD\nx\n=======\ny\n>>>>>>> br";
        assert_eq!(resolve(text, Strategy::Theirs), "a\ny");

        let empty_side = "a\n<<<<<<< HEAD\n=======\ny\n>>>>>>> br";
        assert_eq!(resolve(empty_side, Strategy::Ours), "a");
    }

    #[test]
    fn test_diff3_base_is_dropped() {
        let text = "<<<<<<< LEFT\nl\n||||||| BASE\nb\n=======\nr\n>>>>>>> RIGHT\n";
        assert_eq!(resolve(text, Strategy::Ours), "l\n");
        assert_eq!(resolve(text, Strategy::Theirs), "r\n");
    }

    #[test]
    fn test_unterminated_block_passes_through() {
        let text = "a\n<<<<<<< HEAD\nx\n=======\ny\n";
        assert_eq!(resolve(text, Strategy::Ours), text);
        assert!(!has_conflicts(text));
    }

    #[test]
    fn test_scan_reports_regions() {
        let text = "a\n<<<<<<< HEAD\nx\n=======\ny\ny2\n>>>>>>> br\nb\n";
        let regions = scan(text);
        assert_eq!(
            regions,
            vec![ConflictRegion {
                start_line: 2,
                end_line: 7,
                ours_lines: 1,
                base_lines: 0,
                theirs_lines: 2,
            }]
        );
        assert_eq!(regions[0].line_count(), 6);
        assert!(has_conflicts(text));
        assert!(scan("plain\ntext\n").is_empty());
    }
}
