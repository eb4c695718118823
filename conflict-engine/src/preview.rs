//! Unified-diff preview of a resolution, shown before it is applied.

use similar::TextDiff;

use crate::resolver::resolve;
use crate::types::Strategy;

/// Render the change `resolve(text, strategy)` would make as a unified diff.
///
/// `name` labels both sides of the header (`a/<name>`, `b/<name>`). The
/// result is empty when resolution would not change anything.
pub fn preview(text: &str, strategy: Strategy, name: &str) -> String {
    let resolved = resolve(text, strategy);
    let diff = TextDiff::from_lines(text, resolved.as_str());
    let mut unified = diff.unified_diff();
    unified
        .context_radius(3)
        .header(&format!("a/{}", name), &format!("b/{}", name));
    unified.to_string()
}
