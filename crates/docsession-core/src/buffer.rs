use serde::{Deserialize, Serialize};

/// Id of the sentinel document a fresh session starts with.
pub const WELCOME_ID: &str = "welcome";

const WELCOME_PATH: &str = "WELCOME.md";
const WELCOME_TEXT: &str = "# Welcome\n\nOpen a file or start a new buffer to get going.\n";

/// A document opened in the session.
///
/// Fields are only mutated by the session through the store; everything
/// outside the crate reads them through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub(crate) id: String,
    pub(crate) path: String,
    pub(crate) language: String,
    pub(crate) content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) saved_content: Option<String>,
}

impl Buffer {
    /// A buffer freshly loaded from `path`: id is the path and the loaded
    /// text counts as saved.
    pub fn loaded(path: &str, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: path.to_string(),
            path: path.to_string(),
            language: guess_language(path).to_string(),
            content: text.clone(),
            saved_content: Some(text),
        }
    }

    /// An empty, clean buffer named `name`.
    pub fn empty(name: &str) -> Self {
        Self::loaded(name, String::new())
    }

    pub fn welcome() -> Self {
        Self {
            id: WELCOME_ID.to_string(),
            path: WELCOME_PATH.to_string(),
            language: guess_language(WELCOME_PATH).to_string(),
            content: WELCOME_TEXT.to_string(),
            saved_content: Some(WELCOME_TEXT.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn saved_content(&self) -> Option<&str> {
        self.saved_content.as_deref()
    }

    /// Content differs from the last saved snapshot (a never-saved buffer
    /// compares against the empty string).
    pub fn is_dirty(&self) -> bool {
        self.content != self.saved_content.as_deref().unwrap_or("")
    }

    pub(crate) fn mark_saved(&mut self) {
        self.saved_content = Some(self.content.clone());
    }
}

/// Free-function form of [`Buffer::is_dirty`].
pub fn is_dirty(buffer: &Buffer) -> bool {
    buffer.is_dirty()
}

/// Syntax tag for a path, from its extension.
pub fn guess_language(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "json" => "json",
        "md" | "markdown" => "markdown",
        "css" => "css",
        "html" | "htm" => "html",
        "rs" => "rust",
        "py" => "python",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        _ => "plaintext",
    }
}
