//! File-extension to language-id mapping.
//!
//! Language ids are the semantic labels handed to the editor component when
//! a buffer is created; they are re-derived whenever a file is created or
//! renamed, so they never need to be persisted authoritatively.

/// Fallback language id for unknown extensions.
pub const PLAIN_TEXT: &str = "plaintext";

/// Derive a language id from a file name.
pub fn language_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "rs" => "rust",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "ts" => "typescript",
        "tsx" => "typescriptreact",
        "py" => "python",
        "rb" => "ruby",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "php" => "php",
        "lua" => "lua",
        "sh" | "bash" => "shellscript",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" => "scss",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "xml" => "xml",
        "sql" => "sql",
        "md" | "markdown" => "markdown",
        _ => PLAIN_TEXT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(language_for("main.rs"), "rust");
        assert_eq!(language_for("app.TSX"), "typescriptreact");
        assert_eq!(language_for("index.html"), "html");
        assert_eq!(language_for("notes.md"), "markdown");
    }

    #[test]
    fn test_unknown_or_missing_extension_is_plain_text() {
        assert_eq!(language_for("Makefile"), PLAIN_TEXT);
        assert_eq!(language_for("data.xyz"), PLAIN_TEXT);
        assert_eq!(language_for(""), PLAIN_TEXT);
    }
}
