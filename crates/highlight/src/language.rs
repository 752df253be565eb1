use std::path::Path;

/// Languages with a loaded grammar.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "tsx",
    "html",
    "css",
    "php",
    "json",
    "bash",
    "markdown",
    "rust",
    "c",
    "cpp",
    "java",
    "go",
    "ruby",
    "toml",
    "yaml",
];

/// Detect language from file extension.
pub fn detect_language(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;

    match ext.to_lowercase().as_str() {
        "py" | "pyw" => Some("python"),
        "js" | "mjs" | "cjs" | "jsx" => Some("javascript"),
        "ts" | "mts" | "cts" => Some("typescript"),
        "tsx" => Some("tsx"),
        "html" | "htm" => Some("html"),
        "css" => Some("css"),
        "php" => Some("php"),
        "json" => Some("json"),
        "sh" | "bash" => Some("bash"),
        "md" | "markdown" => Some("markdown"),
        "rs" => Some("rust"),
        "c" | "h" => Some("c"),
        "cpp" | "cc" | "cxx" | "hpp" => Some("cpp"),
        "java" => Some("java"),
        "go" => Some("go"),
        "rb" => Some("ruby"),
        "toml" => Some("toml"),
        "yaml" | "yml" => Some("yaml"),
        _ => None,
    }
}

/// Resolve a short language alias (as typed by the user or stored in a
/// session). Unknown aliases mean plain text.
pub fn language_from_alias(alias: &str) -> Option<&'static str> {
    match alias.to_lowercase().as_str() {
        "js" | "javascript" => Some("javascript"),
        "py" | "python" => Some("python"),
        "html" | "htm" => Some("html"),
        "php" => Some("php"),
        "css" => Some("css"),
        other => SUPPORTED_LANGUAGES.iter().copied().find(|l| *l == other),
    }
}

/// Label for the status bar.
pub fn display_name(language: Option<&str>) -> String {
    language.unwrap_or("text").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions() {
        assert_eq!(detect_language(Path::new("app.PY")), Some("python"));
        assert_eq!(detect_language(Path::new("index.htm")), Some("html"));
        assert_eq!(detect_language(Path::new("notes.txt")), None);
        assert_eq!(detect_language(Path::new("Makefile")), None);
    }

    #[test]
    fn aliases() {
        assert_eq!(language_from_alias("js"), Some("javascript"));
        assert_eq!(language_from_alias("py"), Some("python"));
        assert_eq!(language_from_alias("rust"), Some("rust"));
        assert_eq!(language_from_alias("cobol"), None);
    }

    #[test]
    fn status_label() {
        assert_eq!(display_name(Some("python")), "PYTHON");
        assert_eq!(display_name(None), "TEXT");
    }
}
