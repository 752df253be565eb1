//! Keyword database: language name -> keyword list, loaded from JSON.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

const EMBEDDED_KEYWORDS: &str = include_str!("../assets/keywords.json");

#[derive(Debug, Clone, Default)]
pub struct KeywordDb {
    languages: HashMap<String, Vec<String>>,
}

impl KeywordDb {
    /// The database compiled into the binary.
    pub fn embedded() -> Self {
        Self::from_json(EMBEDDED_KEYWORDS).unwrap_or_else(|e| {
            log::error!("Embedded keyword database is invalid: {}", e);
            Self::default()
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let languages: HashMap<String, Vec<String>> =
            serde_json::from_str(content).context("Invalid keyword database")?;
        Ok(Self { languages })
    }

    /// Use `path` if it exists and parses, the embedded database otherwise.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::embedded();
        }
        let loaded = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
            .and_then(|content| Self::from_json(&content));
        match loaded {
            Ok(db) => {
                log::info!("Loaded keyword database from {}", path.display());
                db
            }
            Err(e) => {
                log::warn!("{:#}; using built-in keywords", e);
                Self::embedded()
            }
        }
    }

    pub fn get(&self, language: &str) -> &[String] {
        self.languages
            .get(language)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Keywords offered while editing `language`.
    ///
    /// PHP files also get HTML tags; HTML files also get CSS and JavaScript.
    /// Python gets nothing here unless `include_python` is set, because its
    /// suggestions come from the semantic backend.
    pub fn base_keywords(&self, language: Option<&str>, include_python: bool) -> Vec<String> {
        let parts: Vec<&str> = match language {
            Some("php") => vec!["php", "html"],
            Some("html") => vec!["html", "css", "javascript"],
            Some("python") if !include_python => Vec::new(),
            Some(other) => vec![other],
            None => Vec::new(),
        };
        parts
            .into_iter()
            .flat_map(|lang| self.get(lang).iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_database_parses() {
        let db = KeywordDb::embedded();
        assert!(db.get("javascript").iter().any(|k| k == "function"));
        assert!(db.get("cobol").is_empty());
    }

    #[test]
    fn language_combinations() {
        let db = KeywordDb::from_json(
            r#"{"php": ["echo"], "html": ["div"], "css": ["color"], "javascript": ["let"], "python": ["def"]}"#,
        )
        .unwrap();

        assert_eq!(db.base_keywords(Some("php"), false), vec!["echo", "div"]);
        assert_eq!(
            db.base_keywords(Some("html"), false),
            vec!["div", "color", "let"]
        );
        assert!(db.base_keywords(Some("python"), false).is_empty());
        assert_eq!(db.base_keywords(Some("python"), true), vec!["def"]);
        assert_eq!(db.base_keywords(Some("css"), false), vec!["color"]);
        assert!(db.base_keywords(None, false).is_empty());
    }

    #[test]
    fn override_file_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");

        std::fs::write(&path, r#"{"javascript": ["only"]}"#).unwrap();
        assert_eq!(KeywordDb::load(&path).get("javascript"), &["only".to_string()]);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(KeywordDb::load(&path).get("javascript").len() > 1);

        let missing = dir.path().join("absent.json");
        assert!(!KeywordDb::load(&missing).get("css").is_empty());
    }
}
