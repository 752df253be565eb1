/// Icon shown before an entry name.
pub fn icon_for(name: &str, is_dir: bool) -> &'static str {
    if is_dir {
        return "📁";
    }
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "py" => "🐍",
        "php" => "🐘",
        "html" => "🌐",
        "css" => "🎨",
        "js" => "📜",
        "json" => "🔧",
        "sql" => "🗄️",
        "md" => "📝",
        "c" | "cpp" => "🇨",
        "java" => "☕",
        "sh" => "💻",
        "png" | "jpg" | "gif" => "🖼️",
        "zip" => "📦",
        "rs" => "🦀",
        _ => "📄",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_by_extension() {
        assert_eq!(icon_for("main.PY", false), "🐍");
        assert_eq!(icon_for("lib.rs", false), "🦀");
        assert_eq!(icon_for("src", true), "📁");
        assert_eq!(icon_for("Makefile", false), "📄");
        assert_eq!(icon_for("archive.tar.zip", false), "📦");
    }
}
