//! Detecção de linguagem por extensão de arquivo.

use std::path::Path;

/// Linguagem atribuída a arquivos sem extensão conhecida.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Curinga: um padrão com esta linguagem vale para qualquer arquivo.
pub const ANY_LANGUAGE: &str = "*";

const EXTENSIONS: &[(&str, &str)] = &[
    ("py", "python"),
    ("pyi", "python"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("mjs", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("rs", "rust"),
    ("go", "go"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("rb", "ruby"),
    ("php", "php"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("hpp", "cpp"),
    ("cs", "csharp"),
    ("swift", "swift"),
    ("scala", "scala"),
    ("sh", "bash"),
    ("md", "markdown"),
    ("rst", "rst"),
    ("html", "html"),
    ("css", "css"),
    ("json", "json"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("toml", "toml"),
    ("ini", "ini"),
    ("xml", "xml"),
    ("sql", "sql"),
];

/// Retorna a linguagem de um caminho pela extensão (ou `"unknown"`).
pub fn language_from_path(path: &str) -> &'static str {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| {
            EXTENSIONS
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, lang)| *lang)
        })
        .unwrap_or(UNKNOWN_LANGUAGE)
}

/// Verifica se um padrão de linguagem `pattern_language` se aplica a `file_language`.
pub fn language_applies(pattern_language: &str, file_language: &str) -> bool {
    pattern_language == ANY_LANGUAGE || pattern_language == file_language
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_path() {
        assert_eq!(language_from_path("src/models.py"), "python");
        assert_eq!(language_from_path("web/App.TSX"), "typescript");
        assert_eq!(language_from_path("main.rs"), "rust");
        assert_eq!(language_from_path("Makefile"), "unknown");
        assert_eq!(language_from_path("archive.tar.gz"), "unknown");
    }

    #[test]
    fn test_language_applies() {
        assert!(language_applies("*", "python"));
        assert!(language_applies("python", "python"));
        assert!(!language_applies("rust", "python"));
    }
}
