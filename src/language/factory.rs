use std::path::Path;

use crate::language::grammars::{
    BashLanguage, CLanguage, CSharpLanguage, CppLanguage, CssLanguage, GoLanguage, HtmlLanguage,
    JavaLanguage, JavaScriptLanguage, JsonLanguage, MarkdownLanguage, PhpLanguage,
    PythonLanguage, RubyLanguage, RustLanguage, SwiftLanguage, TomlLanguage, TsxLanguage,
    TypeScriptLanguage, YamlLanguage,
};
use crate::language::language_trait::LanguageImpl;

/// Every file extension (without the leading dot) that maps to a bundled grammar.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "rs", "py", "pyi", "js", "jsx", "mjs", "cjs", "ts", "tsx", "go", "c", "h", "cc", "cpp", "cxx",
    "hh", "hpp", "hxx", "java", "rb", "php", "swift", "cs", "html", "htm", "md", "markdown",
    "yaml", "yml", "sh", "bash", "zsh", "json", "css", "toml",
];

/// Whole file names recognised before the extension is looked at, paired with
/// the extension whose grammar parses them.
pub const SUPPORTED_FILENAMES: &[(&str, &str)] = &[
    // Make recipes are shell lines; close enough for scope detection
    ("Makefile", "sh"),
    ("makefile", "sh"),
    ("GNUmakefile", "sh"),
    (".bashrc", "sh"),
    (".bash_profile", "sh"),
    (".profile", "sh"),
    (".zshrc", "zsh"),
    ("Cargo.lock", "toml"),
    ("Pipfile", "toml"),
];

/// Factory function to get the appropriate language implementation based on file extension
pub fn get_language_impl(extension: &str) -> Option<Box<dyn LanguageImpl>> {
    match extension {
        "rs" => Some(Box::new(RustLanguage::new())),
        "py" | "pyi" => Some(Box::new(PythonLanguage::new())),
        "js" | "jsx" | "mjs" | "cjs" => Some(Box::new(JavaScriptLanguage::new())),
        "ts" => Some(Box::new(TypeScriptLanguage::new())),
        "tsx" => Some(Box::new(TsxLanguage::new())),
        "go" => Some(Box::new(GoLanguage::new())),
        "c" | "h" => Some(Box::new(CLanguage::new())),
        "cc" | "cpp" | "cxx" | "hh" | "hpp" | "hxx" => Some(Box::new(CppLanguage::new())),
        "java" => Some(Box::new(JavaLanguage::new())),
        "rb" => Some(Box::new(RubyLanguage::new())),
        "php" => Some(Box::new(PhpLanguage::new())),
        "swift" => Some(Box::new(SwiftLanguage::new())),
        "cs" => Some(Box::new(CSharpLanguage::new())),
        "html" | "htm" => Some(Box::new(HtmlLanguage::new())),
        "md" | "markdown" => Some(Box::new(MarkdownLanguage::new())),
        "yaml" | "yml" => Some(Box::new(YamlLanguage::new())),
        "sh" | "bash" | "zsh" => Some(Box::new(BashLanguage::new())),
        "json" => Some(Box::new(JsonLanguage::new())),
        "css" => Some(Box::new(CssLanguage::new())),
        "toml" => Some(Box::new(TomlLanguage::new())),
        _ => None,
    }
}

/// Returns the pool key (a supported extension) for a path, if its grammar is bundled.
///
/// The full file name is consulted first, so `Makefile` or `.bashrc` resolve
/// even without an extension. Matching is case sensitive: `Foo.RS` is not
/// treated as Rust.
pub fn language_key_for_path(path: &Path) -> Option<&'static str> {
    if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
        if let Some(&(_, key)) = SUPPORTED_FILENAMES.iter().find(|(file, _)| *file == name) {
            return Some(key);
        }
    }

    let extension = path.extension()?.to_str()?;
    SUPPORTED_EXTENSIONS
        .iter()
        .copied()
        .find(|supported| *supported == extension)
}

/// Grammar name for a path, e.g. `"python"` for `lib/app.py`.
pub fn filename_to_language(path: &Path) -> Option<&'static str> {
    let key = language_key_for_path(path)?;
    get_language_impl(key).map(|language| language.name())
}

/// The table printed by `--languages`: `.ext` and whole file names with their
/// grammar, sorted by key.
pub fn supported_languages() -> Vec<(String, &'static str)> {
    let extensions = SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| (format!(".{ext}"), *ext));
    let filenames = SUPPORTED_FILENAMES
        .iter()
        .map(|(file, ext)| (file.to_string(), *ext));

    let mut table: Vec<_> = extensions
        .chain(filenames)
        .filter_map(|(key, ext)| get_language_impl(ext).map(|language| (key, language.name())))
        .collect();
    table.sort_unstable();
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_every_supported_extension_has_a_grammar() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(get_language_impl(ext).is_some(), "no grammar for .{ext}");
        }
        for (_, ext) in SUPPORTED_FILENAMES {
            assert!(get_language_impl(ext).is_some(), "no grammar for .{ext}");
        }
        assert_eq!(
            supported_languages().len(),
            SUPPORTED_EXTENSIONS.len() + SUPPORTED_FILENAMES.len()
        );
    }

    #[test]
    fn test_filename_to_language() {
        assert_eq!(
            filename_to_language(&PathBuf::from("src/main.rs")),
            Some("rust")
        );
        assert_eq!(
            filename_to_language(&PathBuf::from("pkg/app.tsx")),
            Some("tsx")
        );
        assert_eq!(
            filename_to_language(&PathBuf::from("include/vec.hpp")),
            Some("cpp")
        );
        assert_eq!(filename_to_language(&PathBuf::from("notes.txt")), None);
        assert_eq!(filename_to_language(&PathBuf::from("LIB.RS")), None);
        assert_eq!(filename_to_language(&PathBuf::from("README")), None);
    }

    #[test]
    fn test_file_name_is_checked_before_extension() {
        assert_eq!(filename_to_language(&PathBuf::from("Makefile")), Some("bash"));
        assert_eq!(
            filename_to_language(&PathBuf::from("home/user/.bashrc")),
            Some("bash")
        );
        // "lock" is no supported extension, the file name decides
        assert_eq!(
            language_key_for_path(&PathBuf::from("project/Cargo.lock")),
            Some("toml")
        );
        assert_eq!(filename_to_language(&PathBuf::from("build.Makefile")), None);
    }

    #[test]
    fn test_added_grammars() {
        assert_eq!(filename_to_language(&PathBuf::from("deploy.sh")), Some("bash"));
        assert_eq!(filename_to_language(&PathBuf::from("package.json")), Some("json"));
        assert_eq!(filename_to_language(&PathBuf::from("site.css")), Some("css"));
        assert_eq!(filename_to_language(&PathBuf::from("Cargo.toml")), Some("toml"));
    }

    #[test]
    fn test_supported_languages_sorted() {
        let table = supported_languages();
        let mut sorted = table.clone();
        sorted.sort();
        assert_eq!(table, sorted);
        assert!(table.contains(&(".py".to_string(), "python")));
        assert!(table.contains(&("Makefile".to_string(), "bash")));
    }
}
