// One zero-sized implementation of LanguageImpl per bundled tree-sitter grammar.

use super::language_trait::LanguageImpl;
use tree_sitter::Language as TSLanguage;

macro_rules! grammar {
    ($ty:ident, $name:literal, $language:expr) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $ty;

        impl $ty {
            pub fn new() -> Self {
                $ty
            }
        }

        impl LanguageImpl for $ty {
            fn get_tree_sitter_language(&self) -> TSLanguage {
                $language.into()
            }

            fn name(&self) -> &'static str {
                $name
            }
        }
    };
}

grammar!(RustLanguage, "rust", tree_sitter_rust::LANGUAGE);
grammar!(PythonLanguage, "python", tree_sitter_python::LANGUAGE);
grammar!(JavaScriptLanguage, "javascript", tree_sitter_javascript::LANGUAGE);
grammar!(
    TypeScriptLanguage,
    "typescript",
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT
);
grammar!(TsxLanguage, "tsx", tree_sitter_typescript::LANGUAGE_TSX);
grammar!(GoLanguage, "go", tree_sitter_go::LANGUAGE);
grammar!(CLanguage, "c", tree_sitter_c::LANGUAGE);
grammar!(CppLanguage, "cpp", tree_sitter_cpp::LANGUAGE);
grammar!(JavaLanguage, "java", tree_sitter_java::LANGUAGE);
grammar!(RubyLanguage, "ruby", tree_sitter_ruby::LANGUAGE);
grammar!(PhpLanguage, "php", tree_sitter_php::LANGUAGE_PHP);
grammar!(SwiftLanguage, "swift", tree_sitter_swift::LANGUAGE);
grammar!(CSharpLanguage, "c_sharp", tree_sitter_c_sharp::LANGUAGE);
grammar!(HtmlLanguage, "html", tree_sitter_html::LANGUAGE);
grammar!(MarkdownLanguage, "markdown", tree_sitter_md::LANGUAGE);
grammar!(YamlLanguage, "yaml", tree_sitter_yaml::language());
grammar!(BashLanguage, "bash", tree_sitter_bash::LANGUAGE);
grammar!(JsonLanguage, "json", tree_sitter_json::LANGUAGE);
grammar!(CssLanguage, "css", tree_sitter_css::LANGUAGE);
grammar!(TomlLanguage, "toml", tree_sitter_toml_ng::LANGUAGE);
