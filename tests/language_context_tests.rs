use grep_ast::language::{filename_to_language, get_pooled_parser, return_pooled_parser};
use grep_ast::{ContextOptions, TreeContext};
use regex::Regex;
use std::path::Path;

fn excerpt(file_name: &str, source: &str, pattern: &str) -> String {
    let mut context =
        TreeContext::from_source(Path::new(file_name), source, ContextOptions::default())
            .unwrap_or_else(|e| panic!("{file_name} should be supported: {e}"));
    let matches = context.grep(&Regex::new(pattern).unwrap());
    assert!(!matches.is_empty(), "no match for {pattern} in {file_name}");
    context.add_lines_of_interest(matches);
    context.add_context();
    context.render().expect("something to show")
}

#[test]
fn test_rust_method_keeps_impl_header() {
    let mut source = String::from("struct Counter {\n    count: u32,\n}\n\nimpl Counter {\n");
    for i in 0..12 {
        source.push_str(&format!("    fn helper_{i}(&self) -> u32 {{\n        self.count + {i}\n    }}\n\n"));
    }
    source.push_str("    fn bump(&mut self) {\n        self.count += 1;\n    }\n}\n");

    let output = excerpt("counter.rs", &source, r"count \+= 1");

    assert!(output.contains("│impl Counter {\n"));
    assert!(output.contains("│    fn bump(&mut self) {\n"));
    assert!(output.contains("█        self.count += 1;\n"));
    assert!(output.contains("⋮...\n"));
}

#[test]
fn test_javascript_callback_context() {
    let source = "const express = require('express');\nconst app = express();\n\n\n\napp.get('/', (req, res) => {\n  const user = req.query.user;\n  res.send(`hello ${user}`);\n});\n\napp.listen(3000);\n";

    let output = excerpt("server.js", source, "res.send");

    assert!(output.contains("│app.get('/', (req, res) => {\n"));
    assert!(output.contains("█  res.send(`hello ${user}`);\n"));
}

#[test]
fn test_go_function_context() {
    let source = "package main\n\nimport \"fmt\"\n\n\n\nfunc greet(name string) string {\n\tmessage := fmt.Sprintf(\"hi %s\", name)\n\treturn message\n}\n\nfunc main() {\n\tfmt.Println(greet(\"go\"))\n}\n";

    let output = excerpt("main.go", source, "Sprintf");

    assert!(output.contains("│func greet(name string) string {\n"));
    assert!(output.contains("█\tmessage := fmt.Sprintf(\"hi %s\", name)\n"));
}

#[test]
fn test_filename_to_language() {
    assert_eq!(filename_to_language(Path::new("src/lib.rs")), Some("rust"));
    assert_eq!(filename_to_language(Path::new("app/view.tsx")), Some("tsx"));
    assert_eq!(filename_to_language(Path::new("notes.txt")), None);
    assert_eq!(filename_to_language(Path::new("Makefile")), None);
}

#[test]
fn test_pooled_parser_round_trip() {
    let parser = get_pooled_parser("java").unwrap();
    assert!(parser.language().is_some());
    return_pooled_parser("java", parser);

    assert!(get_pooled_parser("txt").is_err());
}
