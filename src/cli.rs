use clap::Parser as ClapParser;
use std::path::PathBuf;

#[derive(ClapParser, Debug)]
#[command(
    name = "grep-ast",
    author,
    version,
    about = "Grep source files and show each match inside the code structure around it",
    long_about = None
)]
pub struct Args {
    /// Regular expression to search for
    pub pattern: Option<String>,

    /// Files or directories to search
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Ignore case distinctions in the pattern
    #[arg(short = 'i', long = "ignore-case")]
    pub ignore_case: bool,

    /// Prefix each shown line with its line number
    #[arg(short = 'n', long = "line-number")]
    pub line_number: bool,

    /// Force colored output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// List the supported file extensions and exit
    #[arg(long = "languages")]
    pub languages: bool,

    /// Log the scope table and syntax tree of every searched file
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Do not show the headers of scopes enclosing a match
    #[arg(long = "no-parent-context")]
    pub no_parent_context: bool,

    /// Do not sample the body of scopes starting on a match
    #[arg(long = "no-child-context")]
    pub no_child_context: bool,

    /// Search files excluded by .gitignore
    #[arg(long = "no-gitignore")]
    pub no_gitignore: bool,

    /// Additional ignore file names to honor (can be specified multiple times)
    #[arg(long = "ignore")]
    pub ignore: Vec<String>,

    /// Encoding of the searched files [default: utf-8]
    #[arg(long = "encoding", value_name = "LABEL")]
    pub encoding: Option<String>,
}

impl Args {
    /// "always", "never" or `fallback` when neither flag was given.
    pub fn color_choice(&self, fallback: &str) -> String {
        if self.color {
            "always".to_string()
        } else if self.no_color {
            "never".to_string()
        } else {
            fallback.to_string()
        }
    }
}
