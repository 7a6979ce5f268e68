use anyhow::{Context, Result};
use encoding_rs::Encoding;
use ignore::WalkBuilder;
use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::TreeContextError;
use crate::language::{get_pool_stats, language_key_for_path};
use crate::tree_context::{ContextOptions, ContextTuning, TreeContext};

pub struct GrepParams {
    pub pattern: String,
    pub paths: Vec<PathBuf>,
    pub ignore_case: bool,
    pub line_number: bool,
    pub color: String,
    pub parent_context: bool,
    pub child_context: bool,
    pub verbose: bool,
    pub ignore: Vec<String>,
    pub no_gitignore: bool,
    /// Label of the source encoding, e.g. "utf-8" or "latin1"
    pub encoding: String,
    pub tuning: ContextTuning,
}

/// Configuration for grep operations
struct GrepConfig {
    regex: Regex,
    encoding: &'static Encoding,
    options: ContextOptions,
}

impl GrepConfig {
    fn from_params(params: &GrepParams) -> Result<Self> {
        let regex = RegexBuilder::new(&params.pattern)
            .case_insensitive(params.ignore_case)
            .build()
            .map_err(TreeContextError::from)
            .context("Failed to compile regex pattern")?;

        let encoding = Encoding::for_label(params.encoding.as_bytes())
            .ok_or_else(|| anyhow::anyhow!("Unknown encoding: {}", params.encoding))?;

        let use_color = match params.color.as_str() {
            "always" => true,
            "never" => false,
            _ => atty::is(atty::Stream::Stdout),
        };

        Ok(Self {
            regex,
            encoding,
            options: ContextOptions {
                color: use_color,
                line_number: params.line_number,
                parent_context: params.parent_context,
                child_context: params.child_context,
                verbose: params.verbose,
                tuning: params.tuning.clone(),
            },
        })
    }
}

/// Main entry point for grep functionality
pub fn handle_grep(params: GrepParams) -> Result<()> {
    let config = GrepConfig::from_params(&params)?;
    colored::control::set_override(config.options.color);

    let files = collect_files(&params.paths, &params.ignore, params.no_gitignore);
    debug!(
        "Searching {} file(s) for {:?} as {}",
        files.len(),
        params.pattern,
        config.encoding.name()
    );

    let show_filename = files.len() > 1;

    // Files are processed in parallel but printed in walk order
    let excerpts: Vec<(PathBuf, Option<String>)> = files
        .into_par_iter()
        .map(|path| {
            let excerpt = match grep_file(&path, &config.regex, config.encoding, &config.options) {
                Ok(excerpt) => excerpt,
                Err(e) => {
                    warn!("Skipping {}: {e:#}", path.display());
                    None
                }
            };
            (path, excerpt)
        })
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (path, excerpt) in excerpts {
        let Some(excerpt) = excerpt else {
            continue;
        };
        write_excerpt(&mut out, &path, &excerpt, show_filename)
            .context("Failed to write to stdout")?;
    }
    out.flush().context("Failed to flush stdout")?;

    debug!("Parser pool: {:?}", get_pool_stats());
    Ok(())
}

/// Searches one file and renders its excerpt.
///
/// Returns `Ok(None)` when nothing matched, when the file does not decode
/// cleanly in `encoding` or when no grammar is known for it.
pub fn grep_file(
    path: &Path,
    regex: &Regex,
    encoding: &'static Encoding,
    options: &ContextOptions,
) -> Result<Option<String>> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let Some(source) = encoding.decode_without_bom_handling_and_without_replacement(&bytes) else {
        debug!("Skipping {}: not valid {}", path.display(), encoding.name());
        return Ok(None);
    };

    let mut context = match TreeContext::from_source(path, &source, options.clone()) {
        Ok(context) => context,
        Err(TreeContextError::UnsupportedInput(reason)) => {
            debug!("Skipping {}: {reason}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let matches = context.grep(regex);
    if matches.is_empty() {
        return Ok(None);
    }

    context.add_lines_of_interest(matches);
    context.add_context();
    Ok(context.render())
}

fn write_excerpt(
    out: &mut impl Write,
    path: &Path,
    excerpt: &str,
    show_filename: bool,
) -> io::Result<()> {
    writeln!(out)?;
    if show_filename {
        writeln!(out, "{}:", path.display())?;
    }
    write!(out, "{excerpt}")?;
    writeln!(out)
}

/// Expands the search paths into the supported files beneath them, sorted
/// and without duplicates. Explicitly named files are kept even if ignored.
fn collect_files(paths: &[PathBuf], ignore_patterns: &[String], no_gitignore: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }

        let mut walked = Vec::new();
        for entry in build_walker(path, ignore_patterns, no_gitignore) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Walk error: {e}");
                    continue;
                }
            };

            // Skip directories
            if entry.file_type().is_none_or(|ft| ft.is_dir()) {
                continue;
            }

            if language_key_for_path(entry.path()).is_some() {
                walked.push(entry.into_path());
            }
        }
        walked.sort();
        files.extend(walked);
    }

    let mut seen = std::collections::HashSet::new();
    files.retain(|path| seen.insert(path.clone()));
    files
}

/// Build a file walker with the given parameters
fn build_walker(path: &Path, ignore_patterns: &[String], no_gitignore: bool) -> ignore::Walk {
    let mut walker_builder = WalkBuilder::new(path);
    walker_builder
        .hidden(false)
        .git_ignore(!no_gitignore)
        .git_global(!no_gitignore)
        .git_exclude(!no_gitignore)
        .require_git(false);

    for pattern in ignore_patterns {
        walker_builder.add_custom_ignore_filename(pattern);
    }

    walker_builder.build()
}
