use anyhow::Result;
use clap::Parser as ClapParser;
use std::process::ExitCode;
use tracing::{debug, Level};

mod cli;

use cli::Args;
use grep_ast::config::{get_config, ResolvedConfig};
use grep_ast::grep::{handle_grep, GrepParams};
use grep_ast::language::factory::supported_languages;

fn init_logging(verbose: bool, config: &ResolvedConfig) {
    let log_level = if verbose {
        Level::DEBUG
    } else {
        config
            .defaults
            .log_level
            .parse::<Level>()
            .unwrap_or(Level::WARN)
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_languages() {
    for (key, language) in supported_languages() {
        println!("{key}: {language}");
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = get_config();
    init_logging(args.verbose, config);

    if let Ok(json) = config.to_json_string() {
        debug!("Resolved configuration:\n{json}");
    }

    if args.languages {
        print_languages();
        return Ok(ExitCode::SUCCESS);
    }

    let Some(pattern) = args.pattern.clone() else {
        println!("Please provide a pattern to search for");
        return Ok(ExitCode::from(1));
    };

    handle_grep(GrepParams {
        pattern,
        paths: args.paths.clone(),
        ignore_case: args.ignore_case || config.defaults.ignore_case,
        line_number: args.line_number || config.display.line_number,
        color: args.color_choice(&config.display.color),
        parent_context: !args.no_parent_context && config.context.parent_context,
        child_context: !args.no_child_context && config.context.child_context,
        verbose: args.verbose,
        ignore: args.ignore.clone(),
        no_gitignore: args.no_gitignore || config.defaults.no_gitignore,
        encoding: args
            .encoding
            .clone()
            .unwrap_or_else(|| config.defaults.encoding.clone()),
        tuning: config.context.tuning.clone(),
    })?;

    Ok(ExitCode::SUCCESS)
}
