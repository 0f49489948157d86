//! bytedupe - find files with identical content.
//!
//! Entry point: dispatches the `find` and `correlate` subcommands and maps
//! outcomes to process exit codes.

use std::io::{self, IsTerminal};
use std::process;

use clap::Parser;

use bytedupe::actions;
use bytedupe::cli::{Cli, ColorMode, Commands, CorrelateArgs, FindArgs, PREFER_HELP};
use bytedupe::correlate::{correlate, CorrelateOptions};
use bytedupe::criteria::{Criteria, ParseError};
use bytedupe::error::ExitCode;
use bytedupe::find::{scan, FindOptions};
use bytedupe::logging;

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Find(args) => run_find(&args),
        Commands::Correlate(args) => run_correlate(&args),
    };

    process::exit(code.as_i32());
}

fn run_find(args: &FindArgs) -> ExitCode {
    logging::init_logging(args.verbose);

    if args.help_prefer {
        print!("{PREFER_HELP}");
        return ExitCode::Success;
    }

    if args.execute.is_some() || args.coalesce.is_some() {
        return run_report_actions(args);
    }

    if args.dry_run {
        log::warn!("-n/--dry-run has no effect without --execute or --coalesce");
    }

    if args.paths.is_empty() {
        log::error!("at least one PATH is required");
        return ExitCode::GeneralError;
    }

    let min_size = if args.zero {
        if args.min_size.is_some() {
            log::error!(
                "conflicting arguments: --zero implies --min-size 0, but --min-size was also given"
            );
            return ExitCode::GeneralError;
        }
        0
    } else {
        args.min_size.unwrap_or(1)
    };

    let criteria = match args.prefer.as_deref() {
        Some(text) => match Criteria::parse(text) {
            Ok(criteria) => Some(criteria),
            Err(error) => {
                log::error!("cannot parse --prefer criteria: {error}");
                highlight_criteria_error(text, &error);
                return ExitCode::GeneralError;
            }
        },
        None => None,
    };

    let options = FindOptions {
        paths: args.paths.clone(),
        recurse: args.recurse,
        include_symlinks: args.symlinks,
        detect_aliases: args.aliases,
        only_mixed_roots: args.only_mixed_roots,
        min_size,
        max_memory: args.max_memory,
        max_buffer: args.max_buffer,
        exclude_names: args.exclude.clone(),
        criteria,
        show_progress: args.progress,
        log_time: args.time,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match scan(&options, &mut out) {
        Ok(summary) => {
            log::debug!(
                "scan complete: files={} groups={} errors={}",
                summary.files_seen,
                summary.groups_written,
                summary.errors
            );
            ExitCode::Success
        }
        Err(error) => {
            log::error!("{error:#}");
            ExitCode::GeneralError
        }
    }
}

fn run_report_actions(args: &FindArgs) -> ExitCode {
    // Report execution replays past decisions; scan options make no sense
    // alongside it.
    let scan_options_given = !args.paths.is_empty()
        || args.symlinks
        || args.zero
        || args.aliases
        || args.recurse
        || args.only_mixed_roots
        || args.min_size.is_some()
        || !args.exclude.is_empty()
        || args.prefer.is_some()
        || args.time
        || args.progress;
    if scan_options_given {
        log::error!("only -n/--dry-run can accompany --execute or --coalesce");
        return ExitCode::GeneralError;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match (&args.execute, &args.coalesce) {
        (Some(report), _) => actions::execute_report(report, args.dry_run, &mut out),
        (None, Some(report)) => actions::coalesce_report(report, args.dry_run, &mut out),
        (None, None) => return ExitCode::GeneralError,
    };

    match result {
        Ok(stats) if stats.all_succeeded() => ExitCode::Success,
        Ok(stats) => {
            log::error!("{} action(s) failed", stats.failures);
            ExitCode::PartialFailure
        }
        Err(error) => {
            log::error!("{error:#}");
            ExitCode::GeneralError
        }
    }
}

fn run_correlate(args: &CorrelateArgs) -> ExitCode {
    logging::init_logging(args.verbose);

    let color = match args.colorize {
        ColorMode::On => true,
        ColorMode::Off => false,
        ColorMode::Auto => io::stdout().is_terminal(),
    };

    // With no section selected, report everything.
    let none_selected = !args.matches && !args.removes && !args.adds;

    let options = CorrelateOptions {
        left: args.dirs[0].clone(),
        right: args.dirs[1].clone(),
        show_matches: none_selected || args.matches,
        show_removes: none_selected || args.removes,
        show_adds: none_selected || args.adds,
        color,
        summary: !args.no_summary,
        max_memory: args.max_memory,
        max_buffer: args.max_buffer,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match correlate(&options, &mut out) {
        Ok(_) => ExitCode::Success,
        Err(error) => {
            log::error!("{error:#}");
            ExitCode::GeneralError
        }
    }
}

/// Echo the criteria string with the failing range underlined.
fn highlight_criteria_error(text: &str, error: &ParseError) {
    let Some(position) = error.position else {
        return;
    };
    eprintln!("{text}");
    let marker = match error.length {
        Some(length) if length > 1 => "~".repeat(length),
        _ => "^".to_string(),
    };
    eprintln!("{}{}", " ".repeat(position), marker);
}
