//! `collect` command implementation.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Result, bail};

use crate::cli::CollectArgs;
use crate::collect::{Action, CollectOptions, Collector};
use crate::config::StaticConfig;
use crate::ignore::effective_patterns;
use crate::storage::DestinationStorage;
use crate::{debug, log};

pub fn run_collect(args: &CollectArgs, config: &StaticConfig) -> Result<()> {
    let options = CollectOptions {
        dry_run: args.dry_run,
        link: args.link,
        skip_dirs: args.skip_dirs,
        ignore_patterns: effective_patterns(
            config.ignore.defaults && !args.no_default_ignored,
            &config.ignore.patterns,
            &args.ignore,
        ),
    };

    if !args.noinput && !args.dry_run && !prompt_continue(&config.collect.root)? {
        bail!("static files collection cancelled");
    }

    let destination = DestinationStorage::from_config(config, false)?;
    let report = Collector::new(config, &destination, options).collect()?;

    for (path, action) in &report.files {
        match action {
            Action::Copied => debug!("collect"; "copied {path}"),
            Action::Linked => debug!("collect"; "linked {path}"),
            Action::SkippedDuplicate => debug!("collect"; "skipped duplicate {path}"),
            Action::SkippedExcluded => debug!("collect"; "skipped excluded {path}"),
        }
    }
    for result in &report.post_processed {
        if result.processed {
            debug!("collect"; "post-processed {} as {}", result.original, result.hashed);
        }
    }

    log!(
        "collect";
        "{} static files collected ({} linked, {} post-processed)",
        report.collected(),
        report.linked,
        report.rewritten()
    );
    Ok(())
}

/// Prompt before overwriting the destination. Returns true only on an
/// explicit "yes".
fn prompt_continue(root: &Path) -> Result<bool> {
    eprintln!(
        "\nYou have requested to collect static files at the destination\n\
         location as specified in statica.toml:\n\n    {}\n\n\
         This will overwrite existing files.",
        root.display()
    );
    eprint!("Type 'yes' to continue, or 'no' to cancel: ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim() == "yes")
}
