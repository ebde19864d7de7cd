//! `find` command implementation.

use anyhow::{Result, bail};

use crate::cli::FindArgs;
use crate::config::StaticConfig;
use crate::finder::FinderChain;
use crate::log;
use crate::utils::path::normalize_path;

pub fn run_find(args: &FindArgs, config: &StaticConfig) -> Result<()> {
    let chain = FinderChain::from_config(config)?;

    let mut missing = 0usize;
    for path in &args.paths {
        let matches = chain.resolve(path, !args.first);
        if matches.is_empty() {
            log!("warning"; "no matching file found for `{path}`");
            missing += 1;
            continue;
        }
        if args.first {
            println!("{}", matches[0].display());
        } else {
            log!("find"; "found `{path}` here:");
            for found in &matches {
                println!("  {}", normalize_path(found).display());
            }
        }
    }

    if missing > 0 {
        bail!("{missing} path(s) could not be resolved");
    }
    Ok(())
}
