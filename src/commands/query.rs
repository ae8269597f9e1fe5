//! Query commands: exact name, qualified path, substring and file listing.

use anyhow::Result;

use super::{open_and_refresh, print_symbols};
use crate::cli::GlobalArgs;
use crate::symbol::SearchOptions;

pub async fn find(global: &GlobalArgs, name: &str) -> Result<()> {
    let (session, _) = open_and_refresh(global).await?;
    print_symbols(&session.find_by_name(name)?, global.json)
}

pub async fn qualified(global: &GlobalArgs, path: &str) -> Result<()> {
    let (session, _) = open_and_refresh(global).await?;
    print_symbols(&session.find_by_qualified_path(path)?, global.json)
}

pub async fn search(
    global: &GlobalArgs,
    pattern: &str,
    ignore_case: bool,
    limit: Option<usize>,
) -> Result<()> {
    let (session, _) = open_and_refresh(global).await?;

    let mut options = SearchOptions::from(&session.config().search);
    if ignore_case {
        options.case_sensitive = false;
    }
    if let Some(limit) = limit {
        options.limit = (limit > 0).then_some(limit);
    }

    print_symbols(&session.search_with(pattern, &options)?, global.json)
}

pub async fn symbols(global: &GlobalArgs, file: &str) -> Result<()> {
    let (session, _) = open_and_refresh(global).await?;
    print_symbols(&session.file_symbols(file)?, global.json)
}
