//! Chain and latest command implementations.

use super::parse_id;
use crate::cli::{ChainArgs, LatestArgs};
use crate::error::Result;
use crate::output::Formatter;
use solvr_domain::traits::RelationshipStore;
use solvr_store::SqliteStore;

/// Execute the chain command.
pub fn execute_chain(args: ChainArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let id = parse_id(&args.id)?;
    let chain = store.get_version_chain(id, args.depth)?;

    println!("{}", formatter.format_chain(&chain)?);

    Ok(())
}

/// Execute the latest command.
pub fn execute_latest(args: LatestArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let id = parse_id(&args.id)?;
    let latest = store.latest_in_lineage(id)?;

    println!("{}", formatter.format_approach(&latest)?);

    Ok(())
}
