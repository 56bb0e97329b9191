//! Reset command - delete every record in the journal.

use anyhow::{Result, bail};
use clap::Args;

use super::{Context, print_success};

/// Arguments for the reset command.
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Confirm that all data should be deleted
    #[arg(long)]
    pub yes: bool,
}

/// Run the reset command.
pub async fn run(args: ResetArgs, ctx: &Context) -> Result<()> {
    if !args.yes {
        bail!("this deletes every conversation, contact, category and phrase; rerun with --yes");
    }

    let store = ctx.open_store()?;
    store.reset_all()?;
    if !ctx.json_output {
        print_success("All data deleted");
    }
    Ok(())
}
