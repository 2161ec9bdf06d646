use anyhow::{anyhow, Result};

use super::display::{print_full_record, print_json};
use super::{Context, ShowArgs};
use crate::addressbook::AddressBookSource;

pub fn run_show(ctx: &Context, args: &ShowArgs) -> Result<()> {
    let mut book = ctx.open_book(&args.book)?;

    let record = book
        .get_record(args.id)?
        .ok_or_else(|| anyhow!("No contact {} in {}", args.id, args.book))?;

    if ctx.json {
        return print_json(&record);
    }
    print_full_record(&record);
    Ok(())
}
