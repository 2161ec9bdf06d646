use anyhow::Result;

use super::display::{print_json, print_result};
use super::{Context, ListArgs};
use crate::addressbook::AddressBookSource;
use crate::models::PageSpec;

pub fn run_list(ctx: &Context, args: &ListArgs) -> Result<()> {
    let page = PageSpec::new(args.limit, args.page)?;
    let mut book = ctx.open_book(&args.book)?;

    let result = book.list_records(page, args.no_count)?;
    if ctx.json {
        return print_json(&result);
    }

    println!("{}\n", book.name()?);
    print_result(&result);
    Ok(())
}
