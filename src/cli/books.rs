use anyhow::Result;

use super::display::{print_books, print_json};
use super::{BooksArgs, Context};
use crate::addressbook::AddressBookCatalog;

pub fn run_books(ctx: &Context, args: &BooksArgs) -> Result<()> {
    let catalog = ctx.catalog();

    if args.autocomplete {
        let sources = catalog.autocomplete_sources(&ctx.config.autocomplete_sources, &ctx.user)?;
        if ctx.json {
            return print_json(&sources);
        }
        for source in sources {
            println!("{}", source);
        }
        return Ok(());
    }

    let books = catalog.list(&ctx.user)?;
    if ctx.json {
        return print_json(&books);
    }
    print_books(&books);
    Ok(())
}
