use anyhow::{anyhow, Result};

use super::display::{print_json, print_result};
use super::{Context, SearchArgs};
use crate::addressbook::{AddressBookSource, MatchMode, SearchField, SearchFields, SearchRequest};
use crate::models::PageSpec;

/// Turn command line arguments into a search request
pub fn build_request(args: &SearchArgs) -> Result<SearchRequest> {
    let mode = MatchMode::parse(&args.mode)
        .ok_or_else(|| anyhow!("Unknown match mode '{}': use strict, prefix or substring", args.mode))?;

    let mut request = SearchRequest::new(SearchFields::parse(&args.fields), args.query.clone()).mode(mode);
    if args.count_only {
        request = request.count_only();
    }
    if args.no_count {
        request = request.no_count();
    }
    for name in &args.require {
        let field = SearchField::parse(name)
            .ok_or_else(|| anyhow!("Unknown field '{}': use name or email", name))?;
        request = request.require(field);
    }
    Ok(request)
}

pub fn run_search(ctx: &Context, args: &SearchArgs) -> Result<()> {
    let request = build_request(args)?;
    let page = PageSpec::new(args.limit, args.page)?;

    let mut book = ctx.open_book(&args.book)?;
    book.set_page(page);
    let result = book.search(&request)?;

    if ctx.json {
        return print_json(&result);
    }
    if !request.select {
        println!("{}", result.count);
        return Ok(());
    }
    print_result(&result);
    Ok(())
}
