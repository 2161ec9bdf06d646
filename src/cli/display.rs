use anyhow::Result;
use serde::Serialize;

use crate::models::{AddressBookRef, ContactRecord, ResultSet};

/// Print any value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_books(books: &[AddressBookRef]) {
    if books.is_empty() {
        println!("No address books.");
        return;
    }
    for book in books {
        println!("  {:<16} {}", book.public_id(), book.host_name());
    }
}

/// Print a contact with one address per line
pub fn print_full_record(record: &ContactRecord) {
    println!("{}\n", display_name(record));
    for email in &record.email {
        println!("  {}", email);
    }
    println!("\n  id {}", record.id);
}

/// Print one page of contacts and the paging footer
pub fn print_result(result: &ResultSet) {
    if result.is_empty() {
        println!("No contacts found.");
    }
    for record in &result.records {
        println!("{}", format_row(record));
    }
    if result.count > 0 {
        println!("\n{}", format_range(result));
    }
}

fn display_name(record: &ContactRecord) -> &str {
    if record.name.is_empty() {
        "(unnamed)"
    } else {
        &record.name
    }
}

/// One line per contact: the primary address plus how many others it has
pub fn format_row(record: &ContactRecord) -> String {
    let email = match (record.primary_email(), record.email.len()) {
        (None, _) => "-".to_string(),
        (Some(primary), 1) => primary.to_string(),
        (Some(primary), n) => format!("{} (+{} more)", primary, n - 1),
    };
    format!("{:>6}  {:<30} {}", record.id, display_name(record), email)
}

/// "11-20 of 42"; empty pages beyond the end still report the total
pub fn format_range(result: &ResultSet) -> String {
    if result.is_empty() {
        return format!("0 of {}", result.count);
    }
    let start = result.first + 1;
    let end = result.first + result.len() as u64;
    format!("{}-{} of {}", start, end, result.count)
}
