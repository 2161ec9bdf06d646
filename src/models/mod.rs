mod address_book;
mod contact;
mod page;

pub use address_book::*;
pub use contact::*;
pub use page::*;
