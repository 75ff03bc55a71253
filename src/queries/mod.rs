//! Query modules over the card reference database.
//!
//! Each query struct borrows from a [`Connection`](crate::connection::Connection)
//! and returns typed catalog rows.

pub mod cards;

pub use cards::CardQuery;
