//! Terminal output helpers for the CLI

pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{amount, empty, error, header, info, success};
pub use table::{bills_table, named_table, stats_table, usages_table, TableBuilder};
pub use theme::{theme, Theme};
