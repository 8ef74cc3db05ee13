//! oxn CLI library: table presenter, column configurations and the page-level
//! views behind the `oxn` binary.

pub mod columns;
pub mod logging;
pub mod table;
pub mod views;

pub use table::{Cell, Column, TableView};
pub use views::{TableArgs, ViewContext};
