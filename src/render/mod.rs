// Pure rendering helpers: no I/O, no repository access.

pub mod custom_field;
pub mod table;

pub use table::{render_table, TableShapeError, TableSpec};
