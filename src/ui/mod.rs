pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{attribute_row, deleted, entity_line, error, header, linked, muted, success, unlinked, warn};
pub use table::{entity_table, stats_table};
pub use theme::theme;
