pub mod fields;
pub mod footer;
pub mod header;
pub mod utils;

pub use fields::{draw_select_field, draw_text_field};
pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{format_money, truncate, type_color};
