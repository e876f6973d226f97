mod footer;
mod header;
mod utils;

pub use footer::draw_footer;
pub use header::{draw_header, HeaderContext};
pub use utils::{field_line, source_badge, truncate};
