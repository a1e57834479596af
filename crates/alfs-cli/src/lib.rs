pub mod select;
pub mod util;
