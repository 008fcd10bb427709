pub mod model;
pub mod time;

pub use model::*;
pub use time::now_ms;
