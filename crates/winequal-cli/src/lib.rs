pub mod stages;
pub mod util;
