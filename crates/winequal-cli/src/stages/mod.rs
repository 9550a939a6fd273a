pub mod evaluate;
pub mod input;
pub mod preprocess;
pub mod train;
