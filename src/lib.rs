pub mod catalog;
pub mod config;
pub mod matrix;
pub mod probe;
