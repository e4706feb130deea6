pub mod collectors;
pub mod domain;
pub mod driver;
pub mod error;
pub mod platform;
pub mod probe;
pub mod render;
