pub mod container;
pub mod sink;
