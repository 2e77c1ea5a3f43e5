pub mod command;
pub mod group;
