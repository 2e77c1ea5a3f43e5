pub mod config;
pub mod packer;
pub mod page;
pub mod split_map;
