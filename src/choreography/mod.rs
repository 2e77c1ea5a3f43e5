pub mod compiler;
pub mod directive;
pub mod encode;
pub mod preprocess;
pub mod scene_index;
