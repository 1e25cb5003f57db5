pub mod render;
pub mod width;
