pub mod advisor;
pub mod loader;
pub mod profile;
pub mod render;
pub mod table;
