pub mod app;
pub mod rewrite;
pub mod settings;
pub mod window;
