mod tray;

pub use tray::{create_tray, refresh_tray};
