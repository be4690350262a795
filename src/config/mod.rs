pub mod port;
pub mod settings;
