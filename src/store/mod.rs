pub mod discovery;
pub mod files;
pub mod lock;
