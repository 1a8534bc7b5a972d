pub mod preload;
pub mod session;
