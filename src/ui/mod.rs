pub mod app;
mod assets;
mod audio;
mod board;
mod dialogs;
mod hud;
mod scene;
mod state;
