pub mod client;
pub mod config_loader;
pub mod engine;
pub mod error;
pub mod language;
pub mod playback;
pub mod studio;
pub mod synth;
pub mod view;
pub mod voices;
