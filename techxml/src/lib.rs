pub mod config;
pub mod deps;
pub mod error;
pub mod export;
pub mod io;
pub mod layers;
pub mod menu;
pub mod primitive;
pub mod tech;
pub mod validation;

pub(crate) mod log;
