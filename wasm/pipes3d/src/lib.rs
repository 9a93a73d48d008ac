mod app;
#[cfg(target_arch = "wasm32")]
mod web;

pub use app::{config_or_default, PipesApp};
#[cfg(target_arch = "wasm32")]
pub use web::WebHandle;
