use std::{cell::Cell, rc::Rc};

use wasm_bindgen::prelude::*;

use crate::app::{config_or_default, PipesApp};

/// JS handle for the pipes screensaver.
///
/// Create it with `new WebHandle()`, then `await handle.start(canvas, configToml)`.
/// `configToml` is optional; a config that fails to parse or validate is logged
/// and the defaults are used instead.
#[derive(Clone)]
#[wasm_bindgen]
pub struct WebHandle {
    runner: eframe::WebRunner,
    ui_visible: Rc<Cell<bool>>,
    pointer_over_ui: Rc<Cell<bool>>,
}

#[wasm_bindgen]
impl WebHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();
        eframe::WebLogger::init(log::LevelFilter::Info).ok();

        Self {
            runner: eframe::WebRunner::new(),
            ui_visible: Rc::new(Cell::new(false)),
            pointer_over_ui: Rc::new(Cell::new(false)),
        }
    }

    #[wasm_bindgen]
    pub async fn start(
        &self,
        canvas: web_sys::HtmlCanvasElement,
        config_toml: Option<String>,
    ) -> Result<(), JsValue> {
        let config = config_or_default(config_toml.as_deref());
        // Every page load grows a different field.
        let seed = js_sys::Date::now() as u64;
        log::info!("starting pipes, seed {}, grid size {}", seed, config.grid_size);

        let ui_visible = self.ui_visible.clone();
        let pointer_over_ui = self.pointer_over_ui.clone();
        self.runner
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(move |_cc| {
                    Ok(Box::new(PipesApp::new(
                        seed,
                        config,
                        ui_visible,
                        pointer_over_ui,
                    )))
                }),
            )
            .await
    }

    #[wasm_bindgen]
    pub fn destroy(&self) {
        self.runner.destroy();
    }

    #[wasm_bindgen]
    pub fn has_panicked(&self) -> bool {
        self.runner.has_panicked()
    }

    /// Shows or hides the settings window.
    #[wasm_bindgen]
    pub fn set_ui_visible(&self, visible: bool) {
        self.ui_visible.set(visible);
    }

    /// True while the pointer is over the settings window, so the page can
    /// leave those events to egui.
    #[wasm_bindgen]
    pub fn is_pointer_over_ui(&self) -> bool {
        self.pointer_over_ui.get()
    }
}
