//! WebAssembly bindings for the Memory Kana engine.
//!
//! The browser page owns the DOM, `setTimeout`/`setInterval`, `fetch` and the
//! WebSocket. It forwards inputs to [`WasmGame`] and executes the returned
//! effect lists (JSON arrays of objects tagged by `kind`).

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::actions::{ConcealToken, Effect};
#[cfg(feature = "wasm")]
use crate::game::{GameConfig, GameController};
#[cfg(feature = "wasm")]
use crate::timer::{TimerError, TimerStart, TimerStop};

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[cfg(feature = "wasm")]
fn effects_json(effects: &[Effect]) -> String {
    serde_json::to_string(effects).unwrap_or_else(|_| "[]".to_string())
}

/// WASM-exposed game session
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmGame {
    controller: GameController,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmGame {
    /// Create a session from a JSON `GameConfig` (missing fields use defaults)
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmGame, JsValue> {
        let config: GameConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;

        let controller =
            GameController::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmGame { controller })
    }

    /// Effects to run right after construction
    #[wasm_bindgen(js_name = initialEffects)]
    pub fn initial_effects(&self) -> String {
        effects_json(&self.controller.initial_effects())
    }

    /// Session state as JSON (cells, score, clock)
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.controller.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self) -> u32 {
        self.controller.score()
    }

    #[wasm_bindgen(js_name = isCompleted)]
    pub fn is_completed(&self) -> bool {
        self.controller.is_completed()
    }

    /// A tile was clicked
    pub fn click(&mut self, cell: usize, now_ms: f64) -> Result<String, JsValue> {
        self.controller
            .click(cell, now_ms as i64)
            .map(|effects| effects_json(&effects))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// A `ScheduleConceal` timeout fired
    #[wasm_bindgen(js_name = concealDue)]
    pub fn conceal_due(&mut self, token: f64, now_ms: f64) -> String {
        effects_json(
            &self
                .controller
                .conceal_due(ConcealToken(token as u64), now_ms as i64),
        )
    }

    /// The tick interval fired
    pub fn tick(&mut self, now_ms: f64) -> String {
        effects_json(&self.controller.tick(now_ms as i64))
    }

    /// Body of the `timer?action=start` response
    #[wasm_bindgen(js_name = timerStarted)]
    pub fn timer_started(&mut self, body: &str, now_ms: f64) -> String {
        effects_json(
            &self
                .controller
                .timer_started(TimerStart::parse(body), now_ms as i64),
        )
    }

    /// The `timer?action=start` request failed
    #[wasm_bindgen(js_name = timerStartFailed)]
    pub fn timer_start_failed(&mut self, message: &str, now_ms: f64) -> String {
        effects_json(&self.controller.timer_started(
            Err(TimerError::Network(message.to_string())),
            now_ms as i64,
        ))
    }

    /// Body of the `timer?action=stop` response
    #[wasm_bindgen(js_name = timerStopped)]
    pub fn timer_stopped(&mut self, body: &str) -> String {
        effects_json(&self.controller.timer_stopped(TimerStop::parse(body)))
    }

    /// The `timer?action=stop` request failed
    #[wasm_bindgen(js_name = timerStopFailed)]
    pub fn timer_stop_failed(&mut self, message: &str) -> String {
        effects_json(
            &self
                .controller
                .timer_stopped(Err(TimerError::Network(message.to_string()))),
        )
    }

    /// A WebSocket message arrived
    #[wasm_bindgen(js_name = channelMessage)]
    pub fn channel_message(&mut self, text: &str) -> String {
        effects_json(&self.controller.channel_message(text))
    }

    /// The WebSocket closed
    #[wasm_bindgen(js_name = channelClosed)]
    pub fn channel_closed(&mut self) -> String {
        effects_json(&self.controller.channel_closed())
    }
}
