//! WASM-compatible PlaybackController wrapper

use super::web::{WebMedia, WebView};
use crate::{
    events::validate_event_name, ControlsConfig, ControlsError, MediaEvent, PlaybackController,
    PlaybackSession, PointerButton, PointerEvent, Slot, SlotMap,
};
use js_sys::{Array, Function, Reflect};
use serde_json::Value;
use std::cell::RefCell;
use std::sync::{Arc, Mutex, PoisonError};
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement};

/// Handler invocation recorded by the bus, replayed into JavaScript
struct PendingCall {
    handler: usize,
    args: Vec<Value>,
    session: PlaybackSession,
}

fn to_js(err: ControlsError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// WASM-compatible playback controller
///
/// JavaScript handlers run once the triggering call has finished, in the
/// order the bus invoked them, with the session as `this`. No borrow of the
/// controller is held while they run, so a handler may call back into it.
#[wasm_bindgen]
pub struct WasmControls {
    inner: RefCell<PlaybackController<WebMedia, WebView>>,
    handlers: RefCell<Vec<Function>>,
    pending: Arc<Mutex<Vec<PendingCall>>>,
}

#[wasm_bindgen]
impl WasmControls {
    /// Bind a media element to already-built controls
    ///
    /// `slots` maps slot names (`"scrubber"`, `"toolbar"`, ...) to elements.
    #[wasm_bindgen(constructor)]
    pub fn new(media: Element, slots: &JsValue, config: JsValue) -> Result<WasmControls, JsValue> {
        console_error_panic_hook::set_once();

        let media = WebMedia::from_element(media).map_err(to_js)?;
        let view = WebView::new();

        let mut slot_map = SlotMap::new();
        for slot in Slot::ALL {
            let value = Reflect::get(slots, &JsValue::from_str(slot.as_str()))?;
            if value.is_undefined() || value.is_null() {
                continue;
            }
            let element = value
                .dyn_into::<HtmlElement>()
                .map_err(|_| JsValue::from_str(&format!("Slot '{slot}' is not an HTML element")))?;
            slot_map
                .place(slot, view.intern(&element))
                .map_err(to_js)?;
        }

        let config: ControlsConfig = if config.is_undefined() || config.is_null() {
            ControlsConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let fullscreen = web_sys::window()
            .and_then(|window| window.document())
            .map(|document| view.fullscreen(document));

        let mut inner =
            PlaybackController::bind(media, view, slot_map, config).map_err(to_js)?;
        if let Some(fullscreen) = fullscreen {
            inner = inner.with_fullscreen(Box::new(fullscreen));
        }

        Ok(Self {
            inner: RefCell::new(inner),
            handlers: RefCell::new(Vec::new()),
            pending: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Names of every media event the host should forward
    #[wasm_bindgen(js_name = mediaEvents)]
    pub fn media_events() -> Array {
        MediaEvent::ALL
            .iter()
            .map(|event| JsValue::from_str(event.as_str()))
            .collect()
    }

    // ===== Playback Control =====

    pub fn play(&self) {
        self.drive(|c| {
            c.play();
        });
    }

    pub fn pause(&self) {
        self.drive(|c| {
            c.pause();
        });
    }

    pub fn playpause(&self) {
        self.drive(|c| {
            c.playpause();
        });
    }

    pub fn load(&self) {
        self.drive(|c| {
            c.load();
        });
    }

    #[wasm_bindgen(js_name = jumpTo)]
    pub fn jump_to(&self, seconds: f64) {
        self.drive(|c| {
            c.jump_to(seconds);
        });
    }

    pub fn volume(&self) -> f64 {
        self.inner.borrow().volume()
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: f64) -> Result<(), JsValue> {
        self.drive(|c| c.set_volume(volume).map(|_| ()))
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) -> Result<(), JsValue> {
        self.drive(|c| c.toggle_mute().map(|_| ())).map_err(to_js)
    }

    #[wasm_bindgen(js_name = toggleFullscreen)]
    pub fn toggle_fullscreen(&self) {
        self.drive(|c| {
            c.toggle_fullscreen();
        });
    }

    /// Session state as a plain object
    pub fn session(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.inner.borrow().session())?)
    }

    /// Values from the last synchronizer pass
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.inner.borrow().last_snapshot())?)
    }

    // ===== Events =====

    /// Subscribe a JavaScript function to a named event
    pub fn on(&self, name: &str, handler: JsValue) -> Result<(), JsValue> {
        validate_event_name(name).map_err(to_js)?;
        let function = handler
            .dyn_into::<Function>()
            .map_err(|_| to_js(ControlsError::InvalidHandler(name.to_string())))?;

        let index = {
            let mut handlers = self.handlers.borrow_mut();
            handlers.push(function);
            handlers.len() - 1
        };

        let pending = Arc::clone(&self.pending);
        self.inner
            .borrow()
            .on(name, move |ctx| {
                pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(PendingCall {
                        handler: index,
                        args: ctx.args.to_vec(),
                        session: ctx.session.clone(),
                    });
            })
            .map_err(to_js)?;
        Ok(())
    }

    /// Emit a named event with an optional array of arguments
    pub fn emit(&self, name: &str, args: JsValue) -> Result<(), JsValue> {
        let args: Vec<Value> = if args.is_undefined() || args.is_null() {
            Vec::new()
        } else {
            serde_wasm_bindgen::from_value(args)?
        };
        self.drive(|c| {
            c.emit(name, &args);
        });
        Ok(())
    }

    /// Forward a media element event by name
    #[wasm_bindgen(js_name = handleMediaEvent)]
    pub fn handle_media_event(&self, name: &str) -> Result<(), JsValue> {
        self.drive(|c| c.handle_media_event_name(name).map(|_| ()))
            .map_err(to_js)
    }

    /// Forward a window resize
    #[wasm_bindgen(js_name = handleResize)]
    pub fn handle_resize(&self) {
        self.drive(|c| {
            c.handle_resize();
        });
    }

    // ===== Pointer =====

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(
        &self,
        button: i16,
        client_x: f64,
        client_y: f64,
        target: Option<HtmlElement>,
    ) -> Result<(), JsValue> {
        let target = target.map(|element| self.inner.borrow().view().intern(&element));
        let event =
            PointerEvent::down(client_x, client_y).with_button(PointerButton::from(button));
        self.drive(|c| c.handle_pointer(event, target).map(|_| ()))
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, client_x: f64, client_y: f64) -> Result<(), JsValue> {
        let event = PointerEvent::moved(client_x, client_y);
        self.drive(|c| c.handle_pointer(event, None).map(|_| ()))
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self, client_x: f64, client_y: f64) -> Result<(), JsValue> {
        let event = PointerEvent::up(client_x, client_y);
        self.drive(|c| c.handle_pointer(event, None).map(|_| ()))
            .map_err(to_js)
    }

    /// End any drag in progress (call on window blur)
    #[wasm_bindgen(js_name = cancelDrags)]
    pub fn cancel_drags(&self) {
        self.inner.borrow_mut().cancel_drags();
    }
}

impl WasmControls {
    /// Run `f` against the controller, release it, then replay handlers
    fn drive<R>(&self, f: impl FnOnce(&mut PlaybackController<WebMedia, WebView>) -> R) -> R {
        let result = f(&mut self.inner.borrow_mut());
        self.flush();
        result
    }

    /// Replay queued handler invocations into JavaScript
    ///
    /// Calls queued by a handler's own re-entrant calls are replayed by
    /// that nested call before it returns.
    fn flush(&self) {
        let calls = std::mem::take(
            &mut *self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        for call in calls {
            let Some(handler) = self.handlers.borrow().get(call.handler).cloned() else {
                continue;
            };
            let this = serde_wasm_bindgen::to_value(&call.session).unwrap_or(JsValue::NULL);
            let args: Array = call
                .args
                .iter()
                .map(|arg| serde_wasm_bindgen::to_value(arg).unwrap_or(JsValue::UNDEFINED))
                .collect();

            if let Err(err) = handler.apply(&this, &args) {
                web_sys::console::error_2(&JsValue::from_str("soul-controls handler threw"), &err);
            }
        }
    }
}
