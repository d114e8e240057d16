//! WASM bindings for soul-controls
//!
//! This module implements the collaborator traits on top of the DOM
//! (`HtmlMediaElement`, `HtmlElement`, the Fullscreen API) and exposes
//! a JavaScript-friendly controller.

#[cfg(feature = "wasm")]
pub mod web;

#[cfg(feature = "wasm")]
pub mod controls;

#[cfg(feature = "wasm")]
pub use controls::WasmControls;

#[cfg(feature = "wasm")]
pub use web::{WebFullscreen, WebMedia, WebView};
