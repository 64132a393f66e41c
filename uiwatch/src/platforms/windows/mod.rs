//! Windows platform implementation
//!
//! Accessibility tree access through the Windows UI Automation API, using the
//! uiautomation crate.

pub mod element;
pub mod engine;
pub mod types;
pub mod utils;

pub use element::WindowsUIElement;
pub use engine::WindowsEngine;
pub use utils::{convert_uiautomation_element, generate_element_id};
