//! Raw input events consumed by the trigger engine
//!
//! Serde-capable so event traces can be replayed through the `run` subcommand
//! as JSON lines.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { alt: false, ctrl: false, shift: false };

    pub fn any(&self) -> bool {
        self.alt || self.ctrl || self.shift
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Key {
    Space,
    Escape,
    #[serde(untagged)]
    Other(String),
}

/// One raw event from the page. `target` indexes into the replayed document
/// in creation order (0 = root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InputEvent {
    PointerEnter { target: usize, position: Point },
    PointerLeave { target: usize },
    Click { target: usize, position: Point, #[serde(default)] modifiers: Modifiers },
    PointerDown { position: Point },
    PointerMove { position: Point },
    PointerUp,
    KeyDown { key: Key },
    KeyUp { key: Key },
    Scroll,
}
