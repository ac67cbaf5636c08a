//! # Type overrides
//!
//! Flow-sensitive narrowing of local variables and parameters. Each lexical
//! region that may narrow (a branch, a loop body, the right operand of `&&`)
//! runs inside its own frame; a narrowing set in an outer frame stays visible
//! in the inner ones until shadowed.

use rustc_hash::FxHashMap;

use crate::element::ElementId;
use crate::types::Type;

/// Narrowings of one frame. `None` records that an outer narrowing is
/// cleared for the rest of the frame.
pub type OverrideFrame = FxHashMap<ElementId, Option<Type>>;

#[derive(Debug, Default)]
pub struct TypeOverrideManager {
    frames: Vec<OverrideFrame>,
}

impl TypeOverrideManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.frames.push(OverrideFrame::default());
    }

    /// Pops the innermost frame and returns its narrowings.
    ///
    /// # Panics
    ///
    /// Panics when no frame is open: every `exit_scope` must pair with an
    /// earlier `enter_scope`.
    pub fn exit_scope(&mut self) -> OverrideFrame {
        match self.frames.pop() {
            Some(frame) => frame,
            None => panic!("exit_scope called on a type override manager with no open scope"),
        }
    }

    /// Runs `f` inside a fresh frame, exiting it afterwards
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.enter_scope();
        let result = f(self);
        self.exit_scope();
        result
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Narrows `element` to `ty` in the innermost frame
    pub fn set_type(&mut self, element: ElementId, ty: Type) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.insert(element, Some(ty));
            }
            None => tracing::warn!(?element, "type override set outside of any scope"),
        }
    }

    /// Forgets any narrowing of `element` for the rest of the innermost frame
    pub fn clear_type(&mut self, element: ElementId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(element, None);
        }
    }

    /// Innermost narrowing of `element`, if any
    pub fn get_type(&self, element: ElementId) -> Option<&Type> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(&element))
            .and_then(Option::as_ref)
    }

    /// Narrowings recorded in the innermost frame, to be carried past it
    pub fn capture_local_overrides(&self) -> OverrideFrame {
        self.frames.last().cloned().unwrap_or_default()
    }

    /// Re-applies narrowings captured from another frame
    pub fn apply_overrides(&mut self, overrides: OverrideFrame) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        frame.extend(overrides);
    }
}
