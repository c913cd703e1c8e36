use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::InteropError;

static NEXT_CANVAS_INDEX: AtomicU32 = AtomicU32::new(1);

/// Generate the next `sharpEngineCanvas_{N}` id. The counter is process-wide.
pub fn next_canvas_id() -> String {
    let index = NEXT_CANVAS_INDEX.fetch_add(1, Ordering::Relaxed);
    format!("sharpEngineCanvas_{index}")
}

/// Anything that can be looked up by its canvas id.
pub trait CanvasKeyed {
    fn canvas_id(&self) -> &str;
}

/// Live instances keyed by canvas id.
///
/// The first registered instance is kept in a dedicated slot so the common
/// single-canvas lookup is a single comparison. Further instances go into an
/// `additional` list that only exists while it is non-empty.
pub struct CanvasRegistry<T> {
    primary: Option<T>,
    additional: Option<Vec<T>>,
}

impl<T: CanvasKeyed> CanvasRegistry<T> {
    pub fn new() -> Self {
        Self {
            primary: None,
            additional: None,
        }
    }

    pub fn register(&mut self, item: T) -> Result<(), InteropError> {
        if self.find(item.canvas_id()).is_some() {
            return Err(InteropError::DuplicateCanvasId(item.canvas_id().to_string()));
        }

        if self.primary.is_none() {
            self.primary = Some(item);
        } else {
            self.additional.get_or_insert_with(Vec::new).push(item);
        }
        Ok(())
    }

    pub fn find(&self, canvas_id: &str) -> Option<&T> {
        if let Some(primary) = &self.primary {
            if primary.canvas_id() == canvas_id {
                return Some(primary);
            }
        }
        self.additional
            .as_ref()?
            .iter()
            .find(|item| item.canvas_id() == canvas_id)
    }

    /// Remove and return the item. Removing the primary promotes the first
    /// additional instance.
    pub fn unregister(&mut self, canvas_id: &str) -> Option<T> {
        let removed = if self
            .primary
            .as_ref()
            .is_some_and(|p| p.canvas_id() == canvas_id)
        {
            let removed = self.primary.take();
            if let Some(additional) = &mut self.additional {
                if !additional.is_empty() {
                    self.primary = Some(additional.remove(0));
                }
            }
            removed
        } else {
            let additional = self.additional.as_mut()?;
            let index = additional.iter().position(|i| i.canvas_id() == canvas_id)?;
            Some(additional.remove(index))
        };

        if self.additional.as_ref().is_some_and(|a| a.is_empty()) {
            self.additional = None;
        }
        removed
    }

    pub fn primary(&self) -> Option<&T> {
        self.primary.as_ref()
    }

    /// Primary first, then additional instances in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.primary
            .iter()
            .chain(self.additional.iter().flat_map(|a| a.iter()))
    }

    pub fn len(&self) -> usize {
        self.primary.iter().count() + self.additional.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
    }
}

impl<T: CanvasKeyed> Default for CanvasRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
