//! Template storage.
//!
//! A template is a small square BGRA reference pattern searched for inside
//! captured regions. All templates in a bank share one side length; the bank
//! is append-only during a run so per-template statistics stay index-aligned.

use std::sync::Arc;

use crate::image::{BgraView, BYTES_PER_PIXEL};
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Side length used by default template libraries, in pixels.
pub const DEFAULT_TEMPLATE_SIDE: usize = 20;

/// Immutable square BGRA reference pattern.
pub struct Template {
    data: Vec<u8>,
    side: usize,
    name: String,
    active: bool,
}

impl Template {
    /// Creates a template from a packed BGRA buffer of `side * side * 4` bytes.
    pub fn new(data: Vec<u8>, side: usize, name: impl Into<String>) -> ScreenMatchResult<Self> {
        if side == 0 {
            return Err(ScreenMatchError::InvalidDimensions {
                width: side,
                height: side,
            });
        }
        let needed = side * side * BYTES_PER_PIXEL;
        if data.len() != needed {
            return Err(ScreenMatchError::TemplateBufferMismatch {
                side,
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            side,
            name: name.into(),
            active: true,
        })
    }

    /// Creates a template filled with one BGRA value, mostly for tests.
    pub fn solid(side: usize, bgra: [u8; 4], name: impl Into<String>) -> ScreenMatchResult<Self> {
        let mut data = Vec::with_capacity(side * side * BYTES_PER_PIXEL);
        for _ in 0..side * side {
            data.extend_from_slice(&bgra);
        }
        Self::new(data, side, name)
    }

    /// Returns the side length in pixels.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the template participates in search.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the packed BGRA pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Returns a borrowed view of the template pixels.
    pub fn view(&self) -> BgraView<'_> {
        BgraView::from_slice(&self.data, self.side, self.side)
            .expect("template buffer validated at construction")
    }
}

/// Append-only collection of templates with a uniform side length.
///
/// Templates are stored behind `Arc` so cycle processing can snapshot the
/// collection without copying pixel data; see [`TemplateBank::snapshot`].
#[derive(Default)]
pub struct TemplateBank {
    templates: Vec<Arc<Template>>,
    side: Option<usize>,
}

impl TemplateBank {
    /// Creates an empty bank. The first pushed template fixes the side length.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a template, enforcing the uniform-side invariant.
    ///
    /// Returns the template's index, which is stable for the lifetime of the
    /// process and used to address its statistics.
    pub fn push(&mut self, template: Template) -> ScreenMatchResult<usize> {
        match self.side {
            Some(side) if template.side() != side => {
                return Err(ScreenMatchError::TemplateSideMismatch {
                    expected: side,
                    got: template.side(),
                });
            }
            None => self.side = Some(template.side()),
            _ => {}
        }
        self.templates.push(Arc::new(template));
        Ok(self.templates.len() - 1)
    }

    /// Returns the uniform side length, or `None` for an empty bank.
    pub fn side(&self) -> Option<usize> {
        self.side
    }

    /// Returns the number of templates, active or not.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the bank holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Returns the template at `index`.
    pub fn get(&self, index: usize) -> Option<&Arc<Template>> {
        self.templates.get(index)
    }

    /// Toggles whether the template at `index` participates in search.
    pub fn set_active(&mut self, index: usize, active: bool) -> ScreenMatchResult<()> {
        let len = self.templates.len();
        let slot = self
            .templates
            .get_mut(index)
            .ok_or(ScreenMatchError::IndexOutOfBounds {
                index,
                len,
                context: "template",
            })?;
        if slot.active == active {
            return Ok(());
        }
        *slot = Arc::new(Template {
            data: slot.data.clone(),
            side: slot.side,
            name: slot.name.clone(),
            active,
        });
        Ok(())
    }

    /// Returns a cheap copy-on-read snapshot of the collection.
    pub fn snapshot(&self) -> Vec<Arc<Template>> {
        self.templates.clone()
    }
}
