use crate::errors::AutomationError;
use crate::patterns::{ElementPattern, PatternKind, PatternValue};
use std::fmt;
use std::fmt::Debug;
use tracing::debug;

/// A live element of the accessibility tree.
///
/// Handles are only valid for the duration of a single resolve/extract pass: the
/// underlying native object goes stale as soon as the application redraws or
/// rebuilds that part of its UI. Store a [`crate::LocatorDescriptor`] instead and
/// resolve it again when the element is needed.
pub struct UIElement {
    inner: Box<dyn UIElementImpl>,
}

/// Interface for platform-specific element implementations.
///
/// Every property read returns a `Result`: the node may disappear between any
/// two calls and callers are expected to treat that as a normal condition.
pub trait UIElementImpl: Send + Sync + Debug {
    fn object_id(&self) -> usize;
    fn automation_id(&self) -> Result<String, AutomationError>;
    fn name(&self) -> Result<String, AutomationError>;
    fn class_name(&self) -> Result<String, AutomationError>;
    /// Control type name in its `...Control` form, e.g. `EditControl`.
    fn control_type(&self) -> Result<String, AutomationError>;
    fn process_id(&self) -> Result<u32, AutomationError>;
    fn children(&self) -> Result<Vec<UIElement>, AutomationError>;
    fn parent(&self) -> Result<Option<UIElement>, AutomationError>;
    /// Whether the element still exists in the live tree.
    fn is_available(&self) -> bool;
    /// Capability query. Returns `PatternNotSupported` when the element does not
    /// implement `kind`.
    fn get_pattern(&self, kind: PatternKind) -> Result<PatternValue, AutomationError>;
    fn as_any(&self) -> &dyn std::any::Any;

    // Add a method to clone the box
    fn clone_box(&self) -> Box<dyn UIElementImpl>;
}

impl UIElement {
    /// Create a new UI element from a platform-specific implementation
    pub fn new(impl_: Box<dyn UIElementImpl>) -> Self {
        Self { inner: impl_ }
    }

    /// Identifier of the underlying native object, stable for the lifetime of the handle
    pub fn object_id(&self) -> usize {
        self.inner.object_id()
    }

    pub fn automation_id(&self) -> Result<String, AutomationError> {
        self.inner.automation_id()
    }

    pub fn name(&self) -> Result<String, AutomationError> {
        self.inner.name()
    }

    pub fn class_name(&self) -> Result<String, AutomationError> {
        self.inner.class_name()
    }

    pub fn control_type(&self) -> Result<String, AutomationError> {
        self.inner.control_type()
    }

    pub fn process_id(&self) -> Result<u32, AutomationError> {
        self.inner.process_id()
    }

    pub fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        self.inner.children()
    }

    pub fn parent(&self) -> Result<Option<UIElement>, AutomationError> {
        self.inner.parent()
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    /// Untyped capability query, used when recording every supported pattern.
    pub fn pattern_value(&self, kind: PatternKind) -> Result<PatternValue, AutomationError> {
        self.inner.get_pattern(kind)
    }

    /// Query a pattern, reporting why it is unavailable.
    pub fn try_pattern<P: ElementPattern>(&self) -> Result<P, AutomationError> {
        let value = self.inner.get_pattern(P::KIND)?;
        let kind = value.kind();
        P::from_value(value).ok_or_else(|| {
            AutomationError::Internal(format!(
                "Platform answered a {} query with a {kind} value",
                P::KIND
            ))
        })
    }

    /// Query a pattern, treating any failure as "not supported".
    pub fn pattern<P: ElementPattern>(&self) -> Option<P> {
        match self.try_pattern::<P>() {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                debug!("{} unavailable: {}", P::KIND, e);
                None
            }
        }
    }

    /// Get the underlying implementation as a specific type
    pub fn as_any(&self) -> &dyn std::any::Any {
        self.inner.as_any()
    }
}

impl PartialEq for UIElement {
    fn eq(&self, other: &Self) -> bool {
        self.object_id() == other.object_id()
    }
}

impl Eq for UIElement {}

impl Clone for UIElement {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl Debug for UIElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UIElement")
            .field("automation_id", &self.automation_id().unwrap_or_default())
            .field("name", &self.name().unwrap_or_default())
            .field("control_type", &self.control_type().unwrap_or_default())
            .finish()
    }
}
