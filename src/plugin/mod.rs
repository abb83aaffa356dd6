//! Observer plugins fed with every chunk read from the document.
//!
//! A plugin is described by a [`PluginDescriptor`] (name, icon, description
//! and an `init` factory) and instantiated into a boxed [`Plugin`]. Instances
//! are owned by the [`registry::PluginRegistry`]; the host only ever sees their
//! [`ViewHandle`].

pub mod builtin;
pub mod registry;

use serde::Serialize;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

use crate::session::SessionHandle;
use crate::sink::ErrorReporter;

/// Non-owning reference to the view a plugin renders into.
///
/// The plugin owns the actual widget; the registry and the host keep this
/// handle only to lay the view out next to the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ViewHandle {
    id: Uuid,
    title: String,
}

impl ViewHandle {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// A loaded plugin instance.
pub trait Plugin {
    /// The view this instance renders into.
    fn view(&self) -> ViewHandle;

    /// Receives one raw chunk starting at `offset`.
    ///
    /// `None` marks the end of the stream for the current session. The
    /// default implementation ignores streaming data.
    fn on_read(&mut self, _offset: u64, _bytes: Option<&[u8]>) {}

    /// Structured summary of what the plugin has gathered so far.
    fn report(&self) -> Option<serde_json::Value> {
        None
    }

    /// Called right before the instance is dropped.
    fn destroy(&mut self) {}
}

/// Factory producing a plugin instance, or `None` when initialization fails.
pub type InitFn = Rc<dyn Fn(&PluginHelper) -> Option<Box<dyn Plugin>>>;

/// Static description of a plugin, as found in a registration table.
#[derive(Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub display_name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    init: InitFn,
}

impl PluginDescriptor {
    pub fn new<F>(name: impl Into<String>, init: F) -> Self
    where
        F: Fn(&PluginHelper) -> Option<Box<dyn Plugin>> + 'static,
    {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            icon: None,
            description: None,
            init: Rc::new(init),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Instantiates the plugin.
    pub fn init(&self, helper: &PluginHelper) -> Option<Box<dyn Plugin>> {
        (self.init)(helper)
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("icon", &self.icon)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// What a plugin gets from its host: the session and an error channel.
#[derive(Clone)]
pub struct PluginHelper {
    session: SessionHandle,
    reporter: Rc<dyn ErrorReporter>,
}

impl PluginHelper {
    pub fn new(session: SessionHandle, reporter: Rc<dyn ErrorReporter>) -> Self {
        Self { session, reporter }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Reports a failure to the user; returns the status code to propagate.
    pub fn report_error(&self, message: &str) -> i32 {
        self.reporter.report_error(message)
    }
}

impl fmt::Debug for PluginHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHelper")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
