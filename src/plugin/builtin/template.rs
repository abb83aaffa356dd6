//! Starting point for new plugins: owns a view and ignores the stream.

use crate::plugin::{Plugin, PluginDescriptor, ViewHandle};

pub const NAME: &str = "template";

pub struct TemplatePlugin {
    view: ViewHandle,
}

impl TemplatePlugin {
    pub fn new() -> Self {
        Self {
            view: ViewHandle::new("Template"),
        }
    }
}

impl Default for TemplatePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for TemplatePlugin {
    fn view(&self) -> ViewHandle {
        self.view.clone()
    }
}

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(NAME, |_| Some(Box::new(TemplatePlugin::new())))
        .with_display_name("Template")
}
