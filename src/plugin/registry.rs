//! Name-keyed registry of loaded plugins and the catalogs they resolve from.

use tracing::{debug, trace, warn};

use super::{builtin, Plugin, PluginDescriptor, PluginHelper, ViewHandle};
use crate::error::{HexViewError, Result};

/// Resolves plugin names to descriptors.
pub trait PluginResolver {
    fn resolve(&self, name: &str) -> Option<PluginDescriptor>;

    /// Names that can currently be resolved.
    fn available(&self) -> Vec<String>;
}

/// A registration table of plugin descriptors.
#[derive(Debug, Clone, Default)]
pub struct PluginCatalog {
    descriptors: Vec<PluginDescriptor>,
}

impl PluginCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog of plugins shipped with the crate.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for descriptor in builtin::descriptors() {
            catalog.register(descriptor);
        }
        catalog
    }

    /// Adds a descriptor, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: PluginDescriptor) {
        match self.descriptors.iter_mut().find(|d| d.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => self.descriptors.push(descriptor),
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl PluginResolver for PluginCatalog {
    fn resolve(&self, name: &str) -> Option<PluginDescriptor> {
        self.descriptors.iter().find(|d| d.name == name).cloned()
    }

    fn available(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.name.clone()).collect()
    }
}

/// One loaded plugin.
pub struct PluginEntry {
    descriptor: PluginDescriptor,
    instance: Box<dyn Plugin>,
    view: ViewHandle,
}

impl PluginEntry {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }

    pub fn icon(&self) -> Option<&str> {
        self.descriptor.icon.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.descriptor.description.as_deref()
    }

    pub fn view(&self) -> &ViewHandle {
        &self.view
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.instance.as_ref()
    }
}

/// Ordered collection of loaded plugins, keyed by name.
///
/// Entries keep their load order; notifications are delivered in that order.
pub struct PluginRegistry {
    resolver: Box<dyn PluginResolver>,
    helper: PluginHelper,
    entries: Vec<PluginEntry>,
}

impl PluginRegistry {
    pub fn new(resolver: Box<dyn PluginResolver>, helper: PluginHelper) -> Self {
        Self {
            resolver,
            helper,
            entries: Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name() == name)
    }

    /// Loads `name` unless it is already loaded.
    pub fn load(&mut self, name: &str) -> Result<()> {
        if self.is_loaded(name) {
            trace!(plugin = name, "Plugin already loaded");
            return Ok(());
        }
        let descriptor = self
            .resolver
            .resolve(name)
            .ok_or_else(|| HexViewError::PluginResolution {
                name: name.to_string(),
            })?;
        let instance = descriptor
            .init(&self.helper)
            .ok_or_else(|| HexViewError::PluginInit {
                name: name.to_string(),
            })?;
        let view = instance.view();

        debug!(plugin = name, view = %view.id(), "Loaded plugin");
        self.entries.push(PluginEntry {
            descriptor,
            instance,
            view,
        });
        Ok(())
    }

    /// Unloads `name`; does nothing when it is not loaded.
    pub fn unload(&mut self, name: &str) {
        if let Some(pos) = self.position(name) {
            let mut entry = self.entries.remove(pos);
            entry.instance.destroy();
            debug!(plugin = name, "Unloaded plugin");
        }
    }

    /// Re-creates every instance in place so the next session starts clean.
    ///
    /// An entry whose plugin fails to initialize again is dropped.
    pub fn reset_all(&mut self) {
        let helper = &self.helper;
        self.entries.retain_mut(|entry| {
            entry.instance.destroy();
            match entry.descriptor.init(helper) {
                Some(instance) => {
                    entry.view = instance.view();
                    entry.instance = instance;
                    true
                }
                None => {
                    warn!(plugin = %entry.descriptor.name, "Plugin failed to re-initialize");
                    let err = HexViewError::PluginInit {
                        name: entry.descriptor.name.clone(),
                    };
                    helper.report_error(&err.to_string());
                    false
                }
            }
        });
    }

    /// Delivers a chunk to every plugin in load order.
    ///
    /// `None` or an empty slice is forwarded as `None`: the end of the stream.
    pub fn notify_read(&mut self, offset: u64, bytes: Option<&[u8]>) {
        let bytes = bytes.filter(|b| !b.is_empty());
        trace!(offset, len = bytes.map_or(0, <[u8]>::len), plugins = self.entries.len(), "Notify read");
        for entry in &mut self.entries {
            entry.instance.on_read(offset, bytes);
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&PluginEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Loaded plugin names, in load order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(PluginEntry::name).collect()
    }

    pub fn entries(&self) -> &[PluginEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolver(&self) -> &dyn PluginResolver {
        self.resolver.as_ref()
    }

    pub fn helper(&self) -> &PluginHelper {
        &self.helper
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        for entry in &mut self.entries {
            entry.instance.destroy();
        }
    }
}
