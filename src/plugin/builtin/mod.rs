//! Plugins shipped with hexview.
//!
//! - `template`: minimal plugin owning an empty view
//! - `strings`: printable ASCII runs found in the stream
//! - `entropy`: byte distribution and Shannon entropy of the stream

pub mod entropy;
pub mod strings;
pub mod template;

use super::PluginDescriptor;

/// Registration table of the built-in plugins.
pub fn descriptors() -> Vec<PluginDescriptor> {
    vec![
        template::descriptor(),
        strings::descriptor(),
        entropy::descriptor(),
    ]
}
