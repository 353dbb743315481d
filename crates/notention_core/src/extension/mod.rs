//! Editor extension contracts.
//!
//! Plugins declare capabilities and optionally implement input/click hooks.
//! The registry dispatches hooks in registration order and stops at the
//! first plugin that does not pass.

pub mod capability;
pub mod input_rules;
pub mod insertion;
pub mod plugin;
pub mod property_editor;

pub use capability::PluginCapability;
pub use plugin::{
    ClickTarget, EditorContext, EditorPlugin, HookOutcome, PluginRegistry, PluginRegistryError,
};

use input_rules::InputRulesPlugin;
use property_editor::PropertyEditorPlugin;

/// Registry holding the built-in plugins.
pub fn builtin_registry() -> Result<PluginRegistry, PluginRegistryError> {
    let mut registry = PluginRegistry::new();
    registry.register(Box::new(InputRulesPlugin::new()))?;
    registry.register(Box::new(PropertyEditorPlugin::new()))?;
    Ok(registry)
}
