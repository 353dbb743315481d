//! Capability declarations for editor plugins.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Hook slot a plugin declares it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluginCapability {
    Header,
    Toolbar,
    Popover,
    Modal,
    InputHandler,
    ClickHandler,
}

impl PluginCapability {
    /// Stable string id used in diagnostics and host bindings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Toolbar => "toolbar",
            Self::Popover => "popover",
            Self::Modal => "modal",
            Self::InputHandler => "input_handler",
            Self::ClickHandler => "click_handler",
        }
    }

    /// Whether the core dispatches events to this slot.
    pub fn is_hook(self) -> bool {
        matches!(self, Self::InputHandler | Self::ClickHandler)
    }
}

const ALL_CAPABILITIES: &[PluginCapability] = &[
    PluginCapability::Header,
    PluginCapability::Toolbar,
    PluginCapability::Popover,
    PluginCapability::Modal,
    PluginCapability::InputHandler,
    PluginCapability::ClickHandler,
];

/// Parses one capability from its string id.
pub fn parse_plugin_capability(value: &str) -> Result<PluginCapability, PluginCapabilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(PluginCapabilityError::EmptyCapability);
    }
    ALL_CAPABILITIES
        .iter()
        .copied()
        .find(|capability| capability.as_str() == normalized)
        .ok_or_else(|| PluginCapabilityError::UnsupportedCapability(normalized.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginCapabilityError {
    EmptyCapability,
    UnsupportedCapability(String),
}

impl Display for PluginCapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCapability => write!(f, "plugin capability value must not be empty"),
            Self::UnsupportedCapability(value) => {
                write!(f, "plugin capability is unsupported: {value}")
            }
        }
    }
}

impl Error for PluginCapabilityError {}
