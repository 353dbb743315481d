//! Click handling for in-place property widget editing.

use crate::extension::capability::PluginCapability;
use crate::extension::plugin::{ClickTarget, EditorContext, EditorPlugin, HookOutcome};

pub const PROPERTY_EDITOR_PLUGIN_ID: &str = "property-editor";

/// Starts editing a clicked property widget; a click elsewhere ends editing.
#[derive(Debug, Default)]
pub struct PropertyEditorPlugin;

impl PropertyEditorPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl EditorPlugin for PropertyEditorPlugin {
    fn id(&self) -> &str {
        PROPERTY_EDITOR_PLUGIN_ID
    }

    fn name(&self) -> &str {
        "Property Editor"
    }

    fn capabilities(&self) -> &[PluginCapability] {
        &[PluginCapability::ClickHandler, PluginCapability::Popover]
    }

    fn on_click(&self, ctx: &EditorContext<'_>, target: &ClickTarget) -> HookOutcome {
        match target {
            ClickTarget::Property { id } => {
                if ctx.editing_widget == Some(id.as_str()) {
                    HookOutcome::Handled
                } else {
                    HookOutcome::EditWidget(Some(id.clone()))
                }
            }
            ClickTarget::Tag { .. } | ClickTarget::Content if ctx.editing_widget.is_some() => {
                HookOutcome::EditWidget(None)
            }
            ClickTarget::Tag { .. } | ClickTarget::Content => HookOutcome::Pass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PropertyEditorPlugin;
    use crate::extension::plugin::{ClickTarget, EditorContext, EditorPlugin, HookOutcome};
    use crate::model::content::empty_document;

    #[test]
    fn click_toggles_editing_state() {
        let plugin = PropertyEditorPlugin::new();
        let doc = empty_document();
        let idle = EditorContext {
            doc: &doc,
            selection: None,
            editing_widget: None,
        };
        let target = ClickTarget::Property { id: "w1".into() };
        assert_eq!(
            plugin.on_click(&idle, &target),
            HookOutcome::EditWidget(Some("w1".into()))
        );
        assert_eq!(plugin.on_click(&idle, &ClickTarget::Content), HookOutcome::Pass);

        let editing = EditorContext {
            editing_widget: Some("w1"),
            ..idle
        };
        assert_eq!(plugin.on_click(&editing, &target), HookOutcome::Handled);
        assert_eq!(
            plugin.on_click(&editing, &ClickTarget::Content),
            HookOutcome::EditWidget(None)
        );
    }
}
