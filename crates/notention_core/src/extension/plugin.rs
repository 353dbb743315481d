//! Plugin contract and ordered dispatch pipeline.

use crate::extension::capability::PluginCapability;
use crate::model::content::Block;
use crate::model::selection::EditorSelection;
use crate::transaction::Transaction;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Read-only editor state handed to plugin hooks.
#[derive(Debug, Clone, Copy)]
pub struct EditorContext<'a> {
    pub doc: &'a [Block],
    /// Collapsed caret, when the surface has one inside a block.
    pub selection: Option<EditorSelection>,
    /// Id of the property widget currently being edited.
    pub editing_widget: Option<&'a str>,
}

/// What a click landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    Property { id: String },
    Tag { tag: String },
    /// Plain content or outside any block.
    Content,
}

/// Result of one hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Not handled; the next plugin runs.
    Pass,
    /// Handled without a document change.
    Handled,
    /// Handled; the session applies the transaction.
    Apply(Transaction),
    /// Handled; start editing the given widget, or stop editing.
    EditWidget(Option<String>),
}

impl HookOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Editor plugin exposing optional typed hooks.
pub trait EditorPlugin {
    /// Stable identifier, e.g. `input-rules`.
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn capabilities(&self) -> &[PluginCapability];

    fn on_input(&self, _ctx: &EditorContext<'_>) -> HookOutcome {
        HookOutcome::Pass
    }

    fn on_click(&self, _ctx: &EditorContext<'_>, _target: &ClickTarget) -> HookOutcome {
        HookOutcome::Pass
    }
}

/// Plugins in registration order with a capability index.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn EditorPlugin>>,
    ids: BTreeSet<String>,
    capability_index: BTreeMap<PluginCapability, Vec<usize>>,
}

impl Debug for PluginRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one plugin after id validation.
    pub fn register(&mut self, plugin: Box<dyn EditorPlugin>) -> Result<(), PluginRegistryError> {
        let id = plugin.id().trim().to_string();
        if id.is_empty() {
            return Err(PluginRegistryError::EmptyId);
        }
        if !is_valid_plugin_id(&id) {
            return Err(PluginRegistryError::InvalidId(id));
        }
        if self.ids.contains(&id) {
            return Err(PluginRegistryError::DuplicatePluginId(id));
        }

        let position = self.plugins.len();
        let mut declared: Vec<PluginCapability> = plugin.capabilities().to_vec();
        declared.sort();
        declared.dedup();
        for capability in &declared {
            self.capability_index
                .entry(*capability)
                .or_default()
                .push(position);
        }
        info!(
            "event=plugin_register module=extension status=ok plugin_id={} capabilities={}",
            id,
            declared
                .iter()
                .map(|capability| capability.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );
        self.ids.insert(id);
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Plugin ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|plugin| plugin.id())
    }

    pub fn get(&self, plugin_id: &str) -> Option<&dyn EditorPlugin> {
        self.plugins
            .iter()
            .find(|plugin| plugin.id() == plugin_id)
            .map(|plugin| plugin.as_ref())
    }

    /// Plugins declaring a capability, in registration order.
    pub fn list_by_capability(&self, capability: PluginCapability) -> Vec<&dyn EditorPlugin> {
        let Some(positions) = self.capability_index.get(&capability) else {
            return vec![];
        };
        positions
            .iter()
            .filter_map(|position| self.plugins.get(*position))
            .map(|plugin| plugin.as_ref())
            .collect()
    }

    /// Runs input hooks in order until one does not pass.
    pub fn dispatch_input(&self, ctx: &EditorContext<'_>) -> HookOutcome {
        for plugin in self.list_by_capability(PluginCapability::InputHandler) {
            let outcome = plugin.on_input(ctx);
            if !outcome.is_pass() {
                debug!(
                    "event=plugin_input module=extension status=handled plugin_id={}",
                    plugin.id()
                );
                return outcome;
            }
        }
        HookOutcome::Pass
    }

    /// Runs click hooks in order until one does not pass.
    pub fn dispatch_click(&self, ctx: &EditorContext<'_>, target: &ClickTarget) -> HookOutcome {
        for plugin in self.list_by_capability(PluginCapability::ClickHandler) {
            let outcome = plugin.on_click(ctx, target);
            if !outcome.is_pass() {
                debug!(
                    "event=plugin_click module=extension status=handled plugin_id={}",
                    plugin.id()
                );
                return outcome;
            }
        }
        HookOutcome::Pass
    }
}

/// Lowercase ascii words joined by single `.`, `_` or `-` separators.
fn is_valid_plugin_id(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_separator = false;
            continue;
        }
        if matches!(c, '.' | '_' | '-') && !prev_separator {
            prev_separator = true;
            continue;
        }
        return false;
    }
    !prev_separator
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginRegistryError {
    EmptyId,
    InvalidId(String),
    DuplicatePluginId(String),
}

impl Display for PluginRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "plugin id must not be empty"),
            Self::InvalidId(value) => write!(f, "plugin id is invalid: {value}"),
            Self::DuplicatePluginId(value) => write!(f, "plugin id already registered: {value}"),
        }
    }
}

impl Error for PluginRegistryError {}

#[cfg(test)]
mod tests {
    use super::{
        ClickTarget, EditorContext, EditorPlugin, HookOutcome, PluginRegistry,
        PluginRegistryError,
    };
    use crate::extension::capability::PluginCapability;
    use crate::model::content::empty_document;

    struct Fixed {
        id: &'static str,
        outcome: HookOutcome,
        capabilities: Vec<PluginCapability>,
    }

    impl EditorPlugin for Fixed {
        fn id(&self) -> &str {
            self.id
        }

        fn name(&self) -> &str {
            self.id
        }

        fn capabilities(&self) -> &[PluginCapability] {
            &self.capabilities
        }

        fn on_input(&self, _ctx: &EditorContext<'_>) -> HookOutcome {
            self.outcome.clone()
        }

        fn on_click(&self, _ctx: &EditorContext<'_>, _target: &ClickTarget) -> HookOutcome {
            self.outcome.clone()
        }
    }

    fn fixed(id: &'static str, outcome: HookOutcome) -> Box<Fixed> {
        Box::new(Fixed {
            id,
            outcome,
            capabilities: vec![PluginCapability::InputHandler, PluginCapability::ClickHandler],
        })
    }

    #[test]
    fn dispatch_short_circuits_in_registration_order() {
        let mut registry = PluginRegistry::new();
        registry
            .register(fixed("first", HookOutcome::Pass))
            .expect("first registration");
        registry
            .register(fixed("second", HookOutcome::Handled))
            .expect("second registration");
        registry
            .register(fixed("third", HookOutcome::EditWidget(None)))
            .expect("third registration");

        let doc = empty_document();
        let ctx = EditorContext {
            doc: &doc,
            selection: None,
            editing_widget: None,
        };
        assert_eq!(registry.dispatch_input(&ctx), HookOutcome::Handled);
        assert_eq!(
            registry.dispatch_click(&ctx, &ClickTarget::Content),
            HookOutcome::Handled
        );
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn plugins_without_hook_capability_are_skipped() {
        let mut registry = PluginRegistry::new();
        registry
            .register(Box::new(Fixed {
                id: "toolbar-only",
                outcome: HookOutcome::Handled,
                capabilities: vec![PluginCapability::Toolbar],
            }))
            .expect("registration");
        let doc = empty_document();
        let ctx = EditorContext {
            doc: &doc,
            selection: None,
            editing_widget: None,
        };
        assert_eq!(registry.dispatch_input(&ctx), HookOutcome::Pass);
        assert_eq!(registry.list_by_capability(PluginCapability::Toolbar).len(), 1);
    }

    #[test]
    fn rejects_duplicate_and_invalid_ids() {
        let mut registry = PluginRegistry::new();
        registry
            .register(fixed("same", HookOutcome::Pass))
            .expect("first registration");
        assert_eq!(
            registry.register(fixed("same", HookOutcome::Pass)),
            Err(PluginRegistryError::DuplicatePluginId("same".to_string()))
        );
        assert_eq!(
            registry.register(fixed("Bad Id", HookOutcome::Pass)),
            Err(PluginRegistryError::InvalidId("Bad Id".to_string()))
        );
        assert_eq!(
            registry.register(fixed(" ", HookOutcome::Pass)),
            Err(PluginRegistryError::EmptyId)
        );
        assert_eq!(registry.len(), 1);
    }
}
