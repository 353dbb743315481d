//! Editing session for one open note.
//!
//! # Responsibility
//! - Own the live content model of exactly one note.
//! - Route surface input/click events through the plugin pipeline.
//! - Debounce saves to the persistence collaborator.
//!
//! # Invariants
//! - Before every save `content` is re-serialized and `tags`/`properties`
//!   are recomputed from the model.
//! - A failed save is logged and stays pending; editing never stops on it.
//! - Time is injected (`now`) so debounce behavior is deterministic.

use crate::config::CoreConfig;
use crate::extension::insertion::{tag_insertion, template_insertion};
use crate::extension::{
    builtin_registry, ClickTarget, EditorContext, HookOutcome, PluginRegistry,
    PluginRegistryError,
};
use crate::markup::dom::{parse_fragment, Element, MarkupNode, WidgetKind};
use crate::markup::legacy::widgetize_legacy;
use crate::markup::parse::{parse_markup, parse_root};
use crate::markup::semantics::note_semantics;
use crate::markup::serialize::serialize_model;
use crate::model::content::{property_widgets, Block, ContentModel, InlineNode, PropertyWidget};
use crate::model::note::Note;
use crate::model::ontology::OntologyIndex;
use crate::model::selection::EditorSelection;
use crate::selection::{
    read_selection, sync_surface, to_model, write_selection, EditableSurface, SurfacePoint,
};
use crate::transaction::{Transaction, TransactionResult};
use chrono::Utc;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Keys that still reach the surface while a widget is being edited.
pub const NAVIGATION_KEYS: &[&str] = &[
    "ArrowUp",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "Escape",
    "Tab",
];

/// Persistence collaborator receiving saved notes.
pub trait NoteSink {
    fn save(&mut self, note: &Note) -> Result<(), SinkError>;
}

impl<T: NoteSink + ?Sized> NoteSink for &mut T {
    fn save(&mut self, note: &Note) -> Result<(), SinkError> {
        (**self).save(note)
    }
}

/// Sink keeping every saved snapshot in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub saved: Vec<Note>,
    /// Number of upcoming saves to fail.
    pub fail_next: usize,
}

impl NoteSink for MemorySink {
    fn save(&mut self, note: &Note) -> Result<(), SinkError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(SinkError::Unavailable("memory sink set to fail".to_string()));
        }
        self.saved.push(note.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Backend cannot be reached right now; retrying may succeed.
    Unavailable(String),
    /// Backend refused the note.
    Rejected(String),
}

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "note sink unavailable: {message}"),
            Self::Rejected(message) => write!(f, "note sink rejected note: {message}"),
        }
    }
}

impl Error for SinkError {}

/// Whether a key event may reach the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    PassThrough,
    Suppress,
}

pub struct EditorSession<S: NoteSink> {
    note: Note,
    doc: ContentModel,
    selection: Option<EditorSelection>,
    editing_widget: Option<String>,
    registry: PluginRegistry,
    index: OntologyIndex,
    sink: S,
    debounce: Duration,
    /// Time of the last unsaved edit.
    pending_since: Option<Instant>,
}

impl<S: NoteSink> EditorSession<S> {
    /// Opens a note, upgrading legacy plain-text markers to widgets.
    pub fn open(note: Note, sink: S, registry: PluginRegistry, config: &CoreConfig) -> Self {
        let doc = widgetize_legacy(parse_markup(&note.content));
        info!(
            "event=session_open module=editor_session status=ok note_id={} blocks={}",
            note.id,
            doc.len()
        );
        Self {
            note,
            doc,
            selection: None,
            editing_widget: None,
            registry,
            index: config.ontology_index(),
            sink,
            debounce: config.autosave_debounce(),
            pending_since: None,
        }
    }

    /// Opens a note with the built-in plugins.
    pub fn open_with_builtins(
        note: Note,
        sink: S,
        config: &CoreConfig,
    ) -> Result<Self, PluginRegistryError> {
        Ok(Self::open(note, sink, builtin_registry()?, config))
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn doc(&self) -> &[Block] {
        &self.doc
    }

    pub fn selection(&self) -> Option<EditorSelection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<EditorSelection>) {
        self.selection = selection;
    }

    pub fn editing_widget(&self) -> Option<&str> {
        self.editing_widget.as_deref()
    }

    /// Property widget currently being edited, if it still exists.
    pub fn editing_property(&self) -> Option<&PropertyWidget> {
        let id = self.editing_widget.as_deref()?;
        property_widgets(&self.doc).find(|widget| widget.id == id)
    }

    pub fn is_dirty(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn ontology_index(&self) -> &OntologyIndex {
        &self.index
    }

    /// Applies a transaction; a changed document arms the autosave.
    pub fn apply(&mut self, tx: Transaction, now: Instant) -> TransactionResult {
        let result = tx.apply();
        if result.doc != self.doc {
            self.doc = result.doc.clone();
            self.mark_dirty(now);
        }
        if result.selection.is_some() {
            self.selection = result.selection;
        }
        result
    }

    /// Writes the model to the surface when it differs and restores the
    /// cursor. Returns whether markup was written.
    pub fn render<T: EditableSurface + ?Sized>(&self, surface: &mut T) -> bool {
        let wrote = sync_surface(surface, &self.doc);
        if let Some(selection) = &self.selection {
            write_selection(surface, selection);
        }
        wrote
    }

    /// Re-derives the model from the surface after user input and runs the
    /// input pipeline. Returns whether a plugin handled the input.
    pub fn handle_input<T: EditableSurface + ?Sized>(
        &mut self,
        surface: &mut T,
        now: Instant,
    ) -> bool {
        let doc = parse_root(&parse_fragment(&surface.markup()));
        if doc != self.doc {
            self.doc = doc;
            self.mark_dirty(now);
        }
        self.selection = read_selection(surface);

        let outcome = {
            let ctx = self.context();
            self.registry.dispatch_input(&ctx)
        };
        self.follow_outcome(outcome, surface, now)
    }

    /// Runs the click pipeline for a click at `point`.
    pub fn handle_click<T: EditableSurface + ?Sized>(
        &mut self,
        surface: &mut T,
        point: &SurfacePoint,
        now: Instant,
    ) -> bool {
        let root = parse_fragment(&surface.markup());
        let target = click_target(&root, point);
        if let Some(selection) = to_model(&root, point) {
            self.selection = Some(selection);
        }
        let outcome = {
            let ctx = self.context();
            self.registry.dispatch_click(&ctx, &target)
        };
        self.follow_outcome(outcome, surface, now)
    }

    /// Filters key events while a widget is being edited; `Escape` also
    /// ends editing.
    pub fn handle_key(&mut self, key: &str) -> KeyDisposition {
        if self.editing_widget.is_none() {
            return KeyDisposition::PassThrough;
        }
        if key == "Escape" {
            self.editing_widget = None;
        }
        if NAVIGATION_KEYS.contains(&key) {
            KeyDisposition::PassThrough
        } else {
            KeyDisposition::Suppress
        }
    }

    /// Rewrites the property widget with `id` in place.
    pub fn update_property(
        &mut self,
        id: &str,
        key: &str,
        operator: &str,
        values: Vec<String>,
        now: Instant,
    ) -> TransactionResult {
        let tx = Transaction::new(self.doc.clone()).set_property(id, key, operator, values);
        self.apply(tx, now)
    }

    /// Inserts a tag widget at the caret, or at the end of the note.
    pub fn insert_tag(&mut self, tag: &str, now: Instant) -> TransactionResult {
        self.insert_at_caret(tag_insertion(tag), now)
    }

    /// Inserts the template with `template_id`; `None` when it is unknown.
    pub fn insert_template(
        &mut self,
        template_id: &str,
        now: Instant,
    ) -> Option<TransactionResult> {
        let nodes = self
            .index
            .templates
            .iter()
            .find(|template| template.id == template_id)
            .map(template_insertion)?;
        Some(self.insert_at_caret(nodes, now))
    }

    /// Saves when the quiet period since the last edit has elapsed.
    ///
    /// Returns whether a save succeeded.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.duration_since(since) >= self.debounce => {
                match self.save() {
                    Ok(()) => true,
                    Err(_) => {
                        self.pending_since = Some(now);
                        false
                    }
                }
            }
            _ => false,
        }
    }

    /// Saves immediately when there are unsaved edits.
    pub fn flush(&mut self) -> Result<bool, SinkError> {
        if self.pending_since.is_none() {
            return Ok(false);
        }
        self.save().map(|()| true)
    }

    /// Performs the final save and returns the up-to-date note.
    pub fn close(mut self) -> Result<Note, SinkError> {
        self.editing_widget = None;
        self.flush()?;
        info!(
            "event=session_close module=editor_session status=ok note_id={}",
            self.note.id
        );
        Ok(self.note)
    }

    fn context(&self) -> EditorContext<'_> {
        EditorContext {
            doc: &self.doc,
            selection: self.selection,
            editing_widget: self.editing_widget.as_deref(),
        }
    }

    fn follow_outcome<T: EditableSurface + ?Sized>(
        &mut self,
        outcome: HookOutcome,
        surface: &mut T,
        now: Instant,
    ) -> bool {
        match outcome {
            HookOutcome::Pass => false,
            HookOutcome::Handled => true,
            HookOutcome::Apply(tx) => {
                self.apply(tx, now);
                self.render(surface);
                true
            }
            HookOutcome::EditWidget(widget) => {
                debug!(
                    "event=widget_edit module=editor_session status=ok editing={}",
                    widget.is_some()
                );
                self.editing_widget = widget;
                true
            }
        }
    }

    fn insert_at_caret(&mut self, nodes: Vec<InlineNode>, now: Instant) -> TransactionResult {
        let at = self.selection.unwrap_or_else(|| {
            let last = self.doc.len().saturating_sub(1);
            self.doc
                .get(last)
                .map_or_else(EditorSelection::default, |block| {
                    EditorSelection::block_end(last, block)
                })
        });
        let tx = Transaction::new(self.doc.clone()).insert_nodes(at, nodes);
        self.apply(tx, now)
    }

    fn mark_dirty(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    fn save(&mut self) -> Result<(), SinkError> {
        let semantics = note_semantics(&self.doc);
        self.note.content = serialize_model(&self.doc);
        self.note.tags = semantics.tags;
        self.note.properties = semantics.properties;
        self.note.updated_at = Utc::now().timestamp_millis();

        match self.sink.save(&self.note) {
            Ok(()) => {
                self.pending_since = None;
                info!(
                    "event=note_save module=editor_session status=ok note_id={} tags={} properties={}",
                    self.note.id,
                    self.note.tags.len(),
                    self.note.properties.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=note_save module=editor_session status=error note_id={} error={}",
                    self.note.id, err
                );
                Err(err)
            }
        }
    }
}

/// Widget enclosing the clicked surface node, if any.
fn click_target(root: &Element, point: &SurfacePoint) -> ClickTarget {
    let mut children = &root.children;
    for index in &point.path {
        let Some(MarkupNode::Element(element)) = children.get(*index) else {
            break;
        };
        match element.widget_kind() {
            Some(WidgetKind::Property) => {
                return match element.attr("id").filter(|id| !id.is_empty()) {
                    Some(id) => ClickTarget::Property { id: id.to_string() },
                    None => ClickTarget::Content,
                };
            }
            Some(WidgetKind::Tag) => {
                return ClickTarget::Tag {
                    tag: element.attr("data-tag").unwrap_or_default().to_string(),
                };
            }
            None => children = &element.children,
        }
    }
    ClickTarget::Content
}

#[cfg(test)]
mod tests {
    use super::{click_target, EditorSession, KeyDisposition, MemorySink};
    use crate::config::CoreConfig;
    use crate::extension::ClickTarget;
    use crate::markup::dom::parse_fragment;
    use crate::model::note::Note;
    use crate::selection::SurfacePoint;
    use std::time::{Duration, Instant};

    #[test]
    fn click_target_finds_enclosing_widget() {
        let root = parse_fragment(
            r#"<p>a<span id="w1" class="widget property" data-key="k"><span class="property-key">k</span></span></p>"#,
        );
        assert_eq!(
            click_target(&root, &SurfacePoint::new(vec![0, 1, 0, 0], 0)),
            ClickTarget::Property { id: "w1".into() }
        );
        assert_eq!(
            click_target(&root, &SurfacePoint::new(vec![0, 0], 0)),
            ClickTarget::Content
        );
    }

    #[test]
    fn keys_are_filtered_only_while_editing() {
        let mut session = EditorSession::open_with_builtins(
            Note::new("t", "<p>x</p>"),
            MemorySink::default(),
            &CoreConfig::default(),
        )
        .expect("session opens");
        assert_eq!(session.handle_key("a"), KeyDisposition::PassThrough);

        session.editing_widget = Some("w1".into());
        assert_eq!(session.handle_key("a"), KeyDisposition::Suppress);
        assert_eq!(session.handle_key("Tab"), KeyDisposition::PassThrough);
        assert_eq!(session.handle_key("Escape"), KeyDisposition::PassThrough);
        assert_eq!(session.editing_widget(), None);
    }

    #[test]
    fn failed_save_stays_pending() {
        let sink = MemorySink {
            fail_next: 1,
            ..MemorySink::default()
        };
        let mut session = EditorSession::open_with_builtins(
            Note::new("t", "<p>x</p>"),
            sink,
            &CoreConfig::default(),
        )
        .expect("session opens");
        let start = Instant::now();
        session.insert_tag("idea", start);

        let later = start + Duration::from_millis(1000);
        assert!(!session.tick(later));
        assert!(session.is_dirty());
        assert!(!session.tick(later + Duration::from_millis(999)));
        assert!(session.tick(later + Duration::from_millis(1000)));
        assert_eq!(session.sink().saved.len(), 1);
        assert_eq!(session.sink().saved[0].tags, vec!["idea"]);
    }
}
