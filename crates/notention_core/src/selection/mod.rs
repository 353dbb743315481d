//! Mapping between surface cursor positions and model coordinates.
//!
//! # Responsibility
//! - Translate a surface anchor (child-index path + offset) into an
//!   `EditorSelection` and back.
//! - Keep the rendered surface in sync with the model without redundant
//!   writes.
//!
//! # Invariants
//! - A surface point produced here never lands inside a widget.
//! - Zero-width caret placeholders never count toward offsets.
//! - Unresolvable coordinates yield `None`.

use crate::markup::dom::{parse_fragment, Element, MarkupNode};
use crate::markup::parse::{block_spans, BlockSpan, EMPTY_BLOCK_PLACEHOLDER};
use crate::markup::serialize::serialize_model;
use crate::model::content::{Block, InlineNode};
use crate::model::selection::EditorSelection;
use log::debug;
use serde::{Deserialize, Serialize};

/// Cursor anchor on the surface tree.
///
/// `path` indexes children from the surface root. When the anchor is a text
/// node `offset` counts its characters, otherwise it is a child index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl SurfacePoint {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// Block-relative cursor position with widgets counted as one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatCursor {
    pub block_index: usize,
    pub offset: usize,
}

/// Host surface the editor renders into.
pub trait EditableSurface {
    fn markup(&self) -> String;
    fn set_markup(&mut self, markup: &str);
    fn cursor(&self) -> Option<SurfacePoint>;
    fn set_cursor(&mut self, point: Option<SurfacePoint>);
}

/// In-memory surface for hosts without a live view and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySurface {
    markup: String,
    cursor: Option<SurfacePoint>,
    writes: usize,
}

impl MemorySurface {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            cursor: None,
            writes: 0,
        }
    }

    /// Number of markup writes since creation.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl EditableSurface for MemorySurface {
    fn markup(&self) -> String {
        self.markup.clone()
    }

    fn set_markup(&mut self, markup: &str) {
        self.markup = markup.to_string();
        self.writes += 1;
    }

    fn cursor(&self) -> Option<SurfacePoint> {
        self.cursor.clone()
    }

    fn set_cursor(&mut self, point: Option<SurfacePoint>) {
        self.cursor = point;
    }
}

/// Maps a surface anchor to model coordinates.
pub fn to_model(root: &Element, point: &SurfacePoint) -> Option<EditorSelection> {
    let spans = block_spans(root);
    let cursor = flat_cursor(root, &spans, point)?;
    let span = spans.get(cursor.block_index)?;
    Some(EditorSelection::from_flat(
        cursor.block_index,
        &span.block,
        cursor.offset,
    ))
}

/// Maps model coordinates to a surface anchor.
///
/// Widgets are addressed from their parent element, before (`offset` 0) or
/// after (`offset` 1) the widget.
pub fn to_surface(root: &Element, selection: &EditorSelection) -> Option<SurfacePoint> {
    let spans = block_spans(root);
    let span = spans.get(selection.block_index)?;
    let node = span.block.content.get(selection.inline_index)?;
    if node.is_widget() {
        let ordinal = span.block.content[..selection.inline_index]
            .iter()
            .filter(|node| node.is_widget())
            .count();
        let mut seen = 0;
        let mut relative = find_widget(span.nodes(root), ordinal, &mut seen)?;
        let (mut path, base) = span.anchor();
        let mut widget_index = relative.pop()?;
        match relative.first_mut() {
            Some(first) => *first += base,
            None => widget_index += base,
        }
        path.extend(relative);
        return Some(SurfacePoint::new(path, widget_index + selection.offset.min(1)));
    }
    point_in_span(root, span, selection.to_flat(&span.block))
}

/// Counts characters from the block start to a surface anchor.
pub fn cursor_offset(root: &Element, point: &SurfacePoint) -> Option<FlatCursor> {
    flat_cursor(root, &block_spans(root), point)
}

/// Surface anchor at a flat offset of a block.
pub fn point_at_offset(root: &Element, block_index: usize, offset: usize) -> Option<SurfacePoint> {
    let spans = block_spans(root);
    let span = spans.get(block_index)?;
    point_in_span(root, span, offset)
}

/// Writes the serialized document only when it differs from the surface.
///
/// Returns whether a write happened.
pub fn sync_surface<S: EditableSurface + ?Sized>(surface: &mut S, doc: &[Block]) -> bool {
    let markup = serialize_model(doc);
    if surface.markup() == markup {
        return false;
    }
    surface.set_markup(&markup);
    true
}

/// Reads the surface cursor as model coordinates.
pub fn read_selection<S: EditableSurface + ?Sized>(surface: &S) -> Option<EditorSelection> {
    let point = surface.cursor()?;
    let root = parse_fragment(&surface.markup());
    let selection = to_model(&root, &point);
    if selection.is_none() {
        debug!(
            "event=selection_unmapped module=selection status=ignored path={:?} offset={}",
            point.path, point.offset
        );
    }
    selection
}

/// Places the surface cursor at model coordinates, if they resolve.
pub fn write_selection<S: EditableSurface + ?Sized>(surface: &mut S, selection: &EditorSelection) {
    let root = parse_fragment(&surface.markup());
    if let Some(point) = to_surface(&root, selection) {
        surface.set_cursor(Some(point));
    }
}

fn flat_cursor(root: &Element, spans: &[BlockSpan], point: &SurfacePoint) -> Option<FlatCursor> {
    let Some((&top, rest)) = point.path.split_first() else {
        return root_anchor(root, spans, point.offset);
    };
    let (block_index, span) = spans
        .iter()
        .enumerate()
        .find(|(_, span)| span.range.contains(&top))?;
    let offset = if span.container {
        offset_in_children(span.nodes(root), rest, point.offset)?
    } else {
        let mut relative = point.path.clone();
        relative[0] = top - span.range.start;
        offset_in_children(span.nodes(root), &relative, point.offset)?
    };
    Some(FlatCursor {
        block_index,
        offset,
    })
}

/// Anchor placed directly on the root between top-level children.
fn root_anchor(root: &Element, spans: &[BlockSpan], child: usize) -> Option<FlatCursor> {
    if let Some((block_index, span)) = spans
        .iter()
        .enumerate()
        .find(|(_, span)| span.range.contains(&child))
    {
        let offset = if span.container {
            0
        } else {
            span.nodes(root)[..child - span.range.start]
                .iter()
                .map(visible_len)
                .sum()
        };
        return Some(FlatCursor {
            block_index,
            offset,
        });
    }
    let (block_index, last) = spans
        .iter()
        .enumerate()
        .rev()
        .find(|(_, span)| span.range.end <= child)?;
    Some(FlatCursor {
        block_index,
        offset: last.block.flat_len(),
    })
}

fn offset_in_children(children: &[MarkupNode], path: &[usize], offset: usize) -> Option<usize> {
    match path.split_first() {
        None => Some(
            children[..offset.min(children.len())]
                .iter()
                .map(visible_len)
                .sum(),
        ),
        Some((&index, rest)) => {
            let child = children.get(index)?;
            let before: usize = children[..index].iter().map(visible_len).sum();
            Some(before + offset_in_node(child, rest, offset)?)
        }
    }
}

fn offset_in_node(node: &MarkupNode, path: &[usize], offset: usize) -> Option<usize> {
    match node {
        MarkupNode::Text(text) => {
            if !path.is_empty() {
                return None;
            }
            Some(
                text.chars()
                    .take(offset)
                    .filter(|c| *c != EMPTY_BLOCK_PLACEHOLDER)
                    .count(),
            )
        }
        MarkupNode::Element(element) if element.widget_kind().is_some() => {
            let at_start = offset == 0 && path.iter().all(|index| *index == 0);
            Some(usize::from(!at_start))
        }
        MarkupNode::Element(element) => offset_in_children(&element.children, path, offset),
    }
}

/// Cursor positions a surface node contributes to its block.
fn visible_len(node: &MarkupNode) -> usize {
    match node {
        MarkupNode::Text(text) => text.chars().filter(|c| *c != EMPTY_BLOCK_PLACEHOLDER).count(),
        MarkupNode::Element(element) if element.widget_kind().is_some() => 1,
        MarkupNode::Element(element) => element.children.iter().map(visible_len).sum(),
    }
}

fn point_in_span(root: &Element, span: &BlockSpan, offset: usize) -> Option<SurfacePoint> {
    let (parent_path, base) = span.anchor();
    let nodes = span.nodes(root);
    let (mut relative, point_offset) = point_in_children(nodes, offset);
    let path = match relative.split_first_mut() {
        Some((first, _)) => {
            *first += base;
            let mut path = parent_path;
            path.extend(relative);
            path
        }
        None => {
            return Some(SurfacePoint::new(parent_path, base + point_offset));
        }
    };
    Some(SurfacePoint::new(path, point_offset))
}

/// Finds the anchor at a flat offset; the end of a text run wins over the
/// start of the following node.
fn point_in_children(children: &[MarkupNode], offset: usize) -> (Vec<usize>, usize) {
    let mut remaining = offset;
    for (index, child) in children.iter().enumerate() {
        match child {
            MarkupNode::Text(text) => {
                let len = visible_len(child);
                if remaining <= len {
                    return (vec![index], raw_char_offset(text, remaining));
                }
                remaining -= len;
            }
            MarkupNode::Element(element) if element.widget_kind().is_some() => {
                if remaining == 0 {
                    return (Vec::new(), index);
                }
                remaining -= 1;
            }
            MarkupNode::Element(element) => {
                let len = visible_len(child);
                if len > 0 && remaining <= len {
                    let (mut path, inner) = point_in_children(&element.children, remaining);
                    path.insert(0, index);
                    return (path, inner);
                }
                remaining -= len;
            }
        }
    }
    (Vec::new(), children.len())
}

/// Character offset inside raw text after `visible` non-placeholder chars.
fn raw_char_offset(text: &str, visible: usize) -> usize {
    if visible == 0 {
        return 0;
    }
    let mut seen = 0;
    for (index, c) in text.chars().enumerate() {
        if c != EMPTY_BLOCK_PLACEHOLDER {
            seen += 1;
            if seen == visible {
                return index + 1;
            }
        }
    }
    text.chars().count()
}

/// Path (relative to `children`) of the `ordinal`-th widget in document order.
fn find_widget(children: &[MarkupNode], ordinal: usize, seen: &mut usize) -> Option<Vec<usize>> {
    for (index, child) in children.iter().enumerate() {
        let MarkupNode::Element(element) = child else {
            continue;
        };
        if element.widget_kind().is_some() {
            if *seen == ordinal {
                return Some(vec![index]);
            }
            *seen += 1;
        } else if let Some(mut path) = find_widget(&element.children, ordinal, seen) {
            path.insert(0, index);
            return Some(path);
        }
    }
    None
}

/// Inline node addressed by a selection, if any.
pub fn node_at<'a>(doc: &'a [Block], selection: &EditorSelection) -> Option<&'a InlineNode> {
    doc.get(selection.block_index)?
        .content
        .get(selection.inline_index)
}

#[cfg(test)]
mod tests {
    use super::{
        cursor_offset, point_at_offset, sync_surface, to_model, to_surface, EditableSurface,
        FlatCursor, MemorySurface, SurfacePoint,
    };
    use crate::markup::dom::parse_fragment;
    use crate::model::content::{Block, InlineNode};
    use crate::model::selection::EditorSelection;

    const MIXED: &str =
        r#"<p>first</p><p>ab<span class="widget tag" data-tag="t">#t</span>cd</p>"#;

    #[test]
    fn text_anchor_maps_both_ways() {
        let root = parse_fragment(MIXED);
        let point = SurfacePoint::new(vec![1, 2], 1);
        let selection = to_model(&root, &point).expect("anchor inside block");
        assert_eq!(selection, EditorSelection::new(1, 2, 1));
        assert_eq!(to_surface(&root, &selection), Some(point));
    }

    #[test]
    fn anchors_inside_widget_snap_to_its_edges() {
        let root = parse_fragment(MIXED);
        let inside = SurfacePoint::new(vec![1, 1, 0], 1);
        assert_eq!(to_model(&root, &inside), Some(EditorSelection::new(1, 2, 0)));
        let start = SurfacePoint::new(vec![1, 1, 0], 0);
        assert_eq!(to_model(&root, &start), Some(EditorSelection::new(1, 0, 2)));
    }

    #[test]
    fn widget_selection_anchors_on_the_block() {
        let root = parse_fragment(MIXED);
        assert_eq!(
            to_surface(&root, &EditorSelection::new(1, 1, 0)),
            Some(SurfacePoint::new(vec![1], 1))
        );
        assert_eq!(
            to_surface(&root, &EditorSelection::new(1, 1, 1)),
            Some(SurfacePoint::new(vec![1], 2))
        );
    }

    #[test]
    fn unresolvable_coordinates_return_none() {
        let root = parse_fragment(MIXED);
        assert_eq!(to_surface(&root, &EditorSelection::new(7, 0, 0)), None);
        assert_eq!(to_surface(&root, &EditorSelection::new(0, 3, 0)), None);
        assert_eq!(to_model(&root, &SurfacePoint::new(vec![9, 0], 0)), None);
    }

    #[test]
    fn placeholder_does_not_count() {
        let root = parse_fragment("<p>&#8203;</p>");
        assert_eq!(
            cursor_offset(&root, &SurfacePoint::new(vec![0, 0], 1)),
            Some(FlatCursor {
                block_index: 0,
                offset: 0
            })
        );
        assert_eq!(
            point_at_offset(&root, 0, 0),
            Some(SurfacePoint::new(vec![0, 0], 0))
        );
    }

    #[test]
    fn nested_formatting_is_measured_through() {
        let root = parse_fragment("<p>a<b>bc</b>d</p>");
        let point = SurfacePoint::new(vec![0, 1, 0], 1);
        assert_eq!(to_model(&root, &point), Some(EditorSelection::new(0, 0, 2)));
        assert_eq!(
            point_at_offset(&root, 0, 2),
            Some(SurfacePoint::new(vec![0, 1, 0], 1))
        );
    }

    #[test]
    fn sync_writes_only_when_markup_differs() {
        let doc = vec![Block::new(vec![InlineNode::text("hi")])];
        let mut surface = MemorySurface::new("");
        assert!(sync_surface(&mut surface, &doc));
        assert!(!sync_surface(&mut surface, &doc));
        assert_eq!(surface.writes(), 1);
        assert_eq!(surface.markup(), "<p>hi</p>");
    }
}
