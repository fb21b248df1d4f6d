//! Materialized document tree.
//!
//! Nodes live in an index-based arena owned by [`Document`]. Parent links are
//! plain [`NodeId`]s, so the tree has back-references without reference
//! cycles, and a node detached from its parent stays in the arena and can be
//! attached again.
//!
//! # Example
//!
//! ```
//! use tagstream_core::tree::Document;
//!
//! let doc = Document::parse("<article author='jo'><h1>Hello</h1>Some text.</article>").unwrap();
//!
//! for node in doc.root().children() {
//!     if let Some(el) = node.as_element() {
//!         assert_eq!(el.name(), "article");
//!         assert_eq!(el.attr("author"), Some("jo"));
//!     }
//! }
//! assert_eq!(doc.root().all_text(), "HelloSome text.");
//! ```

use std::fmt;

use crate::error::{Diagnostic, Error, NodeRef, TreeError};
use crate::event::EventKind;
use crate::parser::{Parser, ParserOptions};

// ============================================================================
// Core Types
// ============================================================================

/// Index into the document's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        NodeRef(id.0)
    }
}

/// Internal node storage.
#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// The kind of node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root document container.
    Document,

    /// `<name attr="value">...</name>` or `<name/>`.
    Element {
        name: String,
        /// In source order, names unique.
        attributes: Vec<Attribute>,
        /// Written as `<name/>`.
        self_closing: bool,
    },

    /// Character data, entities decoded. CDATA sections become text too.
    Text(String),

    /// `<!-- ... -->`
    Comment(String),
}

impl NodeKind {
    fn can_have_children(&self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element { .. })
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Document
// ============================================================================

/// A parsed document as a tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only its root.
    pub fn new() -> Self {
        Document {
            nodes: vec![NodeData {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId::new(0),
        }
    }

    /// Parse a complete input with default options.
    ///
    /// The first diagnostic fails the parse. Use
    /// [`parse_recovering`](Self::parse_recovering) to keep going.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut parser = Parser::with_tree(ParserOptions::default());
        parser.feed(input)?.close()?;
        Ok(parser.into_document().unwrap_or_default())
    }

    /// Parse a complete input, building the best tree the input allows.
    pub fn parse_recovering(input: &str, options: ParserOptions) -> (Self, Vec<Diagnostic>) {
        let mut parser = Parser::with_tree(options);
        parser.on(EventKind::Error, |_| Ok(()));
        if let Err(err) = parser.feed(input).and_then(|p| p.close()) {
            log::debug!(target: "tagstream::tree", "recovering parse stopped: {err}");
        }
        let (document, diagnostics) = parser.into_parts();
        (document.unwrap_or_default(), diagnostics)
    }

    /// Get the root node.
    pub fn root(&self) -> Node<'_> {
        Node { doc: self, id: self.root }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Make `id` the root. It is detached from its parent first.
    pub fn set_root(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        self.detach(id);
        self.root = id;
        Ok(())
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<Node<'_>> {
        if self.contains(id) {
            Some(Node { doc: self, id })
        } else {
            None
        }
    }

    /// True if `id` was allocated by this document.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Number of nodes in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[self.root.index()].children.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.index()).map(|n| &n.kind)
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    /// Child IDs of `id`; empty for leaves and unknown IDs.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.index()).map_or(&[], |n| n.children.as_slice())
    }

    /// Serialize the whole document back to markup.
    pub fn to_markup(&self) -> String {
        crate::serialize::to_string(self, self.root)
    }

    // ---- Mutation ----

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: impl Into<String>, attributes: Vec<Attribute>) -> NodeId {
        self.alloc(NodeKind::Element {
            name: name.into(),
            attributes,
            self_closing: false,
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    /// Create a detached comment.
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment(text.into()))
    }

    /// Allocate a node directly under `parent`. Used while parsing.
    pub(crate) fn append_new(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind);
        self.nodes[id.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Append `child` as the last child of `parent`, detaching it from its
    /// current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let len = self.children_of(parent).len();
        self.insert_child(parent, len, child)
    }

    /// Insert `child` at `index` (clamped) among `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        let mut index = index;
        let old_parent = self.parent_of(child);
        if let Some(old) = self.detach(child) {
            // Moving within the same parent shifts later positions down by one.
            if old_parent == Some(parent) && old < index {
                index -= 1;
            }
        }
        let children = &mut self.nodes[parent.index()].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    /// Remove `id` from its parent's children. Returns the index it had, or
    /// `None` if it was not attached.
    pub fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        let siblings = &mut self.nodes[parent.index()].children;
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.remove(index);
        self.nodes[id.index()].parent = None;
        Some(index)
    }

    /// Put `new` in `old`'s place under `parent`. `old` ends up detached.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        self.check(old)?;
        if old == new {
            return Ok(());
        }
        self.check_insert(parent, new)?;
        if self.parent_of(old) != Some(parent) {
            return Err(TreeError::NotAChild {
                parent: parent.into(),
                child: old.into(),
            });
        }
        self.detach(new);
        let siblings = &mut self.nodes[parent.index()].children;
        let Some(index) = siblings.iter().position(|&c| c == old) else {
            return Err(TreeError::NotAChild {
                parent: parent.into(),
                child: old.into(),
            });
        };
        siblings[index] = new;
        self.nodes[old.index()].parent = None;
        self.nodes[new.index()].parent = Some(parent);
        Ok(())
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }

    fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(TreeError::InvalidNode(id.into()))
        }
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check(parent)?;
        self.check(child)?;
        let parent_ok = self.nodes[parent.index()].kind.can_have_children();
        if !parent_ok || child == self.root || self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::HierarchyRequest {
                parent: parent.into(),
                child: child.into(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Node (navigation handle)
// ============================================================================

/// A handle for navigating the document tree.
#[derive(Clone, Copy)]
pub struct Node<'doc> {
    doc: &'doc Document,
    id: NodeId,
}

impl<'doc> Node<'doc> {
    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the node's kind.
    pub fn kind(&self) -> &'doc NodeKind {
        &self.data().kind
    }

    fn data(&self) -> &'doc NodeData {
        &self.doc.nodes[self.id.index()]
    }

    /// Get the parent node, if any.
    pub fn parent(&self) -> Option<Node<'doc>> {
        self.data().parent.map(|id| Node { doc: self.doc, id })
    }

    /// Iterate over child nodes.
    pub fn children(&self) -> impl Iterator<Item = Node<'doc>> + 'doc {
        let doc = self.doc;
        self.data().children.iter().map(move |&id| Node { doc, id })
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// Get the first child node.
    pub fn first_child(&self) -> Option<Node<'doc>> {
        self.data().children.first().map(|&id| Node { doc: self.doc, id })
    }

    /// Get the last child node.
    pub fn last_child(&self) -> Option<Node<'doc>> {
        self.data().children.last().map(|&id| Node { doc: self.doc, id })
    }

    /// Get the next sibling node.
    pub fn next_sibling(&self) -> Option<Node<'doc>> {
        let parent_id = self.data().parent?;
        let siblings = &self.doc.nodes[parent_id.index()].children;
        let pos = siblings.iter().position(|&id| id == self.id)?;
        siblings.get(pos + 1).map(|&id| Node { doc: self.doc, id })
    }

    /// Get the previous sibling node.
    pub fn prev_sibling(&self) -> Option<Node<'doc>> {
        let parent_id = self.data().parent?;
        let siblings = &self.doc.nodes[parent_id.index()].children;
        let pos = siblings.iter().position(|&id| id == self.id)?;
        pos.checked_sub(1).map(|p| Node { doc: self.doc, id: siblings[p] })
    }

    /// Check if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self.kind(), NodeKind::Element { .. })
    }

    /// Check if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self.kind(), NodeKind::Text(_))
    }

    /// Get element view if this is an element.
    pub fn as_element(&self) -> Option<ElementView<'doc>> {
        if let NodeKind::Element { .. } = self.kind() {
            Some(ElementView { node: *self })
        } else {
            None
        }
    }

    /// Get text content if this is a text node.
    pub fn text_content(&self) -> Option<&'doc str> {
        if let NodeKind::Text(s) = self.kind() {
            Some(s)
        } else {
            None
        }
    }

    /// All text content under this node, in document order.
    pub fn all_text(&self) -> String {
        let mut result = String::new();
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            match self.doc.kind(id) {
                Some(NodeKind::Text(s)) => result.push_str(s),
                Some(NodeKind::Comment(_)) | None => {}
                Some(_) => stack.extend(self.doc.children_of(id).iter().rev()),
            }
        }
        result
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", self.kind())
            .finish()
    }
}

// ============================================================================
// ElementView (typed access to elements)
// ============================================================================

/// A typed view for element nodes.
#[derive(Clone, Copy)]
pub struct ElementView<'doc> {
    node: Node<'doc>,
}

impl<'doc> ElementView<'doc> {
    /// Get the underlying node.
    pub fn node(&self) -> Node<'doc> {
        self.node
    }

    /// Get the element name.
    pub fn name(&self) -> &'doc str {
        match self.node.kind() {
            NodeKind::Element { name, .. } => name,
            _ => "",
        }
    }

    /// All attributes in source order.
    pub fn attributes(&self) -> &'doc [Attribute] {
        match self.node.kind() {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Get an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&'doc str> {
        self.attributes()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn is_self_closing(&self) -> bool {
        matches!(self.node.kind(), NodeKind::Element { self_closing: true, .. })
    }

    /// Iterate over child nodes.
    pub fn children(&self) -> impl Iterator<Item = Node<'doc>> + 'doc {
        self.node.children()
    }
}

impl fmt::Debug for ElementView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementView")
            .field("name", &self.name())
            .field("attributes", &self.attributes())
            .finish()
    }
}
