//! Depth-first tree walker with in-place editing.
//!
//! [`walk`] calls [`Visitor::enter`] on a node before its children and
//! [`Visitor::leave`] after them. From either callback the visitor can ask the
//! walker, through the [`WalkContext`], to skip the children, remove the node,
//! replace it or stop the walk altogether.
//!
//! ```
//! use tagstream_core::tree::{Document, NodeKind};
//! use tagstream_core::walk::{walk, FnVisitor};
//!
//! let mut doc = Document::parse("<ul><li>a</li><!-- drop --><li>b</li></ul>").unwrap();
//! let root = doc.root_id();
//! walk(&mut doc, root, &mut FnVisitor::on_enter(|cx, visit| {
//!     if matches!(cx.document().kind(visit.node), Some(NodeKind::Comment(_))) {
//!         cx.remove();
//!     }
//! }))
//! .unwrap();
//! assert_eq!(doc.to_markup(), "<ul><li>a</li><li>b</li></ul>");
//! ```
//!
//! # Editing while walking
//!
//! Children are visited by index against the child count taken when the
//! walker reaches the parent:
//!
//! - a node removed through [`WalkContext::remove`] leaves the cursor where it
//!   is, so the sibling that moves into its slot is visited next;
//! - a replacement made through [`WalkContext::replace`] takes the original's
//!   slot and is the node whose children are walked; if it was an earlier
//!   sibling, the cursor moves down with the siblings that follow;
//! - siblings appended past the original count are not visited;
//! - if the list shrinks below the cursor by other means, the walker stops
//!   visiting that list early instead of reading past its end.

use crate::error::TreeError;
use crate::tree::{Document, Node, NodeId};

/// Key reported for nodes reached through a parent's child list.
pub const CHILDREN: &str = "children";

/// Where the walker is: the node, how it was reached, and its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub node: NodeId,
    /// `None` for the node the walk started from.
    pub parent: Option<NodeId>,
    /// `Some("children")` for child nodes, `None` for the starting node.
    pub key: Option<&'static str>,
    /// Position in the parent's child list.
    pub index: Option<usize>,
}

/// Callbacks invoked by [`walk`]. Both default to doing nothing.
pub trait Visitor {
    fn enter(&mut self, cx: &mut WalkContext<'_>, visit: Visit) {
        let _ = (cx, visit);
    }

    fn leave(&mut self, cx: &mut WalkContext<'_>, visit: Visit) {
        let _ = (cx, visit);
    }
}

/// Adapts a pair of closures to [`Visitor`].
pub struct FnVisitor<E, L> {
    enter: E,
    leave: L,
}

type NoOp = fn(&mut WalkContext<'_>, Visit);

fn no_op(_: &mut WalkContext<'_>, _: Visit) {}

impl<E, L> FnVisitor<E, L>
where
    E: FnMut(&mut WalkContext<'_>, Visit),
    L: FnMut(&mut WalkContext<'_>, Visit),
{
    pub fn new(enter: E, leave: L) -> Self {
        Self { enter, leave }
    }
}

impl<E> FnVisitor<E, NoOp>
where
    E: FnMut(&mut WalkContext<'_>, Visit),
{
    pub fn on_enter(enter: E) -> Self {
        Self { enter, leave: no_op }
    }
}

impl<L> FnVisitor<NoOp, L>
where
    L: FnMut(&mut WalkContext<'_>, Visit),
{
    pub fn on_leave(leave: L) -> Self {
        Self { enter: no_op, leave }
    }
}

impl<E, L> Visitor for FnVisitor<E, L>
where
    E: FnMut(&mut WalkContext<'_>, Visit),
    L: FnMut(&mut WalkContext<'_>, Visit),
{
    fn enter(&mut self, cx: &mut WalkContext<'_>, visit: Visit) {
        (self.enter)(cx, visit)
    }

    fn leave(&mut self, cx: &mut WalkContext<'_>, visit: Visit) {
        (self.leave)(cx, visit)
    }
}

/// Requests made by the current callback.
#[derive(Debug, Default)]
struct Requests {
    skip: bool,
    remove: bool,
    replace: Option<NodeId>,
    stop: bool,
}

/// Handed to every visitor callback.
pub struct WalkContext<'d> {
    doc: &'d mut Document,
    requests: Requests,
}

impl<'d> WalkContext<'d> {
    /// Do not descend into the current node's children. Ignored in `leave`.
    pub fn skip(&mut self) {
        self.requests.skip = true;
    }

    /// Detach the current node once the callback returns. In `enter` this
    /// also skips its children and its `leave` call.
    pub fn remove(&mut self) {
        self.requests.remove = true;
    }

    /// Put `node` in the current node's place once the callback returns.
    pub fn replace(&mut self, node: NodeId) {
        self.requests.replace = Some(node);
    }

    /// End the walk once the callback returns.
    pub fn stop(&mut self) {
        self.requests.stop = true;
    }

    pub fn document(&self) -> &Document {
        &*self.doc
    }

    /// Mutable access, e.g. to create replacement nodes.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut *self.doc
    }

    /// Navigation handle for `id`.
    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        self.doc.get(id)
    }
}

/// A node whose children are being walked.
struct Frame {
    visit: Visit,
    /// Index of the next child to visit.
    cursor: usize,
    /// Child count when the node was entered, less walker removals.
    len: usize,
}

enum Entered {
    /// Walk the node's children next (none if skipped).
    Descend(Frame),
    /// The node was removed; its children and `leave` are skipped.
    Removed,
    Stop,
}

enum Flow {
    Continue,
    Stop,
}

/// Walk the subtree under `root` depth-first.
///
/// Returns the node that ends up in `root`'s place: `root` itself, its
/// replacement, or `None` if it was removed. Replacing the document root
/// makes the replacement the new document root.
///
/// The walk keeps its own stack, so tree depth is bounded by memory only.
pub fn walk<V: Visitor + ?Sized>(
    doc: &mut Document,
    root: NodeId,
    visitor: &mut V,
) -> Result<Option<NodeId>, TreeError> {
    if !doc.contains(root) {
        return Err(TreeError::InvalidNode(root.into()));
    }
    let mut walker = Walker {
        cx: WalkContext {
            doc,
            requests: Requests::default(),
        },
        visitor,
        root: Some(root),
    };
    let start = Visit {
        node: root,
        parent: None,
        key: None,
        index: None,
    };
    walker.run(start)?;
    Ok(walker.root)
}

struct Walker<'d, 'v, V: ?Sized> {
    cx: WalkContext<'d>,
    visitor: &'v mut V,
    /// What currently stands in the starting node's place.
    root: Option<NodeId>,
}

impl<V: Visitor + ?Sized> Walker<'_, '_, V> {
    fn run(&mut self, start: Visit) -> Result<(), TreeError> {
        let mut stack = match self.enter(start, None)? {
            Entered::Descend(frame) => vec![frame],
            Entered::Removed | Entered::Stop => return Ok(()),
        };

        while let Some(frame) = stack.last_mut() {
            let node = frame.visit.node;
            let next = if frame.cursor < frame.len {
                self.cx.doc.children_of(node).get(frame.cursor).copied()
            } else {
                None
            };

            if let Some(child) = next {
                let visit = Visit {
                    node: child,
                    parent: Some(node),
                    key: Some(CHILDREN),
                    index: Some(frame.cursor),
                };
                match self.enter(visit, Some(frame))? {
                    Entered::Descend(child) => stack.push(child),
                    Entered::Removed => {}
                    Entered::Stop => return Ok(()),
                }
                continue;
            }

            // Children done (or the list shrank below the cursor).
            let Some(done) = stack.pop() else {
                break;
            };
            if let Flow::Stop = self.leave(done.visit, stack.last_mut())? {
                return Ok(());
            }
        }
        Ok(())
    }

    fn enter(&mut self, mut visit: Visit, mut parent: Option<&mut Frame>) -> Result<Entered, TreeError> {
        self.visitor.enter(&mut self.cx, visit);
        let requests = std::mem::take(&mut self.cx.requests);

        if let Some(new) = requests.replace {
            if self.replace(visit, new)? {
                visit.index = visit.index.map(|i| i.saturating_sub(1));
                if let Some(frame) = parent.as_deref_mut() {
                    frame.cursor = frame.cursor.saturating_sub(1);
                    frame.len = frame.len.saturating_sub(1);
                }
            }
            visit.node = new;
        }
        if requests.remove {
            self.remove(visit);
            // The next sibling moves into this slot: keep the cursor.
            if let Some(frame) = parent {
                frame.len = frame.len.saturating_sub(1);
            }
            return Ok(if requests.stop { Entered::Stop } else { Entered::Removed });
        }
        if requests.stop {
            return Ok(Entered::Stop);
        }

        let len = if requests.skip {
            0
        } else {
            self.cx.doc.children_of(visit.node).len()
        };
        Ok(Entered::Descend(Frame { visit, cursor: 0, len }))
    }

    fn leave(&mut self, mut visit: Visit, mut parent: Option<&mut Frame>) -> Result<Flow, TreeError> {
        self.visitor.leave(&mut self.cx, visit);
        let requests = std::mem::take(&mut self.cx.requests);

        if let Some(new) = requests.replace {
            if self.replace(visit, new)? {
                if let Some(frame) = parent.as_deref_mut() {
                    frame.cursor = frame.cursor.saturating_sub(1);
                    frame.len = frame.len.saturating_sub(1);
                }
            }
            visit.node = new;
        }
        if requests.remove {
            self.remove(visit);
            if let Some(frame) = parent.as_deref_mut() {
                frame.len = frame.len.saturating_sub(1);
            }
        } else if let Some(frame) = parent.as_deref_mut() {
            frame.cursor += 1;
        }
        Ok(if requests.stop { Flow::Stop } else { Flow::Continue })
    }

    /// Put `new` in `visit.node`'s place. Returns true when `new` was an
    /// earlier sibling, so everything from the old slot on moved down one.
    fn replace(&mut self, visit: Visit, new: NodeId) -> Result<bool, TreeError> {
        let doc = &mut *self.cx.doc;
        let old = visit.node;
        log::trace!(target: "tagstream::walk", "replace {old:?} with {new:?}");
        let mut shifted = false;
        if let Some(parent) = doc.parent_of(old) {
            if old != new && doc.parent_of(new) == Some(parent) {
                let siblings = doc.children_of(parent);
                let position = |id: NodeId| siblings.iter().position(|&c| c == id);
                shifted = matches!((position(new), position(old)), (Some(n), Some(o)) if n < o);
            }
            doc.replace_child(parent, old, new)?;
        } else if doc.root_id() == old {
            doc.set_root(new)?;
        } else if !doc.contains(new) {
            return Err(TreeError::InvalidNode(new.into()));
        }
        if visit.parent.is_none() {
            self.root = Some(new);
        }
        Ok(shifted)
    }

    fn remove(&mut self, visit: Visit) {
        let node = visit.node;
        log::trace!(target: "tagstream::walk", "remove {node:?}");
        self.cx.doc.detach(node);
        if visit.parent.is_none() {
            self.root = None;
        }
    }
}
