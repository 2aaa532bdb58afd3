//! A minimal read-only document tree.
//!
//! Card location only needs to walk parents, scan descendants, and read tag
//! names, attributes and text. [`Node`] captures exactly that, so the locator
//! can be exercised against hand-built trees as well as parsed pages.
//! [`Document`] is the production implementation: an arena flattened from a
//! `scraper::Html` parse, with nodes stored in document order.

/// One node of a read-only document tree.
///
/// Element nodes report a lower-case [`tag`](Node::tag); text nodes report
/// [`text`](Node::text). The document root reports neither.
pub trait Node<'a>: Copy {
    fn parent(self) -> Option<Self>;

    /// Child nodes in document order.
    fn children(self) -> impl Iterator<Item = Self> + 'a;

    fn tag(self) -> Option<&'a str>;

    fn attr(self, name: &str) -> Option<&'a str>;

    fn text(self) -> Option<&'a str>;
}

/// Pre-order descendants of `node`, excluding `node` itself.
pub fn descendants<'a, N: Node<'a>>(node: N) -> Vec<N> {
    let mut out = Vec::new();
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(next) = stack.pop() {
        out.push(next);
        let mut children: Vec<N> = next.children().collect();
        children.reverse();
        stack.extend(children);
    }
    out
}

/// First descendant element with the given tag.
pub fn find_descendant<'a, N: Node<'a>>(node: N, tag: &str) -> Option<N> {
    descendants(node)
        .into_iter()
        .find(|n| n.tag().is_some_and(|t| t.eq_ignore_ascii_case(tag)))
}

/// Trimmed, non-empty descendant text fragments in document order.
pub fn text_fragments<'a, N: Node<'a>>(node: N) -> Vec<&'a str> {
    descendants(node)
        .into_iter()
        .filter_map(Node::text)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whitespace-separated tokens of the `class` attribute.
pub fn class_tokens<'a, N: Node<'a>>(node: N) -> impl Iterator<Item = &'a str> {
    node.attr("class").unwrap_or("").split_whitespace()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

#[derive(Debug)]
enum NodeData {
    Root,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug)]
struct Slot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Arena-backed document. Comments, doctypes and processing instructions are
/// dropped while flattening.
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
}

impl Document {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let parsed = scraper::Html::parse_document(html);
        let mut slots: Vec<Slot> = Vec::new();

        let mut stack = vec![(parsed.tree.root(), None::<NodeId>)];
        while let Some((node, parent)) = stack.pop() {
            let data = match node.value() {
                scraper::Node::Document | scraper::Node::Fragment => NodeData::Root,
                scraper::Node::Element(el) => NodeData::Element {
                    tag: el.name().to_ascii_lowercase(),
                    attrs: el
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                },
                scraper::Node::Text(text) => NodeData::Text(String::from(&**text)),
                _ => continue,
            };

            let id = NodeId(slots.len());
            slots.push(Slot {
                parent,
                children: Vec::new(),
                data,
            });
            if let Some(NodeId(p)) = parent {
                slots[p].children.push(id);
            }

            for child in node.children().rev() {
                stack.push((child, Some(id)));
            }
        }

        Self { slots }
    }

    /// `None` only for an empty arena, which `parse` never produces.
    #[must_use]
    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.node(NodeId(0))
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.slots.len()).then_some(NodeRef { doc: self, id })
    }

    /// Every text node in document order.
    pub fn text_nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot.data, NodeData::Text(_)))
            .map(move |(idx, _)| NodeRef {
                doc: self,
                id: NodeId(idx),
            })
    }

    fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.0]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Node<'a> for NodeRef<'a> {
    fn parent(self) -> Option<Self> {
        let doc = self.doc;
        doc.slot(self.id).parent.map(|id| NodeRef { doc, id })
    }

    fn children(self) -> impl Iterator<Item = Self> + 'a {
        let doc = self.doc;
        doc.slot(self.id)
            .children
            .iter()
            .map(move |&id| NodeRef { doc, id })
    }

    fn tag(self) -> Option<&'a str> {
        match &self.doc.slot(self.id).data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    fn attr(self, name: &str) -> Option<&'a str> {
        match &self.doc.slot(self.id).data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    fn text(self) -> Option<&'a str> {
        match &self.doc.slot(self.id).data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}
