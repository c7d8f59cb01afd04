//! Minimal page model
//!
//! Arena-backed node tree standing in for the host page: parent links for
//! ancestor walks, an optional hyperlink href per node, and a highlight flag
//! the trigger engine toggles. Node ids are stable for the document's life.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    href: Option<String>,
    highlighted: bool,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Create a document containing only the root node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node { parent: None, href: None, highlighted: false }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Look up a node by creation index (0 = root), as event traces do
    pub fn node_by_index(&self, index: usize) -> Option<NodeId> {
        (index < self.nodes.len()).then_some(NodeId(index))
    }

    /// Append a plain element under `parent`
    pub fn create_element(&mut self, parent: NodeId) -> NodeId {
        self.push(parent, None)
    }

    /// Append a hyperlink anchor under `parent`
    pub fn create_anchor(&mut self, parent: NodeId, href: impl Into<String>) -> NodeId {
        self.push(parent, Some(href.into()))
    }

    fn push(&mut self, parent: NodeId, href: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent: Some(parent), href, highlighted: false });
        id
    }

    /// Walk from `node` up to (not including) the root, returning the first
    /// anchor with an href. O(depth).
    pub fn anchor_ancestor(&self, node: NodeId) -> Option<(NodeId, &str)> {
        let mut current = Some(node);
        while let Some(id) = current {
            let entry = &self.nodes[id.0];
            if entry.parent.is_none() {
                break; // document root is never a link
            }
            if let Some(href) = &entry.href {
                return Some((id, href));
            }
            current = entry.parent;
        }
        None
    }

    pub fn set_highlight(&mut self, node: NodeId, on: bool) {
        self.nodes[node.0].highlighted = on;
    }

    pub fn is_highlighted(&self, node: NodeId) -> bool {
        self.nodes[node.0].highlighted
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_resolution_walks_ancestors() {
        let mut doc = Document::new();
        let anchor = doc.create_anchor(doc.root(), "https://example.org/");
        let span = doc.create_element(anchor);
        let inner = doc.create_element(span);

        let (found, href) = doc.anchor_ancestor(inner).unwrap();
        assert_eq!(found, anchor);
        assert_eq!(href, "https://example.org/");
    }

    #[test]
    fn test_nearest_anchor_wins() {
        let mut doc = Document::new();
        let outer = doc.create_anchor(doc.root(), "https://outer.example/");
        let inner = doc.create_anchor(outer, "https://inner.example/");
        let text = doc.create_element(inner);

        let (found, href) = doc.anchor_ancestor(text).unwrap();
        assert_eq!(found, inner);
        assert_eq!(href, "https://inner.example/");
    }

    #[test]
    fn test_no_anchor_in_chain() {
        let mut doc = Document::new();
        let div = doc.create_element(doc.root());
        let p = doc.create_element(div);
        assert!(doc.anchor_ancestor(p).is_none());
    }

    #[test]
    fn test_root_href_is_ignored() {
        let doc = Document::new();
        assert!(doc.anchor_ancestor(doc.root()).is_none());
    }

    #[test]
    fn test_highlight_flag() {
        let mut doc = Document::new();
        let a = doc.create_anchor(doc.root(), "https://example.org/");
        assert!(!doc.is_highlighted(a));
        doc.set_highlight(a, true);
        assert!(doc.is_highlighted(a));
        doc.set_highlight(a, false);
        assert!(!doc.is_highlighted(a));
    }
}
