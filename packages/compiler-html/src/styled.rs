use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Presentational tree produced by rendering a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledContent {
    pub blocks: Vec<StyledNode>,
}

/// Element or text node of the styled surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StyledNode {
    Element {
        tag: String,
        /// Sorted so the serialized surface is deterministic
        attributes: BTreeMap<String, String>,
        children: Vec<StyledNode>,
    },
    Text { content: String },
}

impl StyledNode {
    pub fn element(tag: impl Into<String>) -> Self {
        StyledNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        StyledNode::Text {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let StyledNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: StyledNode) -> Self {
        if let StyledNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<StyledNode>) -> Self {
        if let StyledNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            StyledNode::Element { tag, .. } => Some(tag),
            StyledNode::Text { .. } => None,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            StyledNode::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            StyledNode::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[StyledNode] {
        match self {
            StyledNode::Element { children, .. } => children,
            StyledNode::Text { .. } => &[],
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            StyledNode::Text { content } => out.push_str(content),
            StyledNode::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}
