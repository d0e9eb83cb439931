// ABOUTME: ContentNode trait: the tag/attribute/text/children view extraction works against.
// ABOUTME: Implemented for scraper's ElementRef so static and rendered documents share one code path.

use scraper::ElementRef;

/// Classification of a node for content selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Paragraph,
    Heading(u8),
    Link,
    Other,
}

impl NodeKind {
    /// Classify a lowercase tag name.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "p" => NodeKind::Paragraph,
            "a" => NodeKind::Link,
            "h1" => NodeKind::Heading(1),
            "h2" => NodeKind::Heading(2),
            "h3" => NodeKind::Heading(3),
            "h4" => NodeKind::Heading(4),
            "h5" => NodeKind::Heading(5),
            "h6" => NodeKind::Heading(6),
            _ => NodeKind::Other,
        }
    }

    /// Paragraphs, headings and links carry extractable content.
    pub fn is_content(self) -> bool {
        !matches!(self, NodeKind::Other)
    }
}

/// An element in a document tree.
pub trait ContentNode: Sized + Clone {
    /// Lowercase tag name.
    fn tag_name(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&str>;

    /// Concatenated text of the node and its descendants, unnormalized.
    fn text_content(&self) -> String;

    /// Element children in document order.
    fn child_nodes(&self) -> Vec<Self>;

    fn kind(&self) -> NodeKind {
        NodeKind::from_tag(self.tag_name())
    }

    /// True when the class attribute contains `class` as a whole token.
    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map_or(false, |c| c.split_ascii_whitespace().any(|t| t == class))
    }

    /// All element descendants in document (pre-)order, excluding `self`.
    fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = self.child_nodes().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.child_nodes().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// First descendant with the given tag, in document order.
    fn find_first(&self, tag: &str) -> Option<Self> {
        self.descendants().into_iter().find(|n| n.tag_name() == tag)
    }
}

impl<'a> ContentNode for ElementRef<'a> {
    fn tag_name(&self) -> &str {
        self.value().name()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn text_content(&self) -> String {
        self.text().collect()
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.child_elements().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn classifies_tags() {
        assert_eq!(NodeKind::from_tag("p"), NodeKind::Paragraph);
        assert_eq!(NodeKind::from_tag("h3"), NodeKind::Heading(3));
        assert_eq!(NodeKind::from_tag("a"), NodeKind::Link);
        assert_eq!(NodeKind::from_tag("h7"), NodeKind::Other);
        assert!(!NodeKind::from_tag("div").is_content());
    }

    #[test]
    fn descendants_follow_document_order() {
        let doc = Html::parse_document(
            "<html><body><div><p>one <a href='/x'>two</a></p></div><h2>three</h2></body></html>",
        );
        let tags: Vec<String> = doc
            .root_element()
            .descendants()
            .iter()
            .map(|n| n.tag_name().to_string())
            .collect();
        assert_eq!(tags, vec!["head", "body", "div", "p", "a", "h2"]);
    }

    #[test]
    fn class_tokens_match_whole_words() {
        let doc = Html::parse_document(
            "<html><body><div class='main post-content wide'>x</div></body></html>",
        );
        let div = doc.root_element().find_first("div").unwrap();
        assert!(div.has_class("post-content"));
        assert!(!div.has_class("content"));
        assert_eq!(div.text_content(), "x");
    }

    /// A hand-built tree, standing in for a rendered DOM snapshot.
    #[derive(Clone)]
    struct TestNode {
        tag: &'static str,
        text: &'static str,
        children: Vec<TestNode>,
    }

    impl ContentNode for TestNode {
        fn tag_name(&self) -> &str {
            self.tag
        }
        fn attribute(&self, _name: &str) -> Option<&str> {
            None
        }
        fn text_content(&self) -> String {
            let mut s = self.text.to_string();
            for c in &self.children {
                s.push_str(&c.text_content());
            }
            s
        }
        fn child_nodes(&self) -> Vec<Self> {
            self.children.clone()
        }
    }

    #[test]
    fn trait_works_for_other_trees() {
        let tree = TestNode {
            tag: "html",
            text: "",
            children: vec![TestNode {
                tag: "article",
                text: "",
                children: vec![TestNode {
                    tag: "p",
                    text: "hello",
                    children: vec![],
                }],
            }],
        };
        let article = tree.find_first("article").unwrap();
        assert_eq!(article.descendants().len(), 1);
        assert_eq!(article.text_content(), "hello");
    }
}
