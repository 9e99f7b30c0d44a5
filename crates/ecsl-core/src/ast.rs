use serde::Serialize;

/// Key of a section inside a node body. `Default` is the section that
/// collects children seen before any label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum SectionLabel {
    Default,
    Named(String),
}

impl SectionLabel {
    pub fn named(label: impl Into<String>) -> Self {
        SectionLabel::Named(label.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SectionLabel::Default => None,
            SectionLabel::Named(label) => Some(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    /// Decoded from a quoted literal.
    String(String),
    /// Unquoted scalar (number, bare identifier), kept as written.
    Raw(String),
    /// Attribute written without `=`.
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub label: SectionLabel,
    pub nodes: Vec<Node>,
}

/// Ordered label -> nodes mapping. Re-inserting a label replaces its nodes
/// in place, keeping the position of the first insertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Sections(Vec<Section>);

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: SectionLabel, nodes: Vec<Node>) {
        match self.0.iter_mut().find(|s| s.label == label) {
            Some(section) => section.nodes = nodes,
            None => self.0.push(Section { label, nodes }),
        }
    }

    pub fn get(&self, label: &SectionLabel) -> Option<&[Node]> {
        self.0
            .iter()
            .find(|s| &s.label == label)
            .map(|s| s.nodes.as_slice())
    }

    /// Shorthand for looking up a named section.
    pub fn named(&self, label: &str) -> Option<&[Node]> {
        self.0
            .iter()
            .find(|s| s.label.as_str() == Some(label))
            .map(|s| s.nodes.as_slice())
    }

    pub fn default_section(&self) -> Option<&[Node]> {
        self.get(&SectionLabel::Default)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.0.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &SectionLabel> {
        self.0.iter().map(|s| &s.label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Sections {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub sections: Sections,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            sections: Sections::new(),
        }
    }

    /// Set an attribute, replacing an earlier value of the same name in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: AttrValue) {
        let name = name.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// Children of the default section, or an empty slice.
    pub fn children(&self) -> &[Node] {
        self.sections.default_section().unwrap_or(&[])
    }

    /// Number of nodes in this subtree, this node included.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .sections
            .iter()
            .flat_map(|s| s.nodes.iter())
            .map(Node::subtree_len)
            .sum::<usize>()
    }
}

/// Result of a top-level parse: the root-level sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub sections: Sections,
}

impl Document {
    /// First node of the default section, conventionally the document root.
    pub fn root(&self) -> Option<&Node> {
        self.sections.default_section().and_then(|nodes| nodes.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_replace_in_place() {
        let mut sections = Sections::new();
        sections.insert(SectionLabel::named("a"), vec![Node::new("x")]);
        sections.insert(SectionLabel::named("b"), vec![Node::new("y")]);
        sections.insert(SectionLabel::named("a"), vec![Node::new("z")]);

        let labels: Vec<Option<&str>> = sections.labels().map(|l| l.as_str()).collect();
        assert_eq!(labels, vec![Some("a"), Some("b")]);
        assert_eq!(sections.named("a").unwrap()[0].name, "z");
    }

    #[test]
    fn test_default_label_is_not_empty_string() {
        let mut sections = Sections::new();
        sections.insert(SectionLabel::named(""), vec![Node::new("x")]);
        assert!(sections.default_section().is_none());
        assert_eq!(sections.named("").unwrap().len(), 1);
    }

    #[test]
    fn test_set_attribute_keeps_first_position() {
        let mut node = Node::new("a");
        node.set_attribute("x", AttrValue::String("1".into()));
        node.set_attribute("y", AttrValue::Absent);
        node.set_attribute("x", AttrValue::Raw("2".into()));

        assert_eq!(node.attributes[0].name, "x");
        assert_eq!(node.attribute("x"), Some(&AttrValue::Raw("2".into())));
        assert_eq!(node.attributes.len(), 2);
    }

    #[test]
    fn test_subtree_len_counts_every_section() {
        let mut inner = Node::new("b");
        inner.sections.insert(SectionLabel::Default, vec![Node::new("c")]);
        let mut node = Node::new("a");
        node.sections.insert(SectionLabel::Default, vec![inner]);
        node.sections.insert(SectionLabel::named("s"), vec![Node::new("d"), Node::new("e")]);

        assert_eq!(node.subtree_len(), 5);
        assert_eq!(Node::new("x").subtree_len(), 1);
    }

    #[test]
    fn test_serialize_shape() {
        let mut node = Node::new("a");
        node.set_attribute("n", AttrValue::Raw("42".into()));
        node.sections.insert(SectionLabel::Default, vec![Node::new("b")]);

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["attributes"][0]["value"]["type"], "raw");
        assert_eq!(json["attributes"][0]["value"]["value"], "42");
        assert!(json["sections"][0]["label"].is_null());
        assert_eq!(json["sections"][0]["nodes"][0]["name"], "b");
    }
}
