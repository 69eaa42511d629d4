//! Generic document tree produced by the item document parser.
//!
//! Nodes carry no item semantics. Accessors on `Mapping` are permissive: a
//! missing key or a value of the wrong shape yields the caller's default so one
//! bad field never aborts an otherwise good document.

pub mod parser;

pub use parser::parse;

#[derive(Debug, Clone, PartialEq)]
/// One value in a parsed document.
pub enum Node {
    /// Raw string content between the quotes; escape sequences are kept verbatim.
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<Node>),
    Map(Mapping),
}

impl Node {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Ordered string-keyed mapping. Keys compare exactly; a repeated key replaces
/// the earlier value in place.
pub struct Mapping {
    entries: Vec<(String, Node)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: Node) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// String value, or `None` when absent or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Node::as_str)
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(Node::Int(value)) => *value,
            _ => default,
        }
    }

    /// Float value; integer nodes are widened.
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Some(Node::Float(value)) => *value,
            Some(Node::Int(value)) => *value as f64,
            _ => default,
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Node::Bool(value)) => *value,
            _ => default,
        }
    }

    /// List elements, or an empty slice when absent or not a list.
    pub fn get_list(&self, key: &str) -> &[Node] {
        self.get(key).and_then(Node::as_list).unwrap_or(&[])
    }

    pub fn get_mapping(&self, key: &str) -> Option<&Mapping> {
        self.get(key).and_then(Node::as_mapping)
    }
}
