//! Decoded class hierarchy types shared by both ABIs

use super::platform::Abi;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Parent name to ordered list of direct base-class names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceMap {
    edges: HashMap<String, Vec<String>>,
}

impl InheritanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `child` as a direct base of `parent`.
    ///
    /// Declaration order is kept; a child already listed under the same
    /// parent is not added twice.
    pub fn add_edge(&mut self, parent: &str, child: &str) {
        let children = self.edges.entry(parent.to_string()).or_default();
        if !children.iter().any(|c| c == child) {
            children.push(child.to_string());
        }
    }

    /// Direct bases of `name`, empty when it has none
    pub fn children(&self, name: &str) -> &[String] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `name` has at least one recorded base
    pub fn has_children(&self, name: &str) -> bool {
        !self.children(name).is_empty()
    }

    /// Number of classes with recorded bases
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// How scan results are turned into display lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Name list for MSVC, rendered tree for Itanium
    #[default]
    Auto,
    Tree,
    List,
}

impl FromStr for OutputStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(OutputStyle::Auto),
            "tree" => Ok(OutputStyle::Tree),
            "list" => Ok(OutputStyle::List),
            other => Err(format!("unknown output style: {}", other)),
        }
    }
}

/// Result of one scan: the object's dynamic type and its bases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassHierarchy {
    pub abi: Abi,
    /// Most-derived class
    pub root: String,
    /// Class names in discovery order, root first
    pub names: Vec<String>,
    pub map: InheritanceMap,
}

impl ClassHierarchy {
    /// Creates a hierarchy holding only its root class
    pub fn new(abi: Abi, root: impl Into<String>) -> Self {
        let root = root.into();
        ClassHierarchy {
            abi,
            names: vec![root.clone()],
            root,
            map: InheritanceMap::new(),
        }
    }

    /// Class names in discovery order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Renders the inheritance tree with box-drawing prefixes
    pub fn render_tree(&self) -> String {
        crate::rtti::render::render_tree(&self.root, &self.map)
    }

    /// Display lines for the requested style
    pub fn lines(&self, style: OutputStyle) -> Vec<String> {
        let as_tree = match style {
            OutputStyle::Tree => true,
            OutputStyle::List => false,
            OutputStyle::Auto => self.abi == Abi::Itanium,
        };

        if as_tree {
            self.render_tree().lines().map(str::to_string).collect()
        } else {
            self.names.clone()
        }
    }
}
