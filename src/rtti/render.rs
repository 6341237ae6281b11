//! Box-drawing rendering of an inheritance map

use crate::core::types::InheritanceMap;
use std::collections::HashSet;

/// Suffix of a class whose bases were already drawn further up
pub const REPEAT_MARKER: &str = " [...]";

struct Frame<'a> {
    name: &'a str,
    prefix: String,
    last: bool,
    is_root: bool,
}

/// Renders `map` as an indented tree starting at `root`.
///
/// The root line has no prefix and there is no trailing newline. The bases
/// of a class are drawn at its first occurrence only; later occurrences of a
/// class that has bases get `REPEAT_MARKER` and are not descended into.
/// Shared bases and cycles therefore cost one line per edge.
pub fn render_tree(root: &str, map: &InheritanceMap) -> String {
    let mut lines = Vec::new();
    let mut expanded: HashSet<&str> = HashSet::new();
    let mut stack = vec![Frame {
        name: root,
        prefix: String::new(),
        last: true,
        is_root: true,
    }];

    while let Some(frame) = stack.pop() {
        let repeat = map.has_children(frame.name) && !expanded.insert(frame.name);
        let marker = if repeat { REPEAT_MARKER } else { "" };

        let child_prefix = if frame.is_root {
            lines.push(format!("{}{}", frame.name, marker));
            String::new()
        } else {
            let (branch, continuation) = if frame.last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            lines.push(format!("{}{}{}{}", frame.prefix, branch, frame.name, marker));
            format!("{}{}", frame.prefix, continuation)
        };

        if repeat {
            continue;
        }

        let children = map.children(frame.name);
        // Reverse push so the first child is rendered first
        for (i, child) in children.iter().enumerate().rev() {
            stack.push(Frame {
                name: child,
                prefix: child_prefix.clone(),
                last: i + 1 == children.len(),
                is_root: false,
            });
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_node() {
        let map = InheritanceMap::new();
        assert_eq!(render_tree("Leaf", &map), "Leaf");
    }

    #[test]
    fn test_diamond() {
        let mut map = InheritanceMap::new();
        map.add_edge("D", "B1");
        map.add_edge("D", "B2");
        map.add_edge("B1", "A");
        map.add_edge("B2", "A");

        let expected = "\
D
├── B1
│   └── A
└── B2
    └── A";
        assert_eq!(render_tree("D", &map), expected);
    }

    #[test]
    fn test_nested_continuation() {
        let mut map = InheritanceMap::new();
        map.add_edge("Root", "Left");
        map.add_edge("Root", "Right");
        map.add_edge("Left", "L1");
        map.add_edge("Left", "L2");
        map.add_edge("L1", "Deep");

        let expected = "\
Root
├── Left
│   ├── L1
│   │   └── Deep
│   └── L2
└── Right";
        assert_eq!(render_tree("Root", &map), expected);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut map = InheritanceMap::new();
        map.add_edge("A", "B");
        map.add_edge("B", "A");

        assert_eq!(render_tree("A", &map), "A\n└── B\n    └── A [...]");
    }

    #[test]
    fn test_shared_subtree_drawn_once() {
        let mut map = InheritanceMap::new();
        map.add_edge("Top", "Left");
        map.add_edge("Top", "Right");
        map.add_edge("Left", "Shared");
        map.add_edge("Right", "Shared");
        map.add_edge("Shared", "Base");

        let expected = "\
Top
├── Left
│   └── Shared
│       └── Base
└── Right
    └── Shared [...]";
        assert_eq!(render_tree("Top", &map), expected);
    }

    #[test]
    fn test_stacked_diamonds_stay_linear() {
        // Each level doubles the number of root-to-bottom paths
        let mut map = InheritanceMap::new();
        let levels = 24;
        for level in 0..levels {
            let top = format!("T{}", level);
            let (left, right) = (format!("L{}", level), format!("R{}", level));
            let bottom = format!("T{}", level + 1);
            map.add_edge(&top, &left);
            map.add_edge(&top, &right);
            map.add_edge(&left, &bottom);
            map.add_edge(&right, &bottom);
        }

        let rendered = render_tree("T0", &map);
        let line_count = rendered.lines().count();
        assert!(line_count <= 1 + map.len() * 2 * 2, "{} lines", line_count);
        assert!(rendered.contains("└── T24"));
        assert!(rendered.contains("└── T1 [...]"));
    }
}
