//! Generates an ASCII representation of the selected files' directory tree.

use std::collections::BTreeMap;

/// A utility struct for generating an ASCII directory tree.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeGenerator;

/// A transient trie node; a node with children renders as a directory.
#[derive(Debug, Default)]
struct TreeNode {
    children: BTreeMap<String, TreeNode>,
}

impl TreeGenerator {
    /// Renders `/`-separated relative paths as a tree rooted at `.`.
    ///
    /// Siblings are sorted by name; nodes that have children get a trailing `/`.
    /// The result has no trailing newline.
    pub fn generate_tree<S: AsRef<str>>(relative_paths: &[S]) -> String {
        let mut root = TreeNode::default();
        for path in relative_paths {
            let mut current = &mut root;
            for part in path.as_ref().split('/').filter(|part| !part.is_empty()) {
                current = current.children.entry(part.to_string()).or_default();
            }
        }

        let mut lines = vec![".".to_string()];
        Self::render_children(&root, "", &mut lines);
        lines.join("\n")
    }

    fn render_children(node: &TreeNode, prefix: &str, lines: &mut Vec<String>) {
        let count = node.children.len();
        for (i, (name, child)) in node.children.iter().enumerate() {
            let is_last = i == count - 1;
            let connector = if is_last { "└── " } else { "├── " };
            let suffix = if child.children.is_empty() { "" } else { "/" };
            lines.push(format!("{prefix}{connector}{name}{suffix}"));

            if !child.children.is_empty() {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };
                Self::render_children(child, &new_prefix, lines);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_tree_rendering() {
        let tree = TreeGenerator::generate_tree(&[
            "src/main.py",
            "src/utils/helpers.py",
            "README.md",
            "db/schema1.sql",
            "src/app.py",
        ]);

        insta::assert_snapshot!(tree, @r"
        .
        ├── README.md
        ├── db/
        │   └── schema1.sql
        └── src/
            ├── app.py
            ├── main.py
            └── utils/
                └── helpers.py
        ");
    }

    #[test]
    fn test_single_file_and_empty_input() {
        assert_eq!(TreeGenerator::generate_tree(&["a.py"]), ".\n└── a.py");
        assert_eq!(TreeGenerator::generate_tree::<&str>(&[]), ".");
    }

    #[test]
    fn test_shared_prefixes_are_merged() {
        let tree = TreeGenerator::generate_tree(&["a/b.py", "a/c.py", "a/b.py"]);
        assert_eq!(tree, ".\n└── a/\n    ├── b.py\n    └── c.py");
    }
}
