use std::fmt::{Display, Write};

use crate::parentheses;
use crate::tree::Tree;

/// Text renderings of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TreeFormatter {
    /// `mul(x,add(y,1))`, see [`parentheses`](crate::parentheses).
    #[default]
    Parentheses,
    /// One node per line, connected with box-drawing characters:
    ///
    /// ```text
    /// mul
    /// ├── x
    /// └── add
    ///     ├── y
    ///     └── 1
    /// ```
    Tree,
    /// `(mul x (add y 1))`
    Lisp,
    /// A Graphviz `digraph` with the given name.
    Dot { name: String },
}

impl TreeFormatter {
    pub fn dot(name: impl Into<String>) -> Self {
        TreeFormatter::Dot { name: name.into() }
    }

    pub fn format<'a, T>(&self, tree: T) -> String
    where
        T: Tree<'a>,
        T::Value: Display,
    {
        self.format_with(tree, |value| value.to_string())
    }

    pub fn format_with<'a, T, F>(&self, tree: T, mut mapper: F) -> String
    where
        T: Tree<'a>,
        F: FnMut(&T::Value) -> String,
    {
        match self {
            TreeFormatter::Parentheses => parentheses::to_string(tree, mapper),
            TreeFormatter::Tree => format_tree(tree, |node| label(node, &mut mapper)),
            TreeFormatter::Lisp => format_lisp(tree, |node| label(node, &mut mapper)),
            TreeFormatter::Dot { name } => format_dot(name, tree, |node| label(node, &mut mapper)),
        }
    }
}

fn label<'a, T, F>(node: T, mapper: &mut F) -> String
where
    T: Tree<'a>,
    F: FnMut(&T::Value) -> String,
{
    node.value().map(mapper).unwrap_or_default()
}

fn format_tree<'a, T: Tree<'a>>(tree: T, mut label: impl FnMut(T) -> String) -> String {
    let mut lines = vec![label(tree)];
    let mut stack: Vec<(T, String, bool)> = tree
        .children()
        .rev()
        .enumerate()
        .map(|(index, child)| (child, String::new(), index == 0))
        .collect();

    while let Some((node, indent, last)) = stack.pop() {
        let branch = if last { "└── " } else { "├── " };
        lines.push(format!("{indent}{branch}{}", label(node)));

        let indent = format!("{indent}{}", if last { "    " } else { "│   " });
        stack.extend(
            node.children()
                .rev()
                .enumerate()
                .map(|(index, child)| (child, indent.clone(), index == 0)),
        );
    }

    lines.join("\n")
}

fn format_lisp<'a, T: Tree<'a>>(tree: T, mut label: impl FnMut(T) -> String) -> String {
    enum Step<T> {
        Node(T),
        Close,
    }

    let mut out = String::new();
    let mut stack = vec![Step::Node(tree)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Node(node) if node.is_leaf() => out.push_str(&label(node)),
            Step::Node(node) => {
                out.push('(');
                out.push_str(&label(node));
                stack.push(Step::Close);
                stack.extend(node.children().rev().map(Step::Node));
            }
            Step::Close => out.push(')'),
        }
        if matches!(stack.last(), Some(Step::Node(_))) {
            out.push(' ');
        }
    }

    out
}

fn format_dot<'a, T: Tree<'a>>(name: &str, tree: T, mut label: impl FnMut(T) -> String) -> String {
    let mut out = format!("digraph {name} {{\n");
    let mut edges = String::new();
    // Preorder walk, carrying the index of each node's parent.
    let mut stack = vec![(tree, None::<usize>)];
    let mut index = 0;

    while let Some((node, parent)) = stack.pop() {
        let _ = writeln!(
            out,
            "    node_{index:03} [label=\"{}\"];",
            label(node).replace('"', "\\\"")
        );
        if let Some(parent) = parent {
            let _ = writeln!(edges, "    node_{parent:03} -> node_{index:03};");
        }
        stack.extend(node.children().rev().map(|child| (child, Some(index))));
        index += 1;
    }

    out.push_str(&edges);
    out.push_str("}\n");
    out
}
