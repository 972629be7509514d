//! Generic trees with ordered children and the text formats built on them.
//!
//! Two representations share the read-only [`Tree`] navigation contract:
//!
//! - [`TreeNode`], a mutable tree supporting attach/detach/replace of whole sub-trees;
//! - [`FlatTreeNode`], an immutable breadth-first array encoding of a tree.
//!
//! Both can be written and read in the [parentheses](parentheses) format, and
//! [`FormulaParser`] builds trees from token streams using operator precedence.
//!
//! ## Example
//!
//! ```rust
//! use arbor_tree::{Path, Tree, TreeFormatter, TreeNode};
//!
//! let mut tree = TreeNode::parse("add(mul(x,y),1)").unwrap();
//! let x = tree.root().child_at_path(&Path::of(&[0, 0])).unwrap();
//! assert_eq!(x.path(), Path::of(&[0, 0]));
//! assert_eq!(x.level(), 2);
//!
//! tree.replace_at_path(&Path::of(&[1]), TreeNode::parse("neg(z)").unwrap());
//! assert_eq!(TreeFormatter::Lisp.format(tree.root()), "(add (mul x y) (neg z))");
//!
//! let flat = tree.flatten();
//! assert!(flat.root().tree_eq(tree.root()));
//! ```
mod error;
mod flat;
pub mod formatter;
pub mod formula;
pub mod lexer;
pub mod math;
mod node;
pub mod parentheses;
mod tree;

pub use error::TreeError;
pub use flat::FlatNode;
pub use flat::FlatTreeNode;
pub use formatter::TreeFormatter;
pub use formula::FormulaError;
pub use formula::FormulaParser;
pub use formula::TokenCategory;
pub use lexer::LexerError;
pub use node::Node;
pub use node::NodeId;
pub use node::TreeNode;
pub use parentheses::ParseError;
pub use tree::Tree;
pub use tree::iter;
pub use tree::path::Path;
