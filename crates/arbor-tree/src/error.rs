use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by index based tree access and by the mutation operations
/// of [`TreeNode`](crate::TreeNode).
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum TreeError {
    #[error("Child index is out of bounds: {index} (child count {len})")]
    #[diagnostic(code(arbor_tree::tree::index_out_of_bounds))]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("Node does not belong to this tree")]
    #[diagnostic(code(arbor_tree::tree::node_not_found))]
    NodeNotFound,
    #[error("The root node can't be detached from its own tree")]
    #[diagnostic(
        code(arbor_tree::tree::root_not_detachable),
        help("Use `remove_all_children` or `replace_at_path` with the empty path instead.")
    )]
    RootNotDetachable,
    #[error("Invalid flat tree layout at node {index}: {reason}")]
    #[diagnostic(code(arbor_tree::tree::invalid_layout))]
    InvalidLayout { index: usize, reason: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_codes() {
        let code = |error: TreeError| error.code().map(|code| code.to_string());
        assert_eq!(
            code(TreeError::IndexOutOfBounds { index: 3, len: 1 }).as_deref(),
            Some("arbor_tree::tree::index_out_of_bounds")
        );
        assert_eq!(
            code(TreeError::NodeNotFound).as_deref(),
            Some("arbor_tree::tree::node_not_found")
        );
        assert_eq!(
            code(TreeError::RootNotDetachable).as_deref(),
            Some("arbor_tree::tree::root_not_detachable")
        );
        assert_eq!(
            TreeError::InvalidLayout { index: 2, reason: "children out of range" }.to_string(),
            "Invalid flat tree layout at node 2: children out of range"
        );
    }
}
