#![cfg(feature = "serde")]

use arbor_tree::{FlatTreeNode, Path, Tree, TreeNode};

#[test]
fn test_path_serialization() {
    let path = Path::of(&[0, 2, 1]);
    let json = serde_json::to_string(&path).unwrap();
    assert_eq!(json, "[0,2,1]");
    assert_eq!(serde_json::from_str::<Path>(&json).unwrap(), path);
}

#[test]
fn test_flat_tree_serialization() {
    let tree = TreeNode::parse("0(1(4,5),2(6),3(7(10,11),8,9))").unwrap();
    let flat = tree.flatten();

    let json = serde_json::to_string(&flat).unwrap();
    let restored: FlatTreeNode<String> = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, flat);
    assert!(restored.root().tree_eq(tree.root()));
    assert_eq!(restored.to_tree_node(), tree);
}

#[test]
fn test_flat_tree_rejects_invalid_layout() {
    let cases = [
        r#"{"values":["a"],"child_offsets":[5],"child_counts":[2],"parents":[null]}"#,
        r#"{"values":[],"child_offsets":[],"child_counts":[],"parents":[]}"#,
        r#"{"values":["a","b"],"child_offsets":[1],"child_counts":[1],"parents":[null,0]}"#,
        r#"{"values":["a","b"],"child_offsets":[1,2],"child_counts":[1,0],"parents":[null,1]}"#,
    ];

    for json in cases {
        let error = serde_json::from_str::<FlatTreeNode<String>>(json).unwrap_err();
        assert!(
            error.to_string().starts_with("Invalid flat tree layout"),
            "{json}: {error}"
        );
    }
}

#[test]
fn test_flat_tree_accepts_single_node() {
    let json = r#"{"values":["a"],"child_offsets":[1],"child_counts":[0],"parents":[null]}"#;
    let flat: FlatTreeNode<String> = serde_json::from_str(json).unwrap();
    assert_eq!(flat.to_string(), "a");
    assert_eq!(flat.len(), 1);
}
