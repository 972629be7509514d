use arbor_rewrite::{TreePattern, TreeRewriteRule, TreeRewriter, rules::ARITHMETIC};
use arbor_tree::TreeNode;

fn main() {
    divan::main();
}

/// `add(add(...add(y,0)...,0),0)` nested `depth` times.
fn nested_zeros(depth: usize) -> TreeNode<String> {
    (0..depth).fold(TreeNode::of("y".to_string()), |tree, _| {
        TreeNode::of("add".to_string())
            .with(tree)
            .with(TreeNode::of("0".to_string()))
    })
}

#[divan::bench]
fn compile_rule() {
    let rule = divan::black_box("mul(add(<x>,<y>),<z>) -> add(mul(<x>,<z>),mul(<y>,<z>))");
    TreeRewriteRule::compile(rule).unwrap();
}

#[divan::bench(args = [8, 64, 256])]
fn match_sub_trees(bencher: divan::Bencher, depth: usize) {
    let pattern = TreePattern::compile("add(<x>,0)").unwrap();
    let tree = nested_zeros(depth);
    bencher.bench(|| pattern.matcher(tree.root()).count());
}

#[divan::bench(args = [8, 64, 256])]
fn rewrite_single_rule(bencher: divan::Bencher, depth: usize) {
    let rule = TreeRewriteRule::compile("add(<x>,0) -> <x>").unwrap();
    bencher
        .with_inputs(|| nested_zeros(depth))
        .bench_local_values(|mut tree| {
            rule.rewrite(&mut tree);
            tree
        });
}

#[divan::bench]
fn rewrite_arithmetic_formula(bencher: divan::Bencher) {
    bencher
        .with_inputs(|| {
            arbor_tree::math::parse("(x - x) * sin(y * 1) + (z + 0) * (z + 0) - 1 * (w ^ 1) / (w ^ 1)")
                .unwrap()
        })
        .bench_local_values(|mut tree| {
            ARITHMETIC.rewrite(&mut tree);
            tree
        });
}
