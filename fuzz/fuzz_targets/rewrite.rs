#![no_main]

use arbitrary::Arbitrary;
use arbor_rewrite::{RuleSet, TreeRewriter};
use itertools::Itertools;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Rule {
    pattern: String,
    template: String,
}

#[derive(Debug, Clone, Arbitrary)]
struct Context {
    rules: Vec<Rule>,
    formula: String,
    limit: u8,
}

fuzz_target!(|context: Context| {
    let text = context
        .rules
        .iter()
        .map(|rule| format!("{} -> {}", rule.pattern, rule.template))
        .join("\n");

    let (Ok(rules), Ok(mut tree)) = (
        RuleSet::parse(&text),
        arbor_tree::math::parse(&context.formula),
    ) else {
        return;
    };

    let limit = usize::from(context.limit);
    assert!(rules.rewrite_limited(&mut tree, limit) <= limit);
});
