#![no_main]

use html::{AllowlistSanitizer, Node, Sanitizer, SanitizerConfig, parse_fragment};
use libfuzzer_sys::fuzz_target;

fn check(nodes: &[Node], config: &SanitizerConfig) {
    for node in nodes {
        if let Node::Element {
            name, attributes, ..
        } = node
        {
            assert!(config.allowed_tags.contains(name), "kept <{name}>");
            for (attr, _) in attributes {
                assert!(!attr.starts_with("on"), "kept {name}[{attr}]");
            }
        }
        check(node.children(), config);
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let sanitizer = AllowlistSanitizer::default();
    let Ok(clean) = sanitizer.sanitize(input) else {
        return;
    };
    if let Ok(nodes) = parse_fragment(&clean) {
        check(&nodes, sanitizer.config());
    }
});
