use crate::entities::{escape_attribute, escape_text};
use crate::types::{Node, is_rawtext_element, is_void_element};

/// Serialize nodes the way `innerHTML` would.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, false, &mut out);
    }
    out
}

enum Step<'a> {
    Node(&'a Node, bool),
    End(&'a str),
}

pub fn write_node(node: &Node, in_rawtext: bool, out: &mut String) {
    let mut stack = vec![Step::Node(node, in_rawtext)];
    while let Some(step) = stack.pop() {
        let (node, in_rawtext) = match step {
            Step::End(name) => {
                write_end_tag(name, out);
                continue;
            }
            Step::Node(node, in_rawtext) => (node, in_rawtext),
        };
        match node {
            Node::Text { text } => {
                if in_rawtext {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            Node::Comment { text } => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Node::Element {
                name,
                attributes,
                children,
            } => {
                write_start_tag(name, attributes, out);
                if is_void_element(name) {
                    continue;
                }
                let rawtext = is_rawtext_element(name);
                stack.push(Step::End(name));
                stack.extend(children.iter().rev().map(|child| Step::Node(child, rawtext)));
            }
        }
    }
}

pub fn write_start_tag(name: &str, attributes: &[(String, Option<String>)], out: &mut String) {
    out.push('<');
    out.push_str(name);
    for (attr, value) in attributes {
        out.push(' ');
        out.push_str(attr);
        if let Some(value) = value {
            out.push_str("=\"");
            escape_attribute(value, out);
            out.push('"');
        } else {
            out.push_str("=\"\"");
        }
    }
    out.push('>');
}

pub fn write_end_tag(name: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}
