use crate::ast::*;
use crate::config::RenderOptions;
use crate::literal;
use std::fmt;

/// Render a single node and its sections as ECSL markup.
pub fn render(node: &Node, options: &RenderOptions) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0, options.indent);
    out
}

/// Render every top-level section of a document, one node per line.
/// Named top-level sections get a `label:` header and indented nodes.
pub fn render_document(doc: &Document, options: &RenderOptions) -> String {
    let mut out = String::new();
    for section in &doc.sections {
        let depth = match &section.label {
            SectionLabel::Default => 0,
            SectionLabel::Named(label) => {
                out.push_str(label);
                out.push_str(":\n");
                1
            }
        };
        for node in &section.nodes {
            push_indent(&mut out, depth, options.indent);
            write_node(&mut out, node, depth, options.indent);
            out.push('\n');
        }
    }
    out
}

fn write_node(out: &mut String, node: &Node, depth: usize, indent: usize) {
    out.push('<');
    out.push_str(&node.name);
    for attr in &node.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        write_value(out, &attr.value);
    }

    if node.sections.is_empty() {
        out.push_str(if node.attributes.is_empty() { "/>" } else { " />" });
        return;
    }

    out.push('>');
    for section in &node.sections {
        let child_depth = match &section.label {
            SectionLabel::Default => depth + 1,
            SectionLabel::Named(label) => {
                out.push('\n');
                push_indent(out, depth + 1, indent);
                out.push_str(label);
                out.push(':');
                depth + 2
            }
        };
        for child in &section.nodes {
            out.push('\n');
            push_indent(out, child_depth, indent);
            write_node(out, child, child_depth, indent);
        }
    }
    out.push('\n');
    push_indent(out, depth, indent);
    out.push_str("</");
    out.push_str(&node.name);
    out.push('>');
}

fn write_value(out: &mut String, value: &AttrValue) {
    match value {
        AttrValue::String(s) => {
            out.push('=');
            out.push_str(&literal::encode(s));
        }
        AttrValue::Raw(raw) => {
            // Raw text is written verbatim, so pick a quote it does not contain.
            let quote = if raw.contains('"') { '\'' } else { '"' };
            out.push_str("=v");
            out.push(quote);
            out.push_str(raw);
            out.push(quote);
        }
        AttrValue::Absent => {}
    }
}

fn push_indent(out: &mut String, depth: usize, indent: usize) {
    out.extend(std::iter::repeat(' ').take(depth * indent));
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self, &RenderOptions::default()))
    }
}
