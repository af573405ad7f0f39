//! Evaluated CSS tree and its printer.

/// A node of compiled CSS.
#[derive(Debug, Clone, PartialEq)]
pub enum CssNode {
    /// `selectors { declarations }`
    Rule {
        /// Fully expanded selectors.
        selectors: Vec<String>,
        /// `property: value` pairs without the trailing `;`.
        declarations: Vec<String>,
    },
    /// `@prelude { declarations children }`
    Block {
        /// The at-rule header, e.g. `@media screen`.
        prelude: String,
        /// Declarations directly inside the block (`@font-face`).
        declarations: Vec<String>,
        /// Nested rules and blocks.
        children: Vec<CssNode>,
    },
}

impl CssNode {
    /// Returns `true` if printing the node would produce nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            CssNode::Rule { declarations, .. } => declarations.is_empty(),
            CssNode::Block {
                declarations,
                children,
                ..
            } => declarations.is_empty() && children.iter().all(CssNode::is_empty),
        }
    }
}

/// Prints hoisted statements followed by the tree, two-space indented.
pub fn print(statements: &[String], nodes: &[CssNode]) -> String {
    let mut out = String::new();
    for stmt in statements {
        out.push_str(stmt);
        out.push_str(";\n");
    }
    for node in nodes {
        print_node(node, 0, &mut out);
    }
    out
}

fn print_node(node: &CssNode, depth: usize, out: &mut String) {
    if node.is_empty() {
        return;
    }
    let indent = "  ".repeat(depth);
    match node {
        CssNode::Rule {
            selectors,
            declarations,
        } => {
            out.push_str(&indent);
            out.push_str(&selectors.join(&format!(",\n{indent}")));
            out.push_str(" {\n");
            print_declarations(declarations, &indent, out);
        }
        CssNode::Block {
            prelude,
            declarations,
            children,
        } => {
            out.push_str(&format!("{indent}{prelude} {{\n"));
            print_declarations(declarations, &indent, out);
            for child in children {
                print_node(child, depth + 1, out);
            }
        }
    }
    out.push_str(&indent);
    out.push_str("}\n");
}

fn print_declarations(declarations: &[String], indent: &str, out: &mut String) {
    for decl in declarations {
        out.push_str(&format!("{indent}  {decl};\n"));
    }
}
