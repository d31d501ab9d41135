use crate::cxx::parser::{Dialect, ParsedUnit};
use crate::source::FunctionNode;
use tree_sitter::Node;

/// Declarator kinds that name a function rather than a pointer to one.
const FUNCTION_NAME_KINDS: &[&str] = &[
    "identifier",
    "field_identifier",
    "qualified_identifier",
    "destructor_name",
    "operator_name",
    "template_function",
];

/// Declarators that wrap the function declarator without changing what is
/// declared (`int *f(void)`, `int &f(void)`).
const WRAPPER_KINDS: &[&str] = &[
    "pointer_declarator",
    "reference_declarator",
    "attributed_declarator",
];

const PARAMETER_KINDS: &[&str] = &[
    "parameter_declaration",
    "optional_parameter_declaration",
    "variadic_parameter_declaration",
];

/// Find every function declaration and definition in a unit.
///
/// Bodies of definitions are searched too, so a block-scope declaration or a
/// local class member is reported after the definition that encloses it.
pub fn collect_functions(unit: &ParsedUnit) -> Vec<FunctionNode> {
    let c_dialect = unit.dialect() == Dialect::C;
    let mut walker = Walker {
        unit,
        c_dialect,
        functions: Vec::new(),
    };
    walker.visit(unit.root_node(), c_dialect);
    walker.functions
}

struct Walker<'a> {
    unit: &'a ParsedUnit,
    /// Every function in a C file, `static` ones included, is treated as C
    /// linkage.
    c_dialect: bool,
    functions: Vec<FunctionNode>,
}

impl Walker<'_> {
    fn visit(&mut self, node: Node<'_>, extern_c: bool) {
        let extern_c = match node.kind() {
            "function_definition" => {
                self.definition(node, extern_c);
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit(body, extern_c);
                }
                return;
            }
            "type_definition" => return,
            "declaration" | "field_declaration" => {
                self.declaration(node, extern_c);
                extern_c
            }
            "linkage_specification" => self.c_dialect || self.is_c_linkage(node),
            // Members keep C++ linkage inside extern "C" blocks
            "class_specifier" | "struct_specifier" | "union_specifier" => self.c_dialect,
            _ => extern_c,
        };

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, extern_c);
        }
    }

    fn is_c_linkage(&self, node: Node<'_>) -> bool {
        node.child_by_field_name("value")
            .map(|value| self.unit.node_text(value) == "\"C\"")
            .unwrap_or(false)
    }

    fn definition(&mut self, node: Node<'_>, extern_c: bool) {
        let Some(declarator) = node.child_by_field_name("declarator") else {
            return;
        };
        let Some((name, params)) = self.function_parts(declarator) else {
            return;
        };

        self.functions.push(FunctionNode {
            name,
            param_count: parameter_count(params, self.unit),
            is_definition: true,
            is_extern_c: extern_c,
            begin: self.unit.begin_location(node),
            end: self.unit.end_location(node),
        });
    }

    fn declaration(&mut self, node: Node<'_>, extern_c: bool) {
        let mut cursor = node.walk();
        let declarators: Vec<Node<'_>> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();

        for (index, declarator) in declarators.into_iter().enumerate() {
            let Some((name, params)) = self.function_parts(declarator) else {
                continue;
            };
            // Later declarators of `int a(void), b(void);` start at their own
            // name so spans of one statement never overlap.
            let begin_node = if index == 0 { node } else { declarator };

            self.functions.push(FunctionNode {
                name,
                param_count: parameter_count(params, self.unit),
                is_definition: false,
                is_extern_c: extern_c,
                begin: self.unit.begin_location(begin_node),
                end: self.unit.end_location(declarator),
            });
        }
    }

    /// Unwrap a declarator down to the name and parameter list of a function.
    ///
    /// Conversion operators (`operator bool(void)`, `S::operator int(void)`)
    /// have no function declarator; their parameters hang off the abstract
    /// declarator inside `operator_cast`.
    fn function_parts<'t>(&self, declarator: Node<'t>) -> Option<(String, Node<'t>)> {
        let mut current = declarator;
        while WRAPPER_KINDS.contains(&current.kind()) {
            current = match current.child_by_field_name("declarator") {
                Some(inner) => inner,
                None => last_named_child(current)?,
            };
        }

        if let Some(cast) = operator_cast(current) {
            let ty = cast.child_by_field_name("type")?;
            let params = cast
                .child_by_field_name("declarator")
                .filter(|d| d.kind() == "abstract_function_declarator")?
                .child_by_field_name("parameters")?;
            let scope = self
                .unit
                .source()
                .get(current.start_byte()..cast.start_byte())
                .unwrap_or_default();
            let name = format!("{}operator {}", scope, self.unit.node_text(ty));
            return Some((name, params));
        }

        if current.kind() != "function_declarator" {
            return None;
        }

        let name = current.child_by_field_name("declarator")?;
        if !FUNCTION_NAME_KINDS.contains(&name.kind()) {
            return None;
        }
        let params = current.child_by_field_name("parameters")?;
        Some((self.unit.node_text(name).to_string(), params))
    }
}

/// The `operator_cast` naming a conversion function, looking through any
/// `S::` qualifiers in front of it.
fn operator_cast(declarator: Node<'_>) -> Option<Node<'_>> {
    let mut current = declarator;
    while current.kind() == "qualified_identifier" {
        current = current.child_by_field_name("name")?;
    }
    (current.kind() == "operator_cast").then_some(current)
}

fn last_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let last = node.named_children(&mut cursor).last();
    last
}

/// Number of declared parameters. A lone unnamed `void` declares none.
fn parameter_count(params: Node<'_>, unit: &ParsedUnit) -> usize {
    let mut cursor = params.walk();
    let declared: Vec<Node<'_>> = params
        .named_children(&mut cursor)
        .filter(|child| PARAMETER_KINDS.contains(&child.kind()))
        .collect();

    if let [only] = declared.as_slice() {
        let is_void = only.kind() == "parameter_declaration"
            && only.child_by_field_name("declarator").is_none()
            && only
                .child_by_field_name("type")
                .map(|ty| unit.node_text(ty) == "void")
                .unwrap_or(false);
        if is_void {
            return 0;
        }
    }

    declared.len()
}
