use crate::ast::*;

/// Visitor pattern for traversing snippet trees immutably
///
/// Default implementations walk the entire tree, markup inside attribute
/// values and function bodies included. Override specific visit_* methods
/// to act on nodes, and call the matching walk_* function to keep descending.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &Element) {
        walk_element(self, element);
    }

    fn visit_function(&mut self, function: &Function) {
        walk_function(self, function);
    }

    fn visit_attribute(&mut self, attribute: &Attribute) {
        walk_attribute(self, attribute);
    }

    fn visit_child(&mut self, child: &Child) {
        walk_child(self, child);
    }

    fn visit_property(&mut self, property: &Property) {
        walk_property(self, property);
    }

    fn visit_string(&mut self, _literal: &StringLiteral) {
        // Leaf node, no children to walk
    }

    fn visit_template(&mut self, template: &TemplateLiteral) {
        walk_template(self, template);
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for node in &doc.body {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    match node {
        Node::Element(element) => visitor.visit_element(element),
        Node::Function(function) => visitor.visit_function(function),
        Node::StringLiteral(literal) => visitor.visit_string(literal),
        Node::TemplateLiteral(template) => visitor.visit_template(template),
        Node::NumberLiteral { .. } | Node::Identifier { .. } => {}
        Node::Object(object) => {
            for property in &object.properties {
                visitor.visit_property(property);
            }
        }
        Node::Array { elements, .. } => {
            for element in elements {
                visitor.visit_node(element);
            }
        }
        Node::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            visitor.visit_node(test);
            visitor.visit_node(consequent);
            visitor.visit_node(alternate);
        }
        Node::Logical { left, right, .. } => {
            visitor.visit_node(left);
            visitor.visit_node(right);
        }
        Node::Sequence { expressions, .. } => {
            for expr in expressions {
                visitor.visit_node(expr);
            }
        }
        Node::Spread { argument, .. } => visitor.visit_node(argument),
        Node::Compound { children, .. } => {
            for child in children {
                visitor.visit_node(child);
            }
        }
    }
}

pub fn walk_element<V: Visitor>(visitor: &mut V, element: &Element) {
    for attribute in &element.attributes {
        visitor.visit_attribute(attribute);
    }
    for child in &element.children {
        visitor.visit_child(child);
    }
}

pub fn walk_function<V: Visitor>(visitor: &mut V, function: &Function) {
    for node in &function.body {
        visitor.visit_node(node);
    }
}

pub fn walk_attribute<V: Visitor>(visitor: &mut V, attribute: &Attribute) {
    match attribute {
        Attribute::Named { value, .. } => match value {
            Some(AttributeValue::String(literal)) => visitor.visit_string(literal),
            Some(AttributeValue::Expression(container)) => {
                if let Some(expr) = &container.expression {
                    visitor.visit_node(expr);
                }
            }
            Some(AttributeValue::Element(element)) => visitor.visit_element(element),
            None => {}
        },
        Attribute::Spread { argument, .. } => visitor.visit_node(argument),
    }
}

pub fn walk_child<V: Visitor>(visitor: &mut V, child: &Child) {
    match child {
        Child::Text { .. } => {}
        Child::Expression(container) => {
            if let Some(expr) = &container.expression {
                visitor.visit_node(expr);
            }
        }
        Child::Element(element) => visitor.visit_element(element),
    }
}

pub fn walk_property<V: Visitor>(visitor: &mut V, property: &Property) {
    match property {
        Property::KeyValue { value, .. } => visitor.visit_node(value),
        Property::Shorthand { .. } => {}
        Property::Spread { argument, .. } => visitor.visit_node(argument),
        Property::Method { function, .. } => visitor.visit_function(function),
    }
}

pub fn walk_template<V: Visitor>(visitor: &mut V, template: &TemplateLiteral) {
    for expr in &template.expressions {
        visitor.visit_node(expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[derive(Default)]
    struct ElementCollector {
        names: Vec<String>,
    }

    impl Visitor for ElementCollector {
        fn visit_element(&mut self, element: &Element) {
            self.names
                .push(element.name.clone().unwrap_or_else(|| "<>".to_string()));
            walk_element(self, element);
        }
    }

    #[test]
    fn test_visits_markup_everywhere() {
        let source = r#"
export default function Card({ items }) {
  const badge = <Badge icon={<Icon />} />;
  return (
    <>
      {items.map((item) => <li key={item}>{item}</li>)}
      {badge}
    </>
  );
}
"#;
        let doc = parse(source).unwrap();
        let mut collector = ElementCollector::default();
        collector.visit_document(&doc);
        assert_eq!(collector.names, vec!["Badge", "Icon", "<>", "li"]);
    }
}
