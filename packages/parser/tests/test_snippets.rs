use snippet_parser::{parse, visitor::walk_element, Element, ElementKind, Visitor};

#[derive(Default)]
struct Collect {
    elements: Vec<(Option<String>, ElementKind)>,
}

impl Visitor for Collect {
    fn visit_element(&mut self, element: &Element) {
        self.elements.push((element.name.clone(), element.kind));
        walk_element(self, element);
    }
}

fn element_names(source: &str) -> Vec<String> {
    let doc = parse(source).expect("parse");
    let mut collect = Collect::default();
    collect.visit_document(&doc);
    collect
        .elements
        .into_iter()
        .map(|(name, _)| name.unwrap_or_else(|| "<>".to_string()))
        .collect()
}

#[test]
fn test_marketing_card() {
    let source = r#"
import { Button } from "./button";

export default function PromoCard({ title, items }: { title: string; items: string[] }) {
  const accent = items.length > 2 ? "bg-primary" : "bg-muted";
  return (
    <div className={`rounded-lg p-6 ${accent}`} style={{ translate: "4px 8px" }}>
      <h2 className="text-2xl font-bold">{title}</h2>
      {items.length > 0 && (
        <ul>
          {items.map((item, i) => (
            <li key={i}>{item}</li>
          ))}
        </ul>
      )}
      <Button label="Shop now" />
    </div>
  );
}
"#;
    assert_eq!(element_names(source), vec!["div", "h2", "ul", "li", "Button"]);
}

#[test]
fn test_markup_through_conditionals_arrays_and_sequences() {
    let source = r#"
const a = flag ? <A /> : <B />;
const b = value || <C />;
const c = [<D key="d" />, <E key="e" />];
const d = (setup(), <F />);
"#;
    assert_eq!(element_names(source), vec!["A", "B", "C", "D", "E", "F"]);
}

#[test]
fn test_object_methods_and_class_bodies() {
    let source = r#"
const slots = {
  header() { return <header />; },
  footer: () => <footer />,
  ["main"]: function () { return <main />; },
};
class Panel {
  render = () => <aside />;
}
"#;
    assert_eq!(element_names(source), vec!["header", "footer", "main", "aside"]);
}

#[test]
fn test_fragment_kind() {
    let doc = parse("export const X = () => <><i /></>;").unwrap();
    let mut collect = Collect::default();
    collect.visit_document(&doc);
    assert_eq!(collect.elements[0], (None, ElementKind::Fragment));
    assert_eq!(collect.elements[1], (Some("i".to_string()), ElementKind::Element));
}

#[test]
fn test_partial_document_keeps_prefix() {
    // The user is mid-edit: the last element is not closed yet
    let source = r#"
export default function Hero() {
  return (
    <section>
      <h1>Hello</h1>
      <p className="text-
"#;
    let doc = parse(source).unwrap();
    assert!(doc.has_errors());
    let mut collect = Collect::default();
    collect.visit_document(&doc);
    let names: Vec<_> = collect.elements.iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(
        names,
        vec![Some("section".into()), Some("h1".into()), Some("p".into())]
    );
}

#[test]
fn test_typescript_noise_is_skipped() {
    let source = r#"
interface Props { size?: "sm" | "lg" }
type Tone = "warm" | "cool";
enum Mode { A, B }
export function Badge({ size = "sm" }: Props): JSX.Element {
  const tone = getTone() as Tone;
  const ref = useRef<HTMLDivElement | null>(null);
  return <span data-size={size!} ref={ref}>{tone satisfies Tone}</span>;
}
"#;
    let doc = parse(source).unwrap();
    assert!(doc.errors.is_empty(), "{:?}", doc.errors);
    assert_eq!(element_names(source), vec!["span"]);
}
