//! Accelerated and reference scans must agree on every document in the corpus.

use std::sync::Arc;

use snippet_engine::{
    AccelError, AcceleratorModule, Engine, EngineConfig, ModuleLoader, Operation, ScanBackend,
};
use snippet_editor::InspectIndex;

const CORPUS: &[(&str, &str)] = &[
    ("empty", ""),
    ("plain text", "just some words\nwithout markup\n"),
    (
        "hero",
        r#"export default function Hero() {
  return (
    <section className="flex flex-col items-center gap-6 p-12">
      <h1 className="text-5xl font-bold">Summer Sale</h1>
      <p className="text-lg">Up to 50% off everything</p>
      <a href="/shop" className="rounded-md px-6 py-3">Shop now</a>
    </section>
  );
}
"#,
    ),
    (
        "fragment",
        "export default () => (\n  <>\n    <i>a</i>\n    <b>b</b>\n  </>\n);\n",
    ),
    (
        "file blocks",
        r#"// @snippet-file Badge.tsx
export const Badge = ({ label }) => <span className="px-2 text-xs">{label}</span>;
// @snippet-file-end
// @snippet-file theme.css
.badge { color: red; }
// @snippet-file-end
export default function App() {
  return (
    <main className="flex gap-4">
      <Badge label="New" />
      <p>Hello {"world"}</p>
    </main>
  );
}
"#,
    ),
    (
        "dangling file block",
        "export default () => <div />;\n// @snippet-file Open.tsx\nexport const Open = 1;\n",
    ),
    (
        "security",
        r#"export default function Risky({ html }) {
  const token = localStorage.getItem("t");
  eval(token);
  return <div dangerouslySetInnerHTML={{ __html: html }} />;
}
"#,
    ),
    (
        "expressions",
        r#"export default function List({ items, open }) {
  const ready = items.length > 0 && open;
  return (
    <ul className="space-y-2">
      {items.map((item) => (
        <li key={item.id} className="rounded p-2">{item.label}</li>
      ))}
      {ready ? <em>Ready</em> : null}
    </ul>
  );
}
"#,
    ),
    (
        "generic arrow",
        "const id = <T,>(x: T) => x;\nexport default () => <div className=\"p-4\">{id(1)}</div>;\n",
    ),
    (
        "generic function type",
        "type Fn = <T>(x: T) => T;\nexport default () => <span className=\"text-xs\" />;\n",
    ),
    (
        "object method",
        "const card = {\n  render() {\n    return <div className=\"rounded p-2\">Card</div>;\n  },\n};\n",
    ),
    (
        "conditional arrow",
        "const pick = (on) => on ? <b>On</b> : <i>Off</i>;\nexport default () => <p>{pick(true)}</p>;\n",
    ),
    (
        "method inside a container",
        "export default () => <ul>{({ render() { return <b>x</b>; } }).render()}</ul>;\n",
    ),
    (
        "arrow inside a conditional",
        "export default () => <p>{open ? () => <b>x</b> : <i>y</i>}</p>;\n",
    ),
    (
        "block comments",
        "/* <div> eval(x) */\nexport default () => (\n  <div className=\"flex\">{/* fetch(y) */}</div>\n);\n",
    ),
    (
        "apostrophes",
        "export default () => (\n  <p className=\"text-sm\">Don't {eval(\"x\")} it's</p>\n);\n",
    ),
    (
        "interpolated strings",
        "const c = `gap-2 ${wide ? 'px-4' : 'javascript:void(0)'}`;\nexport default () => <div className={c} />;\n",
    ),
];

/// Element bodies dropped into each statement context
const BODIES: &[&str] = &[
    "<div className=\"p-4 flex\">Hello</div>",
    "<a href=\"javascript:void(0)\">{eval(\"x\")}</a>",
    "<p>Don't {`gap-2 ${on ? 'px-1' : ''}`}</p>",
    "<ul>{items.map((item) => <li key={item}>{item}</li>)}</ul>",
    "<>{/* note */}<b>b</b></>",
];

const CONTEXTS: &[&str] = &[
    "export default () => (\n  BODY\n);\n",
    "export default function App() {\n  return BODY;\n}\n",
    "const view = ready ? BODY : null;\n",
    "const card = {\n  render() {\n    return BODY;\n  },\n};\n",
    "const wrap = <T,>(x: T) => BODY;\n",
];

fn nested_divs(depth: usize) -> String {
    format!(
        "export default () => {}x{};\n",
        "<div>".repeat(depth),
        "</div>".repeat(depth)
    )
}

fn generated() -> Vec<(String, String)> {
    let mut documents = Vec::new();
    for (c, context) in CONTEXTS.iter().enumerate() {
        for (b, body) in BODIES.iter().enumerate() {
            documents.push((format!("context {c} body {b}"), context.replace("BODY", body)));
        }
    }
    for depth in [snippet_parser::MAX_ELEMENT_DEPTH, snippet_parser::MAX_ELEMENT_DEPTH + 1, 5000] {
        documents.push((format!("{depth} nested elements"), nested_divs(depth)));
    }
    documents
}

fn all_documents() -> Vec<(String, String)> {
    CORPUS
        .iter()
        .map(|(name, source)| (name.to_string(), source.to_string()))
        .chain(generated())
        .collect()
}

/// Deep documents recurse further than the default test stack allows in
/// unoptimized builds
fn with_large_stack(test: impl FnOnce() + Send + 'static) {
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(test)
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn accelerated_scans_match_reference() {
    with_large_stack(assert_parity);
}

fn assert_parity() {
    let accelerated = Engine::new(EngineConfig::default());
    let reference = Engine::reference(EngineConfig::default());

    for (name, source) in &all_documents() {
        let source = source.as_str();
        let (blocks, backend) = accelerated.scan_file_blocks_with_backend(source);
        assert_eq!(backend, ScanBackend::Accelerator, "{name}");
        assert_eq!(blocks, reference.scan_file_blocks(source), "file blocks: {name}");
        assert_eq!(
            accelerated.scan_class_candidates(source),
            reference.scan_class_candidates(source),
            "class candidates: {name}"
        );
        assert_eq!(
            accelerated.scan_security(source),
            reference.scan_security(source),
            "security: {name}"
        );
        assert_eq!(
            accelerated.build_inspect_index(source),
            reference.build_inspect_index(source),
            "inspect index: {name}"
        );
    }
}

#[test]
fn deep_markup_has_no_index() {
    with_large_stack(|| {
        let accelerated = Engine::new(EngineConfig::default());
        let limit = snippet_parser::MAX_ELEMENT_DEPTH;
        assert!(!accelerated.build_inspect_index(&nested_divs(limit)).is_empty());
        for depth in [limit + 1, 5000] {
            assert!(accelerated.build_inspect_index(&nested_divs(depth)).is_empty());
        }
    });
}

#[test]
fn reference_engine_matches_free_functions() {
    let engine = Engine::reference(EngineConfig::default());
    for (name, source) in CORPUS {
        assert_eq!(
            engine.scan_file_blocks(source),
            snippet_bundle::scan_file_blocks(source),
            "{name}"
        );
        assert_eq!(engine.build_inspect_index(source), InspectIndex::build(source), "{name}");
    }
}

struct FailingLoader;

impl ModuleLoader for FailingLoader {
    fn load(&self) -> Result<Arc<dyn AcceleratorModule>, AccelError> {
        Err(AccelError::Load("module not found".to_string()))
    }
}

#[test]
fn failed_load_falls_back_and_cools_down() {
    let engine = Engine::with_loader(EngineConfig::default(), Arc::new(FailingLoader));
    let (_, source) = CORPUS[4];

    let (scan, backend) = engine.scan_file_blocks_with_backend(source);
    assert_eq!(backend, ScanBackend::Reference);
    assert_eq!(scan, snippet_bundle::scan_file_blocks(source));
    assert!(matches!(
        engine.accelerator().module(),
        Err(AccelError::CoolingDown { .. })
    ));
    assert_eq!(
        engine.accelerator().last_error(),
        Some(AccelError::Load("module not found".to_string()))
    );
}

struct TruncatingModule;

impl AcceleratorModule for TruncatingModule {
    fn name(&self) -> &str {
        "truncating"
    }

    fn has_export(&self, _export: &str) -> bool {
        true
    }

    fn call(&self, operation: Operation, source: &str) -> Result<Vec<u8>, AccelError> {
        let mut output = snippet_accel::run(operation, source);
        output.truncate(output.len() / 2);
        Ok(output)
    }
}

struct TruncatingLoader;

impl ModuleLoader for TruncatingLoader {
    fn load(&self) -> Result<Arc<dyn AcceleratorModule>, AccelError> {
        Ok(Arc::new(TruncatingModule))
    }
}

#[test]
fn truncated_output_falls_back() {
    let engine = Engine::with_loader(EngineConfig::default(), Arc::new(TruncatingLoader));
    let (_, source) = CORPUS[4];
    let (scan, backend) = engine.scan_file_blocks_with_backend(source);
    assert_eq!(backend, ScanBackend::Reference);
    assert_eq!(scan, snippet_bundle::scan_file_blocks(source));
}
