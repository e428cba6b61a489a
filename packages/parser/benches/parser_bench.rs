use criterion::{black_box, criterion_group, criterion_main, Criterion};
use snippet_parser::{code_mask, parse};

const HERO: &str = r#"
export default function Hero() {
  return (
    <section className="flex flex-col items-center gap-6 bg-background p-12">
      <h1 className="text-5xl font-bold tracking-tight">Summer Sale</h1>
      <p className="text-lg text-muted-foreground">Up to 50% off everything</p>
      <a href="/shop" className="rounded-md bg-primary px-6 py-3 text-primary-foreground">
        Shop now
      </a>
    </section>
  );
}
"#;

fn large_document() -> String {
    let mut source = String::from("export default function Grid({ items }) {\n  return (\n    <div className=\"grid grid-cols-3\">\n");
    for i in 0..200 {
        source.push_str(&format!(
            "      <article key=\"{i}\" className=\"rounded-lg p-4\" style={{{{ translate: \"{i}px 0px\" }}}}>\n        <h3>{{items[{i}].title}}</h3>\n        {{items[{i}].sale && <span className=\"text-red-500\">Sale</span>}}\n      </article>\n"
        ));
    }
    source.push_str("    </div>\n  );\n}\n");
    source
}

fn parse_hero(c: &mut Criterion) {
    c.bench_function("parse_hero", |b| b.iter(|| parse(black_box(HERO))));
}

fn parse_large(c: &mut Criterion) {
    let source = large_document();
    c.bench_function("parse_large_grid", |b| {
        b.iter(|| parse(black_box(&source)))
    });
}

fn mask_large(c: &mut Criterion) {
    let source = large_document();
    c.bench_function("code_mask_large_grid", |b| {
        b.iter(|| code_mask(black_box(&source)))
    });
}

criterion_group!(benches, parse_hero, parse_large, mask_large);
criterion_main!(benches);
