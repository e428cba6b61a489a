use snippet_bundle::{import_names, scan_file_blocks, SnippetBundle};

fn bundles() -> Vec<SnippetBundle> {
    let mains = [
        "",
        "export default () => <div />;",
        "export default () => <div />;\n",
        "\n\nconst x = 1;\n\n",
        "import { Card } from \"./card\";\n\nexport default function Hero() {\n  return <Card />;\n}\n",
        "   // leading comment\nexport default 1;",
    ];
    let file_sets: [&[(&str, &str)]; 4] = [
        &[],
        &[("card.tsx", "export const Card = () => <div className=\"p-4\" />;")],
        &[
            ("z.ts", "export const z = 1;\n"),
            ("a.tsx", ""),
            ("styles.css", ".a {\n  color: red;\n}"),
        ],
        &[("empty-lines.tsx", "\n\n\n")],
    ];

    let mut bundles = Vec::new();
    for main in mains {
        for files in file_sets {
            bundles.push(SnippetBundle::from_parts(main, files.iter().copied()).unwrap());
        }
    }
    bundles
}

#[test]
fn test_parse_serialize_round_trip() {
    for bundle in bundles() {
        let text = bundle.serialize();
        assert_eq!(SnippetBundle::parse(&text), bundle, "round trip of {text:?}");
    }
}

#[test]
fn test_trailing_carriage_return_survives() {
    for content in ["a\r", "\r", "x\r\n", "one\r\ntwo\r"] {
        let bundle = SnippetBundle::from_parts("main();", [("notes.txt", content)]).unwrap();
        let parsed = SnippetBundle::parse(&bundle.serialize());
        assert_eq!(parsed.file("notes.txt"), Some(content), "{content:?}");
    }

    // Hand-written CRLF sections drop the whole terminator
    let parsed = SnippetBundle::parse("// @snippet-file a.ts\r\nx\r\n// @snippet-file-end\r\nmain();");
    assert_eq!(parsed.file("a.ts"), Some("x"));
}

#[test]
fn test_serialized_import_block_lists_sorted_files() {
    for bundle in bundles() {
        let scan = scan_file_blocks(&bundle.serialize());
        let expected: Vec<String> = bundle.file_names().map(str::to_string).collect();
        assert_eq!(import_names(&scan.main_source), expected);
        assert_eq!(scan.has_file_blocks, bundle.has_files());
    }
}

#[test]
fn test_line_map_covers_expanded_document() {
    for bundle in bundles() {
        let scan = scan_file_blocks(&bundle.serialize());
        let map = scan.line_map();

        assert!(map.is_contiguous(), "gaps in {:?}", scan.segments);
        assert_eq!(
            map.total_lines() as usize,
            scan.expanded_source.lines().count()
        );

        let expanded = bundle.expand();
        assert_eq!(expanded.source, scan.expanded_source);
        assert_eq!(expanded.line_map.segments(), scan.segments.as_slice());
    }
}

#[test]
fn test_every_file_line_resolves() {
    for bundle in bundles() {
        let expanded = bundle.expand();
        for (name, content) in bundle.files() {
            let lines = content.lines().count() as u32;
            for line in 1..=lines {
                let expanded_line = expanded
                    .line_map
                    .expanded_line(Some(name), line)
                    .unwrap();
                let resolved = expanded.line_map.resolve(expanded_line, 1).unwrap();
                assert_eq!(resolved.file.as_deref(), Some(name.as_str()));
                assert_eq!(resolved.line, line);
            }
        }
    }
}
