use snippet_accel::{blocks, inspect, run, security, Operation};

const COMPONENT: &str = r#"// @snippet-file Badge.tsx
export const Badge = ({ label }) => <span className="px-2 text-xs">{label}</span>;
// @snippet-file-end
export default function App() {
  const token = localStorage.getItem("t");
  return (
    <main className="flex gap-4">
      <Badge label="New" />
      <p>Hello {"world"}</p>
    </main>
  );
}
"#;

#[test]
fn blocks_split_out_files() {
    let scanned = blocks::scan(COMPONENT);
    assert!(scanned.has_file_blocks);
    assert_eq!(scanned.files.len(), 1);
    assert_eq!(scanned.files[0].0, "Badge.tsx");
    assert!(scanned.main.starts_with("export default function App()"));
    // main piece first, then Badge.tsx
    assert_eq!(scanned.segments, vec![(0, 1, 1, 9), (1, 10, 1, 1)]);
}

#[test]
fn security_positions() {
    assert_eq!(security::scan(COMPONENT), vec![("no-storage-access", 5, 17)]);
}

#[test]
fn inspect_entries() {
    let entries = inspect::build(COMPONENT);
    let names: Vec<_> = entries
        .iter()
        .map(|entry| entry.name.map(|(s, e)| &COMPONENT[s..e]).unwrap_or("<>"))
        .collect();
    assert_eq!(names, vec!["span", "main", "Badge", "p"]);
    assert_eq!(entries[2].parent, Some(1));
    assert_eq!(entries[0].parent, None);
    let main_texts: Vec<_> = entries[1]
        .texts
        .iter()
        .map(|&(s, e)| &COMPONENT[s..e])
        .collect();
    assert_eq!(main_texts, vec!["Hello", "world"]);
}

#[test]
fn candidate_records() {
    let out = String::from_utf8(run(Operation::ClassCandidates, COMPONENT)).unwrap();
    assert_eq!(out, "C\tpx-2\nC\ttext-xs\nC\tflex\nC\tgap-4\n");
}
