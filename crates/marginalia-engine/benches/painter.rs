use criterion::{Criterion, criterion_group, criterion_main};
use marginalia_engine::{
    DocumentTree, Highlighter, HighlighterOptions, LiveCoordinate, NodeAddress, ParentIndex,
};
use uuid::Uuid;

// A long document of paragraphs with some inline markup
fn generate_document(paragraphs: usize) -> DocumentTree {
    let mut tree = DocumentTree::new("article");
    let root = tree.root();
    for i in 0..paragraphs {
        let p = tree.append_element(root, "p").unwrap();
        tree.append_text(p, &format!("Paragraph {i} opens with plain text, ")).unwrap();
        let em = tree.append_element(p, "em").unwrap();
        tree.append_text(em, "continues with emphasis").unwrap();
        tree.append_text(p, " and closes with more prose.").unwrap();
    }
    tree
}

fn stored_anchors(paragraphs: usize) -> Vec<serde_json::Value> {
    (0..paragraphs)
        .map(|i| {
            let address = |offset: usize| NodeAddress {
                parent_tag_name: "p".to_string(),
                parent_index: ParentIndex::Nth(i),
                text_offset: offset,
            };
            serde_json::json!({
                "id": Uuid::new_v4(),
                "startMeta": address(5),
                "endMeta": address(40),
                "text": "",
                "classNames": ["bench"]
            })
        })
        .collect()
}

fn bench_painter(c: &mut Criterion) {
    let mut group = c.benchmark_group("painter");
    group.sample_size(10);

    let doc = generate_document(200);
    let anchors = stored_anchors(200);

    group.bench_function("restore_200_anchors", |b| {
        b.iter(|| {
            let mut tree = doc.clone();
            let mut highlighter = Highlighter::new(HighlighterOptions::default());
            let rendered = highlighter.restore_json(&mut tree, std::hint::black_box(&anchors));
            std::hint::black_box(rendered);
        });
    });

    group.bench_function("stacked_overlaps", |b| {
        b.iter(|| {
            let mut tree = DocumentTree::new("p");
            let root = tree.root();
            let leaf = tree.append_text(root, "one span highlighted many times").unwrap();
            let mut highlighter = Highlighter::new(HighlighterOptions::default());
            tree.set_selection(LiveCoordinate::new(leaf, 0), LiveCoordinate::new(leaf, 8));
            let mut ids = Vec::new();
            for _ in 0..50 {
                let mut range = highlighter.capture_selection(&tree).unwrap();
                if let Some(anchor) = highlighter.from_range(&mut tree, &mut range, &[]).unwrap() {
                    ids.push(anchor.id());
                }
            }
            for id in ids {
                highlighter.remove(&mut tree, id);
            }
            std::hint::black_box(&tree);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_painter);
criterion_main!(benches);
