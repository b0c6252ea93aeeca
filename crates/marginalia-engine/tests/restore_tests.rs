//! Restoring persisted anchors, including the failure paths

use std::cell::RefCell;
use std::rc::Rc;

use marginalia_engine::{
    CreateOrigin, DocumentTree, EventKind, HighlightError, HighlightEvent, Highlighter,
    HighlighterOptions, NodeAddress, NodeSpec, ParentIndex,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

fn document() -> DocumentTree {
    let spec: NodeSpec = serde_json::from_value(json!({
        "tag": "article",
        "children": [
            { "tag": "h1", "children": ["Title"] },
            { "tag": "p", "children": ["First paragraph."] },
            { "tag": "p", "children": ["Second ", { "tag": "em", "children": ["emphasised"] }, " text."] }
        ]
    }))
    .unwrap();
    DocumentTree::from_spec(&spec).unwrap()
}

fn diagnostics(highlighter: &mut Highlighter) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    highlighter.on_diagnostic(move |error| {
        let kind = match error {
            HighlightError::AnchorSourceRecreate { .. } => "recreate",
            HighlightError::SourceType(_) => "source-type",
            HighlightError::SourceNoneRendered { .. } => "none-rendered",
            HighlightError::EmptySelection { .. } => "empty",
            _ => "other",
        };
        sink.borrow_mut().push(kind.to_string());
    });
    seen
}

fn stored(id: Uuid, tag: &str, index: i64, start: usize, end: usize) -> serde_json::Value {
    json!({
        "id": id,
        "startMeta": { "parentTagName": tag, "parentIndex": index, "textOffset": start },
        "endMeta": { "parentTagName": tag, "parentIndex": index, "textOffset": end },
        "text": "",
        "classNames": "stored"
    })
}

#[test]
fn test_restore_json_skips_malformed_items_and_emits_one_create() {
    let mut tree = document();
    let mut highlighter = Highlighter::new(HighlighterOptions::default());
    let seen = diagnostics(&mut highlighter);
    let creates = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&creates);
    highlighter.on(EventKind::Create, move |event| sink.borrow_mut().push(event.clone()));

    let good = Uuid::new_v4();
    let items = vec![
        stored(good, "p", 1, 0, 6),
        json!({ "id": "not-a-uuid", "text": 42 }),
    ];
    let rendered = highlighter.restore_json(&mut tree, &items);

    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].id(), good);
    assert_eq!(rendered[0].class_names(), &["stored".to_string()]);
    assert_eq!(*seen.borrow(), vec!["source-type"]);
    assert_eq!(
        *creates.borrow(),
        vec![HighlightEvent::Create {
            sources: rendered.clone(),
            origin: CreateOrigin::Store,
        }]
    );
    let wraps = highlighter.wrap_nodes(&tree, Some(good));
    assert_eq!(wraps.len(), 1);
    assert_eq!(tree.text_content(wraps[0]), "Second");
}

#[test]
fn test_unresolvable_anchor_is_reported_but_cached() {
    let mut tree = document();
    let mut highlighter = Highlighter::new(HighlighterOptions::default());
    let seen = diagnostics(&mut highlighter);
    let id = Uuid::new_v4();
    let address = NodeAddress {
        parent_tag_name: "p".to_string(),
        parent_index: ParentIndex::Nth(5),
        text_offset: 0,
    };

    let restored = highlighter.restore(
        &mut tree,
        address.clone(),
        address,
        "gone",
        id,
        &["stored".to_string()],
        None,
    );

    assert!(restored.is_none());
    assert_eq!(*seen.borrow(), vec!["recreate"]);
    assert!(highlighter.cache().contains(&id));
    assert!(highlighter.wrap_nodes(&tree, None).is_empty());
}

#[test]
fn test_offset_past_text_end_is_reported() {
    let mut tree = document();
    let mut highlighter = Highlighter::new(HighlighterOptions::default());
    let seen = diagnostics(&mut highlighter);

    let rendered = highlighter.restore_json(&mut tree, &[stored(Uuid::new_v4(), "h1", 0, 0, 50)]);

    assert!(rendered.is_empty());
    assert_eq!(*seen.borrow(), vec!["recreate"]);
}

#[test]
fn test_root_sentinel_spans_whole_document() {
    let mut tree = document();
    let mut highlighter = Highlighter::new(HighlighterOptions::default());
    let id = Uuid::new_v4();

    let rendered = highlighter.restore_json(&mut tree, &[stored(id, "article", -2, 2, 9)]);

    assert_eq!(rendered.len(), 1);
    let text: String = highlighter
        .wrap_nodes(&tree, Some(id))
        .into_iter()
        .map(|node| tree.text_content(node))
        .collect();
    assert_eq!(text, "tleFirs");
}

#[test]
fn test_remove_all_reports_every_cached_id() {
    let mut tree = document();
    let mut highlighter = Highlighter::new(HighlighterOptions::default());
    let removed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&removed);
    highlighter.on(EventKind::Remove, move |event| sink.borrow_mut().push(event.clone()));
    let mut ids = vec![Uuid::new_v4(), Uuid::new_v4()];
    highlighter.restore_json(
        &mut tree,
        &[stored(ids[0], "p", 0, 0, 5), stored(ids[1], "p", 1, 0, 6)],
    );

    highlighter.remove_all(&mut tree);
    highlighter.remove_all(&mut tree);

    ids.sort();
    assert_eq!(*removed.borrow(), vec![HighlightEvent::Remove { ids }]);
    assert!(highlighter.wrap_nodes(&tree, None).is_empty());
    insta::assert_snapshot!(
        tree.to_markup(tree.root()),
        @"<article><h1>Title</h1><p>First paragraph.</p><p>Second <em>emphasised</em> text.</p></article>"
    );
}
