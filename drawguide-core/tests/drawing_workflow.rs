//! Drawing Workflow Integration Tests
//!
//! Exercises the public core API end to end:
//! - Capturing freehand strokes and shapes
//! - Undo / redo across mixed edits
//! - Importing vectorizer output into a drawing
//! - Saving and reloading drawings through the library

use drawguide_core::{
    process_vector_output, DrawingLibrary, DrawingRecord, Point, StrokeKind, StrokeStore,
    StrokeStyle, Tool,
};
use proptest::prelude::*;

/// Drag a freehand stroke through the given points.
fn drag(store: &mut StrokeStore, tool: Tool, points: &[(f32, f32)]) -> bool {
    let mut iter = points.iter().map(|&(x, y)| Point::new(x, y));
    let Some(first) = iter.next() else {
        return false;
    };
    store.begin_stroke(tool, first);
    let mut last = first;
    for p in iter {
        store.extend_stroke(p);
        last = p;
    }
    store.commit_stroke(last)
}

/// Drag a shape from `start` to `end`.
fn shape(store: &mut StrokeStore, tool: Tool, start: (f32, f32), end: (f32, f32)) -> bool {
    store.begin_stroke(tool, Point::new(start.0, start.1));
    store.extend_stroke(Point::new(end.0, end.1));
    store.commit_stroke(Point::new(end.0, end.1))
}

// ============================================================================
// Capture and History
// ============================================================================

#[test]
fn test_mixed_session_undo_redo() {
    let mut store = StrokeStore::new();
    store.set_style(StrokeStyle {
        color: "#ff0000".to_string(),
        width: 4.0,
    });

    assert!(drag(&mut store, Tool::Brush, &[(0.0, 0.0), (10.0, 5.0), (20.0, 0.0)]));
    assert!(shape(&mut store, Tool::Circle, (50.0, 50.0), (53.0, 54.0)));
    assert!(drag(&mut store, Tool::Eraser, &[(0.0, 0.0), (5.0, 5.0)]));
    assert_eq!(store.elements().len(), 3);
    assert_eq!(store.elements()[2].color, "#ffffff");
    assert_eq!(store.elements()[1].color, "#ff0000");

    let full = store.elements().to_vec();
    assert!(store.undo());
    assert!(store.undo());
    assert_eq!(store.elements().len(), 1);
    assert!(store.redo());
    assert!(store.redo());
    assert!(!store.redo());
    assert_eq!(store.elements(), &full[..]);
}

#[test]
fn test_commit_after_undo_discards_redo_branch() {
    let mut store = StrokeStore::new();
    drag(&mut store, Tool::Brush, &[(0.0, 0.0), (10.0, 0.0)]);
    drag(&mut store, Tool::Brush, &[(0.0, 10.0), (10.0, 10.0)]);
    store.undo();

    shape(&mut store, Tool::Square, (0.0, 0.0), (5.0, 5.0));
    assert!(!store.redo());
    assert_eq!(store.elements().len(), 2);
    assert_eq!(store.elements()[1].tool, Tool::Square);
}

#[test]
fn test_single_point_stroke_never_commits() {
    let mut store = StrokeStore::new();
    assert!(!drag(&mut store, Tool::Brush, &[(3.0, 3.0)]));
    assert!(store.elements().is_empty());
    assert_eq!(store.history().len(), 1);
}

#[test]
fn test_clear_after_five_strokes() {
    let mut store = StrokeStore::new();
    for i in 0..5u8 {
        let y = f32::from(i) * 10.0;
        drag(&mut store, Tool::Brush, &[(0.0, y), (30.0, y)]);
    }
    store.clear();
    assert!(store.elements().is_empty());
    assert_eq!(store.history().len(), 1);
    assert!(!store.undo());
}

// ============================================================================
// Vector Import
// ============================================================================

#[test]
fn test_import_vector_strokes_as_one_step() {
    let mut store = StrokeStore::new();
    drag(&mut store, Tool::Brush, &[(0.0, 0.0), (10.0, 10.0)]);

    let strokes = process_vector_output(
        "M10,10 L200,10 M10,100 C20,120 40,140 60,100 L120,160 M300,300 L301,301",
    )
    .expect("process");
    assert_eq!(strokes.len(), 2);
    assert_eq!(strokes[0].kind, StrokeKind::Line);
    assert_eq!(strokes[1].kind, StrokeKind::Curve);

    assert_eq!(store.merge_external_strokes(&strokes), 2);
    assert_eq!(store.elements().len(), 3);
    assert!(store.undo());
    assert_eq!(store.elements().len(), 1);
}

// ============================================================================
// Library Round Trip
// ============================================================================

#[test]
fn test_saved_drawing_restores_into_fresh_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = DrawingLibrary::with_data_dir(dir.path()).expect("library");

    let mut store = StrokeStore::new();
    drag(&mut store, Tool::Brush, &[(0.0, 0.0), (10.0, 10.0), (20.0, 5.0)]);
    shape(&mut store, Tool::Hexagon, (0.0, 0.0), (40.0, 40.0));
    let strokes = process_vector_output("M0,0 L100,0").expect("process");
    library
        .save(
            "robot",
            DrawingRecord::new(store.elements().to_vec()).with_ai_strokes(&strokes),
        )
        .expect("save");

    let reopened = DrawingLibrary::with_data_dir(dir.path()).expect("library");
    let record = reopened.load("robot").expect("load");
    let mut restored = StrokeStore::new();
    restored.load_elements(record.lines);

    assert_eq!(restored.elements(), store.elements());
    assert_eq!(record.ai_strokes.map(|s| s.len()), Some(1));
    assert!(!restored.undo());
}

// ============================================================================
// Properties
// ============================================================================

fn arb_polyline() -> impl Strategy<Value = Vec<(f32, f32)>> {
    prop::collection::vec((0.0f32..460.0, 0.0f32..460.0), 2..12)
}

proptest! {
    #[test]
    fn prop_undo_then_redo_restores_collection(
        lines in prop::collection::vec(arb_polyline(), 1..8)
    ) {
        let mut store = StrokeStore::new();
        for line in &lines {
            drag(&mut store, Tool::Brush, line);
        }
        let before = store.elements().to_vec();

        prop_assert!(store.undo());
        prop_assert!(store.redo());
        prop_assert_eq!(store.elements(), &before[..]);
    }

    #[test]
    fn prop_history_step_tracks_commits(
        lines in prop::collection::vec(arb_polyline(), 0..8),
        undos in 0usize..10
    ) {
        let mut store = StrokeStore::new();
        for line in &lines {
            drag(&mut store, Tool::Brush, line);
        }
        let mut moved = 0;
        for _ in 0..undos {
            if store.undo() {
                moved += 1;
            }
        }
        prop_assert_eq!(moved, undos.min(lines.len()));
        prop_assert_eq!(store.elements().len(), lines.len() - moved);
    }
}
