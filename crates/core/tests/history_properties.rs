use airmark_core::{CommandWrapper, EditorConfig};
use airmark_model::{Annotation, AnnotationKind, Document, Page, Rect};
use proptest::prelude::*;

fn engine_with_pages(pages: usize) -> CommandWrapper {
    CommandWrapper::new(Document::with_blank_pages(pages))
}

/// Compares everything but ids, which are regenerated only for new annotations.
fn rects_on(engine: &CommandWrapper, page: usize) -> Vec<Rect> {
    engine.document().pages[page].annotations.iter().map(|a| a.rect).collect()
}

#[test]
fn add_box_scenario() {
    let mut engine = engine_with_pages(1);

    assert!(engine.execute("AddBoxAnnotation", ["0", "10", "10", "50", "20"]));
    assert!(engine.can_undo());
    assert_eq!(engine.suggested_undo_title(), "Add Box Annotation");
    assert_eq!(rects_on(&engine, 0), vec![Rect::new(10.0, 10.0, 50.0, 20.0)]);

    assert!(engine.undo());
    assert!(rects_on(&engine, 0).is_empty());
    assert!(!engine.can_undo());
    assert!(engine.can_redo());
    assert_eq!(engine.suggested_redo_title(), "Add Box Annotation");
}

#[test]
fn arity_error_scenario() {
    let mut engine = engine_with_pages(1);
    let before = engine.document().clone();

    assert!(!engine.execute("AddBoxAnnotation", ["0", "10", "10"]));
    assert_eq!(engine.document(), &before);
    assert!(!engine.can_undo());
    assert!(!engine.can_redo());
}

#[test]
fn redo_after_undo_restores_each_edit() {
    let mut engine = engine_with_pages(1);
    engine.execute("AddBoxAnnotation", ["0", "0", "0", "10", "10"]);
    engine.execute("AddCircleAnnotation", ["0", "100", "100", "40", "40", "label"]);
    engine.execute("AddTextAnnotation", ["0", "200", "200", "note"]);
    engine.extend_selection_on_page_at_point(0, 5.0, 5.0);
    engine.execute("ChangeSelectedAnnotationText", ["0", "changed"]);
    engine.execute("MoveSelectedAnnotation", ["0", "15", "-5"]);
    engine.execute("DeleteAnnotation", ["0", "110", "110"]);

    let edited = engine.document().clone();
    let depth = engine.undo_count();
    assert_eq!(depth, 6);

    for _ in 0..depth {
        assert!(engine.undo());
    }
    assert_eq!(engine.document(), &Document::with_blank_pages(1));

    for _ in 0..depth {
        assert!(engine.redo());
    }
    assert_eq!(engine.document(), &edited);
}

#[test]
fn change_text_round_trip_restores_contents() {
    let mut engine = engine_with_pages(1);
    engine.execute("AddCircleAnnotation", ["0", "0", "0", "100", "40", "before"]);
    engine.extend_selection_on_page_at_point(0, 50.0, 20.0);

    assert!(engine.execute("ChangeSelectedAnnotationText", ["0", "after"]));
    assert_eq!(engine.selected_contents(), vec![Some("after".to_string())]);

    engine.undo();
    assert_eq!(engine.selected_contents(), vec![Some("before".to_string())]);
    engine.redo();
    assert_eq!(engine.selected_contents(), vec![Some("after".to_string())]);
}

#[test]
fn delete_selected_round_trip_keeps_other_annotations() {
    let mut engine = engine_with_pages(1);
    engine.execute("AddBoxAnnotation", ["0", "0", "0", "10", "10"]);
    engine.execute("AddBoxAnnotation", ["0", "20", "0", "10", "10"]);
    engine.execute("AddBoxAnnotation", ["0", "40", "0", "10", "10"]);
    engine.extend_selection_on_page_at_point(0, 5.0, 5.0);
    engine.extend_selection_on_page_at_point(0, 45.0, 5.0);

    assert!(engine.execute("DeleteSelectedAnnotation", ["0"]));
    assert_eq!(rects_on(&engine, 0), vec![Rect::new(20.0, 0.0, 10.0, 10.0)]);
    assert_eq!(engine.selection_count(), 0);

    engine.undo();
    assert_eq!(rects_on(&engine, 0).len(), 3);
    engine.redo();
    assert_eq!(rects_on(&engine, 0), vec![Rect::new(20.0, 0.0, 10.0, 10.0)]);
}

#[test]
fn undo_keeps_changes_made_while_inhibited() {
    let mut engine = engine_with_pages(1);
    engine.execute("AddBoxAnnotation", ["0", "0", "0", "10", "10"]);
    engine.execute("AddBoxAnnotation", ["0", "100", "100", "10", "10"]);
    engine.extend_selection_on_page_at_point(0, 5.0, 5.0);

    engine.set_inhibited(true);
    assert!(engine.execute("MoveSelectedAnnotation", ["0", "50", "0"]));
    engine.set_inhibited(false);

    assert!(engine.undo());
    assert_eq!(rects_on(&engine, 0), vec![Rect::new(50.0, 0.0, 10.0, 10.0)]);
}

#[test]
fn selection_is_additive_and_deselect_clears() {
    let mut engine = engine_with_pages(2);
    engine.execute("AddBoxAnnotation", ["0", "0", "0", "10", "10"]);
    engine.execute("AddBoxAnnotation", ["1", "0", "0", "10", "10"]);

    assert!(engine.extend_selection_on_page_at_point(0, 5.0, 5.0));
    assert!(engine.extend_selection_on_page_at_point(1, 5.0, 5.0));
    assert!(!engine.extend_selection_on_page_at_point(1, 5.0, 5.0));
    assert!(!engine.extend_selection_on_page_at_point(7, 5.0, 5.0));
    assert_eq!(engine.selection_count(), 2);

    // Moving the selection reaches annotations on every page
    engine.execute("MoveSelectedAnnotation", ["0", "1", "1"]);
    assert_eq!(rects_on(&engine, 1), vec![Rect::new(1.0, 1.0, 10.0, 10.0)]);

    engine.deselect_all();
    assert_eq!(engine.selection_count(), 0);
    assert!(engine.selected_rects().is_empty());
}

#[test]
fn hit_test_prefers_top_most_and_skips_hidden() {
    let mut bottom = Annotation::new(AnnotationKind::Square, Rect::new(0.0, 0.0, 100.0, 100.0));
    bottom.contents = Some("bottom".into());
    let mut hidden = Annotation::new(AnnotationKind::Square, Rect::new(0.0, 0.0, 100.0, 100.0));
    hidden.hidden = true;
    let mut locked = Annotation::new(AnnotationKind::Square, Rect::new(0.0, 0.0, 100.0, 100.0));
    locked.read_only = true;
    let mut middle = Annotation::new(AnnotationKind::Square, Rect::new(0.0, 0.0, 50.0, 50.0));
    middle.contents = Some("middle".into());

    let mut page = Page::default();
    page.annotations = vec![bottom, middle, hidden, locked];
    let mut engine = CommandWrapper::new(Document::new(vec![page]));

    engine.extend_selection_on_page_at_point(0, 50.0, 50.0);
    assert_eq!(engine.selected_contents(), vec![Some("middle".to_string())]);

    engine.deselect_all();
    engine.extend_selection_on_page_at_point(0, 75.0, 75.0);
    assert_eq!(engine.selected_contents(), vec![Some("bottom".to_string())]);
}

#[test]
fn inhibited_drag_coalesces_into_one_entry() {
    let mut engine = engine_with_pages(1);
    engine.execute("AddBoxAnnotation", ["0", "0", "0", "10", "10"]);
    engine.extend_selection_on_page_at_point(0, 5.0, 5.0);
    let depth = engine.undo_count();

    engine.set_inhibited(true);
    for _ in 0..4 {
        engine.execute("MoveSelectedAnnotation", ["0", "5", "0"]);
    }
    engine.execute("MoveSelectedAnnotation", ["0", "-20", "0"]);
    engine.set_inhibited(false);
    engine.execute("MoveSelectedAnnotation", ["0", "20", "0"]);

    assert_eq!(engine.undo_count(), depth + 1);
    assert_eq!(engine.selected_rects(), vec![Rect::new(20.0, 0.0, 10.0, 10.0)]);

    engine.undo();
    assert_eq!(engine.selected_rects(), vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
}

#[test]
fn drag_session_matches_manual_coalescing() {
    let mut manual = engine_with_pages(1);
    let mut session = engine_with_pages(1);
    for engine in [&mut manual, &mut session] {
        engine.execute("AddBoxAnnotation", ["0", "0", "0", "10", "10"]);
        engine.extend_selection_on_page_at_point(0, 5.0, 5.0);
    }

    manual.set_inhibited(true);
    manual.execute("MoveSelectedAnnotation", ["0", "3", "4"]);
    manual.execute("MoveSelectedAnnotation", ["0", "-3", "-4"]);
    manual.set_inhibited(false);
    manual.execute("MoveSelectedAnnotation", ["0", "3", "4"]);

    session.begin_drag();
    session.drag_by(1.0, 2.0);
    session.drag_by(2.0, 2.0);
    session.end_drag();

    assert_eq!(manual.selected_rects(), session.selected_rects());
    assert_eq!(manual.undo_count(), session.undo_count());
    assert_eq!(manual.suggested_undo_title(), session.suggested_undo_title());

    manual.undo();
    session.undo();
    assert_eq!(manual.selected_rects(), session.selected_rects());
}

#[test]
fn history_limit_from_config() {
    let config = EditorConfig::default().with_history_limit(1);
    let mut engine = CommandWrapper::with_config(Document::with_blank_pages(1), config);
    engine.execute("AddTextAnnotation", ["0", "0", "0", "a"]);
    engine.execute("AddTextAnnotation", ["0", "0", "50", "b"]);

    assert_eq!(engine.undo_count(), 1);
    assert!(engine.undo());
    assert!(!engine.undo());
    assert_eq!(engine.document().annotation_count(), 1);
}

#[derive(Debug, Clone)]
enum Edit {
    AddBox(f32, f32),
    AddText(f32, f32),
    SelectAt(f32, f32),
    MoveSelected(f32, f32),
    DeleteSelected,
    ChangeText(u8),
}

fn coord() -> impl Strategy<Value = f32> {
    (0i32..500).prop_map(|v| v as f32)
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (coord(), coord()).prop_map(|(x, y)| Edit::AddBox(x, y)),
        (coord(), coord()).prop_map(|(x, y)| Edit::AddText(x, y)),
        (coord(), coord()).prop_map(|(x, y)| Edit::SelectAt(x, y)),
        (-50i32..50, -50i32..50).prop_map(|(dx, dy)| Edit::MoveSelected(dx as f32, dy as f32)),
        Just(Edit::DeleteSelected),
        any::<u8>().prop_map(Edit::ChangeText),
    ]
}

fn apply(engine: &mut CommandWrapper, edit: &Edit) {
    match edit {
        Edit::AddBox(x, y) => {
            engine.execute("AddBoxAnnotation", ["0".into(), x.to_string(), y.to_string(), "40".into(), "30".into()]);
        }
        Edit::AddText(x, y) => {
            engine.execute("AddTextAnnotation", ["0".into(), x.to_string(), y.to_string(), "t".into()]);
        }
        Edit::SelectAt(x, y) => {
            engine.extend_selection_on_page_at_point(0, *x, *y);
        }
        Edit::MoveSelected(dx, dy) => {
            engine.execute("MoveSelectedAnnotation", ["0".to_string(), dx.to_string(), dy.to_string()]);
        }
        Edit::DeleteSelected => {
            engine.execute("DeleteSelectedAnnotation", ["0"]);
        }
        Edit::ChangeText(n) => {
            engine.execute("ChangeSelectedAnnotationText", ["0".to_string(), format!("text {n}")]);
        }
    }
}

proptest! {
    #[test]
    fn undo_everything_then_redo_everything(edits in prop::collection::vec(edit(), 1..24)) {
        let mut engine = engine_with_pages(1);
        for edit in &edits {
            apply(&mut engine, edit);
        }

        let edited = engine.document().clone();
        let depth = engine.undo_count();

        for _ in 0..depth {
            prop_assert!(engine.undo());
        }
        prop_assert!(!engine.can_undo());
        prop_assert_eq!(engine.document().annotation_count(), 0);

        for _ in 0..depth {
            prop_assert!(engine.redo());
        }
        prop_assert!(!engine.can_redo());
        prop_assert_eq!(engine.document(), &edited);
    }
}
