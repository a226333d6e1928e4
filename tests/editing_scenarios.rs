use egui::{Color32, Pos2};
use staging_canvas::{
    EditorError, Editor, InputEvent, ObjectId, ObjectKind, ToolKind, ToolState,
};

fn blue() -> Color32 {
    Color32::from_rgb(0x3b, 0x82, 0xf6)
}

fn state(tool: ToolKind) -> ToolState {
    ToolState {
        tool,
        color: blue(),
        ..ToolState::default()
    }
}

fn objects(editor: &Editor) -> Vec<ObjectKind> {
    editor.scene().list_objects().map(|o| o.kind().clone()).collect()
}

#[test]
fn test_place_rectangle_undo_redo() {
    let mut editor = Editor::default();
    assert_eq!(editor.scene().canvas_size().width, 800);
    assert_eq!(editor.scene().canvas_size().height, 600);
    assert_eq!(editor.scene().background_color(), Color32::WHITE);

    let tool = state(ToolKind::PlaceRectangle);
    let id = editor.place_default_shape(&tool, ToolKind::PlaceRectangle).unwrap();
    assert!(id.is_some());

    let placed = objects(&editor);
    assert_eq!(placed.len(), 1);
    let rect = placed[0].as_rectangle().expect("a rectangle");
    assert_eq!(rect.fill(), blue());
    assert_eq!(rect.position(), Pos2::new(100.0, 100.0));
    assert_eq!((rect.width(), rect.height()), (100.0, 100.0));
    assert_eq!(editor.history().undo_len(), 1);

    editor.undo().unwrap();
    assert!(editor.scene().is_empty());

    editor.redo().unwrap();
    assert_eq!(objects(&editor), placed);
}

#[test]
fn test_click_places_rectangle_at_pointer() {
    let mut editor = Editor::default();
    let tool = state(ToolKind::PlaceRectangle);
    editor.handle_input(&tool, InputEvent::PointerDown { pos: Pos2::new(300.0, 200.0) }).unwrap();
    editor.handle_input(&tool, InputEvent::PointerUp { pos: Pos2::new(300.0, 200.0) }).unwrap();

    let placed = objects(&editor);
    let rect = placed[0].as_rectangle().unwrap();
    assert_eq!(rect.position(), Pos2::new(300.0, 200.0));
    assert_eq!(editor.history().undo_len(), 1);
}

#[test]
fn test_free_draw_scenario() {
    let mut editor = Editor::default();
    let tool = state(ToolKind::FreeDraw);
    editor.handle_input(&tool, InputEvent::PointerDown { pos: Pos2::new(10.0, 10.0) }).unwrap();
    editor.handle_input(&tool, InputEvent::PointerMove { pos: Pos2::new(20.0, 10.0) }).unwrap();
    editor.handle_input(&tool, InputEvent::PointerMove { pos: Pos2::new(20.0, 20.0) }).unwrap();
    editor.handle_input(&tool, InputEvent::PointerUp { pos: Pos2::new(20.0, 20.0) }).unwrap();

    let placed = objects(&editor);
    assert_eq!(placed.len(), 1);
    let stroke = placed[0].as_stroke().expect("a stroke");
    assert_eq!(
        stroke.points(),
        &[Pos2::new(10.0, 10.0), Pos2::new(20.0, 10.0), Pos2::new(20.0, 20.0)]
    );
    assert_eq!(stroke.color(), blue());
    assert_eq!(stroke.width(), 2.0);
}

#[test]
fn test_stroke_coalescing() {
    for moves in [0usize, 1, 7, 50] {
        let mut editor = Editor::default();
        let tool = state(ToolKind::FreeDraw);
        editor.handle_input(&tool, InputEvent::PointerDown { pos: Pos2::new(5.0, 5.0) }).unwrap();
        for i in 0..moves {
            let pos = Pos2::new(5.0 + i as f32, 5.0 + (i % 3) as f32);
            editor.handle_input(&tool, InputEvent::PointerMove { pos }).unwrap();
        }
        editor.handle_input(&tool, InputEvent::PointerUp { pos: Pos2::new(5.0, 5.0) }).unwrap();

        assert_eq!(editor.history().undo_len(), 1, "moves = {moves}");
        let placed = objects(&editor);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].as_stroke().unwrap().points().len(), moves + 1);
    }
}

#[test]
fn test_tap_leaves_single_point_stroke() {
    let mut editor = Editor::default();
    let tool = state(ToolKind::FreeDraw);
    editor.handle_input(&tool, InputEvent::PointerDown { pos: Pos2::new(40.0, 40.0) }).unwrap();
    editor.handle_input(&tool, InputEvent::PointerUp { pos: Pos2::new(40.0, 40.0) }).unwrap();
    let placed = objects(&editor);
    assert!(placed[0].as_stroke().unwrap().is_dot());
}

#[test]
fn test_idempotent_clear() {
    let mut editor = Editor::default();
    let tool = state(ToolKind::PlaceEllipse);
    editor.place_default_shape(&tool, ToolKind::PlaceEllipse).unwrap();

    editor.clear().unwrap();
    assert!(editor.scene().is_empty());
    editor.clear().unwrap();
    assert!(editor.scene().is_empty());
}

#[test]
fn test_delete_unknown_id() {
    let mut editor = Editor::default();
    editor
        .place_default_shape(&state(ToolKind::PlaceRectangle), ToolKind::PlaceRectangle)
        .unwrap();
    let count = editor.scene().len();

    let missing = ObjectId(4242);
    assert_eq!(editor.delete_object(missing), Err(EditorError::NotFound(missing)));
    assert_eq!(editor.scene().len(), count);
}

#[test]
fn test_ids_never_reused_after_undo() {
    let mut editor = Editor::default();
    let tool = state(ToolKind::PlaceRectangle);
    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(editor.place_default_shape(&tool, ToolKind::PlaceRectangle).unwrap().unwrap());
    }
    editor.undo().unwrap();
    editor.undo().unwrap();
    let fresh = editor.place_default_shape(&tool, ToolKind::PlaceRectangle).unwrap().unwrap();
    assert!(!seen.contains(&fresh));
}

#[test]
fn test_circle_scenario() {
    let mut editor = Editor::default();
    let tool = state(ToolKind::PlaceEllipse);
    editor.place_default_shape(&tool, ToolKind::PlaceEllipse).unwrap();
    let placed = objects(&editor);
    let ellipse = placed[0].as_ellipse().unwrap();
    assert_eq!(ellipse.center(), Pos2::new(150.0, 150.0));
    assert_eq!((ellipse.radius_x(), ellipse.radius_y()), (50.0, 50.0));
}

#[test]
fn test_select_tool_picks_topmost() {
    let mut editor = Editor::default();
    let tool = state(ToolKind::PlaceRectangle);
    editor.place_default_shape(&tool, ToolKind::PlaceRectangle).unwrap();
    let top = editor.place_default_shape(&tool, ToolKind::PlaceEllipse).unwrap();

    let select = state(ToolKind::Select);
    editor.handle_input(&select, InputEvent::PointerDown { pos: Pos2::new(150.0, 150.0) }).unwrap();
    assert_eq!(editor.selection(), top);

    editor.handle_input(&select, InputEvent::PointerDown { pos: Pos2::new(600.0, 500.0) }).unwrap();
    assert_eq!(editor.selection(), None);
}
