use egui::Pos2;
use proptest::prelude::*;
use staging_canvas::{Editor, InputEvent, SceneObject, ToolKind, ToolState};

#[derive(Debug, Clone)]
enum Op {
    Rectangle { x: f32, y: f32 },
    Circle { x: f32, y: f32 },
    Stroke(Vec<(f32, f32)>),
    DeleteTopmost,
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let coord = || 0.0f32..800.0;
    prop_oneof![
        (coord(), coord()).prop_map(|(x, y)| Op::Rectangle { x, y }),
        (coord(), coord()).prop_map(|(x, y)| Op::Circle { x, y }),
        prop::collection::vec((coord(), coord()), 1..6).prop_map(Op::Stroke),
        Just(Op::DeleteTopmost),
        Just(Op::Clear),
    ]
}

fn click(editor: &mut Editor, tool: ToolKind, x: f32, y: f32) {
    let state = ToolState {
        tool,
        ..ToolState::default()
    };
    let pos = Pos2::new(x, y);
    editor.handle_input(&state, InputEvent::PointerDown { pos }).unwrap();
    editor.handle_input(&state, InputEvent::PointerUp { pos }).unwrap();
}

fn apply(editor: &mut Editor, op: &Op) {
    match op {
        Op::Rectangle { x, y } => click(editor, ToolKind::PlaceRectangle, *x, *y),
        Op::Circle { x, y } => click(editor, ToolKind::PlaceEllipse, *x, *y),
        Op::Stroke(points) => {
            let state = ToolState {
                tool: ToolKind::FreeDraw,
                ..ToolState::default()
            };
            let (x, y) = points[0];
            editor.handle_input(&state, InputEvent::PointerDown { pos: Pos2::new(x, y) }).unwrap();
            for &(x, y) in &points[1..] {
                editor.handle_input(&state, InputEvent::PointerMove { pos: Pos2::new(x, y) }).unwrap();
            }
            editor.handle_input(&state, InputEvent::PointerUp { pos: Pos2::new(x, y) }).unwrap();
        }
        Op::DeleteTopmost => {
            if let Some(id) = editor.scene().list_objects().last().map(|o| o.id()) {
                editor.delete_object(id).unwrap();
            }
        }
        Op::Clear => editor.clear().unwrap(),
    }
}

fn content(editor: &Editor) -> Vec<SceneObject> {
    editor.scene().list_objects().cloned().collect()
}

proptest! {
    #[test]
    fn test_undo_then_redo_restores_scene(ops in prop::collection::vec(op_strategy(), 1..12), pick in 0usize..12) {
        let mut editor = Editor::default();
        let mut states = vec![content(&editor)];
        for op in &ops {
            let before = editor.history().undo_len();
            apply(&mut editor, op);
            if editor.history().undo_len() > before {
                states.push(content(&editor));
            }
        }
        let committed = states.len() - 1;
        prop_assert_eq!(editor.history().undo_len(), committed);

        let n = pick % (committed + 1);
        let final_state = content(&editor);
        for _ in 0..n {
            editor.undo().unwrap();
        }
        prop_assert_eq!(&content(&editor), &states[committed - n]);
        for _ in 0..n {
            editor.redo().unwrap();
        }
        prop_assert_eq!(content(&editor), final_state);
    }
}
