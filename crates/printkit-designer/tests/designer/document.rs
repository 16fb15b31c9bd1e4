use printkit_designer::model::{
    ImageData, Layer, ShapeData, ShapeType, TextData, Transform, TransformPatch,
};
use printkit_designer::product::{mug_template, tshirt_template};
use printkit_designer::serialization::{export_json, import_json};
use printkit_designer::validation::{validate, ExportGate, Severity};
use printkit_designer::DesignState;

fn shape(id: &str) -> Layer {
    Layer::shape(
        id,
        Transform::new(300.0, 300.0, 80.0, 80.0),
        ShapeData::new(ShapeType::Rect, "#3366ff"),
    )
    .with_id(id)
}

fn order(state: &DesignState, view_id: &str) -> Vec<String> {
    state.document().views[view_id].layer_ids()
}

#[test]
fn test_undo_redo_restores_layer_order() {
    let mut state = DesignState::new();
    state.initialize(&tshirt_template());
    state.add_layer("front", shape("A")).unwrap();
    state.add_layer("front", shape("B")).unwrap();
    assert_eq!(order(&state, "front"), ["A", "B"]);

    assert!(state.undo());
    assert_eq!(order(&state, "front"), ["A"]);
    assert!(state.redo());
    assert_eq!(order(&state, "front"), ["A", "B"]);
}

#[test]
fn test_z_order_moves() {
    let mut state = DesignState::new();
    state.initialize(&tshirt_template());
    for id in ["A", "B", "C"] {
        state.add_layer("front", shape(id)).unwrap();
    }

    assert!(state.move_layer_to_back("front", "C").unwrap());
    assert_eq!(order(&state, "front"), ["C", "A", "B"]);
    state.undo();

    assert!(state.move_layer_forward("front", "A").unwrap());
    assert_eq!(order(&state, "front"), ["B", "A", "C"]);

    let steps = state.past_len();
    assert!(!state.move_layer_to_front("front", "C").unwrap());
    assert_eq!(state.past_len(), steps);
}

#[test]
fn test_json_round_trip_keeps_every_field() {
    let mut state = DesignState::new();
    state.initialize(&tshirt_template());
    state.set_name("Launch Shirt");

    let mut photo = ImageData::new("data:image/png;base64,AAAA", 1200, 900);
    photo.crop_width = Some(600.0);
    state
        .add_layer(
            "front",
            Layer::image("Photo", Transform::new(260.0, 220.0, 280.0, 210.0), photo),
        )
        .unwrap();
    state
        .add_layer(
            "back",
            Layer::text(
                "Caption",
                Transform::new(300.0, 500.0, 200.0, 40.0).with_rotation(15.0),
                TextData::new("Hello"),
            ),
        )
        .unwrap();
    state.add_layer("front", shape("badge")).unwrap();
    state
        .update_transform(
            "front",
            "badge",
            TransformPatch {
                flip_x: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

    let json = export_json(state.document()).unwrap();
    let restored = import_json(&json).unwrap();
    assert_eq!(&restored, state.document());
    assert_eq!(export_json(&restored).unwrap(), json);
}

#[test]
fn test_import_rejects_incomplete_documents() {
    assert!(import_json("not json").is_none());
    assert!(import_json(r#"{"id": "x", "views": {}}"#).is_none());
    assert!(import_json(r#"{"version": "1.0.0", "views": {}}"#).is_none());
}

#[test]
fn test_low_dpi_image_blocks_export() {
    let template = mug_template();
    let mut state = DesignState::new();
    state.initialize(&template);
    // 300 px stretched across the whole 8.5 in wrap is about 35 DPI
    state
        .add_layer(
            "wrap",
            Layer::image(
                "Tiny",
                Transform::new(100.0, 50.0, 700.0, 300.0),
                ImageData::new("tiny.png", 300, 128),
            ),
        )
        .unwrap();

    let result = validate(state.document(), &template);
    assert!(!result.valid);
    assert_eq!(result.error_count(), 1);
    assert_eq!(result.issues[0].severity, Severity::Error);
    assert_eq!(result.issues[0].view_id.as_deref(), Some("wrap"));

    assert!(ExportGate::check(&result, false).is_err());
    assert!(ExportGate::check(&result, true).is_ok());
}

#[test]
fn test_hidden_layers_are_not_scored() {
    let template = mug_template();
    let mut state = DesignState::new();
    state.initialize(&template);
    let id = state
        .add_layer(
            "wrap",
            Layer::image(
                "Tiny",
                Transform::new(100.0, 50.0, 700.0, 300.0),
                ImageData::new("tiny.png", 300, 128),
            ),
        )
        .unwrap();
    state.set_visibility("wrap", &id, false).unwrap();

    let result = validate(state.document(), &template);
    assert!(result.valid);
    assert_eq!(result.error_count(), 0);
}
