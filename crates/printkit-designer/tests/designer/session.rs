use async_trait::async_trait;
use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use printkit_core::{BackgroundRemovalError, ProgressCallback};
use printkit_designer::background_removal::{BackgroundRemovalModel, BackgroundRemover};
use printkit_designer::model::ShapeType;
use printkit_designer::product::{ProductCatalog, TemplateRegistry};
use printkit_designer::scene::{DataUrlDecoder, MemorySurface, NodeContent};
use printkit_designer::storage::LocalDesignStore;
use printkit_designer::EditorSession;
use printkit_settings::{Config, ExportFormat, MemoryStore};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

fn png_data_url(width: u32, height: u32, color: [u8; 4]) -> String {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes.into_inner())
    )
}

async fn open(config: Config, template_id: &str) -> EditorSession<MemorySurface> {
    let mut catalog = ProductCatalog::new();
    catalog.set_templates(TemplateRegistry::builtin().all());
    let mut session = EditorSession::new(
        config,
        catalog,
        MemorySurface::new(),
        Arc::new(DataUrlDecoder::new()),
    );
    session.select_product(template_id).unwrap();
    session.settle().await;
    session
}

struct Whiteout;

#[async_trait]
impl BackgroundRemovalModel for Whiteout {
    async fn remove_background(
        &self,
        _src: &str,
        progress: &ProgressCallback,
    ) -> Result<String, BackgroundRemovalError> {
        progress(1, 1);
        Ok(png_data_url(8, 4, [255, 255, 255, 0]))
    }
}

#[tokio::test]
async fn test_missing_mockup_still_reaches_ready() {
    let session = open(Config::default(), "mug-classic").await;
    assert!(session.scene().is_ready());
    assert_eq!(session.active_view_id(), "wrap");
}

#[tokio::test]
async fn test_data_url_image_is_placed_and_exported() {
    let mut session = open(Config::default(), "mug-classic").await;
    let src = png_data_url(2400, 1000, [200, 30, 30, 255]);
    let id = session.add_image("Poster", src, 2400, 1000).unwrap();
    session.settle().await;

    let node = session.scene().layer_node(&id).unwrap();
    assert!(matches!(node.content, NodeContent::Image { .. }));
    assert!((node.props.display_width() - 560.0).abs() < 1e-6);

    let result = session.validate().unwrap();
    assert!(result.valid, "{:?}", result.issues);

    let png = session.export(ExportFormat::Png, 1.0, false).unwrap();
    assert_eq!((png.width, png.height), (700, 300));
    let decoded = image::load_from_memory(&png.bytes).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(350, 150).0, [200, 30, 30, 255]);
    assert_eq!(decoded.get_pixel(2, 2).0[3], 0);

    let jpeg = session.export(ExportFormat::Jpeg, 0.5, false).unwrap();
    assert_eq!((jpeg.width, jpeg.height), (350, 150));
    assert!(jpeg.data_url().starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_switching_views_keeps_layers_per_view() {
    let mut session = open(Config::default(), "tshirt-classic").await;
    let front = session.add_shape(ShapeType::Circle, "#111111").unwrap();

    session.open_view("back").unwrap();
    session.settle().await;
    assert!(session.scene().layer_order().is_empty());
    let back = session.add_text("Team").unwrap();

    session.open_view("front").unwrap();
    session.settle().await;
    assert_eq!(session.scene().layer_order(), vec![front]);
    assert!(session.document().layer("back", &back).is_ok());
}

#[tokio::test]
async fn test_background_removal_swaps_source() {
    let mut session = open(Config::default(), "mug-classic").await;
    session = session.with_background_remover(BackgroundRemover::new(Arc::new(Whiteout)));
    let id = session
        .add_image("Logo", png_data_url(8, 4, [0, 0, 0, 255]), 8, 4)
        .unwrap();
    session.settle().await;
    let before = session.document().layer("wrap", &id).unwrap().transform;

    session.remove_background(&id, None).await.unwrap();
    session.settle().await;

    let layer = session.document().layer("wrap", &id).unwrap();
    assert_ne!(layer.data.as_image().unwrap().src, png_data_url(8, 4, [0, 0, 0, 255]));
    assert_eq!(layer.transform, before);
}

#[tokio::test]
async fn test_autosave_writes_after_quiet_period() {
    let mut config = Config::default();
    config.autosave.delay_ms = 50;
    let store = LocalDesignStore::new(Arc::new(MemoryStore::new()));

    let mut session = open(config, "phonecase-classic").await;
    assert!(session.start_autosave(store.clone()));
    session.add_shape(ShapeType::Rect, "#ff00ff").unwrap();
    session.add_shape(ShapeType::Triangle, "#00ffff").unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    let saved = store.load_local(&session.document().id).unwrap();
    assert_eq!(saved.layer_count(), 2);

    session.close();
    assert!(!session.scene().is_ready());
}
