//! PrintKit CLI
//!
//! Commands: templates, validate, dpi, render
//! Reports are JSON on stdout; logs go to stderr.
//! `validate` and `render` exit with code 2 when validation blocks them.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use printkit::designer::geometry::calculate_dpi_with;
use printkit::designer::product::{FileTemplateSource, TemplateLoader};
use printkit::designer::serialization::load_from_file;
use printkit::designer::validation::ValidationConfig;
use printkit::{
    init_logging_with, Config, DataUrlDecoder, Document, EditorMode, EditorSession, ExportFormat,
    LayerData, LogFormat, MemorySurface, ProductCatalog, ProductTemplate, Validator,
};
use printkit_settings::TemplateSettings;

#[derive(Parser)]
#[command(name = "printkit")]
#[command(about = "PrintKit - print-product design tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML or JSON); defaults to the platform location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Template list JSON file; the built-in templates are used otherwise
    #[arg(short, long, global = true)]
    templates: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available product templates
    Templates,

    /// Check a design for print readiness
    Validate {
        /// Design JSON file
        design: PathBuf,
    },

    /// Report the print resolution of every image layer
    Dpi {
        /// Design JSON file
        design: PathBuf,
    },

    /// Rasterize the printable area of one view
    Render {
        /// Design JSON file
        design: PathBuf,

        /// View to render; the template's default view otherwise
        #[arg(short, long)]
        view: Option<String>,

        /// Output file; `.jpg`/`.jpeg` selects JPEG, anything else PNG
        #[arg(short, long)]
        out: PathBuf,

        /// Output pixels per view pixel
        #[arg(short, long)]
        multiplier: Option<f64>,

        /// Export even when validation reports errors
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    if let Err(e) = init_logging_with(format) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            println!("{}", json!({ "error": format!("{:#}", e) }));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    let catalog = load_catalog(&config, cli.templates.as_deref()).await?;
    tracing::debug!("Loaded {} product templates", catalog.templates().len());

    match cli.command {
        Commands::Templates => {
            let templates: Vec<_> = catalog
                .templates()
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "type": t.product_type,
                        "name": t.name,
                        "views": t.view_ids().collect::<Vec<_>>(),
                        "defaultViewId": t.default_view_id,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&templates)?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate { design } => {
            let document = load_from_file(&design)?;
            let template = template_for(&catalog, &document)?;
            let validator = Validator::new(ValidationConfig::from(&config.validation));
            let result = validator.validate(&document, template);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }

        Commands::Dpi { design } => {
            let document = load_from_file(&design)?;
            let template = template_for(&catalog, &document)?;
            let mut badges = Vec::new();
            for product_view in &template.views {
                let Ok(view) = document.view(&product_view.id) else {
                    continue;
                };
                for layer in view.layers.iter().filter(|l| matches!(l.data, LayerData::Image(_))) {
                    let info = calculate_dpi_with(
                        layer,
                        &product_view.printable_area,
                        config.validation.good_dpi,
                    );
                    badges.push(json!({
                        "viewId": product_view.id,
                        "layerId": layer.id,
                        "name": layer.name,
                        "dpi": info,
                    }));
                }
            }
            println!("{}", serde_json::to_string_pretty(&badges)?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Render {
            design,
            view,
            out,
            multiplier,
            force,
        } => render(config, catalog, &design, view.as_deref(), &out, multiplier, force).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(path)?,
        None => match Config::default_path() {
            Ok(path) => Config::load_or_default(&path)?,
            Err(_) => Config::default(),
        },
    };
    Ok(config)
}

async fn load_catalog(config: &Config, templates: Option<&Path>) -> anyhow::Result<ProductCatalog> {
    let settings = match templates {
        Some(path) => TemplateSettings {
            mode: EditorMode::Standalone,
            api_endpoint: Some(path.display().to_string()),
            initial_template: None,
        },
        None => TemplateSettings {
            mode: EditorMode::Demo,
            ..config.templates.clone()
        },
    };

    let mut catalog = ProductCatalog::new();
    TemplateLoader::new(settings, Arc::new(FileTemplateSource::new()))
        .load(&mut catalog, None)
        .await?;
    Ok(catalog)
}

fn template_for<'a>(
    catalog: &'a ProductCatalog,
    document: &Document,
) -> anyhow::Result<&'a ProductTemplate> {
    catalog
        .templates()
        .iter()
        .find(|t| t.id == document.product_template_id)
        .with_context(|| format!("Unknown product template {}", document.product_template_id))
}

fn format_for(path: &Path) -> ExportFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => ExportFormat::Jpeg,
        _ => ExportFormat::Png,
    }
}

async fn render(
    config: Config,
    catalog: ProductCatalog,
    design: &Path,
    view: Option<&str>,
    out: &Path,
    multiplier: Option<f64>,
    force: bool,
) -> anyhow::Result<ExitCode> {
    let json = std::fs::read_to_string(design)
        .with_context(|| format!("Failed to read design file {}", design.display()))?;

    // Relative image paths resolve against the design's directory
    let base_dir = design
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let multiplier = multiplier.unwrap_or(config.export.multiplier);
    let mut session = EditorSession::new(
        config,
        catalog,
        MemorySurface::new(),
        Arc::new(DataUrlDecoder::with_base_dir(base_dir)),
    );

    if !session.import_json(&json) {
        bail!("{} is not a valid design", design.display());
    }
    if session.catalog().selected().map(|t| t.id.as_str())
        != Some(session.document().product_template_id.as_str())
    {
        bail!(
            "Unknown product template {}",
            session.document().product_template_id
        );
    }
    if let Some(view) = view {
        if view != session.active_view_id() {
            session.open_view(view)?;
        }
    }
    session.settle().await;

    let image = match session.export(format_for(out), multiplier, force) {
        Ok(image) => image,
        Err(e) if e.is_export_blocked() => {
            let result = session.validate()?;
            println!(
                "{}",
                json!({ "exported": false, "error": e.to_string(), "validation": result })
            );
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e.into()),
    };

    std::fs::write(out, &image.bytes)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    tracing::info!(
        "Rendered {}x{} {} to {}",
        image.width,
        image.height,
        image.format,
        out.display()
    );
    println!(
        "{}",
        json!({
            "exported": true,
            "path": out.display().to_string(),
            "format": image.format.to_string(),
            "width": image.width,
            "height": image.height,
            "view": session.active_view_id(),
        })
    );
    session.close();
    Ok(ExitCode::SUCCESS)
}
