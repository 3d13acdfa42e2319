use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use rfmask::{EditorConfig, MaskEditor, SaveOutcome, SelectedFile, UploadWorker};

/// Draw a mask over a background image and submit both to a processing endpoint.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Background image to draw the mask over.
    #[arg(short, long)]
    background: PathBuf,

    /// A stroke as space-separated "x,y" canvas points. Repeat for more strokes.
    #[arg(short, long = "stroke")]
    strokes: Vec<String>,

    /// Brush radius in pixels.
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=20))]
    brush_radius: Option<u32>,

    /// Upload endpoint (overrides the config file).
    #[arg(long)]
    endpoint: Option<String>,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only capture the mask; do not upload.
    #[arg(long)]
    no_upload: bool,

    /// Where to write the captured mask.
    #[arg(short, long, default_value = "masked.png")]
    output: PathBuf,

    /// Also write the on-screen composite (background plus strokes).
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_stroke(s: &str) -> anyhow::Result<Vec<(f32, f32)>> {
    s.split_whitespace()
        .map(|pt| {
            let (x, y) = pt
                .split_once(',')
                .with_context(|| format!("point {:?} is not in x,y form", pt))?;
            let x: f32 = x.trim().parse().with_context(|| format!("bad x in {:?}", pt))?;
            let y: f32 = y.trim().parse().with_context(|| format!("bad y in {:?}", pt))?;
            Ok((x, y))
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = match &args.config {
        Some(path) => EditorConfig::from_json_file(path)?,
        None => EditorConfig::default(),
    };
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(radius) = args.brush_radius {
        config.brush_radius = radius;
    }
    if args.no_upload {
        config.upload_enabled = false;
    }
    config.validate()?;

    let mut editor = MaskEditor::new(config.clone());

    let file = SelectedFile::from_path(&args.background)?;
    editor.select_file(&file)?;

    for stroke in &args.strokes {
        editor.stroke(&parse_stroke(stroke)?);
    }

    match editor.save()? {
        SaveOutcome::Captured => {}
        SaveOutcome::Skipped(reason) => log::warn!("nothing uploaded: {:?}", reason),
        SaveOutcome::Submitted(ticket) => {
            let worker = match UploadWorker::spawn(config).await {
                Ok(w) => w,
                Err(e) => {
                    editor.abandon_upload(ticket);
                    return Err(e.into());
                }
            };
            println!("Uploading...");
            log::debug!("submitting upload #{}", ticket.seq());
            let res = worker.upload(ticket.request().clone()).await;
            let outcome = editor.finish_upload(ticket, res);
            worker.close().await?;
            outcome?;
        }
    }

    let Some(mask) = editor.masked_image() else {
        bail!("no mask was captured");
    };
    std::fs::write(&args.output, mask.decode()?)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Mask written to {}", args.output.display());

    if let Some(path) = &args.preview {
        editor
            .surface()
            .preview()
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Preview written to {}", path.display());
    }

    if editor.uploads_enabled() {
        if let Some(view) = editor.result_view() {
            println!("Uploaded image: {}", view.original_src);
            println!("Masked image:   {}", view.mask_src);
        }
    }

    Ok(())
}
