use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use signcheck::config::Settings;
use signcheck::form::Control;
use signcheck::photo::ImageProcessor;
use signcheck::services::{ApiClient, DraftStore, MemorySessionStore};
use signcheck::wizard::WizardController;
use signcheck::{logging, WizardError};

#[derive(Parser, Debug)]
#[command(
    name = "signcheck",
    version,
    about = "Collect sign details, assess a photo and submit the reviewed accessibility report"
)]
struct Cli {
    /// Assessment service base URL (overrides SIGNCHECK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the metadata form as JSON
    Fields,
    /// Downsample and re-encode a photo the way the wizard does
    Photo(PhotoArgs),
    /// Run the full wizard: details, photo, analysis, review, submit
    Assess(AssessArgs),
}

#[derive(Args, Debug)]
struct PhotoArgs {
    /// Input image path
    input: PathBuf,
    /// Output JPEG path
    output: PathBuf,
}

#[derive(Args, Debug)]
struct AssessArgs {
    /// Photo of the sign
    #[arg(long)]
    photo: PathBuf,
    /// Metadata value as FIELD=VALUE (repeatable, applied in order)
    #[arg(long = "set", value_parser = parse_pair)]
    fields: Vec<(String, String)>,
    /// Write-in text for an "Other" choice as FIELD=TEXT
    #[arg(long = "other", value_parser = parse_pair)]
    others: Vec<(String, String)>,
    /// Override an inferred choice as FIELD=VALUE
    #[arg(long = "inferred", value_parser = parse_pair)]
    inferred: Vec<(String, String)>,
    /// Replace a category's assessment text as CATEGORY=TEXT
    #[arg(long = "category", value_parser = parse_pair)]
    categories: Vec<(String, String)>,
    /// Override the overall accessibility rating
    #[arg(long)]
    rating: Option<String>,
    /// Replace the final comments
    #[arg(long)]
    final_comments: Option<String>,
    /// Reviewer's own comments
    #[arg(long)]
    assessor_comments: Option<String>,
    /// Stop after printing the review
    #[arg(long)]
    no_submit: bool,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let mut settings = Settings::from_env()?;
    if let Some(url) = &cli.api_url {
        settings = settings.with_api_url(url)?;
    }

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        api_url = %settings.api_url,
        "Starting signcheck"
    );

    let processor = ImageProcessor::new(settings.max_image_dimension, settings.jpeg_quality);

    match cli.command {
        Commands::Photo(args) => command_photo(processor, args).await,
        Commands::Fields => {
            let controller = start(&settings, processor).await?;
            print_fields(&controller)
        }
        Commands::Assess(args) => {
            let mut controller = start(&settings, processor).await?;
            command_assess(&mut controller, args).await
        }
    }
}

async fn start(settings: &Settings, processor: ImageProcessor) -> Result<WizardController> {
    let api = ApiClient::new(&settings.api_url, settings.api_timeout_seconds)?;
    let drafts = DraftStore::new(Arc::new(MemorySessionStore::new()));
    WizardController::start(api, drafts, processor)
        .await
        .map_err(banner)
}

/// Surface a wizard error the way the form would show it.
fn banner(err: WizardError) -> anyhow::Error {
    tracing::debug!(error = %err, "Wizard error");
    anyhow::anyhow!(err.user_message())
}

async fn command_photo(processor: ImageProcessor, args: PhotoArgs) -> Result<()> {
    let bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("failed to read photo: {}", args.input.display()))?;
    let payload = processor.process(bytes).await.map_err(banner)?;

    use base64::Engine as _;
    let jpeg = base64::engine::general_purpose::STANDARD
        .decode(&payload.data)
        .context("processed photo is not valid base64")?;
    tokio::fs::write(&args.output, &jpeg)
        .await
        .with_context(|| format!("failed to write photo: {}", args.output.display()))?;

    println!(
        "{}",
        json!({
            "output": args.output.display().to_string(),
            "width": payload.width,
            "height": payload.height,
            "bytes": jpeg.len(),
            "media_type": payload.media_type,
        })
    );
    Ok(())
}

fn print_fields(controller: &WizardController) -> Result<()> {
    let fields: Vec<_> = controller
        .form()
        .fields()
        .iter()
        .map(|f| {
            json!({
                "id": f.spec.id,
                "label": f.spec.label,
                "required": f.spec.required,
                "control": f.control,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

async fn command_assess(controller: &mut WizardController, args: AssessArgs) -> Result<()> {
    // Step 1: sign details
    {
        let form = controller.form_mut().map_err(banner)?;
        for (id, value) in &args.fields {
            form.set_value(id, value).map_err(banner)?;
        }
        for (id, text) in &args.others {
            form.set_other(id, text).map_err(banner)?;
        }
    }
    if let Err(err) = controller.next() {
        if let WizardError::Validation { fields } = &err {
            for id in fields {
                if let Some(message) = controller.form().field(id).and_then(|f| f.error_message()) {
                    eprintln!("  {message}");
                }
            }
        }
        return Err(banner(err));
    }

    // Step 2: photo and analysis
    let bytes = tokio::fs::read(&args.photo)
        .await
        .with_context(|| format!("failed to read photo: {}", args.photo.display()))?;
    controller.select_photo(bytes).await.map_err(banner)?;
    eprintln!("Analyzing photo...");
    controller.analyze().await.map_err(banner)?;

    // Step 3: review
    {
        let review = controller.review_mut().map_err(banner)?;
        for (id, value) in &args.inferred {
            review.set_inferred(id, value).map_err(banner)?;
        }
        for (id, text) in &args.categories {
            review.set_category_text(id, text).map_err(banner)?;
        }
        if let Some(rating) = &args.rating {
            review.set_rating(rating).map_err(banner)?;
        }
        if let Some(text) = &args.final_comments {
            review.set_final_comments(text);
        }
        if let Some(text) = &args.assessor_comments {
            review.set_assessor_comments(text);
        }
    }
    print_review(controller)?;

    if args.no_submit {
        return Ok(());
    }
    controller.submit().await.map_err(banner)?;
    eprintln!("Assessment submitted.");
    Ok(())
}

fn print_review(controller: &WizardController) -> Result<()> {
    let Some(review) = controller.review() else {
        bail!("no assessment to review");
    };

    let metadata: serde_json::Map<_, _> = controller
        .form()
        .fields()
        .iter()
        .map(|f| {
            let shown = match &f.control {
                Control::Auto(auto) => auto.text.clone(),
                other => other.value().to_string(),
            };
            (f.spec.label.clone(), json!(shown))
        })
        .collect();

    let report = json!({
        "metadata": metadata,
        "inferred": review.inferred.iter().map(|c| json!({
            "id": c.id,
            "label": c.label,
            "value": c.control.value(),
        })).collect::<Vec<_>>(),
        "context": review.extra_lines.iter().map(|l| json!({
            "label": l.label,
            "value": l.value_html,
        })).collect::<Vec<_>>(),
        "categories": review.categories,
        "rating": review.rating.value(),
        "final_comments": review.final_comments,
        "assessor_comments": review.assessor_comments,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
