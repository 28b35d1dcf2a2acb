//! CLI binary for pdftools.
//!
//! A thin shim over the library crate: flags become a `ToolConfig` plus
//! page state on a `DocumentSession`, results are written to the output
//! directory, and failures are printed in the user's language.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use pdftools::emit::MEDIA_ZIP;
use pdftools::messages::{self, Message};
use pdftools::{
    bundle_zip, file_to_pdf, filter_accepted, images_to_pdf, inspect, merge, ocr, ocr_artifact,
    pdf_to_docx, pdf_to_images, pdf_to_pptx, pdf_to_text, pdf_to_xlsx, read_input, save_all,
    save_artifact, AcceptSet, AnnotationFile, AppSettings, Artifact, DocumentSession, ExtractMode,
    ImageFormat, InputFile, Language, OcrBackend, OutputNaming, PageFlags, PageSeparator,
    PageSpec, PdfToolsError, ProgressCallback, Rotation, SettingsStore, SplitMode, ToolConfig,
    ToolConfigBuilder, ToolProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress bar for multi-item tools (merge, split, rendering, OCR).
/// Items may finish out of order when OCR runs concurrently.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Hidden until a tool announces its item count in `on_start`, so
    /// single-step commands never flash a bar.
    fn new_dynamic() -> Arc<Self> {
        Arc::new(Self {
            bar: ProgressBar::hidden(),
            errors: AtomicUsize::new(0),
        })
    }

    fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl ToolProgressCallback for CliProgressCallback {
    fn on_start(&self, tool: &str, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len}  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.errors.store(0, Ordering::SeqCst);
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
        self.bar.set_prefix(tool.to_string());
        self.bar.reset_eta();
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_item_start(&self, item: usize, _total: usize) {
        self.bar.set_message(format!("#{item}"));
    }

    fn on_item_complete(&self, _item: usize, _total: usize) {
        self.bar.inc(1);
    }

    fn on_item_error(&self, item: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            let mut s: String = error.chars().take(79).collect();
            s.push('\u{2026}');
            s
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            red("✗"),
            item,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total
            .saturating_sub(success_count)
            .max(self.errors.load(Ordering::SeqCst).min(total));
        if failed > 0 {
            eprintln!(
                "{} {}/{} done  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Merge in the order given
  pdftools merge a.pdf b.pdf c.pdf -o out/

  # Keep pages 1 and 3, or write them as separate files
  pdftools extract report.pdf --pages 1,3
  pdftools extract report.pdf --pages 1,3 --separate --zip

  # Remove pages, rotate pages
  pdftools delete report.pdf --pages 2-4
  pdftools rotate scan.pdf --pages 1 --angle 90

  # Split into 5-page chunks, or into explicit ranges
  pdftools split book.pdf --every 5
  pdftools split book.pdf --ranges 1-3,4-10

  # Draw highlights, text, ink and shapes from a JSON file
  pdftools annotate form.pdf --annotations marks.json

  # Conversions
  pdftools convert to-pdf photo1.jpg photo2.png slides.pptx
  pdftools convert to-images report.pdf --pages 1-2 --format jpeg
  pdftools convert to-docx report.pdf

  # Recognise text in a scan (vision LLM by default)
  pdftools ocr scan.pdf --pages 1-3 --stdout

  # Interface language (persisted)
  pdftools lang set en

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (OCR)
  ANTHROPIC_API_KEY       Anthropic API key (OCR)
  GEMINI_API_KEY          Google Gemini API key (OCR)
  EDGEQUAKE_PROVIDER      Override OCR provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override OCR model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory) for rendering
  PDFTOOLS_CONFIG_DIR     Where the language preference is stored
"#;

/// Everyday PDF utilities.
#[derive(Parser, Debug)]
#[command(
    name = "pdftools",
    version,
    about = "Merge, split, rotate, annotate, OCR and convert PDF documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory for results.
    #[arg(short, long, global = true, env = "PDFTOOLS_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Interface language for this run only: ko or en.
    #[arg(long, global = true, env = "PDFTOOLS_LANG", value_parser = parse_language)]
    lang: Option<Language>,

    /// Bundle multiple results into one ZIP archive.
    #[arg(long, global = true, env = "PDFTOOLS_ZIP")]
    zip: bool,

    /// Print a JSON summary instead of text.
    #[arg(long, global = true, env = "PDFTOOLS_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PDFTOOLS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFTOOLS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFTOOLS_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, global = true, env = "PDFTOOLS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print document metadata.
    Info {
        /// PDF file path or HTTP/HTTPS URL.
        input: String,
    },
    /// Join PDFs in the order given.
    Merge {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Split a PDF into several files (default: one per page).
    Split {
        input: String,
        /// Chunks of N pages.
        #[arg(long, conflicts_with_all = ["ranges", "pages"])]
        every: Option<usize>,
        /// Explicit ranges, one file each: 1-3,4-10.
        #[arg(long, conflicts_with = "pages")]
        ranges: Option<String>,
        /// One file per listed page: 1,3,5 or 2-4.
        #[arg(long)]
        pages: Option<String>,
    },
    /// Copy selected pages into a new PDF.
    Extract {
        input: String,
        /// Pages to keep: 5, 3-15, 1,3,5 or 1-3,7.
        #[arg(long)]
        pages: String,
        /// One PDF per selected page.
        #[arg(long)]
        separate: bool,
    },
    /// Remove selected pages.
    Delete {
        input: String,
        #[arg(long)]
        pages: String,
    },
    /// Rotate selected pages clockwise.
    Rotate {
        input: String,
        #[arg(long, default_value = "all")]
        pages: String,
        /// Multiple of 90; negative turns counter-clockwise.
        #[arg(long, default_value_t = 90, allow_hyphen_values = true)]
        angle: i64,
    },
    /// Draw annotations from a JSON file into the pages.
    Annotate {
        input: String,
        #[arg(long)]
        annotations: PathBuf,
    },
    /// Convert to and from PDF.
    #[command(subcommand)]
    Convert(ConvertCommand),
    /// Recognise text in a scanned PDF or image.
    Ocr(OcrArgs),
    /// Show or persist the interface language.
    #[command(subcommand)]
    Lang(LangCommand),
}

#[derive(Subcommand, Debug)]
enum ConvertCommand {
    /// Images, Office files or text to PDF. Images are combined into one file.
    ToPdf {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Render pages to PNG or JPEG.
    ToImages {
        input: String,
        #[arg(long, default_value = "all")]
        pages: String,
        #[arg(long, value_enum, default_value = "png")]
        format: FormatArg,
        /// JPEG quality (1–100).
        #[arg(long, default_value_t = 90,
              value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
        /// Rendering DPI (72–400).
        #[arg(long, env = "PDFTOOLS_DPI", default_value_t = 150,
              value_parser = clap::value_parser!(u32).range(72..=400))]
        dpi: u32,
    },
    /// Extract the text layer.
    ToText {
        input: String,
        /// Page separator: none, rule, header, or a custom string.
        #[arg(long, default_value = "rule")]
        separator: String,
    },
    /// Text layer into a Word document.
    ToDocx { input: String },
    /// Text layer into a spreadsheet, one row per line.
    ToXlsx { input: String },
    /// Text layer into a slide deck, one slide per page.
    ToPptx { input: String },
}

#[derive(clap::Args, Debug)]
struct OcrArgs {
    /// PDF or image path, or HTTP/HTTPS URL.
    input: String,

    /// Pages to recognise (PDF only).
    #[arg(long, env = "PDFTOOLS_PAGES", default_value = "all")]
    pages: String,

    #[arg(long, value_enum, env = "PDFTOOLS_OCR_BACKEND", default_value = "vision")]
    backend: BackendArg,

    /// Tesseract language string, e.g. kor+eng.
    #[arg(long, env = "PDFTOOLS_OCR_LANG", default_value = "kor+eng")]
    ocr_lang: String,

    /// Vision LLM model ID (e.g. gpt-4.1-nano, gpt-4.1).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "PDFTOOLS_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Number of concurrent OCR calls.
    #[arg(short, long, env = "PDFTOOLS_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Retries per page on a transient failure.
    #[arg(long, env = "PDFTOOLS_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-page call timeout in seconds.
    #[arg(long, env = "PDFTOOLS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Page separator: none, rule, header, or a custom string.
    #[arg(long, default_value = "rule")]
    separator: String,

    /// Print the text instead of writing `<name>_ocr.txt`.
    #[arg(long)]
    stdout: bool,
}

#[derive(Subcommand, Debug)]
enum LangCommand {
    /// Print the effective language.
    Show,
    /// Persist a language for future runs.
    Set {
        #[arg(value_parser = parse_language)]
        language: Language,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Vision,
    Tesseract,
}

impl From<BackendArg> for OcrBackend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Vision => OcrBackend::Vision,
            BackendArg::Tesseract => OcrBackend::Tesseract,
        }
    }
}

fn parse_language(s: &str) -> std::result::Result<Language, String> {
    s.parse::<Language>().map_err(|e| e.to_string())
}

/// Run-wide output settings shared by every subcommand.
struct Ctx {
    lang: Language,
    output_dir: PathBuf,
    zip: bool,
    json: bool,
    quiet: bool,
    download_timeout: u64,
    progress: Option<Arc<CliProgressCallback>>,
}

impl Ctx {
    fn base_config(&self) -> ToolConfigBuilder {
        let mut builder = ToolConfig::builder().download_timeout_secs(self.download_timeout);
        if let Some(cb) = &self.progress {
            builder = builder.progress_callback(cb.clone() as ProgressCallback);
        }
        builder
    }

    fn notice(&self, message: Message) {
        if !self.quiet && !self.json {
            eprintln!("{} {}", cyan("ℹ"), message.text(self.lang));
        }
    }

    async fn read(&self, input: &str, accept: AcceptSet) -> Result<InputFile> {
        Ok(read_input(input, accept, self.download_timeout).await?)
    }

    async fn open(&self, input: &str) -> Result<DocumentSession> {
        let file = self.read(input, AcceptSet::PDF).await?;
        let mut session = DocumentSession::new();
        session.load_file(file)?;
        Ok(session)
    }

    /// Write results (or one ZIP of them) and report where they went.
    fn emit(&self, artifacts: Vec<Artifact>, zip_stem: &str) -> Result<Vec<PathBuf>> {
        if let Some(cb) = &self.progress {
            cb.finish();
        }

        let paths = if self.zip && artifacts.len() > 1 {
            let archive = bundle_zip(&artifacts, &format!("{zip_stem}.zip"))?;
            debug!("bundled {} files into {}", artifacts.len(), MEDIA_ZIP);
            vec![save_artifact(&archive, &self.output_dir)?]
        } else {
            save_all(&artifacts, &self.output_dir)?
        };

        if self.json {
            let files: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "status": "ok",
                    "files": files,
                }))
                .context("Failed to serialise summary")?
            );
        } else if !self.quiet {
            for path in &paths {
                eprintln!(
                    "{} {}",
                    green("✔"),
                    messages::saved_to(self.lang, &path.display().to_string())
                );
            }
        }
        Ok(paths)
    }
}

fn stem_of(session: &DocumentSession) -> String {
    OutputNaming::stem(session.name().unwrap_or("document"))
}

fn page_flags(session: &DocumentSession, pages: &str) -> Result<PageFlags> {
    let spec = PageSpec::parse(pages)?;
    Ok(PageFlags::from_spec(session.page_count(), &spec))
}

/// `1-3,5` → `[(1, 3), (5, 5)]`, order kept.
fn parse_ranges(s: &str) -> std::result::Result<Vec<(usize, usize)>, PdfToolsError> {
    let invalid = |part: &str| PdfToolsError::InvalidConfig(format!("Invalid page range '{part}'"));
    let mut ranges = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (part, part),
        };
        let start: usize = start.parse().map_err(|_| invalid(part))?;
        let end: usize = end.parse().map_err(|_| invalid(part))?;
        if start == 0 || start > end {
            return Err(invalid(part));
        }
        ranges.push((start, end));
    }
    if ranges.is_empty() {
        return Err(PdfToolsError::InvalidConfig("no page ranges given".into()));
    }
    Ok(ranges)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar gives the feedback that matters, so INFO-level
    // library logs are suppressed while it is visible.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Language: defaults first, then the stored preference, then --lang ──
    let mut settings = AppSettings::default();
    let store = match SettingsStore::default_location() {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Language preference unavailable: {e}");
            None
        }
    };
    if let Some(store) = &store {
        store.hydrate(&mut settings);
    }
    let lang = cli.lang.unwrap_or_else(|| settings.language());

    let ctx = Ctx {
        lang,
        output_dir: cli.output_dir.clone(),
        zip: cli.zip,
        json: cli.json,
        quiet: cli.quiet,
        download_timeout: cli.download_timeout,
        progress: show_progress.then(CliProgressCallback::new_dynamic),
    };

    let result = run(cli.command, &ctx, store, settings).await;
    if let Some(cb) = &ctx.progress {
        cb.finish();
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, lang);
            ExitCode::FAILURE
        }
    }
}

/// Print a failure the way the user should see it: the localised sentence
/// for library errors, the full context chain for anything else.
fn report(err: &anyhow::Error, lang: Language) {
    debug!("{err:?}");
    match err.chain().find_map(|e| e.downcast_ref::<PdfToolsError>()) {
        Some(e) => eprintln!("{} {}", red("✘"), e.user_message(lang)),
        None => eprintln!("{} {err:#}", red("✘")),
    }
}

async fn run(
    command: Command,
    ctx: &Ctx,
    store: Option<SettingsStore>,
    mut settings: AppSettings,
) -> Result<()> {
    match command {
        Command::Info { input } => {
            let file = ctx.read(&input, AcceptSet::PDF).await?;
            let meta = inspect(&file)?;
            if ctx.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
                );
                return Ok(());
            }
            println!("File:         {}", file.name);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            println!("Encrypted:    {}", meta.is_encrypted);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
            if let Some((w, h)) = meta.page_sizes.first() {
                println!("Page size:    {w:.0} × {h:.0} pt");
            }
        }

        Command::Merge { inputs } => {
            let intake = filter_accepted(&inputs, AcceptSet::PDF);
            let mut files = Vec::with_capacity(intake.accepted.len());
            for path in &intake.accepted {
                files.push(ctx.read(&path.to_string_lossy(), AcceptSet::PDF).await?);
            }
            let config = ctx.base_config().build()?;
            let merged = merge(&files, &config)?;
            ctx.emit(vec![merged], "merged")?;
        }

        Command::Split {
            input,
            every,
            ranges,
            pages,
        } => {
            let session = ctx.open(&input).await?;
            let mode = match (every, ranges, pages) {
                (Some(n), _, _) => SplitMode::EveryN(n),
                (None, Some(r), _) => SplitMode::Ranges(parse_ranges(&r)?),
                (None, None, Some(p)) => SplitMode::Selected(page_flags(&session, &p)?),
                (None, None, None) => SplitMode::EveryPage,
            };
            let parts = session.split(&mode)?;
            ctx.emit(parts, &stem_of(&session))?;
        }

        Command::Extract {
            input,
            pages,
            separate,
        } => {
            let mut session = ctx.open(&input).await?;
            let flags = page_flags(&session, &pages)?;
            *session.flags_mut()? = flags;
            let mode = if separate {
                ExtractMode::SeparateFiles
            } else {
                ExtractMode::SinglePdf
            };
            let out = session.extract(mode)?;
            ctx.emit(out, &format!("extracted_{}", stem_of(&session)))?;
        }

        Command::Delete { input, pages } => {
            let mut session = ctx.open(&input).await?;
            let flags = page_flags(&session, &pages)?;
            *session.flags_mut()? = flags;
            let out = session.delete_marked()?;
            ctx.emit(vec![out], &stem_of(&session))?;
        }

        Command::Rotate {
            input,
            pages,
            angle,
        } => {
            let rotation = Rotation::from_degrees(angle).ok_or_else(|| {
                PdfToolsError::InvalidConfig(format!("angle must be a multiple of 90 (got {angle})"))
            })?;
            let mut session = ctx.open(&input).await?;
            let targets = PageSpec::parse(&pages)?.to_indices(session.page_count());
            let rotations = session.rotations_mut()?;
            for index in targets {
                rotations.set(index + 1, rotation);
            }
            let out = session.rotate()?;
            ctx.emit(vec![out], &stem_of(&session))?;
        }

        Command::Annotate { input, annotations } => {
            let json = tokio::fs::read_to_string(&annotations)
                .await
                .with_context(|| format!("Failed to read annotations from {:?}", annotations))?;
            let (layer, canvas) = AnnotationFile::from_json(&json)?.into_parts();

            let mut session = ctx.open(&input).await?;
            *session.annotations_mut()? = layer;
            let out = session.annotate(&canvas)?;
            ctx.emit(vec![out], &stem_of(&session))?;
        }

        Command::Convert(cmd) => convert(cmd, ctx).await?,

        Command::Ocr(args) => run_ocr(args, ctx).await?,

        Command::Lang(LangCommand::Show) => {
            if ctx.json {
                println!("{}", serde_json::json!({ "language": ctx.lang.code() }));
            } else {
                println!("{}", ctx.lang);
            }
        }

        Command::Lang(LangCommand::Set { language }) => {
            let store = match store {
                Some(store) => store,
                None => SettingsStore::default_location()?,
            };
            settings.set_language(language);
            store.save(&settings)?;
            if !ctx.quiet {
                eprintln!(
                    "{} {}",
                    green("✔"),
                    messages::saved_to(language, &store.path().display().to_string())
                );
            }
        }
    }
    Ok(())
}

async fn convert(cmd: ConvertCommand, ctx: &Ctx) -> Result<()> {
    match cmd {
        ConvertCommand::ToPdf { inputs } => {
            let accept = AcceptSet::IMAGES
                .union(AcceptSet::OFFICE)
                .union(AcceptSet::TEXT);
            let intake = filter_accepted(&inputs, accept);
            if intake.accepted.is_empty() {
                return Err(PdfToolsError::NotEnoughFiles { needed: 1, got: 0 }.into());
            }

            let mut images = Vec::new();
            let mut others = Vec::new();
            for path in &intake.accepted {
                let file = ctx.read(&path.to_string_lossy(), accept).await?;
                if file.kind.is_image() {
                    images.push(file);
                } else {
                    others.push(file);
                }
            }

            let config = ctx.base_config().build()?;
            let mut out = Vec::with_capacity(others.len() + 1);
            if !images.is_empty() {
                out.push(images_to_pdf(&images, &config)?);
            }
            for file in &others {
                out.push(file_to_pdf(file, &config)?);
            }
            ctx.emit(out, "converted")?;
        }

        ConvertCommand::ToImages {
            input,
            pages,
            format,
            quality,
            dpi,
        } => {
            let file = ctx.read(&input, AcceptSet::PDF).await?;
            let image_format = match format {
                FormatArg::Png => ImageFormat::Png,
                FormatArg::Jpeg => ImageFormat::Jpeg { quality },
            };
            let config = ctx
                .base_config()
                .dpi(dpi)
                .image_format(image_format)
                .build()?;
            let spec = PageSpec::parse(&pages)?;
            let out = pdf_to_images(&file.bytes, &file.name, &spec, &config).await?;
            ctx.emit(out, &OutputNaming::stem(&file.name))?;
        }

        ConvertCommand::ToText { input, separator } => {
            let file = ctx.read(&input, AcceptSet::PDF).await?;
            let config = ctx
                .base_config()
                .page_separator(PageSeparator::parse(&separator))
                .build()?;
            ctx.notice(Message::LossyConversion);
            let out = pdf_to_text(&file.bytes, &file.name, &config)?;
            ctx.emit(vec![out], &OutputNaming::stem(&file.name))?;
        }

        ConvertCommand::ToDocx { input } => {
            let file = ctx.read(&input, AcceptSet::PDF).await?;
            ctx.notice(Message::LossyConversion);
            let out = pdf_to_docx(&file.bytes, &file.name)?;
            ctx.emit(vec![out], &OutputNaming::stem(&file.name))?;
        }

        ConvertCommand::ToXlsx { input } => {
            let file = ctx.read(&input, AcceptSet::PDF).await?;
            ctx.notice(Message::LossyConversion);
            let out = pdf_to_xlsx(&file.bytes, &file.name)?;
            ctx.emit(vec![out], &OutputNaming::stem(&file.name))?;
        }

        ConvertCommand::ToPptx { input } => {
            let file = ctx.read(&input, AcceptSet::PDF).await?;
            ctx.notice(Message::LossyConversion);
            let out = pdf_to_pptx(&file.bytes, &file.name)?;
            ctx.emit(vec![out], &OutputNaming::stem(&file.name))?;
        }
    }
    Ok(())
}

async fn run_ocr(args: OcrArgs, ctx: &Ctx) -> Result<()> {
    let file = ctx
        .read(&args.input, AcceptSet::PDF.union(AcceptSet::IMAGES))
        .await?;

    let mut builder = ctx
        .base_config()
        .dpi(args.dpi)
        .ocr_backend(args.backend.into())
        .ocr_language(args.ocr_lang.clone())
        .concurrency(args.concurrency)
        .max_retries(args.max_retries)
        .api_timeout_secs(args.api_timeout)
        .page_separator(PageSeparator::parse(&args.separator));
    if let Some(model) = &args.model {
        builder = builder.model(model.clone());
    }
    if let Some(provider) = &args.provider {
        builder = builder.provider_name(provider.clone());
    }
    let config = builder.build().context("Invalid configuration")?;

    let spec = PageSpec::parse(&args.pages)?;
    let output = ocr(&file, &spec, &config).await?;

    if args.stdout {
        if let Some(cb) = &ctx.progress {
            cb.finish();
        }
        if ctx.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?
            );
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.text.as_bytes())
                .context("Failed to write to stdout")?;
            if !output.text.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    } else {
        ctx.emit(vec![ocr_artifact(&file.name, &output)], &OutputNaming::stem(&file.name))?;
    }

    if !ctx.quiet && !ctx.json {
        let stats = &output.stats;
        eprintln!(
            "{}  {}/{} pages  {}ms",
            if stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.processed_pages,
            stats.total_pages,
            stats.total_duration_ms,
        );
        if stats.total_input_tokens > 0 {
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&stats.total_input_tokens.to_string()),
                dim(&stats.total_output_tokens.to_string()),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_keep_order_and_singletons() {
        assert_eq!(parse_ranges("4-6, 1 ,2-2").unwrap(), vec![(4, 6), (1, 1), (2, 2)]);
    }

    #[test]
    fn ranges_reject_garbage() {
        assert!(parse_ranges("3-1").is_err());
        assert!(parse_ranges("0-2").is_err());
        assert!(parse_ranges("a-b").is_err());
        assert!(parse_ranges(" , ").is_err());
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pdftools", "rotate", "a.pdf", "--angle", "-90", "--lang", "en"])
            .unwrap();
        assert_eq!(cli.lang, Some(Language::English));
        match cli.command {
            Command::Rotate { angle, pages, .. } => {
                assert_eq!(angle, -90);
                assert_eq!(pages, "all");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
