//! # Etikett CLI
//!
//! Command-line interface for the label service.
//!
//! ## Usage
//!
//! ```bash
//! # Run the HTTP service, printing through CUPS
//! etikett serve --config etikett.toml cups://Brother_QL-700
//!
//! # List installed fonts
//! etikett fonts
//!
//! # Render a label to a PDF with two copies
//! etikett render --label-size 57x32 --copies 2 --pdf label.pdf "Ofengemüse (29.12.2024)"
//!
//! # Render a PNG preview with a barcode
//! etikett render --barcode grcy:p:42 --png label.png "Milch"
//!
//! # Print directly to a network printer
//! etikett render --print tcp://192.168.1.20:9100 "Milch"
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use etikett::{
    Config, LabelError, compose,
    dispatch::{Spooler, backend_from_descriptor},
    font::{FontRegistry, registry::SYSTEM_FONT_DIRS},
    grocy::GrocyClient,
    label::Orientation,
    package,
    server::{self, AppState, LabelParams},
};

/// Etikett - label rendering and printing service
#[derive(Parser, Debug)]
#[command(name = "etikett")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter (e.g. "info", "etikett=debug"); RUST_LOG takes precedence
    #[arg(long, global = true)]
    loglevel: Option<String>,

    /// Folder with additional .ttf/.otf fonts
    #[arg(long, global = true, value_name = "DIR")]
    font_folder: Option<PathBuf>,

    /// Label size used when a request does not name one (e.g. "57x32", "62")
    #[arg(long, global = true)]
    default_label_size: Option<String>,

    /// Orientation used when a request does not name one
    #[arg(long, global = true)]
    default_orientation: Option<Orientation>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP label service
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Printer descriptor (file:///dev/usb/lp0, tcp://host:9100, cups://queue)
        printer: Option<String>,
    },

    /// List installed fonts
    Fonts,

    /// Render a single label
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Label text; "\n" starts a new line
    text: String,

    /// Font as "Family (Style)"
    #[arg(long)]
    font: Option<String>,

    /// Font size in points
    #[arg(long)]
    font_size: Option<f32>,

    #[arg(long)]
    label_size: Option<String>,

    #[arg(long)]
    orientation: Option<String>,

    #[arg(long)]
    dpi: Option<u32>,

    /// left, center or right
    #[arg(long)]
    align: Option<String>,

    /// Pixels between lines
    #[arg(long)]
    line_spacing: Option<u32>,

    /// Margin on all sides in mm
    #[arg(long)]
    margin: Option<f32>,

    /// words or characters
    #[arg(long)]
    wrap: Option<String>,

    /// Code 128 payload printed along the bottom
    #[arg(long)]
    barcode: Option<String>,

    #[arg(long, default_value = "1")]
    copies: i64,

    /// Write the PDF here
    #[arg(long, value_name = "FILE")]
    pdf: Option<PathBuf>,

    /// Write a PNG preview here
    #[arg(long, value_name = "FILE")]
    png: Option<PathBuf>,

    /// Send to this printer descriptor
    #[arg(long, value_name = "PRINTER")]
    print: Option<String>,
}

impl RenderArgs {
    fn params(&self) -> LabelParams {
        let margin = self.margin.map(|m| m.to_string());
        LabelParams {
            font_family: self.font.clone(),
            font_size: self.font_size.map(|v| v.to_string()),
            label_size: self.label_size.clone(),
            orientation: self.orientation.clone(),
            dpi: self.dpi.map(|v| v.to_string()),
            margin_top: margin.clone(),
            margin_bottom: margin.clone(),
            margin_left: margin.clone(),
            margin_right: margin,
            line_spacing: self.line_spacing.map(|v| v.to_string()),
            align: self.align.clone(),
            wrap: self.wrap.clone(),
            ..Default::default()
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), LabelError> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.global.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    init_tracing(&config.server.log_level);
    config.validate()?;

    let fonts = load_fonts(&config)?;

    match cli.command {
        Commands::Serve { .. } => {
            let spooler = match &config.printer.printer {
                Some(descriptor) => Some(Spooler::new(
                    config.printer.spool_dir(),
                    backend_from_descriptor(descriptor)?,
                )),
                None => {
                    tracing::warn!("No printer configured, print endpoints will fail");
                    None
                }
            };
            let grocy = match &config.grocy.base_url {
                Some(url) => Some(GrocyClient::new(url, config.grocy.api_key.as_deref().unwrap_or_default())?),
                None => {
                    if config.grocy.print_alias {
                        tracing::warn!("grocy.print_alias is set but grocy.base_url is not");
                    }
                    None
                }
            };
            let mut state = AppState::new(config, fonts, spooler);
            if let Some(client) = grocy {
                state = state.with_aliases(Arc::new(client));
            }
            let state = Arc::new(state);

            // The blocking Grocy client must be dropped outside the runtime.
            let runtime = tokio::runtime::Runtime::new()?;
            let result = runtime.block_on(server::serve(Arc::clone(&state)));
            drop(runtime);
            drop(state);
            result
        }
        Commands::Fonts => {
            for (family, styles) in fonts.families() {
                println!("{} ({})", family, styles.join(", "));
            }
            if let Some(default) = fonts.default_font() {
                println!("\nDefault: {}", default);
            }
            Ok(())
        }
        Commands::Render(args) => render(config, fonts, &args),
    }
}

/// CLI flags win over the configuration file.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    let global = &cli.global;
    if let Some(folder) = &global.font_folder {
        config.server.font_folder = Some(folder.clone());
    }
    if let Some(size) = &global.default_label_size {
        config.label.default_size = size.clone();
    }
    if let Some(orientation) = global.default_orientation {
        config.label.default_orientation = orientation;
    }
    if let Some(level) = &global.loglevel {
        config.server.log_level = level.clone();
    }
    if let Commands::Serve { port, printer } = &cli.command {
        if let Some(port) = port {
            config.server.port = *port;
        }
        if let Some(printer) = printer {
            config.printer.printer = Some(printer.clone());
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", level).into()),
        )
        .init();
}

/// Scan the configured font folder and the system directories, then pick
/// the default font.
fn load_fonts(config: &Config) -> Result<FontRegistry, LabelError> {
    let mut dirs: Vec<PathBuf> = config.server.font_folder.iter().cloned().collect();
    dirs.extend(SYSTEM_FONT_DIRS.iter().map(PathBuf::from));

    let mut fonts = FontRegistry::scan(&dirs);
    if fonts.is_empty() {
        return Err(LabelError::Config(
            "Not a single font was found on your system. Please install some or use the \"--font-folder\" argument"
                .to_string(),
        ));
    }
    if let Some(default) = fonts.choose_default(&config.label.default_fonts) {
        tracing::debug!(font = %default, "Selected default font");
    }
    Ok(fonts)
}

fn render(config: Config, fonts: FontRegistry, args: &RenderArgs) -> Result<(), LabelError> {
    let state = AppState::new(config, fonts, None);
    let spec = server::build_spec(&state, &args.params())?;
    let text = args.text.replace("\\n", "\n");

    let canvas = compose::render(&spec, &text, args.barcode.as_deref(), &state.barcode)?;
    println!(
        "Rendered {}x{} px label at {} DPI",
        canvas.width(),
        canvas.height(),
        canvas.dpi()
    );

    if let Some(path) = &args.png {
        std::fs::write(path, package::preview_png(&canvas)?)?;
        println!("Saved preview to {}", path.display());
    }

    let document = package::package(&canvas, args.copies)?;
    if let Some(path) = &args.pdf {
        document.write_to(path)?;
        println!("Saved {} page(s) to {}", document.page_count(), path.display());
    }

    if let Some(descriptor) = &args.print {
        let spooler = Spooler::new(state.config.printer.spool_dir(), backend_from_descriptor(descriptor)?);
        let name = text.lines().next().unwrap_or("label");
        spooler.submit(name, &document)?;
        println!("Printed {} page(s) via {}", document.page_count(), spooler.backend().name());
    }

    Ok(())
}
