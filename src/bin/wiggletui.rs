use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use crossterm::event::{self, Event as CEvent};
use crossterm::execute;
use crossterm::terminal::{enable_raw_mode, EnterAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use wiggletui::config::Config;
use wiggletui::logging::LogLevel;
use wiggletui::services::{load_context, CatalogSource, Dispatcher, HttpBackend};
use wiggletui::tui::App;

/// Terminal query builder for the WiggleDB genomic interval service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Write the log here instead of ./wiggletui.log
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Backend CGI endpoint (overrides backend.endpoint)
    #[arg(long = "endpoint", value_name = "URL")]
    endpoint: Option<String>,
    /// Attribute catalog URL or path (overrides backend.catalog)
    #[arg(long = "catalog", value_name = "URL|PATH")]
    catalog: Option<String>,
}

fn main() -> Result<()> {
    wiggletui::errors::init()?;
    let args = Args::parse();
    wiggletui::logging::init_with(args.log_file.clone(), args.logging.map(Into::into))?;

    let mut cfg = Config::from_path(args.config.as_ref()).wrap_err("Failed to load configuration")?;
    if let Some(endpoint) = args.endpoint {
        cfg.backend.endpoint = endpoint;
    }
    if let Some(catalog) = args.catalog {
        cfg.backend.catalog = catalog;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let endpoint = cfg.endpoint()?;
    let catalog = cfg.catalog_source();
    if let CatalogSource::File(path) = &catalog {
        info!("Reading attribute catalog from {}", path.display());
    }
    let backend = HttpBackend::new(endpoint, catalog, cfg.timeout()).map_err(|e| eyre!("{e:#}"))?;
    let builder = cfg.query_builder();

    // Nothing can be built without the catalog and the registry
    let ctx = runtime
        .block_on(load_context(&backend, &builder))
        .inspect_err(|e| error!("Startup load failed: {}", e))
        .wrap_err("Could not load the attribute catalog and annotation registry")?;

    let (dispatcher, events) = Dispatcher::new(Arc::new(backend), runtime.handle().clone());
    let mut app = App::new(&ctx, builder, dispatcher, events, cfg.keybindings()?, cfg.theme());

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    wiggletui::errors::restore_terminal();
    terminal.show_cursor()?;
    if let Err(e) = &res {
        error!("Error: {e}");
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key_event) = event::read()? {
                app.handle_key_event(key_event)?;
            }
        }
        app.update()?;

        if app.should_quit() {
            info!("Quitting");
            return Ok(());
        }
    }
}
