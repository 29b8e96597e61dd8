use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Args, Parser, Subcommand};
use ratatui::DefaultTerminal;
use tracing::{debug, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, prelude::*};

mod controller;
mod domain;
mod filter;
mod loader;
mod model;
mod render;
mod sort;
mod table;
mod ui;

use controller::Controller;
use domain::{SortMemory, TableConfig, TableError, WILDCARD};
use model::{Model, Status};
use render::RenderOptions;
use ui::TableUI;

#[derive(Parser, Debug)]
#[command(version, about = "Dropdown filters and click-to-sort for HTML result tables")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Write logs to this file, verbosity is taken from RUST_LOG
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply filter selections and sorts, then write the page as HTML
    Render {
        #[command(flatten)]
        table: TableArgs,

        /// Filter selection as COLUMN=VALUE, may be repeated
        #[arg(long = "select", value_parser = parse_selection)]
        selections: Vec<(usize, String)>,

        /// Sort by column index, applied in the given order after the selections
        #[arg(long = "sort")]
        sorts: Vec<usize>,

        /// Output file, stdout when missing
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        stylesheet: Option<String>,

        #[arg(long)]
        script: Option<String>,
    },
    /// Browse the table in the terminal
    View {
        #[command(flatten)]
        table: TableArgs,
    },
}

#[derive(Args, Debug)]
struct TableArgs {
    /// HTML page, CSV, Parquet or Arrow file
    input: String,

    /// Columns that get a dropdown filter
    #[arg(long, value_delimiter = ',', default_values_t = domain::DEFAULT_FILTERABLE_COLUMNS)]
    filter_columns: Vec<usize>,

    /// Columns that can be sorted, all when missing
    #[arg(long, value_delimiter = ',')]
    sortable_columns: Option<Vec<usize>>,

    /// Label of the "no filter" option
    #[arg(long, default_value = WILDCARD)]
    wildcard: String,

    #[arg(long, value_enum, default_value_t = SortMemory::SingleColumn)]
    sort_memory: SortMemory,

    /// Event poll interval of the viewer in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

impl TableArgs {
    fn config(&self) -> TableConfig {
        TableConfig::default()
            .with_filterable_columns(self.filter_columns.clone())
            .with_sortable_columns(self.sortable_columns.clone())
            .with_wildcard(self.wildcard.clone())
            .with_sort_memory(self.sort_memory)
            .with_event_poll_time(self.poll_ms)
    }

    fn load_model(&self) -> Result<Model, TableError> {
        let path = loader::expand_path(&self.input)?;
        let doc = loader::load_document(&path)?;
        Model::init(doc, &self.config())
    }
}

fn parse_selection(s: &str) -> Result<(usize, String), String> {
    let (column, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got \"{s}\""))?;
    let column = column
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad column in \"{s}\": {e}"))?;
    Ok((column, value.to_string()))
}

fn init_tracing(log_file: Option<&PathBuf>, interactive: bool) -> Result<(), TableError> {
    let writer = match log_file {
        Some(path) => BoxMakeWriter::new(Mutex::new(fs::File::create(path)?)),
        // Logging to the terminal would garble the viewer.
        None if interactive => return Ok(()),
        None => BoxMakeWriter::new(std::io::stderr),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Command::View { .. });
    let result = init_tracing(cli.log_file.as_ref(), interactive).and_then(|_| run(cli.command));
    match result {
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

/// Load the input, apply every selection, then every sort in order, and render the page.
fn render_batch(
    table: &TableArgs,
    selections: &[(usize, String)],
    sorts: &[usize],
    opts: &RenderOptions,
) -> Result<String, TableError> {
    let mut model = table.load_model()?;
    for (column, value) in selections.iter() {
        model.select_filter(*column, value)?;
    }
    for &column in sorts.iter() {
        let direction = model.sort_column(column)?;
        debug!("Sorted column {} {:?}", column, direction);
    }
    Ok(render::render_page(model.document(), opts))
}

fn run(command: Command) -> Result<(), TableError> {
    match command {
        Command::Render {
            table,
            selections,
            sorts,
            output,
            stylesheet,
            script,
        } => {
            let opts = RenderOptions::default()
                .with_stylesheet(stylesheet)
                .with_script(script);
            let page = render_batch(&table, &selections, &sorts, &opts)?;
            match output {
                Some(path) => {
                    fs::write(&path, page)?;
                    info!("Wrote {}", path.display());
                }
                None => print!("{page}"),
            }
            Ok(())
        }
        Command::View { table } => {
            let cfg = table.config();
            let mut model = table.load_model()?;
            view(&mut model, &cfg)
        }
    }
}

fn view(model: &mut Model, cfg: &TableConfig) -> Result<(), TableError> {
    let ui = TableUI::new();
    let controller = Controller::new(cfg);
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, model, &ui, &controller);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &TableUI,
    controller: &Controller,
) -> Result<(), TableError> {
    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event()?;
        model.update(message)?;
    }
    Ok(())
}
