use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, info, trace};

use crate::domain::TableError;
use crate::table::{Document, Row, Table};

#[derive(Debug, PartialEq)]
enum FileType {
    HTML,
    CSV,
    PARQUET,
    ARROW,
}

/// Expand `~` and environment variables in a user supplied path.
pub fn expand_path(path: &str) -> Result<PathBuf, TableError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| TableError::InvalidArgument(format!("{path}: {e}")))
}

pub fn load_document(path: &Path) -> Result<Document, TableError> {
    let file_type = check_file(path)?;
    let start_time = Instant::now();
    let doc = match file_type {
        FileType::HTML => parse_html(&fs::read_to_string(path)?)?,
        FileType::CSV => load_frame(load_csv(path)?)?,
        FileType::PARQUET => load_frame(load_parquet(path)?)?,
        FileType::ARROW => load_frame(load_arrow(path)?)?,
    };
    info!(
        "Loaded {:?} from {} in {}ms",
        file_type,
        path.display(),
        start_time.elapsed().as_millis()
    );
    Ok(doc)
}

fn detect_file_type(path: &Path) -> Result<FileType, TableError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("HTML") | Some("HTM") => Ok(FileType::HTML),
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(TableError::UnknownFileType),
    }
}

fn check_file(path: &Path) -> Result<FileType, TableError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TableError::FileNotFound,
        ErrorKind::PermissionDenied => TableError::PermissionDenied,
        _ => TableError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TableError::LoadingFailed("Not a file!".into()));
    }
    debug!("{} is {} bytes", path.display(), metadata.len());
    detect_file_type(path)
}

fn selector(css: &str) -> Result<Selector, TableError> {
    Selector::parse(css).map_err(|e| TableError::LoadingFailed(format!("selector {css}: {e:?}")))
}

// Text of a cell without the options of a dropdown injected by an earlier render.
fn cell_text(cell: ElementRef) -> String {
    let text: String = cell
        .descendants()
        .filter(|n| {
            !n.ancestors()
                .any(|a| a.value().as_element().is_some_and(|e| e.name() == "select"))
        })
        .filter_map(|n| match n.value() {
            Node::Text(t) => Some(&**t),
            _ => None,
        })
        .collect();
    text.trim().to_string()
}

fn is_hidden(row: ElementRef) -> bool {
    row.value()
        .attr("style")
        .map(|s| s.replace(char::is_whitespace, "").contains("display:none"))
        .unwrap_or(false)
}

/// Build a document from the first `<table>` of a page. Pages without a table are fine.
pub fn parse_html(source: &str) -> Result<Document, TableError> {
    let html = Html::parse_document(source);
    let title = html
        .select(&selector("title")?)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string());

    let Some(element) = html.select(&selector("table")?).next() else {
        debug!("Page has no table");
        return Ok(Document { title, table: None });
    };

    let caption = element
        .select(&selector("caption")?)
        .next()
        .map(cell_text);

    let tr_selector = selector("tr")?;
    let mut rows = element.select(&tr_selector).map(|tr| {
        let cells: Vec<String> = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "th" | "td"))
            .map(cell_text)
            .collect();
        (cells, is_hidden(tr))
    });

    let headers = rows.next().map(|(cells, _)| cells).unwrap_or_default();
    let mut table = Table::new(headers, Vec::new());
    table.caption = caption;
    table.rows = rows
        .map(|(cells, hidden)| Row {
            cells,
            visible: !hidden,
        })
        .collect();
    trace!(
        "Parsed table with {} columns and {} rows",
        table.ncolumns(),
        table.rows.len()
    );

    Ok(Document {
        title,
        table: Some(table),
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<String>, PolarsError> {
    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    Ok(series
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).unwrap_or_default())
        .collect())
}

fn load_frame(frame: LazyFrame) -> Result<Document, TableError> {
    let df = frame.collect()?;
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    let columns = names
        .iter()
        .map(|name| load_column(&df, name))
        .collect::<Result<Vec<_>, _>>()?;

    let rows = (0..df.height())
        .map(|r| columns.iter().map(|c| c[r].clone()).collect())
        .collect();
    Ok(Document::with_table(Table::new(names, rows)))
}
