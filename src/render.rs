//! HTML output of a document after filtering and sorting.
//!
//! Mirrors the page layout the results generator writes: a sortable table whose header
//! cells call `sortTable(i)`, data rows inside `#tableBody`, and filter dropdowns inside
//! the filterable header cells.

use derive_setters::Setters;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::table::{Document, FilterSelect, HeaderCell, Row, Table};

#[derive(Debug, Clone, Default, Setters)]
#[setters(prefix = "with_")]
pub struct RenderOptions {
    pub stylesheet: Option<String>,
    pub script: Option<String>,
}

/// Render a full page around the document's table.
pub fn render_page(doc: &Document, opts: &RenderOptions) -> String {
    let title = doc.title.as_deref().unwrap_or("Results");
    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    page.push_str("  <meta charset=\"utf-8\">\n");
    page.push_str(
        "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1, shrink-to-fit=no\">\n",
    );
    page.push_str(&format!("  <title>{}</title>\n", encode_text(title)));
    if let Some(css) = &opts.stylesheet {
        page.push_str(&format!(
            "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\">\n",
            encode_double_quoted_attribute(css)
        ));
    }
    page.push_str("</head>\n\n<body>\n\n");
    if let Some(table) = &doc.table {
        page.push_str(&render_table(table));
    }
    if let Some(script) = &opts.script {
        page.push_str(&format!(
            "\n  <script src=\"{}\"></script>\n",
            encode_double_quoted_attribute(script)
        ));
    }
    page.push_str("</body>\n</html>\n");
    page
}

pub fn render_table(table: &Table) -> String {
    let mut out = String::from("<table id=\"sortableTable\">\n");
    if let Some(caption) = &table.caption {
        out.push_str(&format!("<caption>{}</caption>\n", encode_text(caption)));
    }
    out.push_str("<tr>\n");
    for (idx, header) in table.headers.iter().enumerate() {
        out.push_str(&render_header(idx, header));
    }
    out.push_str("</tr>\n<tbody id=\"tableBody\">\n");
    for row in table.rows.iter() {
        out.push_str(&render_row(row));
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

fn render_header(idx: usize, header: &HeaderCell) -> String {
    let select = header.select.as_ref().map(render_select).unwrap_or_default();
    format!(
        "    <th onclick=\"sortTable({idx})\">{}{select}</th>\n",
        encode_text(&header.text)
    )
}

fn render_select(select: &FilterSelect) -> String {
    let options: String = select
        .options
        .iter()
        .map(|o| {
            let marker = if *o == select.selected { " selected" } else { "" };
            format!(
                "<option value=\"{}\"{marker}>{}</option>",
                encode_double_quoted_attribute(o),
                encode_text(o)
            )
        })
        .collect();
    format!("<select>{options}</select>")
}

fn render_row(row: &Row) -> String {
    let style = if row.visible { "" } else { " style=\"display: none\"" };
    let cells: String = row
        .cells
        .iter()
        .map(|c| format!("    <td>{}</td>\n", encode_text(c)))
        .collect();
    format!("<tr{style}>\n{cells}</tr>\n")
}
