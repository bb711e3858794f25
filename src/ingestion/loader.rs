//! Extension-keyed file loaders.
//!
//! Every supported extension maps to one [`LoaderKind`]; each kind turns a
//! file on disk into a list of [`LoadedDocument`]s:
//!
//! | Extension | Loader | Documents produced |
//! |-----------|--------|--------------------|
//! | `.pdf` | [`LoaderKind::Pdf`] | one per page |
//! | `.csv` | [`LoaderKind::Csv`] | one per record, `header: value` lines |
//! | `.xlsx`, `.xls` | [`LoaderKind::Spreadsheet`] | one per worksheet |
//! | `.txt`, `.md`, `.json` | [`LoaderKind::Text`] | one for the whole file |

use crate::types::{AppError, LoadedDocument, Result, SourceMetadata};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// Extensions accepted by the upload form, with the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &[".pdf", ".csv", ".xlsx", ".xls", ".txt", ".md", ".json"];

/// Parsing strategy for one family of file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    /// Page-aware PDF text extraction
    Pdf,
    /// Row-oriented CSV records
    Csv,
    /// Excel workbooks, cell text per worksheet
    Spreadsheet,
    /// Raw UTF-8 text
    Text,
}

const LOADERS: &[(&str, LoaderKind)] = &[
    (".pdf", LoaderKind::Pdf),
    (".csv", LoaderKind::Csv),
    (".xlsx", LoaderKind::Spreadsheet),
    (".xls", LoaderKind::Spreadsheet),
    (".txt", LoaderKind::Text),
    (".md", LoaderKind::Text),
    (".json", LoaderKind::Text),
];

/// Look up the loader for an extension (`".pdf"` or `"pdf"`, any case).
pub fn select_loader(extension: &str) -> Result<LoaderKind> {
    let normalized = normalize_extension(extension);

    LOADERS
        .iter()
        .find(|(ext, _)| *ext == normalized)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| {
            if normalized.is_empty() {
                AppError::UnsupportedFileType("(no extension)".to_string())
            } else {
                AppError::UnsupportedFileType(normalized)
            }
        })
}

/// Pick the loader from a path's extension and parse the file.
pub fn load_file(path: &Path) -> Result<Vec<LoadedDocument>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let loader = select_loader(extension)?;

    tracing::debug!(path = %path.display(), loader = loader.name(), "Loading file");
    loader.parse(path)
}

fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().trim_start_matches('.').to_lowercase();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed)
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl LoaderKind {
    /// Parse the file at `path` into documents.
    pub fn parse(&self, path: &Path) -> Result<Vec<LoadedDocument>> {
        let source = source_name(path);
        match self {
            LoaderKind::Pdf => parse_pdf(path, &source),
            LoaderKind::Csv => parse_csv(path, &source),
            LoaderKind::Spreadsheet => parse_spreadsheet(path, &source),
            LoaderKind::Text => parse_text(path, &source),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LoaderKind::Pdf => "pdf",
            LoaderKind::Csv => "csv",
            LoaderKind::Spreadsheet => "spreadsheet",
            LoaderKind::Text => "text",
        }
    }
}

fn parse_pdf(path: &Path, source: &str) -> Result<Vec<LoadedDocument>> {
    let document = lopdf::Document::load(path).map_err(|e| AppError::parse(source, e))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        let content = match document.extract_text(&[*page_number]) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    file = source,
                    page = page_number,
                    error = %e,
                    "Skipping unreadable page"
                );
                continue;
            }
        };

        pages.push(LoadedDocument {
            content,
            metadata: SourceMetadata {
                source: source.to_string(),
                page: Some(*page_number),
                ..Default::default()
            },
        });
    }

    Ok(pages)
}

fn parse_csv(path: &Path, source: &str) -> Result<Vec<LoadedDocument>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::parse(source, e))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::parse(source, e))?
        .clone();

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AppError::parse(source, e))?;

        let content = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{}: {}", header.trim(), value.trim()))
            .collect::<Vec<_>>()
            .join("\n");

        rows.push(LoadedDocument {
            content,
            metadata: SourceMetadata {
                source: source.to_string(),
                row: Some(row as u32),
                ..Default::default()
            },
        });
    }

    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{:?}", e),
    }
}

fn parse_spreadsheet(path: &Path, source: &str) -> Result<Vec<LoadedDocument>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| AppError::parse(source, e))?;

    let mut sheets = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| AppError::parse(source, format!("sheet '{}': {}", sheet_name, e)))?;

        let mut content = String::new();
        for row in range.rows() {
            let cells: Vec<String> = row.iter().map(cell_text).collect();
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }
            content.push_str(&cells.join(" | "));
            content.push('\n');
        }

        sheets.push(LoadedDocument {
            content,
            metadata: SourceMetadata {
                source: source.to_string(),
                sheet: Some(sheet_name),
                ..Default::default()
            },
        });
    }

    Ok(sheets)
}

fn parse_text(path: &Path, source: &str) -> Result<Vec<LoadedDocument>> {
    let bytes = std::fs::read(path).map_err(|e| AppError::parse(source, e))?;
    let content = String::from_utf8(bytes)
        .map_err(|e| AppError::parse(source, format!("not valid UTF-8: {}", e)))?;

    Ok(vec![LoadedDocument {
        content,
        metadata: SourceMetadata {
            source: source.to_string(),
            ..Default::default()
        },
    }])
}
