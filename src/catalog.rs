//! # Workshop Catalog Module
//!
//! Lists the machines of a workshop by reading the machine column of the
//! workshop's spreadsheet. The file is re-read on every call; rosters are
//! small and lookups are user-triggered.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::WorkshopRegistry;
use crate::errors::LookupError;

/// Machine roster lookup over the configured workshops
#[derive(Debug, Clone)]
pub struct Catalog {
    workshops: WorkshopRegistry,
    column: String,
}

impl Catalog {
    /// Create a catalog reading `column` from each workshop spreadsheet
    pub fn new(workshops: WorkshopRegistry, column: impl Into<String>) -> Self {
        Self {
            workshops,
            column: column.into(),
        }
    }

    pub fn workshops(&self) -> &WorkshopRegistry {
        &self.workshops
    }

    /// Spreadsheet path backing a workshop, if the workshop is configured
    pub fn resource_path(&self, workshop: &str) -> Option<&Path> {
        self.workshops.get(workshop).map(|w| w.path.as_path())
    }

    /// List the machines of `workshop` in spreadsheet row order.
    ///
    /// Blank cells are dropped, duplicates are kept. Parsing happens on the
    /// blocking pool so the dispatcher is never stalled by a large file.
    pub async fn list_machines(&self, workshop: &str) -> Result<Vec<String>, LookupError> {
        let path = self
            .resource_path(workshop)
            .ok_or_else(|| LookupError::UnknownWorkshop(workshop.to_string()))?
            .to_path_buf();
        let column = self.column.clone();

        debug!(workshop = %workshop, path = %path.display(), "Reading workshop roster");

        let task_path = path.clone();
        tokio::task::spawn_blocking(move || read_machine_column(&task_path, &column))
            .await
            .map_err(|e| LookupError::ResourceUnreadable {
                path,
                cause: e.to_string(),
            })?
    }
}

/// Read the non-empty values below the `column` header of the first worksheet
pub fn read_machine_column(path: &Path, column: &str) -> Result<Vec<String>, LookupError> {
    if !path.exists() {
        return Err(LookupError::ResourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(path, e))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => return Err(unreadable(path, e)),
        None => return Err(unreadable(path, "workbook has no worksheets")),
    };

    let mut rows = range.rows();
    let index = rows
        .next()
        .and_then(|header| {
            header
                .iter()
                .position(|cell| cell_text(cell).as_deref() == Some(column))
        })
        .ok_or_else(|| LookupError::SchemaMismatch {
            path: path.to_path_buf(),
            column: column.to_string(),
        })?;

    Ok(rows
        .filter_map(|row| row.get(index))
        .filter_map(cell_text)
        .collect())
}

/// Trimmed text of a cell; `None` for empty, blank and error cells
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        other => {
            let text = other.to_string();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

fn unreadable(path: &Path, cause: impl std::fmt::Display) -> LookupError {
    LookupError::ResourceUnreadable {
        path: PathBuf::from(path),
        cause: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_filters_blanks() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("   ".to_string())), None);
        assert_eq!(
            cell_text(&Data::String("  Станок 1 ".to_string())),
            Some("Станок 1".to_string())
        );
    }

    #[test]
    fn test_cell_text_renders_numbers() {
        assert_eq!(cell_text(&Data::Float(101.0)), Some("101".to_string()));
        assert_eq!(cell_text(&Data::Int(7)), Some("7".to_string()));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = read_machine_column(Path::new("/non/existent/workshop.xlsx"), "Машина");
        assert!(matches!(result, Err(LookupError::ResourceNotFound { .. })));
    }
}
