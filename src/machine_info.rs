//! # Machine Info Module
//!
//! Looks up free-text machine descriptions in a flat UTF-8 file made of
//! blocks like:
//!
//! ```text
//! Станок 1
//! Any number of lines
//! describing the machine
//! <
//! ```
//!
//! The identifier line and the `<` sentinel are compared after trimming;
//! the lines between them are returned verbatim.

use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

use crate::errors::LookupError;

/// Line that terminates a machine block
pub const BLOCK_SENTINEL: &str = "<";

/// Info text attached to one machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineInfoBlock {
    pub machine: String,
    pub body: String,
}

/// Read-only view over the machine info file
#[derive(Debug, Clone)]
pub struct MachineInfoSource {
    path: PathBuf,
}

impl MachineInfoSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Find the first block for `machine`, re-reading the file on each call
    pub async fn find_machine_info(&self, machine: &str) -> Result<MachineInfoBlock, LookupError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LookupError::ResourceNotFound {
                    path: self.path.clone(),
                });
            }
            Err(e) => {
                return Err(LookupError::ResourceUnreadable {
                    path: self.path.clone(),
                    cause: e.to_string(),
                });
            }
        };

        debug!(machine = %machine, bytes = content.len(), "Scanning machine info file");

        find_block(&content, machine)
            .map(|body| MachineInfoBlock {
                machine: machine.to_string(),
                body,
            })
            .ok_or_else(|| LookupError::NotFound {
                machine: machine.to_string(),
            })
    }
}

/// Body of the first block keyed by `machine`, or `None` when no line matches.
///
/// A block without a closing sentinel runs to the end of the text. Blank
/// identifiers and the sentinel itself never match.
pub fn find_block(content: &str, machine: &str) -> Option<String> {
    // Guard only; matching compares trimmed lines against the id as given
    let guard = machine.trim();
    if guard.is_empty() || guard == BLOCK_SENTINEL {
        return None;
    }

    let mut lines = content.split_inclusive('\n');
    lines.find(|line| line.trim() == machine)?;

    Some(
        lines
            .take_while(|line| line.trim() != BLOCK_SENTINEL)
            .collect(),
    )
}
