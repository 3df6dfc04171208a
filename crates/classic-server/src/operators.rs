//! Operator list.
//!
//! One name per line in a plain text file. The file is re-read on every
//! check, so edits apply without a restart.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use tracing::debug;

pub struct OperatorList {
    path: PathBuf,
}

impl OperatorList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn is_operator(&self, name: &str) -> bool {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => {
                debug!("Couldn't open operator file {}", self.path.display());
                return false;
            }
        };
        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .any(|line| line.trim() == name)
    }
}
