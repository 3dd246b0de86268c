//! Pair List Tool
//!
//! This crate drives the `radius-pair` engine from files: a JSON
//! configuration supplies the dictionary and arena limits, and pair lists
//! are read from legacy `Name op value` text.
//!
//! # Features
//!
//! - JSON configuration with dictionary definitions
//! - Load, print and canonically sort pair files
//! - Validate a pair file against a filter file
//!
//! # Example
//!
//! ```rust
//! use radius_pairtool::{Config, Session};
//!
//! let config = Config::example();
//! let mut session = Session::new(&config).unwrap();
//!
//! let list = session.parse("NAS-Port = 5, User-Name = \"bob\"").unwrap();
//! assert_eq!(session.print(list, true).unwrap(), vec![
//!     "User-Name = \"bob\"".to_string(),
//!     "NAS-Port = 5".to_string(),
//! ]);
//! ```

pub mod config;

pub use config::{AttributeDef, Config, ConfigError};

use radius_pair::{
    Arena, Dictionary, ListId, ScopeId, Validation, ValidationFailure, ValidationMode,
    cmp_by_parent_num,
};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Dictionary plus the arena that holds every list loaded from files
pub struct Session {
    dict: Dictionary,
    arena: Arena,
    scope: ScopeId,
    mode: ValidationMode,
}

impl Session {
    /// Build a session from a validated configuration
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let dict = config.build_dictionary()?;
        let mut arena = Arena::with_config(config.arena.clone());
        let scope = arena.new_scope(None)?;
        Ok(Session {
            dict,
            arena,
            scope,
            mode: config.validation_mode(),
        })
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Override the configured validation mode
    pub fn set_mode(&mut self, mode: ValidationMode) {
        self.mode = mode;
    }

    /// Parse a text block into a new list
    pub fn parse(&mut self, text: &str) -> Result<ListId, ConfigError> {
        let list = self.arena.new_list(self.scope)?;
        let count = self
            .arena
            .list_from_str(self.scope, &self.dict, list, text)?;
        debug!(pairs = count, "Parsed pair list");
        Ok(list)
    }

    /// Read a pair file into a new list
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<ListId, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Loading pair file");
        self.parse(&text)
    }

    /// Render `list` one pair per line, sorted canonically when `sort` is set
    pub fn print(&mut self, list: ListId, sort: bool) -> Result<Vec<String>, ConfigError> {
        if sort {
            self.arena.list_sort(list, cmp_by_parent_num)?;
        }
        let mut lines = Vec::with_capacity(self.arena.list_len(list));
        for pair in self.arena.iter(list) {
            lines.push(self.arena.pair_print(pair)?);
        }
        Ok(lines)
    }

    /// Check `input` against the conditions in `filter`
    pub fn validate(&self, input: ListId, filter: ListId) -> Result<Validation, ConfigError> {
        let result = self.arena.validate(input, filter, self.mode)?;
        if let Validation::Failed(failure) = &result {
            self.arena.log_validation_failure(failure);
        }
        Ok(result)
    }

    /// One-line description of a validation failure
    pub fn describe_failure(&self, failure: &ValidationFailure) -> String {
        let filter = self
            .arena
            .pair_print(failure.filter)
            .unwrap_or_else(|e| format!("<{}>", e));
        match failure.candidate {
            Some(candidate) => {
                let found = self
                    .arena
                    .pair_print(candidate)
                    .unwrap_or_else(|e| format!("<{}>", e));
                format!("filter \"{}\" failed against \"{}\"", filter, found)
            }
            None => format!("filter \"{}\" failed: attribute missing", filter),
        }
    }
}
