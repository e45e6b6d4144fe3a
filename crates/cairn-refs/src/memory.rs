//! In-memory reference store.
//!
//! [`InMemoryRefStore`] keeps branches in a `BTreeMap` behind a `RwLock`.
//! Repositories own one each; nothing is persisted.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::{RefError, Result};
use crate::names::validate_branch_name;
use crate::traits::RefStore;
use crate::types::Branch;

/// An in-memory implementation of [`RefStore`].
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    branches: RwLock<BTreeMap<String, Branch>>,
    head: RwLock<Option<String>>,
}

fn poisoned(e: impl std::fmt::Display) -> RefError {
    RefError::Poisoned(e.to_string())
}

impl InMemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_branch(&self, name: &str) -> Result<Option<Branch>> {
        let branches = self.branches.read().map_err(poisoned)?;
        Ok(branches.get(name).cloned())
    }

    fn write_branch(&self, branch: &Branch) -> Result<()> {
        validate_branch_name(&branch.name)?;
        let mut branches = self.branches.write().map_err(poisoned)?;
        debug!(branch = %branch.canonical_name(), head = %branch.head.short_hex(), "branch updated");
        branches.insert(branch.name.clone(), branch.clone());
        Ok(())
    }

    fn list_branches(&self) -> Result<Vec<Branch>> {
        let branches = self.branches.read().map_err(poisoned)?;
        Ok(branches.values().cloned().collect())
    }

    fn head(&self) -> Result<Option<String>> {
        let head = self.head.read().map_err(poisoned)?;
        Ok(head.clone())
    }

    fn set_head(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        if self.read_branch(branch)?.is_none() {
            return Err(RefError::NotFound {
                name: branch.to_string(),
            });
        }
        let mut head = self.head.write().map_err(poisoned)?;
        *head = Some(branch.to_string());
        Ok(())
    }
}
