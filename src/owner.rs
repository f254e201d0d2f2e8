//! Owner identity management.
//!
//! Every task operation is scoped to an owner. Resolution order:
//! 1) CLI --owner (explicit)
//! 2) TALLY_OWNER environment variable
//! 3) Persisted value in `<data_root>/owner`
//! 4) Config default (owner.default)

use std::fs;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Resolve the current owner using CLI, environment, persisted value, and
/// config. Errors with `OwnerNotSet` when nothing applies.
pub fn resolve_owner(
    storage: &Storage,
    config: &Config,
    cli_owner: Option<&str>,
) -> Result<String> {
    if let Some(owner) = non_empty(cli_owner) {
        validate_owner_name(owner)?;
        return Ok(owner.to_string());
    }

    if let Ok(env_owner) = std::env::var("TALLY_OWNER") {
        if let Some(owner) = non_empty(Some(env_owner.as_str())) {
            validate_owner_name(owner)?;
            return Ok(owner.to_string());
        }
    }

    if let Some(owner) = load_persisted_owner(storage)? {
        return Ok(owner);
    }

    if let Some(owner) = config.owner.default.as_deref() {
        if let Some(owner) = non_empty(Some(owner)) {
            return Ok(owner.to_string());
        }
    }

    Err(Error::OwnerNotSet)
}

/// Persist the owner identity in `<data_root>/owner`.
pub fn persist_owner(storage: &Storage, owner: &str) -> Result<()> {
    let owner = non_empty(Some(owner))
        .ok_or_else(|| Error::InvalidArgument("owner name cannot be empty".to_string()))?;
    validate_owner_name(owner)?;

    fs::create_dir_all(storage.root())?;
    fs::write(storage.owner_file(), format!("{owner}\n"))?;
    Ok(())
}

/// Load the persisted owner identity, if present.
pub fn load_persisted_owner(storage: &Storage) -> Result<Option<String>> {
    let path = storage.owner_file();
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let owner = raw.trim();
    if owner.is_empty() {
        return Ok(None);
    }

    Ok(Some(owner.to_string()))
}

/// Owner names become directory names under the data root, so they are
/// restricted to a filesystem-safe alphabet.
pub fn validate_owner_name(owner: &str) -> Result<()> {
    if owner.is_empty() || owner.len() > 64 {
        return Err(Error::InvalidArgument(
            "owner name must be 1-64 characters".to_string(),
        ));
    }
    if !owner
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
    {
        return Err(Error::InvalidArgument(format!(
            "owner name '{owner}' may only contain alphanumerics, '-', '_', '.'"
        )));
    }
    if owner == "." || owner == ".." {
        return Err(Error::InvalidArgument(
            "owner name cannot be '.' or '..'".to_string(),
        ));
    }
    Ok(())
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
