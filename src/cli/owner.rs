//! tally owner command implementation (set/show).

use std::path::PathBuf;

use super::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::owner;

#[derive(serde::Serialize)]
struct OwnerSetReport {
    owner: String,
    path: PathBuf,
}

#[derive(serde::Serialize)]
struct OwnerShowReport {
    owner: String,
}

pub fn run_set(ctx: &Context, name: String) -> Result<()> {
    owner::persist_owner(&ctx.storage, &name)?;
    let path = ctx.storage.owner_file();

    let report = OwnerSetReport {
        owner: name.trim().to_string(),
        path: path.clone(),
    };

    let mut human = HumanOutput::new(format!("Owner set: {}", report.owner));
    human.push_summary("path", path.display().to_string());

    emit_success(ctx.output, "owner set", &report, Some(&human))
}

pub fn run_show(ctx: &Context) -> Result<()> {
    let owner = ctx.owner()?;
    let report = OwnerShowReport {
        owner: owner.clone(),
    };

    let human = HumanOutput::new(owner);
    emit_success(ctx.output, "owner show", &report, Some(&human))
}
