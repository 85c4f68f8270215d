use anyhow::{Context, Result};
use std::env;
use survey_store::repository::Repository;

pub fn run() -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    let repo = Repository::init(&cwd).context("failed to initialize repository")?;
    println!("Initialized empty survey repository in {}", repo.survey_dir().display());
    Ok(())
}
