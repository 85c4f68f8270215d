use anyhow::Result;

pub fn run() -> Result<()> {
    let repo = super::open_repo()?;
    println!("Rebuilding response index...");
    let count = repo.reindex()?;
    println!("  responses: {} entries", count);
    println!("Done.");
    Ok(())
}
