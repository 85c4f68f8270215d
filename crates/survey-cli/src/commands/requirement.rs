use anyhow::Result;
use survey_core::model::{Contact, RecordKind, Requirement};
use survey_store::service::{RequirementProposal, RequirementService, RequirementUpdate};

use super::{open_repo, print_json, resolve};
use crate::notify;

pub fn propose(
    title: String,
    description: String,
    category: Option<String>,
    customer: Option<Contact>,
    json: bool,
) -> Result<()> {
    let repo = open_repo()?;
    let notifier = notify::for_repo(&repo)?;
    let requirement = RequirementService::new(&repo, notifier.as_ref()).propose(RequirementProposal {
        title,
        description,
        customer,
        category,
    })?;

    if json {
        return print_json(&requirement);
    }
    println!("[requirement {}] {}", requirement.id.short(), requirement.title);
    Ok(())
}

pub fn update(
    id: String,
    status: Option<String>,
    completion: Option<u8>,
    message: Option<String>,
    json: bool,
) -> Result<()> {
    let repo = open_repo()?;
    let id = resolve(&repo, RecordKind::Requirement, &id)?;
    let notifier = notify::for_repo(&repo)?;
    let requirement = RequirementService::new(&repo, notifier.as_ref()).update(
        &id,
        RequirementUpdate {
            status,
            completion,
            response: message,
        },
    )?;

    if json {
        return print_json(&requirement);
    }
    println!(
        "Requirement {} is {} ({}%)",
        requirement.id.short(),
        requirement.status,
        requirement.completion
    );
    Ok(())
}

pub fn list(status: Option<String>, category: Option<String>, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let notifier = notify::for_repo(&repo)?;
    let requirements = RequirementService::new(&repo, notifier.as_ref())
        .list(status.as_deref(), category.as_deref())?;

    if json {
        return print_json(&requirements);
    }
    if requirements.is_empty() {
        println!("No requirements found.");
        return Ok(());
    }
    for r in &requirements {
        print_row(r);
    }
    Ok(())
}

fn print_row(r: &Requirement) {
    let who = r.customer.as_ref().map_or("anonymous", |c| c.name.as_str());
    println!(
        "{}  {:<11} {:>3}%  {}  ({})",
        r.id.short(),
        r.status,
        r.completion,
        r.title,
        who
    );
}
