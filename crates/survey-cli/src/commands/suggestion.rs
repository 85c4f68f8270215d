use anyhow::Result;
use survey_core::model::{Contact, RecordKind, Suggestion};
use survey_store::service::SuggestionService;

use super::{open_repo, print_json, resolve};
use crate::notify;

pub fn submit(content: String, category: Option<String>, customer: Option<Contact>, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let notifier = notify::for_repo(&repo)?;
    let suggestion = SuggestionService::new(&repo, notifier.as_ref()).submit(
        &content,
        customer,
        category.as_deref(),
    )?;

    if json {
        return print_json(&suggestion);
    }
    println!("[suggestion {}] {}", suggestion.id.short(), suggestion.content);
    Ok(())
}

pub fn respond(id: String, status: String, message: Option<String>, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let id = resolve(&repo, RecordKind::Suggestion, &id)?;
    let notifier = notify::for_repo(&repo)?;
    let suggestion = SuggestionService::new(&repo, notifier.as_ref()).respond(
        &id,
        &status,
        message.as_deref(),
    )?;

    if json {
        return print_json(&suggestion);
    }
    println!(
        "Suggestion {} is now {} ({}%)",
        suggestion.id.short(),
        suggestion.status,
        suggestion.completion_percentage()
    );
    Ok(())
}

pub fn list(status: Option<String>, category: Option<String>, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let notifier = notify::for_repo(&repo)?;
    let suggestions = SuggestionService::new(&repo, notifier.as_ref())
        .list(status.as_deref(), category.as_deref())?;

    if json {
        return print_json(&suggestions);
    }
    if suggestions.is_empty() {
        println!("No suggestions found.");
        return Ok(());
    }
    for s in &suggestions {
        print_row(s);
    }
    Ok(())
}

fn print_row(s: &Suggestion) {
    let who = s.customer.as_ref().map_or("anonymous", |c| c.name.as_str());
    println!(
        "{}  {:<11} {:>3}%  {}  ({})",
        s.id.short(),
        s.status,
        s.completion_percentage(),
        s.content,
        who
    );
    if let Some(response) = &s.response {
        println!("          > {}", response);
    }
}
