use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use survey_core::model::{RecordKind, Survey, SurveyDraft};
use survey_store::port::SurveyStore;
use survey_store::service::SurveyService;

use super::{open_repo, percent, print_json, resolve};
use crate::notify;

fn read_draft(file: &PathBuf) -> Result<SurveyDraft> {
    let data = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    serde_json::from_str(&data).with_context(|| format!("invalid survey draft in {}", file.display()))
}

pub fn create(file: PathBuf, json: bool) -> Result<()> {
    let draft = read_draft(&file)?;
    let repo = open_repo()?;
    let notifier = notify::for_repo(&repo)?;
    let survey = SurveyService::new(&repo, notifier.as_ref())
        .create_survey(draft)
        .context("failed to create survey")?;

    if json {
        return print_json(&survey);
    }
    println!("[survey {}] {}", survey.id.short(), survey.title);
    println!("  {} questions, status {}", survey.questions.len(), survey.status);
    Ok(())
}

pub fn update(id: String, file: PathBuf, json: bool) -> Result<()> {
    let draft = read_draft(&file)?;
    let repo = open_repo()?;
    let id = resolve(&repo, RecordKind::Survey, &id)?;
    let notifier = notify::for_repo(&repo)?;
    let survey = SurveyService::new(&repo, notifier.as_ref())
        .update_survey(&id, draft)
        .context("failed to update survey")?;

    if json {
        return print_json(&survey);
    }
    println!("Updated survey {} ({} questions)", survey.id.short(), survey.questions.len());
    Ok(())
}

pub fn list(json: bool) -> Result<()> {
    let repo = open_repo()?;
    let surveys = repo.list_surveys()?;

    if json {
        return print_json(&surveys);
    }
    if surveys.is_empty() {
        println!("No surveys.");
        return Ok(());
    }
    for survey in &surveys {
        println!(
            "{}  {:<9} {:>4} responses  {}",
            survey.id.short(),
            survey.status,
            survey.response_count,
            survey.title
        );
    }
    Ok(())
}

pub fn show(id: String, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let id = resolve(&repo, RecordKind::Survey, &id)?;
    let survey = repo.get_survey(&id)?;

    if json {
        return print_json(&survey);
    }
    print_survey(&survey);
    Ok(())
}

fn print_survey(survey: &Survey) {
    println!("survey {}", survey.id.hex());
    println!("Title:     {}", survey.title);
    println!("Status:    {}", survey.status);
    println!("Created:   {}", survey.created_at.format("%Y-%m-%d %H:%M:%S %Z"));
    if let Some(updated) = survey.updated_at {
        println!("Updated:   {}", updated.format("%Y-%m-%d %H:%M:%S %Z"));
    }
    println!("Responses: {}", survey.response_count);
    println!("Complete:  {}", percent(survey.completion_rate));
    if let Some(description) = &survey.description {
        println!();
        println!("    {}", description);
    }
    println!();
    println!("Questions:");
    for question in &survey.questions {
        let marker = if question.required { "*" } else { " " };
        println!("  {}{} [{}] {}", marker, question.id, question.question_type, question.title);
        if !question.options.is_empty() {
            println!("      options: {}", question.options.join(", "));
        }
        if let Some(settings) = question.effective_settings() {
            println!("      range: {}-{}", settings.min, settings.max);
        }
    }
    let delivery = &survey.delivery;
    println!();
    println!("Delivery: {:?}", delivery.distribution);
    if !delivery.recipients.is_empty() {
        println!("  recipients: {}", delivery.recipients.join(", "));
    }
}

pub fn status(id: String, status: String, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let id = resolve(&repo, RecordKind::Survey, &id)?;
    let notifier = notify::for_repo(&repo)?;
    let survey = SurveyService::new(&repo, notifier.as_ref()).set_status(&id, &status)?;

    if json {
        return print_json(&survey);
    }
    println!("Survey {} is now {}", survey.id.short(), survey.status);
    Ok(())
}

pub fn delete(id: String) -> Result<()> {
    let repo = open_repo()?;
    let id = resolve(&repo, RecordKind::Survey, &id)?;
    let notifier = notify::for_repo(&repo)?;
    let removed = SurveyService::new(&repo, notifier.as_ref()).delete_survey(&id)?;
    println!("Deleted survey {} and {} responses", id.short(), removed);
    Ok(())
}

pub fn send(id: String) -> Result<()> {
    let repo = open_repo()?;
    let id = resolve(&repo, RecordKind::Survey, &id)?;
    let notifier = notify::for_repo(&repo)?;
    let sent = SurveyService::new(&repo, notifier.as_ref()).distribute(&id)?;
    println!("Sent survey {} to {} recipients", id.short(), sent);
    Ok(())
}
