use anyhow::Result;
use survey_core::model::{RecordKind, Response};
use survey_store::port::SurveyStore;

use super::{open_repo, print_json, resolve};

pub fn show(id: String, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let id = resolve(&repo, RecordKind::Response, &id)?;
    let response = repo.get_response(&id)?;

    if json {
        return print_json(&response);
    }
    print_response(&response);
    Ok(())
}

pub fn list(survey: String, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let survey_id = resolve(&repo, RecordKind::Survey, &survey)?;
    let responses = repo.responses_for_survey(&survey_id)?;

    if json {
        return print_json(&responses);
    }
    if responses.is_empty() {
        println!("No responses.");
        return Ok(());
    }
    for response in &responses {
        println!(
            "{}  {}  {}",
            response.id.short(),
            response.submitted_at.format("%Y-%m-%d %H:%M"),
            response.respondent.name.as_deref().unwrap_or("anonymous")
        );
    }
    Ok(())
}

fn print_response(response: &Response) {
    println!("response {}", response.id.hex());
    println!("Survey:    {}", response.survey_id.short());
    println!("Submitted: {}", response.submitted_at.format("%Y-%m-%d %H:%M:%S %Z"));
    let who = &response.respondent;
    match (&who.name, &who.email) {
        (Some(name), Some(email)) => println!("From:      {} <{}>", name, email),
        (Some(name), None) => println!("From:      {}", name),
        (None, Some(email)) => println!("From:      <{}>", email),
        (None, None) => println!("From:      anonymous"),
    }
    if let Some(company) = &who.company {
        println!("Company:   {}", company);
    }
    println!();
    for answer in &response.answers {
        let value = if answer.is_skipped() {
            "(skipped)".to_string()
        } else {
            answer.values().join(", ")
        };
        let flag = if answer.is_valid { "" } else { "  [invalid]" };
        println!("  {} {}: {}{}", answer.question_id, answer.question_title, value, flag);
    }
}
