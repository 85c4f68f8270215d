use anyhow::Result;
use survey_core::analytics::{format_duration, ResponseMetrics, SurveyDashboard};
use survey_core::model::RecordKind;
use survey_store::service::AnalyticsService;

use super::{open_repo, percent, print_json, resolve};

pub fn response(id: String, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let id = resolve(&repo, RecordKind::Response, &id)?;
    let metrics = AnalyticsService::new(&repo).response_metrics(&id)?;

    if json {
        return print_json(&metrics);
    }
    print_metrics(&metrics);
    Ok(())
}

fn print_metrics(m: &ResponseMetrics) {
    println!("response {}", m.response_id.hex());
    println!("Questions:       {}", m.question_count);
    println!("Valid answers:   {}", m.valid_answers_count);
    println!(
        "Validation rate: {}{}",
        percent(m.validation_rate),
        if m.is_validated { " (validated)" } else { "" }
    );
    println!("Completion time: {}", m.formatted_completion_time);
    println!(
        "Per question:    {}",
        format_duration(m.average_time_per_question.round() as u64)
    );
    if !m.question_type_completion.is_empty() {
        println!();
        println!("Completion by question type:");
        for (question_type, rate) in &m.question_type_completion {
            println!("  {:<16} {}", question_type.as_str(), percent(*rate));
        }
    }
    if !m.category_scores.is_empty() {
        println!();
        println!("Category scores:");
        for (category, score) in &m.category_scores {
            println!("  {:<16} {:.2}", category, score);
        }
    }
}

pub fn dashboard(survey: String, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let survey_id = resolve(&repo, RecordKind::Survey, &survey)?;
    let dashboard = AnalyticsService::new(&repo).survey_dashboard(&survey_id)?;

    if json {
        return print_json(&dashboard);
    }
    print_dashboard(&dashboard);
    Ok(())
}

fn print_dashboard(d: &SurveyDashboard) {
    println!("survey {} ({})", d.survey_id.short(), d.title);
    println!("Status:           {}", d.status);
    println!("Responses:        {}", d.total_responses);
    println!("Completion rate:  {}", percent(d.completion_rate));
    println!("Average time:     {}", d.formatted_average_completion_time);
    println!(
        "Valid answers:    {}/{} ({})",
        d.valid_answers,
        d.total_answers,
        percent(d.validation_rate)
    );
    match d.growth_rate {
        Some(rate) => println!("30-day growth:    {:+.1}%", rate),
        None => println!("30-day growth:    n/a"),
    }

    if !d.questions.is_empty() {
        println!();
        println!("Questions:");
        for q in &d.questions {
            println!("  {} {} ({} answered, {} skipped)", q.question_id, q.title, q.answered, q.skipped);
            for option in &q.option_counts {
                println!("      {:<20} {}", option.option, option.count);
            }
            if let Some(avg) = q.average_score {
                println!("      average: {:.2}", avg);
            }
            if let Some(nps) = q.net_promoter_score {
                println!("      NPS: {:.1}", nps);
            }
        }
    }
    for (label, counts) in [("Devices", &d.devices), ("Browsers", &d.browsers), ("Sources", &d.sources)] {
        if counts.is_empty() {
            continue;
        }
        let parts: Vec<String> = counts.iter().map(|(k, v)| format!("{} {}", k, v)).collect();
        println!("{}: {}", label, parts.join(", "));
    }
    if !d.trend.is_empty() {
        println!();
        println!("Daily responses:");
        for point in &d.trend {
            println!("  {}  {}", point.date, point.count);
        }
    }
}

pub fn recent(count: usize, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let responses = AnalyticsService::new(&repo).recent_responses(count)?;

    if json {
        return print_json(&responses);
    }
    if responses.is_empty() {
        println!("No responses.");
        return Ok(());
    }
    for r in &responses {
        println!(
            "{}  {}  survey {}  {} answers",
            r.id.short(),
            r.submitted_at.format("%Y-%m-%d %H:%M"),
            r.survey_id.short(),
            r.answers.len()
        );
    }
    Ok(())
}
