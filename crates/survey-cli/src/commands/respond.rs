use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use survey_core::model::{RecordKind, Respondent, ResponseMetadata, Submission};
use survey_core::validate::RawAnswers;
use survey_store::error::StoreError;
use survey_store::service::SurveyService;

use super::{open_repo, print_json, resolve};
use crate::notify;

pub struct Args {
    pub answers: Vec<String>,
    pub timings: Vec<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub source: Option<String>,
    pub time: Option<u64>,
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => bail!("expected question_id=value, got '{}'", pair),
    }
}

fn parse_timings(pairs: &[String]) -> Result<BTreeMap<String, u64>> {
    let mut timings = BTreeMap::new();
    for pair in pairs {
        let (key, value) = split_pair(pair)?;
        let seconds: u64 = value
            .trim()
            .parse()
            .with_context(|| format!("timing for '{}' is not a number of seconds", key))?;
        timings.insert(key.to_string(), seconds);
    }
    Ok(timings)
}

pub fn run(survey: String, args: Args, json: bool) -> Result<()> {
    let pairs = args
        .answers
        .iter()
        .map(|pair| split_pair(pair))
        .collect::<Result<Vec<_>>>()?;
    let submission = Submission {
        respondent: Respondent {
            name: args.name,
            email: args.email,
            company: args.company,
            ..Default::default()
        },
        answers: RawAnswers::from_form_pairs(pairs),
        timings: parse_timings(&args.timings)?,
        completion_time_seconds: args.time,
        metadata: ResponseMetadata {
            device: args.device,
            browser: args.browser,
            source: args.source,
        },
    };

    let repo = open_repo()?;
    let survey_id = resolve(&repo, RecordKind::Survey, &survey)?;
    let notifier = notify::for_repo(&repo)?;
    let response = match SurveyService::new(&repo, notifier.as_ref())
        .submit_response(&survey_id, submission)
    {
        Ok(response) => response,
        Err(StoreError::Validation(report)) => {
            for missing in &report.missing {
                eprintln!("missing answer: {} ({})", missing.question_title, missing.question_id);
            }
            bail!("response rejected: {}", report);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        return print_json(&response);
    }
    let invalid = response.answers.iter().filter(|a| !a.is_valid).count();
    println!(
        "[response {}] survey {}, {} answers",
        response.id.short(),
        survey_id.short(),
        response.answers.len()
    );
    if invalid > 0 {
        println!("  {} answers did not match their question", invalid);
    }
    Ok(())
}
