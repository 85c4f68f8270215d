mod commands;
mod notify;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "survey", about = "Customer survey and feedback management", version)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new survey repository
    Init,

    /// Manage surveys
    Survey {
        #[command(subcommand)]
        action: SurveyAction,
    },

    /// Submit a response to a survey
    Respond {
        /// Survey ID (full or prefix, minimum 4 chars)
        survey: String,

        /// Answer as question_id=value (repeat a key for multiple values)
        #[arg(short, long)]
        answer: Vec<String>,

        /// Seconds spent on a question, as question_id=seconds (repeatable)
        #[arg(long)]
        timing: Vec<String>,

        /// Respondent name
        #[arg(long)]
        name: Option<String>,

        /// Respondent email
        #[arg(long)]
        email: Option<String>,

        /// Respondent company
        #[arg(long)]
        company: Option<String>,

        /// Device the response came from
        #[arg(long)]
        device: Option<String>,

        /// Browser the response came from
        #[arg(long)]
        browser: Option<String>,

        /// Traffic source (email, link, ...)
        #[arg(long)]
        source: Option<String>,

        /// Total completion time in seconds
        #[arg(long)]
        time: Option<u64>,
    },

    /// Inspect stored responses
    Response {
        #[command(subcommand)]
        action: ResponseAction,
    },

    /// Response and survey analytics
    Analytics {
        #[command(subcommand)]
        action: AnalyticsAction,
    },

    /// Customer suggestions
    Suggestion {
        #[command(subcommand)]
        action: SuggestionAction,
    },

    /// Customer requirements
    Requirement {
        #[command(subcommand)]
        action: RequirementAction,
    },

    /// Rebuild the response index
    Reindex,
}

#[derive(Subcommand)]
enum SurveyAction {
    /// Create a survey from a JSON draft file
    Create {
        /// Path to the draft (title, description, questions, delivery)
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Replace a survey's title, questions and delivery from a JSON draft file
    Update {
        /// Survey ID (full or prefix)
        id: String,

        #[arg(short, long)]
        file: PathBuf,
    },
    /// List all surveys
    List,
    /// Show a survey and its questions
    Show {
        /// Survey ID (full or prefix)
        id: String,
    },
    /// Change a survey's status (draft, active, inactive, archived)
    Status {
        id: String,
        status: String,
    },
    /// Delete a survey and all of its responses
    Delete {
        id: String,
    },
    /// Email the survey invitation to its recipients
    Send {
        id: String,
    },
}

#[derive(Subcommand)]
enum ResponseAction {
    /// Show one response
    Show {
        /// Response ID (full or prefix)
        id: String,
    },
    /// List the responses to a survey
    List {
        /// Survey ID (full or prefix)
        survey: String,
    },
}

#[derive(Subcommand)]
enum AnalyticsAction {
    /// Metrics for a single response
    Response {
        id: String,
    },
    /// Aggregated dashboard for a survey
    Dashboard {
        /// Survey ID (full or prefix)
        survey: String,
    },
    /// Most recent responses across all surveys
    Recent {
        /// Maximum number of entries
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },
}

#[derive(Subcommand)]
enum SuggestionAction {
    /// Submit a suggestion
    Submit {
        /// Suggestion text
        content: String,

        /// Category tag
        #[arg(long)]
        category: Option<String>,

        /// Submitter name
        #[arg(long)]
        name: Option<String>,

        /// Submitter email, where replies are sent
        #[arg(long)]
        email: Option<String>,

        /// Submit without a name or email
        #[arg(long)]
        anonymous: bool,
    },
    /// Set a suggestion's status and optionally reply to the submitter
    Respond {
        id: String,

        /// New status (new, reviewed, implemented, rejected)
        status: String,

        /// Reply text, emailed to the submitter
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List suggestions
    List {
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum RequirementAction {
    /// Propose a requirement
    Propose {
        /// Short title
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long)]
        category: Option<String>,

        /// Submitter name
        #[arg(long)]
        name: Option<String>,

        /// Submitter email, where replies are sent
        #[arg(long)]
        email: Option<String>,

        /// Submit without a name or email
        #[arg(long)]
        anonymous: bool,
    },
    /// Update a requirement's status, completion or reply
    Update {
        id: String,

        /// New status (proposed, in-progress, implemented, rejected)
        #[arg(long)]
        status: Option<String>,

        /// Completion percentage, 0-100
        #[arg(long)]
        completion: Option<u8>,

        /// Reply text, emailed to the submitter
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List requirements
    List {
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        category: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let json = cli.json;

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Survey { action } => match action {
            SurveyAction::Create { file } => commands::survey::create(file, json),
            SurveyAction::Update { id, file } => commands::survey::update(id, file, json),
            SurveyAction::List => commands::survey::list(json),
            SurveyAction::Show { id } => commands::survey::show(id, json),
            SurveyAction::Status { id, status } => commands::survey::status(id, status, json),
            SurveyAction::Delete { id } => commands::survey::delete(id),
            SurveyAction::Send { id } => commands::survey::send(id),
        },
        Commands::Respond {
            survey,
            answer,
            timing,
            name,
            email,
            company,
            device,
            browser,
            source,
            time,
        } => commands::respond::run(
            survey,
            commands::respond::Args {
                answers: answer,
                timings: timing,
                name,
                email,
                company,
                device,
                browser,
                source,
                time,
            },
            json,
        ),
        Commands::Response { action } => match action {
            ResponseAction::Show { id } => commands::response::show(id, json),
            ResponseAction::List { survey } => commands::response::list(survey, json),
        },
        Commands::Analytics { action } => match action {
            AnalyticsAction::Response { id } => commands::analytics::response(id, json),
            AnalyticsAction::Dashboard { survey } => commands::analytics::dashboard(survey, json),
            AnalyticsAction::Recent { count } => commands::analytics::recent(count, json),
        },
        Commands::Suggestion { action } => match action {
            SuggestionAction::Submit {
                content,
                category,
                name,
                email,
                anonymous,
            } => commands::suggestion::submit(
                content,
                category,
                commands::submitter(name, email, anonymous),
                json,
            ),
            SuggestionAction::Respond { id, status, message } => {
                commands::suggestion::respond(id, status, message, json)
            }
            SuggestionAction::List { status, category } => {
                commands::suggestion::list(status, category, json)
            }
        },
        Commands::Requirement { action } => match action {
            RequirementAction::Propose {
                title,
                description,
                category,
                name,
                email,
                anonymous,
            } => commands::requirement::propose(
                title,
                description,
                category,
                commands::submitter(name, email, anonymous),
                json,
            ),
            RequirementAction::Update {
                id,
                status,
                completion,
                message,
            } => commands::requirement::update(id, status, completion, message, json),
            RequirementAction::List { status, category } => {
                commands::requirement::list(status, category, json)
            }
        },
        Commands::Reindex => commands::reindex::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
