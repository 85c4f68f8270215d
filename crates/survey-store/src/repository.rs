use crate::config::Config;
use crate::error::StoreError;
use crate::index_store::IndexStore;
use crate::port::SurveyStore;
use crate::query;
use crate::records::RecordDatabase;
use std::fs;
use std::path::{Path, PathBuf};
use survey_core::id::RecordId;
use survey_core::model::{RecordKind, Requirement, Response, Suggestion, Survey};

const SURVEY_DIR: &str = ".survey";

/// On-disk survey repository.
///
/// Combines the record database, the response index and the repository
/// configuration under a `.survey/` directory.
pub struct Repository {
    root: PathBuf,
    pub records: RecordDatabase,
    pub indexes: IndexStore,
    config: Config,
}

impl Repository {
    /// Initialize a new repository at `path`.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        let survey_dir = root.join(SURVEY_DIR);

        if survey_dir.exists() {
            return Err(StoreError::RepositoryExists(
                survey_dir.display().to_string(),
            ));
        }

        let records = RecordDatabase::new(survey_dir.join("records"));
        records.ensure_dirs()?;
        let indexes = IndexStore::new(survey_dir.join("indexes"));
        indexes.ensure_dir()?;

        let config = Config::default();
        config.save(&survey_dir.join("config.json"))?;
        log::info!("initialized survey repository at {}", survey_dir.display());

        Ok(Self {
            root,
            records,
            indexes,
            config,
        })
    }

    /// Open an existing repository at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        let survey_dir = root.join(SURVEY_DIR);

        if !survey_dir.exists() {
            return Err(StoreError::RepositoryNotFound(
                root.display().to_string(),
            ));
        }

        let config = Config::load(&survey_dir.join("config.json"))?;
        log::debug!("opened survey repository at {}", survey_dir.display());

        Ok(Self {
            records: RecordDatabase::new(survey_dir.join("records")),
            indexes: IndexStore::new(survey_dir.join("indexes")),
            root,
            config,
        })
    }

    /// Search upward from `start` for a `.survey/` directory and open that repo.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut current = start.as_ref().to_path_buf();
        loop {
            if current.join(SURVEY_DIR).exists() {
                return Self::open(&current);
            }
            if !current.pop() {
                return Err(StoreError::RepositoryNotFound(
                    start.as_ref().display().to_string(),
                ));
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn survey_dir(&self) -> PathBuf {
        self.root.join(SURVEY_DIR)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn outbox_path(&self) -> PathBuf {
        self.survey_dir().join("outbox.jsonl")
    }

    /// Rebuild the response index from the records directory.
    pub fn reindex(&self) -> Result<usize, StoreError> {
        self.indexes.rebuild_all(&self.records)
    }
}

impl SurveyStore for Repository {
    fn create_survey(&self, survey: &Survey) -> Result<(), StoreError> {
        self.records.insert(survey)
    }

    fn get_survey(&self, id: &RecordId) -> Result<Survey, StoreError> {
        self.records.read(id)
    }

    fn list_surveys(&self) -> Result<Vec<Survey>, StoreError> {
        Ok(query::sort_surveys(self.records.iter_all()?))
    }

    fn update_survey(&self, survey: &Survey) -> Result<Survey, StoreError> {
        let (stored, ()) = self.records.modify(&survey.id, |stored: &mut Survey| {
            let mut next = survey.clone();
            next.response_count = stored.response_count;
            next.completion_rate = stored.completion_rate;
            *stored = next;
            Ok(())
        })?;
        Ok(stored)
    }

    fn delete_survey(&self, id: &RecordId) -> Result<usize, StoreError> {
        self.records.read::<Survey>(id)?;
        let responses: Vec<Response> = self.records.iter_all()?;
        let mut removed = 0;
        for response in responses.iter().filter(|r| &r.survey_id == id) {
            self.records.remove::<Response>(&response.id)?;
            removed += 1;
        }
        self.records.remove::<Survey>(id)?;
        self.indexes.remove_survey(id)?;
        log::info!("deleted survey {} and {} responses", id.short(), removed);
        Ok(removed)
    }

    fn increment_response_count(&self, id: &RecordId) -> Result<u64, StoreError> {
        let (_, count) = self.records.modify(id, |survey: &mut Survey| {
            survey.response_count += 1;
            Ok(survey.response_count)
        })?;
        log::debug!("survey {} response count now {}", id.short(), count);
        Ok(count)
    }

    fn set_completion_rate(&self, id: &RecordId, rate: f64) -> Result<(), StoreError> {
        self.records.modify(id, |survey: &mut Survey| {
            survey.completion_rate = rate;
            Ok(())
        })?;
        Ok(())
    }

    fn create_response(&self, response: &Response) -> Result<(), StoreError> {
        self.records.insert(response)?;
        if let Err(e) = self.indexes.add_response(&response.survey_id, &response.id) {
            if let Err(undo) = self.records.remove::<Response>(&response.id) {
                log::error!("unindexed response {} left in place: {}", response.id.short(), undo);
            }
            return Err(e);
        }
        Ok(())
    }

    fn get_response(&self, id: &RecordId) -> Result<Response, StoreError> {
        self.records.read(id)
    }

    fn delete_response(&self, id: &RecordId) -> Result<(), StoreError> {
        let response: Response = self.records.read(id)?;
        self.records.remove::<Response>(id)?;
        self.indexes.remove_response(&response.survey_id, id)
    }

    fn responses_for_survey(&self, survey_id: &RecordId) -> Result<Vec<Response>, StoreError> {
        let mut responses = Vec::new();
        for id in self.indexes.responses_for(survey_id)? {
            match self.records.read::<Response>(&id) {
                Ok(response) => responses.push(response),
                Err(StoreError::NotFound { .. }) => {
                    log::warn!("response index lists missing response {}; run reindex", id.short());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(query::sort_responses(responses))
    }

    fn recent_responses(&self, count: usize) -> Result<Vec<Response>, StoreError> {
        Ok(query::most_recent(self.records.iter_all()?, count))
    }

    fn create_suggestion(&self, suggestion: &Suggestion) -> Result<(), StoreError> {
        self.records.insert(suggestion)
    }

    fn get_suggestion(&self, id: &RecordId) -> Result<Suggestion, StoreError> {
        self.records.read(id)
    }

    fn update_suggestion(&self, suggestion: &Suggestion) -> Result<(), StoreError> {
        self.records.modify(&suggestion.id, |stored: &mut Suggestion| {
            *stored = suggestion.clone();
            Ok(())
        })?;
        Ok(())
    }

    fn list_suggestions(&self) -> Result<Vec<Suggestion>, StoreError> {
        Ok(query::query_suggestions(self.records.iter_all()?, None, None))
    }

    fn create_requirement(&self, requirement: &Requirement) -> Result<(), StoreError> {
        self.records.insert(requirement)
    }

    fn get_requirement(&self, id: &RecordId) -> Result<Requirement, StoreError> {
        self.records.read(id)
    }

    fn update_requirement(&self, requirement: &Requirement) -> Result<(), StoreError> {
        self.records.modify(&requirement.id, |stored: &mut Requirement| {
            *stored = requirement.clone();
            Ok(())
        })?;
        Ok(())
    }

    fn list_requirements(&self) -> Result<Vec<Requirement>, StoreError> {
        Ok(query::query_requirements(self.records.iter_all()?, None, None))
    }

    fn resolve_id(&self, kind: RecordKind, prefix: &str) -> Result<RecordId, StoreError> {
        self.records.resolve_prefix(kind, prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use std::thread;
    use crate::memory::MemoryNotifier;
    use crate::service::SurveyService;
    use survey_core::model::{
        Question, QuestionType, Respondent, ResponseMetadata, Submission, SurveyDraft,
    };
    use survey_core::validate::RawAnswers;

    fn survey(title: &str) -> Survey {
        let draft = SurveyDraft {
            title: title.into(),
            description: None,
            questions: vec![],
            delivery: Default::default(),
        };
        Survey::from_draft(RecordId::hash(title.as_bytes()), draft, Utc::now())
    }

    fn response(seed: &str, survey_id: &RecordId, minutes_ago: i64) -> Response {
        Response {
            id: RecordId::hash(seed.as_bytes()),
            survey_id: survey_id.clone(),
            respondent: Respondent::default(),
            submitted_at: Utc::now() - Duration::minutes(minutes_ago),
            answers: vec![],
            completion_time_seconds: None,
            metadata: ResponseMetadata::default(),
        }
    }

    #[test]
    fn init_creates_structure() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let survey_dir = dir.path().join(".survey");
        assert!(survey_dir.join("records").join("survey").is_dir());
        assert!(survey_dir.join("records").join("response").is_dir());
        assert!(survey_dir.join("indexes").is_dir());
        assert!(survey_dir.join("config.json").exists());
        assert_eq!(repo.outbox_path(), survey_dir.join("outbox.jsonl"));
    }

    #[test]
    fn init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        assert!(matches!(
            Repository::init(dir.path()),
            Err(StoreError::RepositoryExists(_))
        ));
    }

    #[test]
    fn discover_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let repo = Repository::discover(&nested).unwrap();
        assert_eq!(repo.root(), dir.path());
    }

    #[test]
    fn open_without_repo_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Repository::open(dir.path()),
            Err(StoreError::RepositoryNotFound(_))
        ));
    }

    #[test]
    fn responses_are_indexed_per_survey() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let a = survey("A");
        let b = survey("B");
        repo.create_survey(&a).unwrap();
        repo.create_survey(&b).unwrap();
        repo.create_response(&response("r1", &a.id, 5)).unwrap();
        repo.create_response(&response("r2", &a.id, 10)).unwrap();
        repo.create_response(&response("r3", &b.id, 1)).unwrap();

        let for_a = repo.responses_for_survey(&a.id).unwrap();
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].id, RecordId::hash(b"r2"));

        let recent = repo.recent_responses(2).unwrap();
        assert_eq!(recent[0].id, RecordId::hash(b"r3"));
        assert_eq!(recent[1].id, RecordId::hash(b"r1"));
    }

    #[test]
    fn delete_survey_cascades_to_responses() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let a = survey("A");
        let b = survey("B");
        repo.create_survey(&a).unwrap();
        repo.create_survey(&b).unwrap();
        repo.create_response(&response("r1", &a.id, 1)).unwrap();
        repo.create_response(&response("r2", &a.id, 2)).unwrap();
        repo.create_response(&response("r3", &b.id, 3)).unwrap();

        assert_eq!(repo.delete_survey(&a.id).unwrap(), 2);
        assert!(matches!(repo.get_survey(&a.id), Err(StoreError::NotFound { .. })));
        assert!(repo.get_response(&RecordId::hash(b"r1")).is_err());
        assert!(repo.responses_for_survey(&a.id).unwrap().is_empty());
        assert_eq!(repo.responses_for_survey(&b.id).unwrap().len(), 1);
    }

    #[test]
    fn update_survey_keeps_counters() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let s = survey("A");
        repo.create_survey(&s).unwrap();
        repo.increment_response_count(&s.id).unwrap();
        repo.set_completion_rate(&s.id, 100.0).unwrap();

        let mut edited = s.clone();
        edited.title = "Renamed".into();
        let stored = repo.update_survey(&edited).unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.response_count, 1);
        assert_eq!(repo.get_survey(&s.id).unwrap().completion_rate, 100.0);
    }

    #[test]
    fn concurrent_increments_are_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let s = survey("Busy");
        Repository::init(&root).unwrap().create_survey(&s).unwrap();

        let root = Arc::new(root);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let root = Arc::clone(&root);
                let id = s.id.clone();
                thread::spawn(move || {
                    let repo = Repository::open(root.as_path()).unwrap();
                    for _ in 0..5 {
                        repo.increment_response_count(&id).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let repo = Repository::open(root.as_path()).unwrap();
        assert_eq!(repo.get_survey(&s.id).unwrap().response_count, 20);
    }

    #[test]
    fn submission_is_withdrawn_when_survey_stays_locked() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&repo, &notifier);
        let s = service
            .create_survey(SurveyDraft {
                title: "Locked".into(),
                description: None,
                questions: vec![Question::new("q1", "Thoughts", QuestionType::Text).required()],
                delivery: Default::default(),
            })
            .unwrap();

        let (fan, rest) = s.id.fan_out();
        let lock = dir
            .path()
            .join(".survey/records/survey")
            .join(fan)
            .join(format!("{rest}.json.lock"));
        fs::write(&lock, "").unwrap();
        let submission = Submission {
            answers: RawAnswers::from_form_pairs([("q1", "hello")]),
            ..Default::default()
        };
        let result = service.submit_response(&s.id, submission);
        fs::remove_file(&lock).unwrap();

        assert!(matches!(result, Err(StoreError::LockConflict(_))));
        assert!(repo.recent_responses(10).unwrap().is_empty());
        assert!(repo.responses_for_survey(&s.id).unwrap().is_empty());
        assert_eq!(repo.get_survey(&s.id).unwrap().response_count, 0);
    }

    #[test]
    fn corrupt_index_fails_loudly_until_reindexed() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let a = survey("A");
        let b = survey("B");
        repo.create_survey(&a).unwrap();
        repo.create_survey(&b).unwrap();
        repo.create_response(&response("r1", &a.id, 2)).unwrap();
        fs::write(dir.path().join(".survey/indexes/responses.json"), "[").unwrap();

        assert!(matches!(
            repo.create_response(&response("r2", &b.id, 1)),
            Err(StoreError::CorruptIndex { .. })
        ));
        assert!(repo.responses_for_survey(&a.id).is_err());
        assert!(!repo.records.exists::<Response>(&RecordId::hash(b"r2")));

        assert_eq!(repo.reindex().unwrap(), 1);
        assert_eq!(repo.responses_for_survey(&a.id).unwrap().len(), 1);
        assert!(repo.responses_for_survey(&b.id).unwrap().is_empty());
    }

    #[test]
    fn reindex_recovers_lost_index() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let s = survey("A");
        repo.create_survey(&s).unwrap();
        repo.create_response(&response("r1", &s.id, 1)).unwrap();
        fs::remove_file(dir.path().join(".survey/indexes/responses.json")).unwrap();

        assert!(repo.responses_for_survey(&s.id).unwrap().is_empty());
        assert_eq!(repo.reindex().unwrap(), 1);
        assert_eq!(repo.responses_for_survey(&s.id).unwrap().len(), 1);
    }
}
