use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use testsmith_core::SkipList;
use testsmith_generation::GenerationBackend;
use testsmith_models::{CommitInfo, FileChange, FileStatus, ProjectRoots, PullRequest};
use testsmith_orchestrator::{Orchestrator, OrchestratorConfig};
use testsmith_remote::{CommitterConfig, RemoteError, RemoteHost};
use testsmith_runtime::{PollOutcome, RemotePoller, RuntimeConfig};
use tokio_util::sync::CancellationToken;

type Log = Arc<Mutex<Vec<String>>>;

const FOO_V1: &str = "using System;\n\npublic class Foo\n{\n    public int Run()\n    {\n        return 1;\n    }\n}\n";
const FOO_V2: &str = "using System;\n\npublic class Foo\n{\n    public int Run()\n    {\n        return 2;\n    }\n}\n";
const GENERATED: &str = "public class FooTests\n{\n    [Fact]\n    public void Run_ReturnsTwo() { }\n}";

/// In-memory remote: a moving head, per-commit diffs and file contents.
#[derive(Default)]
struct FakeHost {
    heads: Mutex<Vec<CommitInfo>>,
    diffs: Mutex<HashMap<String, Vec<FileChange>>>,
    contents: Mutex<HashMap<(String, String), String>>,
    log: Log,
}

impl FakeHost {
    fn new(log: Log) -> Arc<Self> {
        Arc::new(Self {
            log,
            ..Default::default()
        })
    }

    /// Queues the head returned by the next `latest_commit` calls.
    /// The last queued head stays current.
    fn push_head(&self, sha: &str, parent: Option<&str>) {
        let parents = parent.map(|p| vec![p.to_string()]).unwrap_or_default();
        self.heads.lock().unwrap().push(CommitInfo::new(sha, parents));
    }

    fn set_diff(&self, sha: &str, files: &[(&str, FileStatus)]) {
        let files = files
            .iter()
            .map(|(path, status)| FileChange {
                path: path.to_string(),
                status: *status,
                additions: 1,
                deletions: 1,
            })
            .collect();
        self.diffs.lock().unwrap().insert(sha.to_string(), files);
    }

    fn set_content(&self, path: &str, sha: &str, content: &str) {
        self.contents
            .lock()
            .unwrap()
            .insert((path.to_string(), sha.to_string()), content.to_string());
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl RemoteHost for FakeHost {
    async fn latest_commit(&self, _branch: &str) -> testsmith_remote::Result<CommitInfo> {
        self.record("poll".to_string());
        let mut heads = self.heads.lock().unwrap();
        match heads.len() {
            0 => Err(RemoteError::NotFound("branch".into())),
            1 => Ok(heads[0].clone()),
            _ => Ok(heads.remove(0)),
        }
    }

    async fn commit_file_diff(&self, sha: &str) -> testsmith_remote::Result<Vec<FileChange>> {
        Ok(self.diffs.lock().unwrap().get(sha).cloned().unwrap_or_default())
    }

    async fn file_content_at(&self, path: &str, sha: &str) -> testsmith_remote::Result<String> {
        self.record(format!("fetch {}@{}", path, sha));
        self.contents
            .lock()
            .unwrap()
            .get(&(path.to_string(), sha.to_string()))
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn create_branch(&self, name: &str, from_branch: &str) -> testsmith_remote::Result<()> {
        self.record(format!("branch {} from {}", name, from_branch));
        Ok(())
    }

    async fn commit_file(
        &self,
        branch: &str,
        path: &str,
        content: &str,
        _message: &str,
    ) -> testsmith_remote::Result<String> {
        assert_eq!(content, GENERATED);
        self.record(format!("commit {} {}", branch, path));
        Ok("c-test".into())
    }

    async fn create_pull_request(
        &self,
        _title: &str,
        head: &str,
        base: &str,
        _body: &str,
    ) -> testsmith_remote::Result<PullRequest> {
        self.record(format!("pr {} -> {}", head, base));
        Ok(PullRequest {
            number: 1,
            html_url: "https://github.com/acme/shop/pull/1".into(),
        })
    }
}

/// Answers with a fixed response after an optional delay, logging both ends.
struct SlowBackend {
    response: String,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
    log: Log,
}

impl SlowBackend {
    fn new(response: &str, delay: Duration, log: Log) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            delay,
            prompts: Mutex::new(Vec::new()),
            log,
        })
    }
}

#[async_trait]
impl GenerationBackend for SlowBackend {
    async fn generate(&self, prompt: &str) -> String {
        self.log.lock().unwrap().push("generate-start".to_string());
        self.prompts.lock().unwrap().push(prompt.to_string());
        tokio::time::sleep(self.delay).await;
        self.log.lock().unwrap().push("generate-end".to_string());
        self.response.clone()
    }
}

/// Cancels the poll on its first call, then answers normally.
struct CancellingBackend {
    cancel: CancellationToken,
    calls: Mutex<usize>,
}

#[async_trait]
impl GenerationBackend for CancellingBackend {
    async fn generate(&self, _prompt: &str) -> String {
        *self.calls.lock().unwrap() += 1;
        self.cancel.cancel();
        GENERATED.to_string()
    }
}

fn poller(
    host: Arc<FakeHost>,
    backend: Arc<dyn GenerationBackend>,
    poll_interval: Duration,
) -> RemotePoller {
    let orchestrator = Orchestrator::new(backend, OrchestratorConfig::default());
    RemotePoller::new(
        host,
        Arc::new(orchestrator),
        CommitterConfig::new("main", "auto-"),
        SkipList::default(),
        ProjectRoots::new("", "src", "tests"),
        RuntimeConfig::default().with_poll_interval(poll_interval),
    )
}

fn entries(log: &Log, prefix: &str) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|e| e.starts_with(prefix))
        .cloned()
        .collect()
}

#[tokio::test]
async fn test_first_poll_primes_then_no_new_commit() {
    let log = Log::default();
    let host = FakeHost::new(log.clone());
    host.push_head("c1", None);
    let backend = SlowBackend::new(GENERATED, Duration::ZERO, log.clone());
    let mut poller = poller(host, backend, Duration::from_secs(1));
    let cancel = CancellationToken::new();

    let outcome = poller.poll_once(&cancel).await.unwrap();
    assert_eq!(outcome, PollOutcome::Primed { sha: "c1".into() });
    assert_eq!(poller.last_seen(), Some("c1"));

    let outcome = poller.poll_once(&cancel).await.unwrap();
    assert_eq!(outcome, PollOutcome::NoNewCommit);
    assert!(entries(&log, "branch").is_empty());
}

#[tokio::test]
async fn test_readme_only_commit_creates_nothing() {
    let log = Log::default();
    let host = FakeHost::new(log.clone());
    host.push_head("c1", None);
    host.push_head("c2", Some("c1"));
    host.set_diff("c2", &[("README.md", FileStatus::Modified)]);
    let backend = SlowBackend::new(GENERATED, Duration::ZERO, log.clone());
    let mut poller = poller(host, backend.clone(), Duration::from_secs(1));
    let cancel = CancellationToken::new();

    poller.poll_once(&cancel).await.unwrap();
    let outcome = poller.poll_once(&cancel).await.unwrap();

    assert_eq!(outcome, PollOutcome::NoRelevantFiles { sha: "c2".into() });
    assert!(entries(&log, "fetch").is_empty());
    assert!(entries(&log, "branch").is_empty());
    assert!(entries(&log, "commit").is_empty());
    assert!(entries(&log, "pr").is_empty());
    assert!(backend.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_relevant_change_is_committed_with_one_pull_request() {
    let log = Log::default();
    let host = FakeHost::new(log.clone());
    host.push_head("c1", None);
    host.push_head("c2", Some("c1"));
    host.set_diff(
        "c2",
        &[
            ("src/a/Foo.cs", FileStatus::Modified),
            ("src/Program.cs", FileStatus::Modified),
            ("tests/a/BarTests.cs", FileStatus::Modified),
            ("src/a/Gone.cs", FileStatus::Removed),
            ("docs/notes.md", FileStatus::Added),
        ],
    );
    host.set_content("src/a/Foo.cs", "c1", FOO_V1);
    host.set_content("src/a/Foo.cs", "c2", FOO_V2);
    host.set_content("tests/a/FooTests.cs", "c2", "public class FooTests { /* old */ }");
    let backend = SlowBackend::new(GENERATED, Duration::ZERO, log.clone());
    let mut poller = poller(host, backend.clone(), Duration::from_secs(1));
    let cancel = CancellationToken::new();

    poller.poll_once(&cancel).await.unwrap();
    let outcome = poller.poll_once(&cancel).await.unwrap();

    let (branch, committed, pull_request) = match outcome {
        PollOutcome::Dispatched {
            branch,
            committed,
            pull_request,
        } => (branch.unwrap(), committed, pull_request),
        other => panic!("expected dispatch, got {:?}", other),
    };
    assert!(branch.starts_with("auto-"));
    assert_eq!(committed, 1);
    assert_eq!(pull_request.unwrap().number, 1);

    // Only the relevant source file and its test file are fetched.
    assert_eq!(
        entries(&log, "fetch"),
        vec![
            "fetch src/a/Foo.cs@c1",
            "fetch src/a/Foo.cs@c2",
            "fetch tests/a/FooTests.cs@c2",
        ]
    );
    assert_eq!(
        entries(&log, "commit"),
        vec![format!("commit {} tests/a/FooTests.cs", branch)]
    );
    assert_eq!(entries(&log, "pr"), vec![format!("pr {} -> main", branch)]);

    let prompts = backend.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("return 2;"));
    assert!(prompts[0].contains("/* old */"));
}

#[tokio::test]
async fn test_empty_generation_leaves_no_branch_or_pull_request() {
    let log = Log::default();
    let host = FakeHost::new(log.clone());
    host.push_head("c1", None);
    host.push_head("c2", Some("c1"));
    host.set_diff("c2", &[("src/a/Foo.cs", FileStatus::Modified)]);
    host.set_content("src/a/Foo.cs", "c2", FOO_V2);
    let backend = SlowBackend::new("   ", Duration::ZERO, log.clone());
    let mut poller = poller(host, backend, Duration::from_secs(1));
    let cancel = CancellationToken::new();

    poller.poll_once(&cancel).await.unwrap();
    let outcome = poller.poll_once(&cancel).await.unwrap();

    assert!(matches!(
        outcome,
        PollOutcome::Dispatched {
            branch: None,
            committed: 0,
            pull_request: None,
        }
    ));
    assert!(entries(&log, "branch").is_empty());
    assert!(entries(&log, "commit").is_empty());
    assert!(entries(&log, "pr").is_empty());
}

#[tokio::test]
async fn test_file_missing_at_commit_is_treated_as_deleted() {
    let log = Log::default();
    let host = FakeHost::new(log.clone());
    host.push_head("c1", None);
    host.push_head("c2", Some("c1"));
    host.set_diff("c2", &[("src/a/Foo.cs", FileStatus::Renamed)]);
    host.set_content("src/a/Foo.cs", "c1", FOO_V1);
    let backend = SlowBackend::new(GENERATED, Duration::ZERO, log.clone());
    let mut poller = poller(host, backend.clone(), Duration::from_secs(1));
    let cancel = CancellationToken::new();

    poller.poll_once(&cancel).await.unwrap();
    let outcome = poller.poll_once(&cancel).await.unwrap();

    assert!(matches!(outcome, PollOutcome::Dispatched { committed: 0, .. }));
    assert!(backend.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failing_file_does_not_abort_batch() {
    let log = Log::default();
    let host = FakeHost::new(log.clone());
    host.push_head("c1", None);
    host.push_head("c2", Some("c1"));
    host.set_diff(
        "c2",
        &[
            ("lib/Bad.cs", FileStatus::Added),
            ("src/a/Foo.cs", FileStatus::Modified),
        ],
    );
    // Outside the source root: no test path can be derived.
    host.set_content("lib/Bad.cs", "c2", FOO_V2);
    host.set_content("src/a/Foo.cs", "c1", FOO_V1);
    host.set_content("src/a/Foo.cs", "c2", FOO_V2);
    let backend = SlowBackend::new(GENERATED, Duration::ZERO, log.clone());
    let mut poller = poller(host, backend.clone(), Duration::from_secs(1));
    let cancel = CancellationToken::new();

    poller.poll_once(&cancel).await.unwrap();
    let outcome = poller.poll_once(&cancel).await.unwrap();

    let branch = match outcome {
        PollOutcome::Dispatched {
            branch: Some(branch),
            committed: 1,
            pull_request: Some(_),
        } => branch,
        other => panic!("expected one committed file, got {:?}", other),
    };
    assert_eq!(
        entries(&log, "commit"),
        vec![format!("commit {} tests/a/FooTests.cs", branch)]
    );
    assert_eq!(entries(&log, "branch").len(), 1);
    assert_eq!(entries(&log, "pr").len(), 1);
    assert_eq!(backend.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancellation_mid_batch_finishes_current_file_only() {
    let log = Log::default();
    let host = FakeHost::new(log.clone());
    host.push_head("c1", None);
    host.push_head("c2", Some("c1"));
    host.set_diff(
        "c2",
        &[
            ("src/a/Foo.cs", FileStatus::Modified),
            ("src/b/Bar.cs", FileStatus::Modified),
        ],
    );
    for path in ["src/a/Foo.cs", "src/b/Bar.cs"] {
        host.set_content(path, "c1", FOO_V1);
        host.set_content(path, "c2", FOO_V2);
    }
    let cancel = CancellationToken::new();
    let backend = Arc::new(CancellingBackend {
        cancel: cancel.clone(),
        calls: Mutex::new(0),
    });
    let mut poller = poller(host, backend.clone(), Duration::from_secs(1));

    poller.poll_once(&cancel).await.unwrap();
    let outcome = poller.poll_once(&cancel).await.unwrap();

    assert!(cancel.is_cancelled());
    assert!(matches!(outcome, PollOutcome::Dispatched { committed: 1, .. }));
    assert_eq!(*backend.calls.lock().unwrap(), 1);
    let commits = entries(&log, "commit");
    assert_eq!(commits.len(), 1);
    assert!(commits[0].ends_with("tests/a/FooTests.cs"));
}

#[tokio::test]
async fn test_cancelled_before_poll() {
    let log = Log::default();
    let host = FakeHost::new(log.clone());
    host.push_head("c1", None);
    let backend = SlowBackend::new(GENERATED, Duration::ZERO, log.clone());
    let mut poller = poller(host, backend, Duration::from_secs(1));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = poller.poll_once(&cancel).await.unwrap();
    assert_eq!(outcome, PollOutcome::Cancelled);
    assert!(poller.last_seen().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_poll_loop_never_overlaps_dispatch() {
    let log = Log::default();
    let host = FakeHost::new(log.clone());
    host.push_head("c1", None);
    for i in 2..=4 {
        let sha = format!("c{}", i);
        let parent = format!("c{}", i - 1);
        host.push_head(&sha, Some(parent.as_str()));
        host.set_diff(&sha, &[("src/a/Foo.cs", FileStatus::Modified)]);
        host.set_content("src/a/Foo.cs", &parent, FOO_V1);
        host.set_content("src/a/Foo.cs", &sha, FOO_V2);
    }
    // Generation takes far longer than the poll interval.
    let backend = SlowBackend::new(GENERATED, Duration::from_secs(5), log.clone());
    let poller = poller(host, backend, Duration::from_secs(1));

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller.run(cancel.clone()));
    tokio::time::sleep(Duration::from_secs(60)).await;
    cancel.cancel();
    handle.await.unwrap();

    let log = log.lock().unwrap();
    let mut in_dispatch = false;
    for entry in log.iter() {
        match entry.as_str() {
            "generate-start" => in_dispatch = true,
            "generate-end" => in_dispatch = false,
            "poll" => assert!(!in_dispatch, "poll overlapped a dispatch: {:?}", log),
            _ => {}
        }
    }
    let generations = log.iter().filter(|e| *e == "generate-start").count();
    assert_eq!(generations, 3);
    assert_eq!(log.iter().filter(|e| e.starts_with("pr ")).count(), 3);
}
