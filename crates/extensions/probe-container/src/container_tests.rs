use minimon_protocols::ScrapeEvent;
use minimon_storage::MemoryStore;
use tokio::sync::mpsc;

use super::*;

/// Runtime answering from canned state.
#[derive(Default)]
struct FakeApi {
    containers: Mutex<Vec<Container>>,
    restart_counts: Mutex<HashMap<String, u64>>,
    list_fails: Mutex<bool>,
}

impl FakeApi {
    fn set(&self, containers: Vec<Container>) {
        *self.containers.lock() = containers;
    }

    fn restarts(&self, id: &str, count: u64) {
        self.restart_counts.lock().insert(id.to_string(), count);
    }
}

#[async_trait]
impl ContainerApi for FakeApi {
    async fn list(&self) -> Result<Vec<Container>, ContainerApiError> {
        if *self.list_fails.lock() {
            return Err(ContainerApiError::Malformed("/containers/json".to_string()));
        }
        Ok(self.containers.lock().clone())
    }

    async fn inspect(&self, id: &str) -> Result<ContainerInspect, ContainerApiError> {
        match self.restart_counts.lock().get(id) {
            Some(count) => Ok(ContainerInspect { restart_count: *count }),
            None => Err(ContainerApiError::Status {
                path: format!("/containers/{}/json", id),
                status: 404,
            }),
        }
    }
}

fn container(id: &str, name: &str, image_id: &str, state: &str) -> Container {
    Container {
        id: id.to_string(),
        names: vec![format!("/{}", name)],
        image: "nginx:1.27".to_string(),
        image_id: image_id.to_string(),
        state: state.to_string(),
        status: "Up 1 minute".to_string(),
    }
}

struct Harness {
    api: Arc<FakeApi>,
    probe: ContainerProbe,
    store: MemoryStore,
    sink: ScrapeSink,
    events: mpsc::Receiver<ScrapeEvent>,
}

impl Harness {
    fn new() -> Self {
        let api = Arc::new(FakeApi::default());
        let (tx, events) = mpsc::channel(64);
        Self {
            probe: ContainerProbe::new(api.clone()),
            api,
            store: MemoryStore::new(),
            sink: ScrapeSink::new("docker", tx),
            events,
        }
    }

    /// Scrape once and return `(metric_id, healthy, description)` per event;
    /// messages are reported with `healthy = None`.
    async fn scrape(&mut self) -> Vec<(String, Option<bool>, String)> {
        self.probe.scrape(&self.sink, &self.store).await;
        let mut seen = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            seen.push(match event {
                ScrapeEvent::MetricState {
                    metric_id,
                    is_healthy,
                    description,
                    ..
                } => (metric_id.as_str().to_string(), Some(is_healthy), description),
                ScrapeEvent::MetricMessage {
                    metric_id,
                    description,
                    ..
                } => (metric_id.as_str().to_string(), None, description),
            });
        }
        seen
    }
}

fn find<'a>(events: &'a [(String, Option<bool>, String)], id: &str) -> &'a (String, Option<bool>, String) {
    events
        .iter()
        .find(|(metric_id, _, _)| metric_id == id)
        .unwrap_or_else(|| panic!("no event for {} in {:?}", id, events))
}

#[test]
fn test_config_defaults() {
    let config: ContainerConfig = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(config.socket, PathBuf::from("/var/run/docker.sock"));
    assert_eq!(config.timeout, Duration::from_secs(10));

    let probe = ContainerProbe::factory(&serde_json::json!({"socket": "/run/podman.sock"}), Duration::from_secs(30)).unwrap();
    assert_eq!(probe.probe_type(), "container");
    assert!(!probe.multiple_instances_allowed());
}

#[test]
fn test_invalid_params() {
    for params in [
        serde_json::json!({"timeout": "0s"}),
        serde_json::json!({"timeout": "soon"}),
        serde_json::json!({"socket": 3}),
    ] {
        assert!(
            matches!(ContainerProbe::from_params(&params), Err(ProbeError::InvalidParams(_))),
            "accepted {}",
            params
        );
    }
}

#[tokio::test]
async fn test_running_container_is_healthy() {
    let mut harness = Harness::new();
    harness.api.set(vec![container("a1", "web", "sha256:1", "running")]);
    harness.api.restarts("a1", 0);

    let events = harness.scrape().await;
    assert_eq!(find(&events, "docker/containers:list").1, Some(true));
    assert_eq!(find(&events, "docker/container_state:a1").1, Some(true));
    assert_eq!(find(&events, "docker/container_restart:a1").1, Some(true));
    assert_eq!(find(&events, "docker/containers:inspect").1, Some(true));
    // First sighting records the image without a notification.
    assert!(events.iter().all(|(_, healthy, _)| healthy.is_some()));
    assert_eq!(harness.store.get("image_id/web").as_deref(), Some("sha256:1"));
}

#[tokio::test]
async fn test_stopped_container_fails() {
    let mut harness = Harness::new();
    harness.api.set(vec![container("a1", "web", "sha256:1", "exited")]);
    harness.api.restarts("a1", 0);

    let events = harness.scrape().await;
    let (_, healthy, description) = find(&events, "docker/container_state:a1");
    assert_eq!(*healthy, Some(false));
    assert_eq!(description, "container isn't running (exited)");
}

#[tokio::test]
async fn test_image_change_notifies_once() {
    let mut harness = Harness::new();
    harness.api.set(vec![container("a1", "web", "sha256:1", "running")]);
    harness.api.restarts("a1", 0);
    harness.scrape().await;

    // Re-created with a new image: new id, same name.
    harness.api.set(vec![container("b2", "web", "sha256:2", "running")]);
    harness.api.restarts("b2", 0);
    let events = harness.scrape().await;
    let (_, healthy, description) = find(&events, "docker/container_image:b2");
    assert_eq!(*healthy, None);
    assert_eq!(description, "image was updated");

    let events = harness.scrape().await;
    assert!(events.iter().all(|(id, _, _)| id != "docker/container_image:b2"));
}

#[tokio::test]
async fn test_known_image_survives_restart() {
    let mut harness = Harness::new();
    harness.store.set("image_id/web", "sha256:old");
    harness.api.set(vec![container("a1", "web", "sha256:new", "running")]);
    harness.api.restarts("a1", 0);

    let events = harness.scrape().await;
    assert_eq!(find(&events, "docker/container_image:a1").2, "image was updated");
}

#[tokio::test]
async fn test_restart_count_increase_fails_once() {
    let mut harness = Harness::new();
    harness.api.set(vec![container("a1", "web", "sha256:1", "running")]);
    harness.api.restarts("a1", 2);

    // Non-zero count on first sight counts as a restart.
    let events = harness.scrape().await;
    let (_, healthy, description) = find(&events, "docker/container_restart:a1");
    assert_eq!(*healthy, Some(false));
    assert_eq!(description, "container is restarting (2, Up 1 minute)");

    let events = harness.scrape().await;
    assert_eq!(find(&events, "docker/container_restart:a1").1, Some(true));

    harness.api.restarts("a1", 3);
    let events = harness.scrape().await;
    assert_eq!(find(&events, "docker/container_restart:a1").1, Some(false));
}

#[tokio::test]
async fn test_inspect_errors_are_collected() {
    let mut harness = Harness::new();
    harness.api.set(vec![
        container("a1", "web", "sha256:1", "running"),
        container("c3", "db", "sha256:9", "running"),
    ]);
    harness.api.restarts("a1", 0);

    let events = harness.scrape().await;
    let (_, healthy, description) = find(&events, "docker/containers:inspect");
    assert_eq!(*healthy, Some(false));
    assert!(description.starts_with("unable to inspect containers: "));
    assert!(description.contains("/containers/c3/json"));
    assert!(events.iter().all(|(id, _, _)| id != "docker/container_restart:c3"));
}

#[tokio::test]
async fn test_list_failure_stops_scrape() {
    let mut harness = Harness::new();
    harness.api.set(vec![container("a1", "web", "sha256:1", "running")]);
    *harness.api.list_fails.lock() = true;

    let events = harness.scrape().await;
    assert_eq!(events.len(), 1);
    let (id, healthy, description) = &events[0];
    assert_eq!(id, "docker/containers:list");
    assert_eq!(*healthy, Some(false));
    assert!(description.starts_with("failed to list containers"));
}

#[tokio::test]
async fn test_update_task_uses_given_store() {
    let api = Arc::new(FakeApi::default());
    api.set(vec![container("a1", "web", "sha256:1", "running")]);
    api.restarts("a1", 0);
    let probe = Arc::new(ContainerProbe::new(api));
    let store = Arc::new(MemoryStore::new());
    let (tx, _rx) = mpsc::channel(64);

    let tasks = probe.update_tasks(ScrapeSink::new("docker", tx), store.clone());
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name(), "docker/containers");
    tasks[0].run().await;
    assert_eq!(store.get("image_id/web").as_deref(), Some("sha256:1"));
}
