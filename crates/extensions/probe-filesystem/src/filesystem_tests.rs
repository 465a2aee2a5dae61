use minimon_protocols::ScrapeEvent;
use tokio::sync::mpsc;

use super::*;

const SCRAPE_INTERVAL: Duration = Duration::from_secs(60);
const GB: u64 = 1_000_000_000;

struct NoStore;

impl KvStore for NoStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
    fn set(&self, _key: &str, _value: &str) -> bool {
        false
    }
    fn remove(&self, _key: &str) {}
    fn sync(&self, _force: bool) -> Result<(), minimon_protocols::StorageError> {
        Ok(())
    }
}

fn state(event: &ScrapeEvent) -> (&str, &str, bool, &str) {
    match event {
        ScrapeEvent::MetricState {
            metric_id,
            name,
            is_healthy,
            description,
        } => (metric_id.as_str(), name, *is_healthy, description),
        other => panic!("unexpected event: {:?}", other),
    }
}

fn probe(params: serde_json::Value) -> Arc<FilesystemProbe> {
    Arc::new(FilesystemProbe::from_params(&params, SCRAPE_INTERVAL).unwrap())
}

fn mount(device: &str, mountpoint: &str, fs_type: &str) -> MountEntry {
    MountEntry {
        device: device.to_string(),
        mountpoint: mountpoint.to_string(),
        fs_type: fs_type.to_string(),
    }
}

fn window(samples: &[(u64, u64)]) -> WindowCollector<u64> {
    let start = Instant::now();
    let mut window = WindowCollector::new(Duration::from_secs(300));
    for (secs, available) in samples {
        window.push(start + Duration::from_secs(*secs), *available);
    }
    window
}

fn drain(rx: &mut mpsc::Receiver<ScrapeEvent>) -> Vec<ScrapeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn scrape(probe: Arc<FilesystemProbe>) -> Vec<ScrapeEvent> {
    let (tx, mut rx) = mpsc::channel(16);
    let tasks = probe.update_tasks(ScrapeSink::new("fs", tx), Arc::new(NoStore));
    assert_eq!(tasks.len(), 1);
    tasks[0].run().await;
    drop(tasks);
    drain(&mut rx)
}

#[test]
fn test_config_defaults() {
    let probe = FilesystemProbe::from_params(&serde_json::json!({}), SCRAPE_INTERVAL).unwrap();
    let config = probe.config();
    assert!(config.mountpoints.is_empty());
    assert_eq!(config.fstypes, vec!["ext4", "btrfs"]);
    assert!(config.mountpoint_blacklist.is_empty());
    assert_eq!(config.threshold, RelativeAbsoluteValue::Relative(0.2));
    assert_eq!(config.rate_threshold, RelativeAbsoluteValue::Absolute(GB));
    assert_eq!(config.rate_threshold_window, Duration::from_secs(300));
    assert_eq!(config.mount_prefix, "");
    assert_eq!(probe.probe_type(), "filesystem");
    assert!(probe.multiple_instances_allowed());
}

#[test]
fn test_invalid_params() {
    for params in [
        serde_json::json!({"fstypes": []}),
        serde_json::json!({"mountpoints": ["/"], "threshold": "lots"}),
        serde_json::json!({"rate_threshold_window": "30s"}),
        serde_json::json!({"mountpoints": "/"}),
    ] {
        assert!(
            matches!(
                FilesystemProbe::from_params(&params, SCRAPE_INTERVAL),
                Err(ProbeError::InvalidParams(_))
            ),
            "accepted {}",
            params
        );
    }
}

#[test]
fn test_rate_window_must_cover_scrape_interval() {
    let params = serde_json::json!({"rate_threshold_window": "1m"});
    assert!(FilesystemProbe::from_params(&params, Duration::from_secs(60)).is_ok());
    match FilesystemProbe::from_params(&params, Duration::from_secs(90)) {
        Err(ProbeError::InvalidParams(message)) => {
            assert!(message.contains("rate_threshold_window"));
            assert!(message.contains("1m < 1m30s"));
        }
        _ => panic!("expected invalid params"),
    }
}

#[test]
fn test_explicit_mountpoints_skip_discovery() {
    let probe = probe(serde_json::json!({"mountpoint_whitelist": ["/data", "/"]}));
    let entries = [mount("/dev/sda1", "/", "ext4"), mount("/dev/sdb1", "/srv", "ext4")];
    assert_eq!(probe.select_mountpoints(&entries), vec!["/data", "/"]);
}

#[test]
fn test_discovery_filters_and_dedups() {
    let probe = probe(serde_json::json!({
        "fstypes": ["ext4", "btrfs"],
        "mountpoint_blacklist": ["/boot"]
    }));
    let entries = [
        mount("/dev/sda1", "/", "ext4"),
        mount("/dev/sda2", "/boot", "ext4"),
        mount("/dev/sdb1", "/var/lib/docker/btrfs", "btrfs"),
        mount("/dev/sdb1", "/srv", "btrfs"),
        mount("tmpfs", "/run", "tmpfs"),
        mount("/dev/sdc1", "/mnt/usb", "vfat"),
    ];
    assert_eq!(probe.select_mountpoints(&entries), vec!["/", "/srv"]);
}

#[test]
fn test_discovery_with_nothing_matching() {
    let probe = probe(serde_json::json!({"fstypes": ["zfs"]}));
    assert!(probe.select_mountpoints(&[mount("/dev/sda1", "/", "ext4")]).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rate_needs_two_instants() {
    let probe = probe(serde_json::json!({}));
    assert!(probe.judge_rate(&window(&[]), 100 * GB).is_none());
    assert!(probe.judge_rate(&window(&[(0, 10 * GB)]), 100 * GB).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_rate_slow_change_is_ok() {
    let probe = probe(serde_json::json!({}));
    // 100 MB in a minute, 1 GB per 5 minutes allowed.
    let verdict = probe.judge_rate(&window(&[(0, 10 * GB), (60, 10 * GB - GB / 10)]), 100 * GB);
    assert_eq!(verdict, Some(Ok(())));
}

#[tokio::test(start_paused = true)]
async fn test_rate_fast_decrease_fails() {
    let probe = probe(serde_json::json!({}));
    let verdict = probe.judge_rate(&window(&[(0, 10 * GB), (30, 9 * GB), (60, 8 * GB)]), 100 * GB);
    assert_eq!(
        verdict,
        Some(Err(
            "available space decreased rapidly by 2.0 GB in 1m to reach 8.0 GB".to_string()
        ))
    );
}

#[tokio::test(start_paused = true)]
async fn test_rate_fast_increase_fails() {
    let probe = probe(serde_json::json!({}));
    let verdict = probe.judge_rate(&window(&[(0, GB), (120, 3 * GB)]), 100 * GB);
    assert_eq!(
        verdict,
        Some(Err(
            "available space increased rapidly by 2.0 GB in 2m to reach 3.0 GB".to_string()
        ))
    );
}

#[tokio::test(start_paused = true)]
async fn test_rate_threshold_relative_to_size() {
    // 10% of 100 GB per 5 minutes: 1 GB per minute is fine, 3 GB is not.
    let probe = probe(serde_json::json!({"rate_threshold": "10%"}));
    assert_eq!(
        probe.judge_rate(&window(&[(0, 50 * GB), (60, 49 * GB)]), 100 * GB),
        Some(Ok(()))
    );
    assert!(matches!(
        probe.judge_rate(&window(&[(0, 50 * GB), (60, 47 * GB)]), 100 * GB),
        Some(Err(_))
    ));
}

#[test]
fn test_display_mountpoint() {
    let probe = probe(serde_json::json!({
        "mountpoints": ["/host", "/host/data"],
        "mount_prefix": "/host"
    }));
    assert_eq!(probe.display_mountpoint("/host"), "/");
    assert_eq!(probe.display_mountpoint("/host/data"), "/data");
    assert_eq!(probe.display_mountpoint("/other"), "/other");
}

#[test]
fn test_is_low() {
    let relative = probe(serde_json::json!({
        "mountpoints": ["/"],
        "threshold": "20%"
    }));
    assert!(relative.is_low(&Usage { available: 19, total: 100 }));
    assert!(!relative.is_low(&Usage { available: 20, total: 100 }));

    let absolute = probe(serde_json::json!({
        "mountpoints": ["/"],
        "threshold": "1k"
    }));
    assert!(absolute.is_low(&Usage { available: 999, total: 1_000_000 }));
    assert!(!absolute.is_low(&Usage { available: 1000, total: 1_000_000 }));
}

#[test]
fn test_usage_percent() {
    assert_eq!(Usage { available: 25, total: 100 }.available_percent(), 25);
    assert_eq!(Usage { available: 0, total: 0 }.available_percent(), 0);
}

#[test]
fn test_format_bytes() {
    assert_eq!(format_bytes(512), "512 B");
    assert_eq!(format_bytes(1500), "1.5 kB");
    assert_eq!(format_bytes(3_200_000_000), "3.2 GB");
}

#[test]
fn test_usage_of_tempdir() {
    let dir = tempfile::tempdir().unwrap();
    let usage = Usage::of(dir.path().to_str().unwrap()).unwrap();
    assert!(usage.total > 0);
    assert!(usage.available <= usage.total);
}

#[tokio::test(start_paused = true)]
async fn test_second_scrape_reports_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap().to_string();
    let probe = probe(serde_json::json!({"mountpoints": [path.clone()], "threshold": "0"}));

    let (tx, mut rx) = mpsc::channel(16);
    let tasks = probe.update_tasks(ScrapeSink::new("fs", tx), Arc::new(NoStore));

    tasks[0].run().await;
    assert_eq!(drain(&mut rx).len(), 1);

    tokio::time::advance(SCRAPE_INTERVAL).await;
    tasks[0].run().await;
    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    let (usage_id, _, _, _) = state(&events[0]);
    assert_eq!(usage_id, format!("fs/filesystem:{}", path));
    let (rate_id, name, is_healthy, _) = state(&events[1]);
    assert_eq!(rate_id, format!("fs/filesystem_rate:{}", path));
    assert_eq!(name, format!("mountpoint {}", path));
    assert!(is_healthy);
}

#[tokio::test]
async fn test_scrape_healthy_mountpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap().to_string();
    let events = scrape(probe(serde_json::json!({
        "mountpoints": [path.clone()],
        "threshold": "0"
    })))
    .await;

    assert_eq!(events.len(), 1);
    let (metric_id, _, is_healthy, _) = state(&events[0]);
    assert_eq!(metric_id, format!("fs/filesystem:{}", path));
    assert!(is_healthy);
}

#[tokio::test]
async fn test_scrape_low_space() {
    let dir = tempfile::tempdir().unwrap();
    let events = scrape(probe(serde_json::json!({
        "mountpoints": [dir.path().to_str().unwrap()],
        "threshold": "1000000t"
    })))
    .await;

    assert_eq!(events.len(), 1);
    let (_, name, is_healthy, description) = state(&events[0]);
    assert!(name.starts_with("mountpoint "));
    assert!(!is_healthy);
    assert!(description.starts_with("low space remaining"));
}

#[tokio::test]
async fn test_scrape_missing_mountpoint_is_failure() {
    let events = scrape(probe(serde_json::json!({
        "mountpoints": ["/definitely/not/mounted/here"]
    })))
    .await;

    assert_eq!(events.len(), 1);
    let (_, _, is_healthy, description) = state(&events[0]);
    assert!(!is_healthy);
    assert!(description.starts_with("unable to get remaining space"));
}
