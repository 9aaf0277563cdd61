use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::EventKind;
use tempfile::TempDir;

use super::debouncer::{Debouncer, IDLE_TICK, is_temp_file};
use super::types::ChangeKind;
use super::*;
use crate::core::{Joinable, Startable, Stoppable};
use crate::pipeline::{BuildError, BuildReport};
use crate::utils::path::normalize_path;

// ============================================================================
// Debouncer
// ============================================================================

fn debouncer(window_ms: u64) -> Debouncer {
    Debouncer::new(Duration::from_millis(window_ms), Logger::capture(false))
}

fn make_event(paths: Vec<&str>, kind: EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> EventKind {
    EventKind::Modify(ModifyKind::Data(DataChange::Any))
}

fn create_kind() -> EventKind {
    EventKind::Create(CreateKind::File)
}

fn remove_kind() -> EventKind {
    EventKind::Remove(RemoveKind::File)
}

fn rename_kind() -> EventKind {
    EventKind::Modify(ModifyKind::Name(RenameMode::Both))
}

#[test]
fn test_debouncer_empty() {
    let debouncer = debouncer(100);
    assert!(!debouncer.is_ready());
    assert_eq!(debouncer.sleep_duration(), IDLE_TICK);
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = debouncer(100);

    debouncer.add_event(&make_event(vec!["/tmp/a.html"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/b.html"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/c.html"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/d.html", "/tmp/e.html"], rename_kind()));

    assert_eq!(debouncer.changes.len(), 5);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.html")], ChangeKind::Created);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/b.html")], ChangeKind::Modified);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/c.html")], ChangeKind::Removed);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/e.html")], ChangeKind::Renamed);
}

#[test]
fn test_noise_does_not_arm() {
    let mut debouncer = debouncer(100);

    debouncer.add_event(&make_event(vec!["/tmp/a.html"], EventKind::Access(AccessKind::Any)));
    debouncer.add_event(&make_event(
        vec!["/tmp/a.html"],
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
    ));
    debouncer.add_event(&make_event(vec!["/tmp/.home.html.swp"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/home.html~"], create_kind()));

    assert!(debouncer.changes.is_empty());
    assert!(debouncer.armed_at.is_none());
}

#[test]
fn test_poll_write_time_counts_as_modify() {
    let mut debouncer = debouncer(100);
    debouncer.add_event(&make_event(
        vec!["/tmp/a.html"],
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
    ));
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.html")], ChangeKind::Modified);
}

#[test]
fn test_temp_file_does_not_rearm() {
    let mut debouncer = debouncer(100);

    debouncer.add_event(&make_event(vec!["/tmp/real.html"], modify_kind()));
    let first_time = debouncer.armed_at.unwrap();

    std::thread::sleep(Duration::from_millis(5));

    debouncer.add_event(&make_event(vec!["/tmp/real.html.swp"], modify_kind()));
    assert_eq!(debouncer.armed_at.unwrap(), first_time);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_later_events_do_not_extend_window() {
    let mut debouncer = debouncer(100);

    debouncer.add_event(&make_event(vec!["/tmp/a.html"], modify_kind()));
    let armed = debouncer.armed_at.unwrap();
    std::thread::sleep(Duration::from_millis(5));
    debouncer.add_event(&make_event(vec!["/tmp/b.html"], modify_kind()));

    assert_eq!(debouncer.armed_at.unwrap(), armed);
}

#[test]
fn test_burst_yields_one_batch() {
    let mut debouncer = debouncer(30);
    for i in 0..10 {
        let path = format!("/tmp/page{i}.html");
        debouncer.add_event(&make_event(vec![&path], modify_kind()));
    }
    assert!(debouncer.take_if_ready().is_none());

    std::thread::sleep(Duration::from_millis(40));
    let batch = debouncer.take_if_ready().unwrap();
    assert_eq!(batch.len(), 10);

    // nothing pending afterwards
    assert!(debouncer.take_if_ready().is_none());
    assert!(debouncer.armed_at.is_none());
}

#[test]
fn test_zero_window_is_ready_immediately() {
    let mut debouncer = debouncer(0);
    debouncer.add_event(&make_event(vec!["/tmp/a.html"], modify_kind()));
    assert!(debouncer.take_if_ready().is_some());
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = debouncer(100);

    debouncer.add_event(&make_event(vec!["/tmp/a.html"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.html"], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.html")], ChangeKind::Created);
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = debouncer(100);

    debouncer.add_event(&make_event(vec!["/tmp/a.html"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.html"], create_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.html")], ChangeKind::Modified);
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = debouncer(100);

    debouncer.add_event(&make_event(vec!["/tmp/a.html"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.html"], remove_kind()));

    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.html")], ChangeKind::Removed);
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = debouncer(0);

    debouncer.add_event(&make_event(vec!["/tmp/a.html"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.html"], remove_kind()));

    assert!(debouncer.changes.is_empty(), "created+removed should discard");
    // armed, but an empty batch never triggers a rebuild
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_remove_create_remove_keeps_deletion() {
    let mut debouncer = debouncer(0);
    let home = "/site/templates/home.html";

    debouncer.add_event(&make_event(vec![home], remove_kind()));
    debouncer.add_event(&make_event(vec![home], create_kind()));
    debouncer.add_event(&make_event(vec![home], remove_kind()));

    let batch = debouncer.take_if_ready().expect("deletion must produce a batch");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[&PathBuf::from(home)], ChangeKind::Removed);
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = debouncer(100);
    debouncer.armed_at = Some(Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur >= Duration::from_millis(90));
    assert!(dur <= Duration::from_millis(100));
}

#[test]
fn test_is_temp_file() {
    for name in ["a.swp", "a.swo", "a.bak", "a.tmp", "home.html~", ".#home.html", "4913", ".DS_Store"] {
        assert!(is_temp_file(Path::new(name)), "{name}");
    }
    for name in ["home.html", "logo.png", ".htaccess"] {
        assert!(!is_temp_file(Path::new(name)), "{name}");
    }
}

#[test]
fn test_watch_options_from_config() {
    let serve = crate::config::ServeConfig {
        poll: true,
        poll_interval_ms: 50,
        debounce_ms: 20,
        ..Default::default()
    };
    let options = WatchOptions::from(&serve);
    assert_eq!(options.debounce, Duration::from_millis(20));
    assert_eq!(
        options.backend,
        Backend::Poll {
            interval: Duration::from_millis(50)
        }
    );
    assert_eq!(WatchOptions::default().backend, Backend::Native);
}

// ============================================================================
// Watcher against the real file system
// ============================================================================

/// Counts rebuilds; optionally fails the first `fail_first` of them.
#[derive(Default)]
struct CountingRebuild {
    calls: AtomicUsize,
    fail_first: usize,
}

impl CountingRebuild {
    fn failing(fail_first: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rebuild for CountingRebuild {
    fn rebuild(&self) -> Result<BuildReport, BuildError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(BuildError::Copy(crate::asset::CopyError::SourceNotFound(
                "static".into(),
            )));
        }
        Ok(BuildReport::default())
    }
}

struct Fixture {
    _temp: TempDir,
    templates: PathBuf,
    static_dir: PathBuf,
    rebuild: Arc<CountingRebuild>,
    logger: Logger,
    watcher: Watcher,
}

fn fixture(options: WatchOptions, rebuild: CountingRebuild) -> Fixture {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let templates = root.join("templates");
    let static_dir = root.join("static");
    fs::create_dir_all(&templates).unwrap();
    fs::create_dir_all(&static_dir).unwrap();
    fs::write(templates.join("home.html"), "v0").unwrap();

    let rebuild = Arc::new(rebuild);
    let logger = Logger::capture(false);
    let watcher = Watcher::new(
        vec![WatchTarget::recursive(&templates), WatchTarget::recursive(&static_dir)],
        options,
        Arc::clone(&rebuild) as Arc<dyn Rebuild>,
        logger.clone(),
    );

    Fixture {
        _temp: temp,
        templates,
        static_dir,
        rebuild,
        logger,
        watcher,
    }
}

fn native(debounce_ms: u64) -> WatchOptions {
    WatchOptions {
        debounce: Duration::from_millis(debounce_ms),
        backend: Backend::Native,
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    condition()
}

fn shutdown(watcher: &mut Watcher) {
    watcher.stop();
    watcher.join();
    assert_eq!(watcher.state(), LifecycleState::Stopped);
}

#[test]
fn test_create_triggers_rebuild() {
    let mut fx = fixture(native(50), CountingRebuild::default());
    fx.watcher.start().unwrap();

    fs::write(fx.static_dir.join("logo.png"), [1, 2, 3]).unwrap();
    assert!(wait_until(Duration::from_secs(3), || fx.rebuild.calls() >= 1));

    shutdown(&mut fx.watcher);
}

#[test]
fn test_modify_delete_and_rename_each_trigger_rebuild() {
    let mut fx = fixture(native(50), CountingRebuild::default());
    fx.watcher.start().unwrap();
    let home = fx.templates.join("home.html");

    fs::write(&home, "v1").unwrap();
    assert!(wait_until(Duration::from_secs(3), || fx.rebuild.calls() >= 1));
    // let the batch settle before the next change
    std::thread::sleep(Duration::from_millis(150));

    let before = fx.rebuild.calls();
    fs::rename(&home, fx.templates.join("index.html")).unwrap();
    assert!(wait_until(Duration::from_secs(3), || fx.rebuild.calls() > before));
    std::thread::sleep(Duration::from_millis(150));

    let before = fx.rebuild.calls();
    fs::remove_file(fx.templates.join("index.html")).unwrap();
    assert!(wait_until(Duration::from_secs(3), || fx.rebuild.calls() > before));

    shutdown(&mut fx.watcher);
}

#[test]
fn test_nested_directory_change_is_seen() {
    let mut fx = fixture(native(50), CountingRebuild::default());
    fs::create_dir_all(fx.static_dir.join("css")).unwrap();
    fx.watcher.start().unwrap();

    fs::write(fx.static_dir.join("css").join("site.css"), "body {}").unwrap();
    assert!(wait_until(Duration::from_secs(3), || fx.rebuild.calls() >= 1));

    shutdown(&mut fx.watcher);
}

#[test]
fn test_burst_coalesces_into_one_rebuild() {
    let mut fx = fixture(native(400), CountingRebuild::default());
    fx.watcher.start().unwrap();

    for i in 0..10 {
        fs::write(fx.templates.join(format!("page{i}.html")), "x").unwrap();
    }

    assert!(wait_until(Duration::from_secs(3), || fx.rebuild.calls() >= 1));
    // give a second batch the chance to show up
    std::thread::sleep(Duration::from_millis(800));
    assert_eq!(fx.rebuild.calls(), 1);

    shutdown(&mut fx.watcher);
}

#[test]
fn test_failed_rebuild_keeps_watching() {
    let mut fx = fixture(native(50), CountingRebuild::failing(1));
    fx.watcher.start().unwrap();
    let home = fx.templates.join("home.html");

    fs::write(&home, "broken").unwrap();
    assert!(wait_until(Duration::from_secs(3), || fx.rebuild.calls() >= 1));
    std::thread::sleep(Duration::from_millis(150));

    let before = fx.rebuild.calls();
    fs::write(&home, "fixed").unwrap();
    assert!(wait_until(Duration::from_secs(3), || fx.rebuild.calls() > before));

    shutdown(&mut fx.watcher);

    let lines = fx.logger.lines();
    assert!(lines.iter().any(|l| l.starts_with("✗ rebuild failed")));
    assert!(lines.iter().any(|l| l.starts_with("✓ rebuilt")));
}

#[test]
fn test_poll_backend_sees_changes() {
    let options = WatchOptions {
        debounce: Duration::from_millis(20),
        backend: Backend::Poll {
            interval: Duration::from_millis(50),
        },
    };
    let mut fx = fixture(options, CountingRebuild::default());
    fx.watcher.start().unwrap();
    // first scan establishes the baseline
    std::thread::sleep(Duration::from_millis(200));

    fs::write(fx.static_dir.join("new.txt"), "hello").unwrap();
    assert!(wait_until(Duration::from_secs(3), || fx.rebuild.calls() >= 1));

    shutdown(&mut fx.watcher);
}

#[test]
fn test_no_rebuild_after_stop() {
    let mut fx = fixture(native(50), CountingRebuild::default());
    fx.watcher.start().unwrap();
    shutdown(&mut fx.watcher);

    fs::write(fx.templates.join("home.html"), "late").unwrap();
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(fx.rebuild.calls(), 0);
}

#[test]
fn test_missing_target_fails_start() {
    let mut fx = fixture(native(50), CountingRebuild::default());
    fs::remove_dir_all(&fx.static_dir).unwrap();

    let err = fx.watcher.start().unwrap_err();
    assert!(format!("{err:#}").contains("static"));
    assert_eq!(fx.watcher.state(), LifecycleState::Stopped);
}

#[test]
fn test_stop_twice_and_join_twice() {
    let mut fx = fixture(native(50), CountingRebuild::default());
    fx.watcher.start().unwrap();

    fx.watcher.stop();
    fx.watcher.stop();
    fx.watcher.join();
    fx.watcher.join();
    assert_eq!(fx.watcher.state(), LifecycleState::Stopped);
}

#[test]
fn test_join_without_start_returns() {
    let mut fx = fixture(native(50), CountingRebuild::default());
    fx.watcher.join();
    assert_eq!(fx.watcher.state(), LifecycleState::Idle);

    fx.watcher.stop();
    fx.watcher.join();
    assert_eq!(fx.watcher.state(), LifecycleState::Stopped);
}

#[test]
fn test_cannot_start_twice() {
    let mut fx = fixture(native(50), CountingRebuild::default());
    fx.watcher.start().unwrap();
    assert!(fx.watcher.start().is_err());
    shutdown(&mut fx.watcher);
}
