//! End-to-end scenarios against the real kernel watch facility.
#![cfg(target_os = "linux")]

use std::fs::{self, File};
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use filewatchd::config::WatcherConfigBuilder;
use filewatchd::event::EventKind;
use filewatchd::logger::StdLogger;
use filewatchd::watcher::Watcher;
use mktemp::Temp;

fn watcher_with_depth(root: &std::path::Path, max_depth: i32) -> Watcher {
    let config = WatcherConfigBuilder::default()
        .root(root.to_string_lossy().into_owned())
        .max_depth(max_depth)
        .build()
        .unwrap();
    Watcher::new(config, Arc::new(StdLogger)).unwrap()
}

#[test]
fn single_file_add_reports_exactly_one_added_event() {
    let dir = Temp::new_dir().unwrap();
    let watcher = watcher_with_depth(dir.as_ref(), -1);
    watcher.watch().unwrap();

    let path = dir.as_ref().join("a.txt");
    File::create(&path).unwrap().write_all(b"hello").unwrap();

    let event = watcher.next_event();
    assert_eq!(event.kind, EventKind::Added);
    assert_eq!(event.payload, path.to_string_lossy().into_owned());

    watcher.stop();
    watcher.join();
}

#[test]
fn burst_add_reports_every_file_exactly_once() {
    let dir = Temp::new_dir().unwrap();
    let watcher = watcher_with_depth(dir.as_ref(), -1);
    watcher.watch().unwrap();

    for i in 0..100 {
        let path = dir.as_ref().join(format!("temp{}.txt", i));
        File::create(&path).unwrap().write_all(b"x").unwrap();
    }

    let mut seen = std::collections::HashSet::new();
    for _ in 0..100 {
        let event = watcher.next_event();
        assert_eq!(event.kind, EventKind::Added);
        assert!(seen.insert(event.payload));
    }
    assert_eq!(seen.len(), 100);

    watcher.stop();
    watcher.join();
}

#[test]
fn subdirectory_is_watched_recursively() {
    let dir = Temp::new_dir().unwrap();
    let watcher = watcher_with_depth(dir.as_ref(), -1);
    watcher.watch().unwrap();

    let sub = dir.as_ref().join("sub");
    fs::create_dir(&sub).unwrap();

    let dir_event = watcher.next_event();
    assert_eq!(dir_event.kind, EventKind::DirAdded);
    assert!(dir_event.payload.starts_with(sub.to_string_lossy().as_ref()));
    assert!(dir_event.payload.ends_with('/'));

    let file_path = sub.join("x");
    File::create(&file_path).unwrap().write_all(b"y").unwrap();

    let file_event = watcher.next_event();
    assert_eq!(file_event.kind, EventKind::Added);
    assert_eq!(file_event.payload, file_path.to_string_lossy().into_owned());

    watcher.stop();
    watcher.join();
}

#[test]
fn max_depth_zero_does_not_watch_subdirectories() {
    let dir = Temp::new_dir().unwrap();
    let watcher = watcher_with_depth(dir.as_ref(), 0);
    watcher.watch().unwrap();

    let sub = dir.as_ref().join("sub");
    fs::create_dir(&sub).unwrap();

    let dir_event = watcher.next_event();
    assert_eq!(dir_event.kind, EventKind::DirAdded);

    File::create(sub.join("x"))
        .unwrap()
        .write_all(b"y")
        .unwrap();

    // No watch was attached to `sub`, so no further event arrives. Stop
    // unblocks `next_event` with `none` instead of hanging the test.
    let watcher = Arc::new(watcher);
    let w2 = watcher.clone();
    let handle = thread::spawn(move || w2.next_event());
    thread::sleep(Duration::from_millis(200));
    watcher.stop();

    let event = handle.join().unwrap();
    assert_eq!(event.kind, EventKind::None);
    watcher.join();
}

#[test]
fn removing_a_watched_subdirectory_reports_dir_removed() {
    let dir = Temp::new_dir().unwrap();
    let watcher = watcher_with_depth(dir.as_ref(), -1);
    watcher.watch().unwrap();

    let sub = dir.as_ref().join("sub");
    fs::create_dir(&sub).unwrap();
    let dir_added = watcher.next_event();
    assert_eq!(dir_added.kind, EventKind::DirAdded);

    fs::remove_dir(&sub).unwrap();
    let dir_removed = watcher.next_event();
    assert_eq!(dir_removed.kind, EventKind::DirRemoved);
    assert!(dir_removed.payload.starts_with(sub.to_string_lossy().as_ref()));

    watcher.stop();
    watcher.join();
}

#[test]
fn removing_root_triggers_orderly_shutdown() {
    let dir = Temp::new_dir().unwrap();
    let root = dir.as_ref().to_path_buf();
    let watcher = Arc::new(watcher_with_depth(&root, -1));
    watcher.watch().unwrap();

    // `Temp` removes the directory itself on drop; do it explicitly so the
    // watcher's teardown is what we're actually testing.
    let w2 = watcher.clone();
    let handle = thread::spawn(move || {
        // Root removal emits `dir-removed` for root itself before the watch
        // table empties out and triggers shutdown; drain until `none`.
        loop {
            let event = w2.next_event();
            if event.kind == EventKind::None {
                return event;
            }
        }
    });

    fs::remove_dir(&root).unwrap();

    let event = handle.join().unwrap();
    assert_eq!(event.kind, EventKind::None);
    assert!(!watcher.is_running());
    watcher.join();

    std::mem::forget(dir);
}
