#![allow(clippy::unwrap_used, clippy::expect_used)]

use logtools::{FlusherConfig, LogError, LogLevel, LogOptions, LogRegistry, MemorySink};
use proptest::prelude::*;
use std::time::Duration;

fn registry() -> LogRegistry {
    LogRegistry::with_config(FlusherConfig {
        write_interval: Duration::from_millis(10),
        start_delay: Duration::ZERO,
    })
}

fn level() -> impl Strategy<Value = LogLevel> {
    prop::sample::select(LogLevel::ALL.to_vec())
}

proptest! {
    #[test]
    fn distinct_names_get_increasing_indices(count in 1usize..24) {
        let reg = registry();
        for expected in 0..count {
            let idx = reg
                .register_sink(MemorySink::new(format!("sink-{expected}")), LogOptions::default())
                .unwrap();
            prop_assert_eq!(idx, expected);
        }
        prop_assert_eq!(reg.len(), count);
    }

    #[test]
    fn repeated_name_leaves_registry_unchanged(count in 1usize..8, dup in 0usize..8) {
        let reg = registry();
        for i in 0..count {
            reg.register_sink(MemorySink::new(format!("sink-{i}")), LogOptions::default()).unwrap();
        }
        let dup = dup % count;
        let err = reg
            .register_sink(MemorySink::new(format!("sink-{dup}")), LogOptions::default())
            .unwrap_err();
        prop_assert!(matches!(err, LogError::DuplicateName(_)));
        prop_assert_eq!(reg.len(), count);
    }

    #[test]
    fn macro_check_matches_threshold(threshold in level(), asked in level(), extra in 0usize..4) {
        let reg = registry();
        let idx = reg
            .register_sink(MemorySink::new("only"), LogOptions::default().threshold(threshold))
            .unwrap();
        prop_assert_eq!(reg.macro_check(idx, asked), asked <= threshold);
        prop_assert!(!reg.macro_check(idx + 1 + extra, asked));
    }
}

#[test]
fn file_registration_rejects_same_path_twice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dup.log");
    let reg = registry();

    assert_eq!(reg.register_new_log(&path, LogOptions::default()).unwrap(), 0);
    assert!(matches!(
        reg.register_new_log(&path, LogOptions::default().append(true)),
        Err(LogError::DuplicateName(_))
    ));
    assert_eq!(reg.len(), 1);
    assert!(!path.exists(), "registration alone must not open the file");
}

#[test]
fn registry_from_config_registers_sections() {
    let dir = tempfile::tempdir().unwrap();
    let ini = format!(
        "[Logging]\nwrite_interval_ms = 15\nstart_delay_ms = 0\nmax_level = debug2\n\n\
         [log.app]\npath = {}\nthreshold = info\n\n\
         [log.trace]\npath = {}\nthread_safe = true\nthreshold = debug4\n",
        dir.path().join("app.log").display(),
        dir.path().join("trace.log").display(),
    );
    let cfg_path = dir.path().join("logging.ini");
    std::fs::write(&cfg_path, ini).unwrap();

    let cfg = logtools::Config::load(&cfg_path).unwrap();
    let reg = LogRegistry::from_config(&cfg).unwrap();

    assert_eq!(reg.len(), 2);
    assert_eq!(reg.write_interval(), Duration::from_millis(15));
    assert_eq!(reg.start_delay(), Duration::ZERO);
    assert_eq!(reg.reporting_level(0), Some(LogLevel::Info));
    assert_eq!(reg.is_thread_safe(1), Some(true));

    // Entry 1 accepts DEBUG4 but the start-time mask stops at DEBUG2.
    assert!(reg.macro_check(1, LogLevel::Debug4));
    assert!(!reg.enabled(1, LogLevel::Debug4));
    assert!(reg.enabled(1, LogLevel::Debug2));
}
