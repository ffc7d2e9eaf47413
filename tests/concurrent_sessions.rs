#![allow(clippy::unwrap_used, clippy::expect_used)]

use logtools::{FlusherConfig, LogLevel, LogOptions, LogRegistry, MemorySink};
use std::{fmt::Write as _, thread, time::Duration};

const THREADS: usize = 16;
const LINES_PER_THREAD: usize = 50;

fn registry() -> LogRegistry {
    LogRegistry::with_config(FlusherConfig {
        write_interval: Duration::from_millis(5),
        start_delay: Duration::ZERO,
    })
}

fn token(thread: usize, line: usize) -> String {
    // Long, piecewise-written tokens make interleaving visible if it happens.
    format!("<t{thread:02}-l{line:03}-{}>", "x".repeat(thread + 1))
}

fn hammer(reg: &LogRegistry, idx: usize) {
    thread::scope(|scope| {
        for t in 0..THREADS {
            scope.spawn(move || {
                for l in 0..LINES_PER_THREAD {
                    let tok = token(t, l);
                    let mut session = reg.get(idx, LogLevel::Info);
                    // Several writes per line.
                    for chunk in tok.as_bytes().chunks(3) {
                        session.append(std::str::from_utf8(chunk).unwrap());
                        thread::yield_now();
                    }
                    write!(session, " end").unwrap();
                }
            });
        }
    });
}

fn assert_all_lines_intact(out: &str) {
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), THREADS * LINES_PER_THREAD);
    for line in &lines {
        assert!(line.starts_with(" - "), "bad header: {line:?}");
        assert!(line.ends_with(" end"), "line was split: {line:?}");
    }
    for t in 0..THREADS {
        for l in 0..LINES_PER_THREAD {
            let tok = token(t, l);
            let expected = format!("INFO: {tok} end");
            assert_eq!(
                lines.iter().filter(|line| line.ends_with(&expected)).count(),
                1,
                "token {tok} missing or damaged"
            );
        }
    }
}

#[test]
fn thread_safe_sessions_never_interleave() {
    let reg = registry();
    let sink = MemorySink::new("shared");
    let idx = reg
        .register_sink(sink.clone(), LogOptions::default().thread_safe(true))
        .unwrap();

    assert!(reg.start());
    hammer(&reg, idx);
    assert!(reg.stop());

    assert_all_lines_intact(&sink.contents());
}

#[test]
fn merge_only_sessions_still_merge_whole_lines() {
    let reg = registry();
    let sink = MemorySink::new("shared");
    let idx = reg.register_sink(sink.clone(), LogOptions::default()).unwrap();

    assert!(reg.start());
    hammer(&reg, idx);
    reg.close_logs();

    assert_all_lines_intact(&sink.contents());
}

#[test]
fn different_entries_are_written_independently() {
    let reg = registry();
    let sinks: Vec<MemorySink> = (0..4).map(|i| MemorySink::new(format!("s{i}"))).collect();
    for s in &sinks {
        reg.register_sink(s.clone(), LogOptions::default().thread_safe(true))
            .unwrap();
    }

    assert!(reg.start());
    thread::scope(|scope| {
        for idx in 0..sinks.len() {
            let reg = &reg;
            scope.spawn(move || {
                for n in 0..100 {
                    reg.get(idx, LogLevel::Warning).append(format!("e{idx}-{n}"));
                }
            });
        }
    });
    assert!(reg.stop());

    for (idx, sink) in sinks.iter().enumerate() {
        let out = sink.contents();
        assert_eq!(out.lines().count(), 100);
        assert!(out.lines().all(|l| l.contains(&format!("WARNING: e{idx}-"))));
    }
}
