// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Integration tests for page ordering, history, and the thumbnail cache.

mod common;

use std::sync::Arc;

use common::{CountingRenderer, init_tracing, labels, session_ab};
use pagewerk_core::SessionConfig;
use pagewerk_document::testing::labelled_pdf;
use pagewerk_session::Session;

#[test]
fn load_move_delete_scenario() {
    let mut session = session_ab(3, 2);
    assert_eq!(session.count(), 5);
    assert_eq!(labels(&session), ["A1", "A2", "A3", "B1", "B2"]);

    assert!(session.move_page(4, 0));
    assert_eq!(labels(&session), ["B2", "A1", "A2", "A3", "B1"]);

    assert!(session.delete(&[0]));
    assert_eq!(session.count(), 4);
    assert_eq!(labels(&session), ["A1", "A2", "A3", "B1"]);

    let groups = session.files_in_order();
    assert_eq!(groups.len(), 2);
    assert_eq!((groups[0].name.as_str(), groups[0].page_count), ("A.pdf", 3));
    assert_eq!((groups[1].name.as_str(), groups[1].page_count), ("B.pdf", 1));
}

#[test]
fn count_only_changes_on_delete() {
    let mut session = session_ab(4, 3);
    let a = session.files_in_order()[0].file_id;
    let mut expected = 7;
    // Deterministic pseudo-random edit sequence.
    let mut seed: u64 = 0x5eed;
    let mut next = |bound: usize| {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((seed >> 33) as usize) % bound.max(1)
    };

    for step in 0..200 {
        let len = session.count();
        match step % 4 {
            0 => {
                session.move_page(next(len + 2), next(len + 2));
            }
            1 => {
                session.rotate(next(len + 2), 90 * next(6) as i64 - 180);
            }
            2 => {
                session.regroup_file(a, next(3));
            }
            _ if step % 20 == 3 => {
                let index = next(len + 2);
                if session.delete(&[index]) {
                    expected -= 1;
                }
            }
            _ => {}
        }
        assert_eq!(session.count(), expected, "after step {}", step);
    }
}

#[test]
fn undo_then_redo_restores_exact_state() {
    let mut session = session_ab(3, 2);
    let b = session.files_in_order()[1].file_id;

    let edits: Vec<Box<dyn Fn(&mut Session) -> bool>> = vec![
        Box::new(|s: &mut Session| s.move_page(4, 1)),
        Box::new(|s: &mut Session| s.rotate(2, 270)),
        Box::new(|s: &mut Session| s.delete(&[3, 0])),
        Box::new(move |s: &mut Session| s.regroup_file(b, 0)),
    ];

    for edit in &edits {
        let before = session.pages().to_vec();
        assert!(edit(&mut session));
        let after = session.pages().to_vec();
        assert_ne!(before, after);

        assert!(session.undo());
        assert_eq!(session.pages(), &before[..]);
        assert!(session.redo());
        assert_eq!(session.pages(), &after[..]);
    }
}

#[test]
fn rotation_wraps_around() {
    let mut session = session_ab(1, 1);
    for _ in 0..4 {
        assert!(session.rotate(0, 90));
    }
    assert_eq!(session.get(0).unwrap().rotation.degrees(), 0);

    session.rotate(0, 450);
    session.rotate(1, 90);
    assert_eq!(session.get(0).unwrap().rotation, session.get(1).unwrap().rotation);
    assert_eq!(session.get(0).unwrap().rotation.degrees(), 90);

    assert!(session.rotate(1, -180));
    assert_eq!(session.get(1).unwrap().rotation.degrees(), 270);
}

#[test]
fn huge_rotation_deltas_are_normalised() {
    let mut session = session_ab(1, 1);
    assert!(session.rotate(0, 90));
    let depth = session.undo_depth();

    // A whole number of turns changes nothing.
    assert!(!session.rotate(0, i64::MAX - 7));
    assert_eq!(session.undo_depth(), depth);
    assert!(session.rotate(0, i64::MAX - 187));
    assert_eq!(session.get(0).unwrap().rotation.degrees(), 270);
    assert!(!session.rotate(0, i64::MIN));
    assert_eq!(session.get(0).unwrap().rotation.degrees(), 270);
}

#[test]
fn regroup_preserves_internal_order() {
    let mut session = session_ab(3, 3);
    session.move_page(5, 0);
    session.move_page(3, 1);
    session.move_page(4, 2);
    let before = labels(&session);
    assert_eq!(before, ["B3", "A3", "B1", "A1", "A2", "B2"]);

    let a = session.files_in_order()[1].file_id;
    assert!(session.regroup_file(a, 0));
    assert_eq!(labels(&session), ["A3", "A1", "A2", "B3", "B1", "B2"]);

    // Every same-file pair keeps its relative order.
    let after = labels(&session);
    for (i, x) in before.iter().enumerate() {
        for y in &before[i + 1..] {
            if x[..1] == y[..1] {
                let px = after.iter().position(|l| l == x).unwrap();
                let py = after.iter().position(|l| l == y).unwrap();
                assert!(px < py, "{} should stay before {}", x, y);
            }
        }
    }
}

#[test]
fn history_keeps_only_the_last_fifty_steps() {
    init_tracing();
    let mut session = Session::new();
    session.load([("A.pdf", labelled_pdf("A", 12))]);

    let mut states = vec![session.pages().to_vec()];
    for i in 0..60 {
        assert!(session.move_page(0, i % 11 + 1));
        states.push(session.pages().to_vec());
    }
    assert_eq!(session.undo_depth(), 50);

    for k in 1..=50 {
        assert!(session.undo(), "undo step {}", k);
        assert_eq!(session.pages(), &states[60 - k][..]);
    }
    assert!(!session.undo());
    assert_eq!(session.pages(), &states[10][..]);
}

#[test]
fn history_limit_is_configurable() {
    let config = SessionConfig {
        history_limit: 3,
        ..SessionConfig::default()
    };
    let mut session = Session::with_config(config).unwrap();
    session.load([("A.pdf", labelled_pdf("A", 4))]);
    for _ in 0..10 {
        session.move_page(0, 3);
    }
    assert_eq!(session.undo_depth(), 3);
}

#[test]
fn rotation_invalidates_cached_thumbnail() {
    init_tracing();
    let mut session =
        Session::with_renderer(SessionConfig::default(), CountingRenderer::default()).unwrap();
    session.load([("A.pdf", labelled_pdf("A", 2))]);
    let calls = |s: &Session<CountingRenderer>| s.renderer().calls.get();

    let first = session.get_thumbnail(0).unwrap();
    let again = session.get_thumbnail(0).unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(calls(&session), 1);
    assert_eq!((first.width, first.height), (184, 238));

    assert!(session.rotate(0, 90));
    let turned = session.get_thumbnail(0).unwrap();
    assert!(!Arc::ptr_eq(&first, &turned));
    assert_eq!(calls(&session), 2);
    assert_eq!((turned.width, turned.height), (238, 184));

    // Back at 0 degrees: that entry was dropped by the first rotation.
    session.rotate(0, 270);
    let back = session.get_thumbnail(0).unwrap();
    assert!(!Arc::ptr_eq(&first, &back));
    assert_eq!(calls(&session), 3);
}

#[test]
fn reorder_and_delete_keep_cached_thumbnails() {
    let mut session =
        Session::with_renderer(SessionConfig::default(), CountingRenderer::default()).unwrap();
    session.load([("A.pdf", labelled_pdf("A", 3))]);
    let first = session.get_thumbnail(0).unwrap();

    session.move_page(0, 2);
    session.delete(&[0]);
    let moved = session.get_thumbnail(1).unwrap();
    assert!(Arc::ptr_eq(&first, &moved));
    assert_eq!(session.renderer().calls.get(), 1);
    assert_eq!(session.cached_thumbnails(), 1);
}

#[test]
fn viewer_renders_bypass_cache() {
    let mut session =
        Session::with_renderer(SessionConfig::default(), CountingRenderer::default()).unwrap();
    session.load([("A.pdf", labelled_pdf("A", 1))]);

    let big = session.get_page_image(0).unwrap();
    session.get_page_image(0).unwrap();
    assert_eq!(session.renderer().calls.get(), 2);
    assert_eq!((big.width, big.height), (1224, 1584));
    assert_eq!(session.cached_thumbnails(), 0);
}
