#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use revlist::{ListConfig, VersionedList};

#[derive(Debug, Arbitrary)]
enum Op {
    Push(i16),
    PushAll(Vec<i16>),
    Pop,
    Shift,
    Unshift(Vec<i16>),
    Splice(i8, Option<u8>, Vec<i16>),
    Reverse,
    Sort,
    Fill(i16, Option<i8>, Option<i8>),
    CopyWithin(i8, i8, Option<i8>),
    Set(u8, i16),
    Undo(u8),
    Redo(u8),
    Previous,
    Next,
    Jump(i8),
    GoTo(u8),
    Clean,
    Limit(u8),
    Checkpoint(u8),
    Restore(u8),
    RemoveCheckpoint(u8),
}

#[derive(Debug, Arbitrary)]
struct Input {
    initial: Vec<i16>,
    max_entries: Option<u8>,
    reject_negative: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let config = match input.max_entries {
        Some(m) => ListConfig::bounded(usize::from(m).max(1)),
        None => ListConfig::default(),
    };
    let Ok(list) = VersionedList::with_config(input.initial, None, config) else {
        return;
    };
    if input.reject_negative {
        list.set_validation(|x| *x >= 0);
    }

    for op in input.ops.into_iter().take(256) {
        let before = list.history_len();
        let cursor = list.cursor();
        match op {
            Op::Push(v) => {
                list.push(v);
            }
            Op::PushAll(v) => {
                list.push_all(v);
            }
            Op::Pop => {
                list.pop();
            }
            Op::Shift => {
                list.shift();
            }
            Op::Unshift(v) => {
                list.unshift(v);
            }
            Op::Splice(s, d, v) => {
                list.splice(isize::from(s), d.map(usize::from), v);
            }
            Op::Reverse => {
                list.reverse();
            }
            Op::Sort => {
                list.sort();
            }
            Op::Fill(v, s, e) => {
                list.fill(v, s.map(isize::from), e.map(isize::from));
            }
            Op::CopyWithin(t, s, e) => {
                list.copy_within(isize::from(t), isize::from(s), e.map(isize::from));
            }
            Op::Set(i, v) => {
                list.set(usize::from(i), v);
            }
            Op::Undo(n) => {
                list.undo(usize::from(n));
            }
            Op::Redo(n) => {
                list.redo(usize::from(n));
            }
            Op::Previous => {
                list.previous();
            }
            Op::Next => {
                list.next();
            }
            Op::Jump(n) => {
                if list.jump(isize::from(n)).is_err() {
                    assert_eq!(list.cursor(), cursor, "failed jump moved cursor");
                }
            }
            Op::GoTo(i) => {
                if list.go_to(usize::from(i)).is_err() {
                    assert_eq!(list.cursor(), cursor, "failed go_to moved cursor");
                }
            }
            Op::Clean => {
                list.clean();
                assert_eq!(list.history_len(), 1);
            }
            Op::Limit(k) => {
                let truncated = list.limit(usize::from(k));
                assert_eq!(truncated, usize::from(k).max(1) < before);
            }
            Op::Checkpoint(l) => list.save_checkpoint(&l.to_string()),
            Op::Restore(l) => {
                list.restore_checkpoint(&l.to_string());
                assert_eq!(list.history_len(), before, "restore recorded history");
            }
            Op::RemoveCheckpoint(l) => {
                list.remove_checkpoint(&l.to_string());
            }
        }

        assert!(list.history_len() >= 1, "history emptied");
        assert!(list.cursor() < list.history_len(), "cursor out of bounds");
        if let Some(max) = list.config().max_entries {
            assert!(list.history_len() <= max, "depth limit exceeded");
        }
    }
});
