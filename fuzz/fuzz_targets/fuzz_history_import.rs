#![no_main]

use libfuzzer_sys::fuzz_target;
use revlist::VersionedList;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let list = VersionedList::new(vec![1i64, 2, 3]);
    let before = list.entries();

    match list.import(text) {
        Ok(()) => {
            // Accepted documents must leave a navigable history that exports
            // back to an equivalent document.
            assert!(list.history_len() >= 1, "empty history after import");
            assert_eq!(list.cursor(), list.history_len() - 1, "cursor not at newest");
            assert_eq!(list.get(), list.current_entry().items, "live != current entry");
            let json = list.to_json().expect("export after import");
            let copy = VersionedList::<i64>::new(Vec::new());
            copy.import(&json).expect("re-import of export");
            assert_eq!(copy.entries(), list.entries(), "round trip changed entries");
        }
        Err(_) => {
            assert_eq!(list.entries(), before, "failed import mutated history");
            assert_eq!(list.get(), vec![1, 2, 3], "failed import mutated live items");
        }
    }

    // Same text through the live-sequence path.
    let accepted = list.deserialize(text);
    if !accepted {
        assert!(list.history_len() >= 1);
    }
    let _ = list.to_csv();
});
