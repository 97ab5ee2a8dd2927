#![no_main]

use libfuzzer_sys::fuzz_target;
use prbridge_github_issues::change_set::parse_and_validate_change_set;
use prbridge_github_issues::path_policy::{
    has_control_character, has_file_name, has_parent_traversal, is_absolute_path, PathAllowlist,
};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let allowlist = PathAllowlist::default();
    let Ok(change_set) = parse_and_validate_change_set(&text, &allowlist) else {
        return;
    };
    assert!(!change_set.changes().is_empty());
    assert!(!change_set.title().is_empty());
    for entry in change_set.changes() {
        assert!(allowlist.evaluate(&entry.path).accepted);
        assert!(!has_parent_traversal(&entry.path));
        assert!(!is_absolute_path(&entry.path));
        assert!(!has_control_character(&entry.path));
        assert!(has_file_name(&entry.path));
    }
});
