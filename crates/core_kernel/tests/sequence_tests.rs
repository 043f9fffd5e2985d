//! Property tests for business code generation

use core_kernel::next_code;
use proptest::prelude::*;

#[test]
fn test_serialized_generation_counts_up() {
    let mut latest: Option<String> = None;
    let mut issued = Vec::new();
    for _ in 0..3 {
        let code = next_code("PJ01-241125", latest.as_deref());
        issued.push(code.clone());
        latest = Some(code);
    }
    assert_eq!(issued, vec!["PJ01-24112501", "PJ01-24112502", "PJ01-24112503"]);
}

proptest! {
    #[test]
    fn prop_next_code_keeps_prefix(prefix in "[A-Z]{2}[0-9]{0,2}-?", n in 0u64..500) {
        let latest = format!("{}{:02}", prefix, n);
        let next = next_code(&prefix, Some(&latest));
        prop_assert!(next.starts_with(&prefix));
    }

    #[test]
    fn prop_next_code_is_strictly_increasing(n in 0u64..10_000) {
        let latest = format!("JH{:02}", n);
        let next = next_code("JH", Some(&latest));
        let suffix: u64 = next.trim_start_matches("JH").parse().unwrap();
        prop_assert_eq!(suffix, n + 1);
        prop_assert!(next.len() >= 4);
    }
}
