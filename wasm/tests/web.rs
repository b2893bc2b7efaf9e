//! Browser-clock bindings, run with `wasm-pack test --headless --firefox`

#![cfg(target_arch = "wasm32")]

use lawnsync_wasm::{is_in_season_now, season_on};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn task_json(seasons: &str) -> String {
    format!(
        r#"{{
            "id": "6f1c2a9e-6a61-4d7a-9a43-1d0d6b0c5f10",
            "name": "Mow",
            "description": "Mow to 3 inches",
            "estimated_duration": 45,
            "priority": "medium",
            "seasons": {}
        }}"#,
        seasons
    )
}

#[wasm_bindgen_test]
fn year_round_task_is_in_season_now() {
    let json = task_json(r#"["spring", "summer", "fall", "winter"]"#);
    assert_eq!(is_in_season_now(&json).ok(), Some(true));
}

#[wasm_bindgen_test]
fn season_follows_browser_clock() {
    let now = js_sys::Date::new_0();
    let today = chrono::NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
    .unwrap();
    let current = format!(r#"["{}"]"#, season_on(today).as_str());
    assert_eq!(is_in_season_now(&task_json(&current)).ok(), Some(true));
}

#[wasm_bindgen_test]
fn taskless_seasons_are_never_in_season() {
    assert_eq!(is_in_season_now(&task_json("[]")).ok(), Some(false));
}

#[wasm_bindgen_test]
fn malformed_task_is_an_error() {
    assert!(is_in_season_now("{").is_err());
}
