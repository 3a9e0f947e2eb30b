use super::*;

#[test]
fn format_time_ago_reports_zero_as_a_dash() {
    assert_eq!(format_time_ago(0), "-");
}

#[test]
fn format_elapsed_picks_the_largest_fitting_unit() {
    assert_eq!(format_elapsed(5), "5s");
    assert_eq!(format_elapsed(90), "1m");
    assert_eq!(format_elapsed(7_200), "2h");
    assert_eq!(format_elapsed(172_800), "2d");
}

#[derive(Debug, serde::Serialize)]
struct Item {
    name: String,
}

#[test]
fn handle_list_prints_the_empty_message_for_text() {
    let items: Vec<Item> = Vec::new();
    let mut called = false;
    handle_list(OutputFormat::Text, &items, "nothing here", |_items, _out| {
        called = true;
    })
    .unwrap();
    assert!(!called);
}

#[test]
fn handle_list_renders_text_for_nonempty_items() {
    let items = vec![Item { name: "a".into() }, Item { name: "b".into() }];
    let mut seen = Vec::new();
    handle_list(OutputFormat::Text, &items, "nothing here", |items, _out| {
        seen = items.iter().map(|i| i.name.clone()).collect::<Vec<_>>();
    })
    .unwrap();
    assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
}
