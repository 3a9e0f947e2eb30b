use super::*;

fn render_to_string(table: &Table) -> String {
    let mut buf = Vec::new();
    table.render(&mut buf);
    String::from_utf8(buf).unwrap()
}

#[test]
fn renders_header_and_rows_aligned() {
    let mut table = Table::new(vec![Column::left("ID"), Column::left("STATUS")]);
    table.row(vec!["job-1".to_string(), "running".to_string()]);
    table.row(vec!["j-2".to_string(), "pending".to_string()]);
    let rendered = render_to_string(&table);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ID"));
}

#[test]
fn truncates_cells_past_the_column_max() {
    let mut table = Table::new(vec![Column::left("NAME").with_max(5)]);
    table.row(vec!["a-very-long-name".to_string()]);
    let rendered = render_to_string(&table);
    let data_line = rendered.lines().nth(1).unwrap();
    assert!(data_line.trim_end().ends_with('…'));
    assert!(data_line.trim_end().chars().count() <= 5);
}

#[test]
fn short_rows_are_padded_not_rejected() {
    let mut table = Table::new(vec![Column::left("A"), Column::left("B"), Column::left("C")]);
    table.row(vec!["x".to_string()]);
    let rendered = render_to_string(&table);
    assert_eq!(rendered.lines().count(), 2);
}

#[test]
fn empty_table_still_renders_a_header() {
    let table = Table::new(vec![Column::muted("ID")]);
    let rendered = render_to_string(&table);
    assert_eq!(rendered.lines().count(), 1);
}
