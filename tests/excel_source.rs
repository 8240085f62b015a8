#![cfg(feature = "excel_test_writer")]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use sheetbind::error::ErrorKind;
use sheetbind::ingestion::{parse_all, parse_all_into_list, ExcelSource, ParseOptions};
use sheetbind::schema::{Fields, Record};
use sheetbind::types::Timestamp;

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("sheetbind-{name}-{nanos}.xlsx"))
}

#[derive(Debug, Default, PartialEq)]
struct Player {
    id: i64,
    name: String,
    score: f64,
    active: bool,
    joined: Option<Timestamp>,
}

impl Record for Player {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("id", |p: &mut Player| &mut p.id);
        fields.field("name", |p: &mut Player| &mut p.name);
        fields.field("score", |p: &mut Player| &mut p.score);
        fields.field("active", |p: &mut Player| &mut p.active);
        fields.field("joined", |p: &mut Player| &mut p.joined);
    }
}

fn write_players_xlsx(path: &PathBuf, bad_score: bool) {
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    let mut wb = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let ws = wb.add_worksheet();
    ws.set_name("Players").unwrap();

    // header
    ws.write_string(0, 0, "id").unwrap();
    ws.write_string(0, 1, "name").unwrap();
    ws.write_string(0, 2, "score").unwrap();
    ws.write_string(0, 3, "active").unwrap();
    ws.write_string(0, 4, "joined").unwrap();

    ws.write_number(1, 0, 1).unwrap();
    ws.write_string(1, 1, "Ada").unwrap();
    ws.write_number(1, 2, 98.5).unwrap();
    ws.write_boolean(1, 3, true).unwrap();
    let joined = ExcelDateTime::from_ymd(2024, 3, 1).unwrap();
    ws.write_datetime_with_format(1, 4, &joined, &date_format).unwrap();

    // row 2 leaves `joined` blank
    ws.write_number(2, 0, 2).unwrap();
    ws.write_string(2, 1, "Grace").unwrap();
    if bad_score {
        ws.write_string(2, 2, "n/a").unwrap();
    } else {
        ws.write_number(2, 2, 87.25).unwrap();
    }
    ws.write_boolean(2, 3, false).unwrap();

    wb.save(path).unwrap();
}

fn workbook_options(path: &PathBuf) -> ParseOptions {
    ParseOptions::new(Arc::new(ExcelSource::new()), path.to_string_lossy())
}

#[test]
fn excel_sheet_binds_typed_cells() {
    let path = tmp_file("players");
    write_players_xlsx(&path, false);

    let players = parse_all_into_list::<Player>(&workbook_options(&path)).unwrap();
    assert_eq!(players.len(), 2);

    assert_eq!(players[0].id, 1);
    assert_eq!(players[0].name, "Ada");
    assert_eq!(players[0].score, 98.5);
    assert!(players[0].active);
    assert_eq!(players[0].joined.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");

    assert_eq!(players[1].score, 87.25);
    assert!(!players[1].active);
    assert_eq!(players[1].joined, None);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn excel_bad_cell_is_located() {
    let path = tmp_file("players-bad");
    write_players_xlsx(&path, true);

    let rows: Vec<_> = parse_all::<Player>(&workbook_options(&path)).unwrap().collect();
    assert!(rows[0].1.is_ok());
    let cell = rows[1].1.as_ref().unwrap_err().cell_error().unwrap().clone();
    assert_eq!(cell.sheet, "Players");
    assert_eq!(cell.cell, "C3");
    assert_eq!(cell.field, "Player.score");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn excel_missing_worksheet_is_fetch_fault() {
    let path = tmp_file("players-missing");
    write_players_xlsx(&path, false);

    let options = workbook_options(&path).with_sheet_name("Nope");
    let err = parse_all::<Player>(&options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);

    let _ = std::fs::remove_file(&path);
}
