use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use tennis_features::dataset::{self, DatasetError, LoadReport};
use tennis_features::records::Surface;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn loads_sorts_and_filters_fixture() {
    let (records, report) =
        dataset::load_matches(&fixture_path("wta_matches.csv"), 2010).expect("fixture loads");

    assert_eq!(
        report,
        LoadReport {
            rows_read: 10,
            loaded: 5,
            missing_player: 1,
            bad_date: 1,
            before_min_year: 1,
            unknown_winner: 1,
            self_match: 1,
        }
    );

    let ids = records.iter().map(|r| r.match_id).collect::<Vec<_>>();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);

    // Same-day matches keep their file order.
    assert_eq!(records[0].player_1, "Gamma C.");
    assert_eq!(records[1].player_1, "Beta B.");
    assert_eq!(records[2].player_1, "Alpha A.");
    assert_eq!(
        records[0].date,
        NaiveDate::from_ymd_opt(2011, 1, 2).unwrap()
    );

    let walkover = &records[3];
    assert_eq!(walkover.player_1, "Alpha A.");
    assert_eq!(walkover.winner, "Alpha A.");
    assert_eq!(walkover.rank_1, None);
    assert_eq!(walkover.rank_2, Some(40.0));
    assert_eq!(walkover.score.as_deref(), Some("W/O"));

    let last = &records[4];
    assert_eq!(last.surface, Surface::Clay);
    assert_eq!(last.surface_raw.as_deref(), Some("Clay"));
    assert_eq!(last.tournament.as_deref(), Some("Paris Open"));
    assert_eq!(last.best_of.as_deref(), Some("3"));
    assert_eq!(last.odd_1, Some(1.7));
}

#[test]
fn min_year_filters_whole_seasons() {
    let (records, report) =
        dataset::load_matches(&fixture_path("wta_matches.csv"), 2012).expect("fixture loads");
    assert_eq!(records.len(), 1);
    assert_eq!(report.before_min_year, 6);
}

#[test]
fn missing_required_columns_is_a_schema_error() {
    let raw = "Date,Player_1,Score\n2020-01-01,A,6-0 6-0\n";
    let err = dataset::read_matches(raw.as_bytes(), 2010).unwrap_err();
    match err.downcast_ref::<DatasetError>() {
        Some(DatasetError::MissingColumns { missing }) => {
            assert_eq!(missing, &vec!["player_2".to_string(), "winner".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn player_aliases_are_accepted() {
    let raw = "Player1,Player2,Winner,Date\nA,B,B,2015-03-01\n";
    let (records, _) = dataset::read_matches(raw.as_bytes(), 2010).expect("aliases parse");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].surface, Surface::Unknown);
    assert!(!records[0].player_1_won());
}

#[test]
fn find_matches_csv_prefers_wta_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("rankings.csv"), "x".repeat(4096)).unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("WTA_2023.csv"), "a,b\n").unwrap();
    fs::write(nested.join("wta_small.csv"), "a\n").unwrap();

    let found = dataset::find_matches_csv(dir.path()).expect("csv found");
    assert_eq!(found, nested.join("WTA_2023.csv"));
    assert_eq!(dataset::resolve_input(dir.path()).unwrap(), found);
}

#[test]
fn find_matches_csv_falls_back_to_largest() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("a.csv"), "small").unwrap();
    fs::write(dir.path().join("b.csv"), "much larger body").unwrap();
    fs::write(dir.path().join("notes.txt"), "x".repeat(100)).unwrap();

    let found = dataset::find_matches_csv(dir.path()).expect("csv found");
    assert_eq!(found, dir.path().join("b.csv"));
}

#[test]
fn empty_directory_has_no_csv() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = dataset::find_matches_csv(dir.path()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DatasetError>(),
        Some(DatasetError::NoCsvFound { .. })
    ));
}

#[test]
fn surface_text_is_kept_alongside_bucket() {
    let raw = "Player1,Player2,Winner,Date,Surface\n\
               A,B,B,2015-03-01, Indoor Hard \n\
               C,D,C,2015-03-02,Sand\n\
               E,F,E,2015-03-03,\n";
    let (records, _) = dataset::read_matches(raw.as_bytes(), 2010).expect("rows parse");

    assert_eq!(records[0].surface, Surface::Hard);
    assert_eq!(records[0].surface_text().as_deref(), Some("Indoor Hard"));
    assert_eq!(records[1].surface, Surface::Unknown);
    assert_eq!(records[1].surface_text().as_deref(), Some("Sand"));
    assert_eq!(records[2].surface, Surface::Unknown);
    assert_eq!(records[2].surface_text(), None);
}
