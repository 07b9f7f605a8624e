//! Integration test for the staying-home analysis against a small export
//!
//! The fixture holds a few weeks of designations: two dates with three
//! top-division games, quieter dates that must be ignored, referees working
//! other competitions, one malformed name and one short row.

use hockey_stats::calendar::Month;
use hockey_stats::designation::{parse_designations, CsvFileSource};
use hockey_stats::pipeline::{
    build_staying_home, designation_table, staying_home, DesignationExportConfig,
    StayingHomeConfig,
};
use hockey_stats::staying_home::{analyze, qualified_referees, AnalysisConfig, TOP_DIVISION};
use hockey_stats::RefereeId;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fs;

const FIXTURE: &str = "tests/fixtures/input/designations.csv";

fn referee(last: &str, first: &str) -> RefereeId {
    RefereeId::new(last, first)
}

#[test]
fn test_parse_fixture() {
    let content = fs::read_to_string(FIXTURE).expect("Failed to read designation fixture");
    let parsed = parse_designations(&content).expect("Failed to parse designations");

    // the six-column row is dropped
    assert_eq!(parsed.games.len(), 13);
    assert_eq!(parsed.rejected.len(), 1);
}

#[test]
fn test_qualification_boundary() {
    let content = fs::read_to_string(FIXTURE).unwrap();
    let games = parse_designations(&content).unwrap().games;
    let qualified = qualified_referees(&games, TOP_DIVISION, 3);

    let expected: HashSet<RefereeId> = [
        referee("DUPONT", "Jean"),
        referee("MARTIN", "Marie"),
        referee("PETIT", "Paul"),
        referee("LEROY", "Hugo"),
        referee("GARNIER", "Luc"),
    ]
    .into_iter()
    .collect();
    assert_eq!(qualified, expected);

    // two top-division games each
    assert!(!qualified.contains(&referee("FAURE", "Louis")));
    assert!(!qualified.contains(&referee("BLANC", "Eric")));
}

#[test]
fn test_daily_statistics() {
    let mut source = CsvFileSource::new(FIXTURE);
    let report = build_staying_home(&mut source, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.qualified_count, 5);
    let dates: Vec<NaiveDate> = report.days.iter().map(|d| d.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 1, 18).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 25).unwrap(),
        ]
    );

    // working another competition is not staying home
    let january = &report.days[0];
    assert_eq!(january.top_division_games, 3);
    assert_eq!(january.qualified_on_top, 4);
    assert_eq!(january.unqualified_on_top, 2);
    assert_eq!(january.not_on_top, 1);
    assert!(january.staying_home.is_empty());
    let martin = referee("MARTIN", "Marie");
    assert!(january.working_other.contains_key(&martin));
    assert!(january.working_other[&martin].contains("Division 1"));

    let february = &report.days[1];
    assert_eq!(february.staying_home, vec![martin]);
    assert!((february.pct_staying_home - 20.0).abs() < 1e-9);
    // double-booked on the same day
    assert!(february.working_other.contains_key(&referee("PETIT", "Paul")));
    assert_eq!(february.qualified_on_top, 4);
}

#[test]
fn test_rollups() {
    let content = fs::read_to_string(FIXTURE).unwrap();
    let games = parse_designations(&content).unwrap().games;
    let report = analyze(&games, &AnalysisConfig::default());

    assert_eq!(report.global.days, 2);
    assert_eq!(report.global.top_division_games, 6);
    assert_eq!(report.global.staying_home, 1);
    assert_eq!(report.global.working_other, 2);
    assert_eq!(report.global.avg_top_division_games(), 3.0);
    let unqualified: usize = report.days.iter().map(|d| d.unqualified_on_top).sum();
    assert_eq!(report.global.unqualified_on_top, unqualified);
    assert!(report.global.unqualified_on_top >= 2);

    let months: Vec<Month> = report.months().map(|(m, _)| m).collect();
    assert_eq!(months, vec![Month::January, Month::February]);
    assert_eq!(report.monthly[&Month::February].staying_home, 1);
}

#[test]
fn test_stricter_configuration() {
    let content = fs::read_to_string(FIXTURE).unwrap();
    let games = parse_designations(&content).unwrap().games;
    let config = AnalysisConfig {
        min_top_division_games: 4,
        ..AnalysisConfig::default()
    };
    let report = analyze(&games, &config);
    assert!(report.days.is_empty());
    assert!(report.monthly.is_empty());
}

#[test]
fn test_write_html_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("data").join("staying_home.html");
    let config = StayingHomeConfig {
        output: output.clone(),
        analysis: AnalysisConfig::default(),
    };

    let summary = staying_home(&mut CsvFileSource::new(FIXTURE), &config).unwrap();
    assert!(summary.contains("5 qualified referees"));

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("<h3>18/01/2025</h3>"));
    assert!(html.contains("<h3>25/02/2025</h3>"));
    assert!(!html.contains("<h3>11/01/2025</h3>"));
    assert!(html.contains("<li>MARTIN Marie: Division 1</li>"));
    assert!(html.contains("<li>PETIT Paul: U20 Élite</li>"));
    assert!(html.contains("<li>MARTIN Marie</li>"));
}

#[test]
fn test_report_labels_follow_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("staying_home.html");
    let config = StayingHomeConfig {
        output: output.clone(),
        analysis: AnalysisConfig {
            qualification_threshold: 5,
            min_top_division_games: 2,
            ..AnalysisConfig::default()
        },
    };

    staying_home(&mut CsvFileSource::new(FIXTURE), &config).unwrap();

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("<h1>Statistiques Arbitres SLM - Absences sur Journées à 2+ Matchs</h1>"));
    assert!(html.contains("<td>Total arbitres SLM qualifiés (5+ matchs)</td>"));
    assert!(html.contains("<td>Journées analysées (2+ matchs SLM)</td>"));
    assert!(!html.contains("3+"));
}

#[test]
fn test_write_designation_table() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("designations.html");
    fs::write(&template, "<table>\n%DATA%\n</table>").unwrap();
    let output = dir.path().join("out.html");

    let summary = designation_table(
        &mut CsvFileSource::new(FIXTURE),
        &DesignationExportConfig {
            template,
            output: output.clone(),
        },
    )
    .unwrap();
    assert!(summary.contains("designations"));

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains(
        "<tr><td>Synerglace Ligue Magnus</td><td>Saison régulière</td><td>11/01/2025</td><td>Janvier</td>"
    ));
    assert!(html.contains("<td>Arbitre principal</td><td>Mme MARTIN Marie</td>"));
    assert!(!html.contains("%DATA%"));
}
