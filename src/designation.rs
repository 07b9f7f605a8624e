//! Designation export parsing.
//!
//! The export holds one row per game: competition, phase, date, time,
//! location, team pairing, then one column per refereeing role.

use crate::referee::{parse_referee_names, NameError, RefereeId};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Date format used by the designation export.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Minimum number of columns for a row to describe a game.
const MIN_COLUMNS: usize = 7;

/// Columns holding the referees counted in the statistics.
const REFEREE_COLUMNS: Range<usize> = 6..9;

/// One game and the referees designated on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub competition: String,
    pub phase: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub teams: String,
    pub referees: Vec<RefereeId>,
}

/// A referee entry dropped while parsing, kept for auditing the source data.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedName {
    /// Line in the export (1-based, header included)
    pub line: u64,
    pub column: usize,
    pub error: NameError,
}

/// Result of parsing a designation export.
#[derive(Debug, Default)]
pub struct ParsedDesignations {
    pub games: Vec<Game>,
    pub rejected: Vec<RejectedName>,
}

/// Anything able to produce the raw designation export.
pub trait DesignationSource {
    fn fetch_designations(&mut self) -> Result<String>;
}

/// Designation export previously saved to disk.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        CsvFileSource {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DesignationSource for CsvFileSource {
    fn fetch_designations(&mut self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }
}

/// Build a reader for the `;`-separated, `"`-quoted export format.
pub fn export_reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(b';')
        .quote(b'"')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// Parse the designation export into games.
///
/// Short rows are skipped. Malformed referee names are logged and reported in
/// [`ParsedDesignations::rejected`]. An invalid date fails the whole parse.
pub fn parse_designations(text: &str) -> Result<ParsedDesignations> {
    let mut reader = export_reader(text);
    let mut parsed = ParsedDesignations::default();

    for result in reader.records() {
        let record = result.context("Failed to read designation row")?;
        if record.len() < MIN_COLUMNS {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw_date = record.get(2).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .with_context(|| format!("Line {}: invalid date '{}'", line, raw_date))?;

        let mut referees = Vec::new();
        for column in REFEREE_COLUMNS {
            let Some(cell) = record.get(column) else {
                break;
            };
            for entry in parse_referee_names(cell) {
                match entry {
                    Ok(referee) => referees.push(referee),
                    Err(error) => {
                        log::warn!("Line {} column {}: {}", line, column + 1, error);
                        parsed.rejected.push(RejectedName {
                            line,
                            column,
                            error,
                        });
                    }
                }
            }
        }

        parsed.games.push(Game {
            competition: record[0].to_string(),
            phase: record[1].to_string(),
            date,
            time: record[3].to_string(),
            location: record[4].to_string(),
            teams: record[5].to_string(),
            referees,
        });
    }

    Ok(parsed)
}

/// Split a `"HOM - Home Club / AWA - Away Club"` pairing into the two full names.
pub fn split_team_pairing(teams: &str) -> Option<(String, String)> {
    let (home, away) = teams.split_once(" / ")?;
    let full_name = |side: &str| side.split_once(" - ").map(|(_, name)| name.trim().to_string());
    Some((full_name(home)?, full_name(away)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\"Compétition\";\"Phase\";\"Date\";\"Heure\";\"Lieu\";\"Rencontre\";\"Arbitre principal\";\"Arbitre principal 2\";\"Juge de ligne\"";

    #[test]
    fn test_parse_rows() {
        let text = format!(
            "{}\n{}\n",
            HEADER,
            "\"Synerglace Ligue Magnus\";\"Saison\";\"18/01/2025\";\"20:00\";\"Rouen\";\"ROU - Rouen / ANG - Angers\";\"M DUPONT Jean, Mme MARTIN Marie\";\"\";\"M PETIT Paul\""
        );
        let parsed = parse_designations(&text).unwrap();
        assert_eq!(parsed.games.len(), 1);
        let game = &parsed.games[0];
        assert_eq!(game.competition, "Synerglace Ligue Magnus");
        assert_eq!(game.date, NaiveDate::from_ymd_opt(2025, 1, 18).unwrap());
        assert_eq!(
            game.referees,
            vec![
                RefereeId::new("DUPONT", "Jean"),
                RefereeId::new("MARTIN", "Marie"),
                RefereeId::new("PETIT", "Paul"),
            ]
        );
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn test_skips_short_rows() {
        let text = format!("{}\n\"D1\";\"Saison\";\"18/01/2025\"\n", HEADER);
        let parsed = parse_designations(&text).unwrap();
        assert!(parsed.games.is_empty());
    }

    #[test]
    fn test_reports_rejected_names() {
        let text = format!(
            "{}\n{}\n",
            HEADER,
            "\"D1\";\"Saison\";\"18/01/2025\";\"18:30\";\"Caen\";\"CAE - Caen / BRE - Brest\";\"Invalid Name 123\";\"M PETIT Paul\";\"\""
        );
        let parsed = parse_designations(&text).unwrap();
        assert_eq!(parsed.games[0].referees, vec![RefereeId::new("PETIT", "Paul")]);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].line, 2);
        assert_eq!(parsed.rejected[0].column, 6);
    }

    #[test]
    fn test_invalid_date_is_fatal() {
        let text = format!(
            "{}\n{}\n",
            HEADER,
            "\"D1\";\"Saison\";\"2025-01-18\";\"18:30\";\"Caen\";\"CAE - Caen / BRE - Brest\";\"\";\"\";\"\""
        );
        let err = parse_designations(&text).unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }

    #[test]
    fn test_split_team_pairing() {
        assert_eq!(
            split_team_pairing("ROU - Rouen Dragons / ANG - Angers Ducs"),
            Some(("Rouen Dragons".to_string(), "Angers Ducs".to_string()))
        );
        assert_eq!(
            split_team_pairing("GRE - Grenoble - Brûleurs de Loups / CER - Cergy"),
            Some(("Grenoble - Brûleurs de Loups".to_string(), "Cergy".to_string()))
        );
        assert_eq!(split_team_pairing("Rouen vs Angers"), None);
    }
}
