//! One row per designated official, for the public designation table.

use crate::calendar::Month;
use crate::designation::{export_reader, split_team_pairing};
use anyhow::{Context, Result};
use csv::StringRecord;

/// Role columns of the designation export, in table order.
pub const ROLE_COLUMNS: [&str; 7] = [
    "Arbitre principal",
    "Arbitre principal 2",
    "Juge de ligne",
    "Juge de ligne 2",
    "Arbitre",
    "Arbitre 2",
    "Superviseur",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRow {
    pub competition: String,
    pub phase: String,
    pub date: String,
    pub month: String,
    pub time: String,
    pub location: String,
    pub home: String,
    pub away: String,
    pub role: String,
    pub official: String,
}

impl AssignmentRow {
    pub fn cells(&self) -> [&str; 10] {
        [
            self.competition.as_str(),
            self.phase.as_str(),
            self.date.as_str(),
            self.month.as_str(),
            self.time.as_str(),
            self.location.as_str(),
            self.home.as_str(),
            self.away.as_str(),
            self.role.as_str(),
            self.official.as_str(),
        ]
    }
}

/// Header text without the byte order mark and stray quotes of the export.
fn normalize_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim().trim_matches('"')
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| normalize_header(h) == name)
        .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in designation export", name))
}

/// `Arbitre principal 2` and `Arbitre principal` are the same role.
pub fn role_name(column: &str) -> &str {
    column.strip_suffix(" 2").unwrap_or(column)
}

/// Month name from a `DD/MM/YYYY` date, empty when the month is unreadable.
fn month_of(date: &str) -> String {
    date.split('/')
        .nth(1)
        .and_then(|m| m.parse().ok())
        .and_then(Month::from_number)
        .map(|m| m.french_name().to_string())
        .unwrap_or_default()
}

/// Flatten the designation export into one row per filled role cell.
pub fn flatten_assignments(text: &str) -> Result<Vec<AssignmentRow>> {
    let mut reader = export_reader(text);
    let headers = reader
        .headers()
        .context("Failed to read designation export header")?
        .clone();

    let competition_col = find_column(&headers, "Compétition")?;
    let phase_col = find_column(&headers, "Phase")?;
    let date_col = find_column(&headers, "Date")?;
    let time_col = find_column(&headers, "Heure")?;
    let location_col = find_column(&headers, "Lieu")?;
    let teams_col = find_column(&headers, "Rencontre")?;
    let role_cols: Vec<(&str, usize)> = ROLE_COLUMNS
        .iter()
        .filter_map(|name| {
            let col = headers.iter().position(|h| normalize_header(h) == *name);
            if col.is_none() {
                log::warn!("Role column '{}' missing from designation export", name);
            }
            col.map(|c| (*name, c))
        })
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read designation row")?;
        let field = |col: usize| record.get(col).unwrap_or("").to_string();

        let teams = field(teams_col);
        let (home, away) = split_team_pairing(&teams).unwrap_or_else(|| {
            log::warn!("Unrecognized team pairing '{}'", teams);
            (teams.clone(), String::new())
        });
        let date = field(date_col);

        for (role, col) in &role_cols {
            let official = field(*col);
            if official.trim().is_empty() {
                continue;
            }
            rows.push(AssignmentRow {
                competition: field(competition_col),
                phase: field(phase_col),
                date: date.clone(),
                month: month_of(&date),
                time: field(time_col),
                location: field(location_col),
                home: home.clone(),
                away: away.clone(),
                role: role_name(role).to_string(),
                official,
            });
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\u{feff}\"Compétition\";\"Phase\";\"Date\";\"Heure\";\"Lieu\";\"Rencontre\";\"Arbitre principal\";\"Arbitre principal 2\";\"Juge de ligne\";\"Juge de ligne 2\";\"Arbitre\";\"Arbitre 2\";\"Superviseur\"\n\
\"Synerglace Ligue Magnus\";\"Saison\";\"18/01/2025\";\"20:00\";\"Rouen\";\"ROU - Rouen Dragons / ANG - Angers Ducs\";\"M DUPONT Jean\";\"Mme MARTIN Marie\";\"M PETIT Paul\";\"\";\"\";\"\";\"M GRAND Luc\"\n";

    #[test]
    fn test_role_name() {
        assert_eq!(role_name("Arbitre principal 2"), "Arbitre principal");
        assert_eq!(role_name("Juge de ligne"), "Juge de ligne");
    }

    #[test]
    fn test_month_of() {
        assert_eq!(month_of("18/01/2025"), "Janvier");
        assert_eq!(month_of("2025"), "");
    }

    #[test]
    fn test_flatten_assignments() {
        let rows = flatten_assignments(EXPORT).unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].role, "Arbitre principal");
        assert_eq!(rows[0].official, "M DUPONT Jean");
        assert_eq!(rows[0].month, "Janvier");
        assert_eq!(rows[0].home, "Rouen Dragons");
        assert_eq!(rows[0].away, "Angers Ducs");

        assert_eq!(rows[1].role, "Arbitre principal");
        assert_eq!(rows[1].official, "Mme MARTIN Marie");
        assert_eq!(rows[3].role, "Superviseur");
    }

    #[test]
    fn test_missing_required_column() {
        let err = flatten_assignments("\"Phase\";\"Date\"\n").unwrap_err();
        assert!(err.to_string().contains("Compétition"));
    }
}
