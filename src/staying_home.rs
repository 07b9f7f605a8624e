//! Referee availability on busy top-division days.
//!
//! For every date with enough top-division games, classify the referees who
//! regularly officiate in the top division: appointed there, appointed to
//! another competition, or not appointed at all ("staying home").

use crate::calendar::Month;
use crate::designation::Game;
use crate::referee::RefereeId;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Label of the top-division competition in the designation export.
pub const TOP_DIVISION: &str = "Synerglace Ligue Magnus";

/// Parameters of the availability analysis.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Competition whose referees are audited
    pub top_division: String,
    /// Top-division appearances needed to count as a top-division referee
    pub qualification_threshold: usize,
    /// Top-division games needed on a date for it to be analysed
    pub min_top_division_games: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_division: TOP_DIVISION.to_string(),
            qualification_threshold: 3,
            min_top_division_games: 3,
        }
    }
}

impl AnalysisConfig {
    /// Name of the audited competition in report headings, `SLM` for the default one.
    pub fn division_label(&self) -> &str {
        if self.top_division == TOP_DIVISION {
            "SLM"
        } else {
            &self.top_division
        }
    }

    fn is_top_division(&self, game: &Game) -> bool {
        game.competition == self.top_division
    }
}

/// Referees with at least `threshold` top-division appearances.
///
/// Appearances are counted per designation, so a referee listed in two roles
/// of the same game counts twice.
pub fn qualified_referees(
    games: &[Game],
    top_division: &str,
    threshold: usize,
) -> HashSet<RefereeId> {
    let mut appearances: HashMap<&RefereeId, usize> = HashMap::new();
    for game in games.iter().filter(|g| g.competition == top_division) {
        for referee in &game.referees {
            *appearances.entry(referee).or_insert(0) += 1;
        }
    }

    appearances
        .into_iter()
        .filter(|(_, count)| *count >= threshold)
        .map(|(referee, _)| referee.clone())
        .collect()
}

/// Classification of the qualified referees on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct DayStat {
    pub date: NaiveDate,
    pub top_division_games: usize,
    /// Qualified referees appointed to a top-division game
    pub qualified_on_top: usize,
    /// Other referees appointed to a top-division game
    pub unqualified_on_top: usize,
    /// Qualified referees without a top-division appointment
    pub not_on_top: usize,
    pub pct_not_on_top: f64,
    pub pct_staying_home: f64,
    /// Qualified referees without any appointment, sorted
    pub staying_home: Vec<RefereeId>,
    /// Qualified referees appointed to other competitions, with those competitions
    pub working_other: BTreeMap<RefereeId, BTreeSet<String>>,
}

impl DayStat {
    pub fn staying_home_count(&self) -> usize {
        self.staying_home.len()
    }

    pub fn working_other_count(&self) -> usize {
        self.working_other.len()
    }
}

/// Classify the qualified referees for the games of a single date.
pub fn analyze_day(
    date: NaiveDate,
    games: &[&Game],
    qualified: &HashSet<RefereeId>,
    config: &AnalysisConfig,
) -> DayStat {
    let mut on_top: HashSet<&RefereeId> = HashSet::new();
    let mut unqualified_on_top: HashSet<&RefereeId> = HashSet::new();
    let mut appointed: HashSet<&RefereeId> = HashSet::new();
    let mut working_other: BTreeMap<RefereeId, BTreeSet<String>> = BTreeMap::new();
    let mut top_division_games = 0;

    for game in games {
        let top = config.is_top_division(game);
        if top {
            top_division_games += 1;
        }
        for referee in &game.referees {
            if !qualified.contains(referee) {
                if top {
                    unqualified_on_top.insert(referee);
                }
                continue;
            }
            appointed.insert(referee);
            if top {
                on_top.insert(referee);
            } else {
                working_other
                    .entry(referee.clone())
                    .or_default()
                    .insert(game.competition.clone());
            }
        }
    }

    let mut staying_home: Vec<RefereeId> = qualified
        .iter()
        .filter(|r| !appointed.contains(r))
        .cloned()
        .collect();
    staying_home.sort();

    let not_on_top = qualified.len() - on_top.len();
    let pct = |count: usize| percentage(count as f64, qualified.len());

    DayStat {
        date,
        top_division_games,
        qualified_on_top: on_top.len(),
        unqualified_on_top: unqualified_on_top.len(),
        not_on_top,
        pct_not_on_top: pct(not_on_top),
        pct_staying_home: pct(staying_home.len()),
        staying_home,
        working_other,
    }
}

/// Summed daily counts over a set of analysed dates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub days: usize,
    pub top_division_games: usize,
    pub qualified_on_top: usize,
    pub unqualified_on_top: usize,
    pub not_on_top: usize,
    pub staying_home: usize,
    pub working_other: usize,
}

impl Totals {
    pub fn add(&mut self, day: &DayStat) {
        self.days += 1;
        self.top_division_games += day.top_division_games;
        self.qualified_on_top += day.qualified_on_top;
        self.unqualified_on_top += day.unqualified_on_top;
        self.not_on_top += day.not_on_top;
        self.staying_home += day.staying_home_count();
        self.working_other += day.working_other_count();
    }

    /// Per-day average of `total`, zero when no day was analysed.
    pub fn per_day(&self, total: usize) -> f64 {
        if self.days == 0 {
            0.0
        } else {
            total as f64 / self.days as f64
        }
    }

    pub fn avg_top_division_games(&self) -> f64 {
        self.per_day(self.top_division_games)
    }

    pub fn avg_unqualified_on_top(&self) -> f64 {
        self.per_day(self.unqualified_on_top)
    }

    pub fn avg_not_on_top(&self) -> f64 {
        self.per_day(self.not_on_top)
    }

    pub fn avg_staying_home(&self) -> f64 {
        self.per_day(self.staying_home)
    }

    pub fn avg_working_other(&self) -> f64 {
        self.per_day(self.working_other)
    }
}

/// `value` as a percentage of `total`, zero for an empty total.
pub fn percentage(value: f64, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        value / total as f64 * 100.0
    }
}

/// Complete availability analysis of a designation export.
#[derive(Debug, Clone, Default)]
pub struct StayingHomeReport {
    /// Parameters the analysis ran with
    pub config: AnalysisConfig,
    pub qualified_count: usize,
    pub global: Totals,
    pub monthly: BTreeMap<Month, Totals>,
    /// Analysed dates in chronological order
    pub days: Vec<DayStat>,
}

impl StayingHomeReport {
    /// Months with at least one analysed date, in calendar order.
    pub fn months(&self) -> impl Iterator<Item = (Month, &Totals)> {
        Month::ALL
            .into_iter()
            .filter_map(|month| self.monthly.get(&month).map(|t| (month, t)))
            .filter(|(_, totals)| totals.days > 0)
    }
}

/// Run the availability analysis over every game of the export.
pub fn analyze(games: &[Game], config: &AnalysisConfig) -> StayingHomeReport {
    let qualified = qualified_referees(games, &config.top_division, config.qualification_threshold);
    log::info!(
        "Found {} {} referees with at least {} games",
        qualified.len(),
        config.top_division,
        config.qualification_threshold
    );

    let mut by_date: BTreeMap<NaiveDate, Vec<&Game>> = BTreeMap::new();
    for game in games {
        by_date.entry(game.date).or_default().push(game);
    }

    let mut report = StayingHomeReport {
        config: config.clone(),
        qualified_count: qualified.len(),
        ..Default::default()
    };

    for (date, day_games) in by_date {
        let top_games = day_games
            .iter()
            .filter(|g| config.is_top_division(g))
            .count();
        if top_games < config.min_top_division_games {
            continue;
        }

        let day = analyze_day(date, &day_games, &qualified, config);
        log_day(&day);

        report.global.add(&day);
        report.monthly.entry(Month::of(date)).or_default().add(&day);
        report.days.push(day);
    }

    log_totals("Global", &report.global, report.qualified_count);
    for (month, totals) in report.months() {
        log_totals(month.french_name(), totals, report.qualified_count);
    }

    report
}

fn log_totals(label: &str, totals: &Totals, qualified: usize) {
    log::info!(
        "{}: {} days, {} top-division games ({:.1} per day), \
         {:.1} not on top division per day ({:.1}%), \
         {:.1} staying home per day ({:.1}%), {:.1} working other divisions per day",
        label,
        totals.days,
        totals.top_division_games,
        totals.avg_top_division_games(),
        totals.avg_not_on_top(),
        percentage(totals.avg_not_on_top(), qualified),
        totals.avg_staying_home(),
        percentage(totals.avg_staying_home(), qualified),
        totals.avg_working_other()
    );
}

fn log_day(day: &DayStat) {
    log::info!(
        "{}: {} games, {} qualified on top division, {} others on top division, \
         {} not on top division ({:.1}%), {} staying home ({:.1}%), {} working other divisions",
        day.date.format("%d/%m/%Y"),
        day.top_division_games,
        day.qualified_on_top,
        day.unqualified_on_top,
        day.not_on_top,
        day.pct_not_on_top,
        day.staying_home_count(),
        day.pct_staying_home,
        day.working_other_count()
    );
    for referee in &day.staying_home {
        log::info!("  staying home: {}", referee);
    }
    for (referee, competitions) in &day.working_other {
        let names: Vec<&str> = competitions.iter().map(String::as_str).collect();
        log::info!("  working other: {}: {}", referee, names.join(", "));
    }
}
