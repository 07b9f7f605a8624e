//! Penalty scraping from the league websites.
//!
//! Both leagues run the same WordPress plugin: an `admin-ajax.php` action
//! lists the games of a phase, and each game page embeds the full game sheet
//! as JSON in the `:data` attribute of a `<live-rencontre-container>` element.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Game state of a finished game in the league listings.
const FINISHED: &str = "T";

/// Penalty length in minutes when the game sheet leaves it empty.
const DEFAULT_PENALTY_MINUTES: u32 = 2;

/// A competition phase published on one of the league websites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct League {
    pub name: &'static str,
    pub base_url: &'static str,
    pub competition_id: u32,
    pub phase_id: u32,
}

pub const MAGNUS: League = League {
    name: "Magnus",
    base_url: "https://liguemagnus.com",
    competition_id: 197,
    phase_id: 560,
};

pub const DIVISION_1: League = League {
    name: "D1",
    base_url: "https://www.hockeyfrance.com/competitions",
    competition_id: 196,
    phase_id: 559,
};

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GameListResponse {
    data: GameListPage,
}

#[derive(Debug, Deserialize)]
struct GameListPage {
    data: Vec<GameSummary>,
}

#[derive(Debug, Deserialize)]
struct GameSummary {
    id: u64,
    #[serde(default)]
    etat: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    abreviation: String,
}

#[derive(Debug, Deserialize)]
struct Person {
    nom_complet: String,
}

#[derive(Debug, Deserialize)]
struct Infraction {
    code: String,
}

/// Game sheet embedded in a game page.
#[derive(Debug, Deserialize)]
pub struct GameSheet {
    /// `YYYY-MM-DD HH:MM:SS`
    date_rencontre_non_formate: String,
    receveur: TeamRef,
    visiteur: TeamRef,
    #[serde(default)]
    evenements: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PenaltyEvent {
    /// Game clock in seconds
    temps: Option<u32>,
    equipe: TeamRef,
    joueur: Option<Person>,
    substitution: Option<Person>,
    temps_penalite: Option<u32>,
    sanction: Option<Infraction>,
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One penalty as published in the penalty tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyRow {
    pub date: String,
    pub home: String,
    pub away: String,
    pub clock: String,
    pub team: String,
    pub player: String,
    pub substitute: String,
    pub length: String,
    pub infraction: String,
}

impl PenaltyRow {
    pub fn cells(&self) -> [&str; 9] {
        [
            self.date.as_str(),
            self.home.as_str(),
            self.away.as_str(),
            self.clock.as_str(),
            self.team.as_str(),
            self.player.as_str(),
            self.substitute.as_str(),
            self.length.as_str(),
            self.infraction.as_str(),
        ]
    }

    /// Tab-separated line, the format stored in the results cache.
    pub fn to_tsv(&self) -> String {
        self.cells().join("\t")
    }
}

/// `HH:MM:SS` from a game clock in seconds.
pub fn format_clock(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

/// `DD/MM/YYYY` from the sheet's `YYYY-MM-DD HH:MM:SS` timestamp.
fn format_sheet_date(raw: &str) -> Result<String> {
    let day = raw.split_whitespace().next().unwrap_or("");
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .with_context(|| format!("Invalid game date '{}'", raw))?;
    Ok(date.format("%d/%m/%Y").to_string())
}

impl GameSheet {
    /// Penalties of the game, in sheet order.
    ///
    /// Penalty events without an infraction are skipped.
    pub fn penalties(&self) -> Result<Vec<PenaltyRow>> {
        let date = format_sheet_date(&self.date_rencontre_non_formate)?;
        let mut rows = Vec::new();

        for event in &self.evenements {
            if event.get("type").and_then(|t| t.as_str()) != Some("SANCTION") {
                continue;
            }
            let penalty: PenaltyEvent = serde_json::from_value(event.clone())
                .context("Malformed penalty event")?;
            let Some(infraction) = penalty.sanction else {
                log::warn!(
                    "Penalty without infraction in game {} - {} on {}",
                    self.receveur.abreviation,
                    self.visiteur.abreviation,
                    date
                );
                continue;
            };

            let minutes = penalty
                .temps_penalite
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_PENALTY_MINUTES);
            rows.push(PenaltyRow {
                date: date.clone(),
                home: self.receveur.abreviation.clone(),
                away: self.visiteur.abreviation.clone(),
                clock: format_clock(penalty.temps.unwrap_or(0)),
                team: penalty.equipe.abreviation,
                player: penalty.joueur.map(|p| p.nom_complet).unwrap_or_default(),
                substitute: penalty
                    .substitution
                    .map(|p| p.nom_complet)
                    .unwrap_or_default(),
                length: format!("{}:00", minutes),
                infraction: infraction.code,
            });
        }

        Ok(rows)
    }
}

/// Extract the embedded game sheet from a game page.
pub fn parse_game_page(html: &str) -> Result<GameSheet> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("live-rencontre-container")
        .map_err(|e| anyhow::anyhow!("Invalid selector: {:?}", e))?;
    let container = document
        .select(&selector)
        .next()
        .ok_or_else(|| anyhow::anyhow!("No live-rencontre-container element"))?;
    let data = container
        .value()
        .attr(":data")
        .ok_or_else(|| anyhow::anyhow!("live-rencontre-container has no :data attribute"))?;
    serde_json::from_str(data).context("Failed to decode game sheet")
}

// ─── Network ─────────────────────────────────────────────────────────────────

/// Anything able to list finished games and read their penalties.
pub trait PenaltySource {
    /// Ids of the finished games of a league phase.
    fn finished_games(&self, league: &League) -> Result<Vec<u64>>;

    /// Penalties of one game.
    fn game_penalties(&self, league: &League, game_id: u64) -> Result<Vec<PenaltyRow>>;
}

pub struct PenaltyScraper {
    client: Client,
}

impl PenaltyScraper {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64; rv:131.0) Gecko/20100101 Firefox/131.0")
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(PenaltyScraper { client })
    }
}

impl PenaltySource for PenaltyScraper {
    fn finished_games(&self, league: &League) -> Result<Vec<u64>> {
        let url = format!("{}/wp-admin/admin-ajax.php", league.base_url);
        let competition_id = league.competition_id.to_string();
        let phase_id = league.phase_id.to_string();
        let form = [
            ("action", "get_rencontres"),
            ("page", ""),
            ("equipe_id", ""),
            ("competition_id", competition_id.as_str()),
            ("phase_id", phase_id.as_str()),
            ("date_min", ""),
            ("date_max", ""),
            ("par_page", "300"),
            ("journee", ""),
            ("limite", "0"),
        ];

        let listing: GameListResponse = self
            .client
            .post(&url)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&form)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to list {} games", league.name))?
            .json()
            .with_context(|| format!("Failed to decode {} game list", league.name))?;

        let total = listing.data.data.len();
        let finished: Vec<u64> = listing
            .data
            .data
            .into_iter()
            .filter(|g| g.etat.as_deref() == Some(FINISHED))
            .map(|g| g.id)
            .collect();
        log::info!(
            "{} out of {} {} games are finished",
            finished.len(),
            total,
            league.name
        );
        Ok(finished)
    }

    fn game_penalties(&self, league: &League, game_id: u64) -> Result<Vec<PenaltyRow>> {
        let url = format!("{}/rencontre/{}/", league.base_url, game_id);
        let html = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .with_context(|| format!("Failed to fetch {}", url))?;
        let penalties = parse_game_page(&html)
            .with_context(|| format!("Failed to read game sheet of {}", url))?
            .penalties()?;
        log::info!("{} penalties in game {}", penalties.len(), game_id);
        Ok(penalties)
    }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Penalties of already scraped games, keyed by game id.
///
/// Stored as a JSON object of tab-separated penalty lines, one entry per game.
#[derive(Debug, Default)]
pub struct PenaltyCache {
    games: BTreeMap<String, String>,
}

impl PenaltyCache {
    /// Load the cache, starting empty if the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let games = serde_json::from_str(&text)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        Ok(PenaltyCache { games })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.games)?;
        crate::output::write_file(path, &text)
    }

    pub fn contains(&self, game_id: u64) -> bool {
        self.games.contains_key(&game_id.to_string())
    }

    pub fn insert(&mut self, game_id: u64, penalties: &[PenaltyRow]) {
        let lines: Vec<String> = penalties.iter().map(PenaltyRow::to_tsv).collect();
        self.games.insert(game_id.to_string(), lines.join("\n"));
    }

    /// Raw tab-separated penalty lines of a game.
    pub fn get(&self, game_id: u64) -> Option<&str> {
        self.games.get(&game_id.to_string()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
