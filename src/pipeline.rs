//! Report pipelines used by the CLI.
//!
//! Each pipeline fetches its input, renders its pages and returns a one-line
//! summary instead of printing.

use crate::assignments::flatten_assignments;
use crate::designation::{parse_designations, DesignationSource};
use crate::output::write_file;
use crate::penalties::{
    League, PenaltyCache, PenaltyScraper, PenaltySource, DIVISION_1, MAGNUS,
};
use crate::report::render_staying_home;
use crate::staying_home::{analyze, AnalysisConfig, StayingHomeReport};
use crate::template::{self, table_rows};
use anyhow::{Context, Result};
use std::path::PathBuf;

// ============================================================================
// Staying home
// ============================================================================

/// Configuration for the staying-home report.
pub struct StayingHomeConfig {
    /// Output HTML path
    pub output: PathBuf,
    pub analysis: AnalysisConfig,
}

/// Parse the designations and run the availability analysis.
pub fn build_staying_home(
    source: &mut dyn DesignationSource,
    analysis: &AnalysisConfig,
) -> Result<StayingHomeReport> {
    let export = source.fetch_designations()?;
    let parsed = parse_designations(&export)?;
    log::info!("Parsed {} games", parsed.games.len());
    if !parsed.rejected.is_empty() {
        log::warn!(
            "{} referee entries did not match the expected name format",
            parsed.rejected.len()
        );
    }
    Ok(analyze(&parsed.games, analysis))
}

/// Build the staying-home report and write it as HTML.
pub fn staying_home(
    source: &mut dyn DesignationSource,
    config: &StayingHomeConfig,
) -> Result<String> {
    let report = build_staying_home(source, &config.analysis)?;
    let html = render_staying_home(&report)?;
    write_file(&config.output, &html)?;

    Ok(format!(
        "HTML report generated: {} ({} qualified referees, {} days analysed)",
        config.output.display(),
        report.qualified_count,
        report.global.days
    ))
}

// ============================================================================
// Penalties
// ============================================================================

/// Configuration for the penalty pages.
pub struct PenaltiesConfig {
    /// Results cache of already scraped games
    pub cache: PathBuf,
    /// Directory receiving magnus.html, d1.html and index.html
    pub output_dir: PathBuf,
    /// Template with a `%DATA%` placeholder for table rows
    pub table_template: PathBuf,
    /// Template with `%MAGNUS_DATA%` and `%D1_DATA%` placeholders
    pub index_template: PathBuf,
}

/// Scrape every finished game missing from the cache.
///
/// A game that fails is logged and left out of the cache so the next run
/// tries it again. Returns the finished game ids of the league.
fn collect_league(
    scraper: &dyn PenaltySource,
    league: &League,
    cache: &mut PenaltyCache,
) -> Result<Vec<u64>> {
    let finished = scraper.finished_games(league)?;
    for &game_id in &finished {
        if cache.contains(game_id) {
            continue;
        }
        match scraper.game_penalties(league, game_id) {
            Ok(penalties) => cache.insert(game_id, &penalties),
            Err(e) => log::warn!("Error processing game {}: {:#}", game_id, e),
        }
    }
    Ok(finished)
}

/// Raw tab-separated penalty blocks of the given games, in listing order.
fn cached_blocks<'a>(cache: &'a PenaltyCache, games: &[u64]) -> Vec<&'a str> {
    games.iter().filter_map(|id| cache.get(*id)).collect()
}

/// Table rows for the penalty blocks of a league.
fn penalty_table_rows(blocks: &[&str]) -> String {
    table_rows(
        blocks
            .iter()
            .flat_map(|block| block.lines())
            .filter(|line| !line.is_empty())
            .map(|line| line.split('\t')),
    )
}

/// Scrape penalties of both leagues and render the penalty pages.
pub fn penalties(config: &PenaltiesConfig) -> Result<String> {
    let scraper = PenaltyScraper::new()?;
    render_penalties(&scraper, config)
}

/// Render the penalty pages from `source`.
///
/// The cache is saved after each league, so a failing league keeps the games
/// already scraped for the previous ones.
fn render_penalties(source: &dyn PenaltySource, config: &PenaltiesConfig) -> Result<String> {
    let mut cache = PenaltyCache::load(&config.cache)?;

    let magnus_games = collect_league(source, &MAGNUS, &mut cache)?;
    cache.save(&config.cache)?;
    let d1_games = collect_league(source, &DIVISION_1, &mut cache)?;
    cache.save(&config.cache)?;

    let table_template = template::load(&config.table_template)?;
    let index_template = template::load(&config.index_template)?;

    let magnus = cached_blocks(&cache, &magnus_games);
    let d1 = cached_blocks(&cache, &d1_games);
    let magnus_rows = penalty_table_rows(&magnus);
    let d1_rows = penalty_table_rows(&d1);
    let magnus_raw = magnus.join("\n");
    let d1_raw = d1.join("\n");

    write_file(
        &config.output_dir.join("magnus.html"),
        &template::fill(&table_template, &[("DATA", magnus_rows.as_str())]),
    )?;
    write_file(
        &config.output_dir.join("d1.html"),
        &template::fill(&table_template, &[("DATA", d1_rows.as_str())]),
    )?;
    write_file(
        &config.output_dir.join("index.html"),
        &template::fill(
            &index_template,
            &[
                ("MAGNUS_DATA", magnus_raw.as_str()),
                ("D1_DATA", d1_raw.as_str()),
            ],
        ),
    )?;

    Ok(format!(
        "Penalty pages generated in {} ({} Magnus games, {} D1 games, {} cached)",
        config.output_dir.display(),
        magnus.len(),
        d1.len(),
        cache.len()
    ))
}

// ============================================================================
// Designation table
// ============================================================================

/// Configuration for the designation table.
pub struct DesignationExportConfig {
    /// Template with a `%DATA%` placeholder for table rows
    pub template: PathBuf,
    /// Output HTML path
    pub output: PathBuf,
}

/// Render one table row per designated official.
pub fn designation_table(
    source: &mut dyn DesignationSource,
    config: &DesignationExportConfig,
) -> Result<String> {
    let export = source.fetch_designations()?;
    let rows = flatten_assignments(&export)?;
    let page_template = template::load(&config.template)?;

    let data = table_rows(rows.iter().map(|r| r.cells()));
    let html = template::fill(&page_template, &[("DATA", data.as_str())]);
    write_file(&config.output, &html)
        .with_context(|| format!("Failed to write designation table {}", config.output.display()))?;

    Ok(format!(
        "Designation table generated: {} ({} designations)",
        config.output.display(),
        rows.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::penalties::PenaltyRow;

    #[test]
    fn test_penalty_table_rows() {
        let blocks = ["18/01/2025\tROU\tANG", "", "19/01/2025\tGRE\tCER\n20/01/2025\tBOR\tAMI"];
        let rows = penalty_table_rows(&blocks);
        assert_eq!(rows.lines().count(), 3);
        assert!(rows.starts_with("<tr><td>18/01/2025</td><td>ROU</td><td>ANG</td></tr>"));
    }

    #[test]
    fn test_cached_blocks_follow_listing_order() {
        let mut cache = PenaltyCache::default();
        cache.insert(2, &[]);
        let blocks = cached_blocks(&cache, &[3, 2, 1]);
        assert_eq!(blocks, vec![""]);
    }

    /// Magnus lists games 101 and 102, game 102 has no readable sheet.
    struct FakeLeagues {
        d1_available: bool,
    }

    impl PenaltySource for FakeLeagues {
        fn finished_games(&self, league: &League) -> Result<Vec<u64>> {
            if *league == DIVISION_1 {
                if !self.d1_available {
                    anyhow::bail!("D1 listing unavailable");
                }
                return Ok(vec![201]);
            }
            Ok(vec![101, 102])
        }

        fn game_penalties(&self, league: &League, game_id: u64) -> Result<Vec<PenaltyRow>> {
            if game_id == 102 {
                anyhow::bail!("No live-rencontre-container element");
            }
            Ok(vec![PenaltyRow {
                date: "18/01/2025".to_string(),
                home: league.name.to_string(),
                away: "ANG".to_string(),
                clock: "00:10:00".to_string(),
                team: "ANG".to_string(),
                player: "Jean DUPONT".to_string(),
                substitute: String::new(),
                length: "2:00".to_string(),
                infraction: format!("G{}", game_id),
            }])
        }
    }

    fn penalties_config(dir: &std::path::Path) -> PenaltiesConfig {
        let table_template = dir.join("table.html");
        let index_template = dir.join("index.html");
        std::fs::write(&table_template, "<table>%DATA%</table>").unwrap();
        std::fs::write(&index_template, "<pre>%MAGNUS_DATA%</pre><pre>%D1_DATA%</pre>").unwrap();
        PenaltiesConfig {
            cache: dir.join("data").join("finished_games.json"),
            output_dir: dir.join("site"),
            table_template,
            index_template,
        }
    }

    #[test]
    fn test_render_penalty_pages() {
        let dir = tempfile::tempdir().unwrap();
        let config = penalties_config(dir.path());

        let summary = render_penalties(&FakeLeagues { d1_available: true }, &config).unwrap();
        assert!(summary.contains("1 Magnus games, 1 D1 games, 2 cached"));

        let magnus = std::fs::read_to_string(config.output_dir.join("magnus.html")).unwrap();
        assert!(magnus.contains("<td>Magnus</td>"));
        assert!(magnus.contains("<td>G101</td>"));
        let index = std::fs::read_to_string(config.output_dir.join("index.html")).unwrap();
        assert!(index.contains("<pre>18/01/2025\tD1\tANG"));
    }

    #[test]
    fn test_cache_kept_when_later_league_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = penalties_config(dir.path());

        assert!(render_penalties(&FakeLeagues { d1_available: false }, &config).is_err());

        let cache = PenaltyCache::load(&config.cache).unwrap();
        assert!(cache.contains(101));
        // failed games are retried on the next run
        assert!(!cache.contains(102));
        assert!(!config.output_dir.join("magnus.html").exists());
    }
}
