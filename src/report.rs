//! HTML rendering of the staying-home analysis.

use crate::staying_home::{percentage, DayStat, StayingHomeReport, Totals};
use crate::template::escape_html;
use anyhow::Result;
use std::fmt::Write;

const FOOTER: &str = "\n</body>\n</html>";

/// Render the full report: global table, monthly table, then one section per day.
///
/// Headings name the audited competition and the thresholds of `report.config`.
pub fn render_staying_home(report: &StayingHomeReport) -> Result<String> {
    let division = escape_html(report.config.division_label());
    let mut out = String::new();
    write_header(&mut out, &division, report.config.min_top_division_games)?;
    write_global(&mut out, report, &division)?;
    write_monthly(&mut out, report, &division)?;

    writeln!(out, "\n    <h2>Détails par Journée</h2>")?;
    for day in &report.days {
        write_day(&mut out, day, &division)?;
    }

    out.push_str(FOOTER);
    Ok(out)
}

fn write_header(out: &mut String, division: &str, min_games: usize) -> std::fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"fr\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "    <meta charset=\"UTF-8\">")?;
    writeln!(
        out,
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">"
    )?;
    writeln!(out, "    <title>Statistiques Arbitres {} - Absences</title>", division)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(
        out,
        "    <h1>Statistiques Arbitres {} - Absences sur Journées à {}+ Matchs</h1>",
        division, min_games
    )
}

fn metric_row(out: &mut String, label: &str, value: &str) -> std::fmt::Result {
    writeln!(out, "        <tr>")?;
    writeln!(out, "            <td>{}</td>", label)?;
    writeln!(out, "            <td>{}</td>", value)?;
    writeln!(out, "        </tr>")
}

fn metric_table_start(out: &mut String) -> std::fmt::Result {
    writeln!(out, "    <table border=\"1\">")?;
    writeln!(out, "        <tr>")?;
    writeln!(out, "            <th>Métrique</th>")?;
    writeln!(out, "            <th>Valeur</th>")?;
    writeln!(out, "        </tr>")
}

/// `avg (pct%)` with the percentage taken against the qualified referee count.
fn avg_with_share(avg: f64, qualified: usize) -> String {
    format!("{:.1} ({:.1}%)", avg, percentage(avg, qualified))
}

fn write_global(out: &mut String, report: &StayingHomeReport, division: &str) -> std::fmt::Result {
    let global: &Totals = &report.global;
    let qualified = report.qualified_count;
    let config = &report.config;

    writeln!(out, "\n    <h2>Statistiques Globales</h2>")?;
    metric_table_start(out)?;
    metric_row(
        out,
        &format!(
            "Total arbitres {} qualifiés ({}+ matchs)",
            division, config.qualification_threshold
        ),
        &qualified.to_string(),
    )?;
    metric_row(
        out,
        &format!(
            "Journées analysées ({}+ matchs {})",
            config.min_top_division_games, division
        ),
        &global.days.to_string(),
    )?;
    metric_row(
        out,
        &format!("Total matchs {}", division),
        &global.top_division_games.to_string(),
    )?;
    metric_row(
        out,
        &format!("Moyenne matchs {} par journée", division),
        &format!("{:.1}", global.avg_top_division_games()),
    )?;
    metric_row(
        out,
        &format!("Moyenne arbitres non-{0} désignés sur {0} par journée", division),
        &format!("{:.1}", global.avg_unqualified_on_top()),
    )?;
    metric_row(
        out,
        &format!("Moyenne arbitres {0} Non désignés sur {0} par journée", division),
        &avg_with_share(global.avg_not_on_top(), qualified),
    )?;
    metric_row(
        out,
        &format!("Moyenne arbitres {} restant à domicile par journée", division),
        &avg_with_share(global.avg_staying_home(), qualified),
    )?;
    metric_row(
        out,
        &format!("Moyenne arbitres {} travaillant autres divisions par journée", division),
        &format!("{:.1}", global.avg_working_other()),
    )?;
    writeln!(out, "    </table>")
}

fn write_monthly(out: &mut String, report: &StayingHomeReport, division: &str) -> std::fmt::Result {
    let qualified = report.qualified_count;

    writeln!(out, "\n    <h2>Statistiques Mensuelles</h2>")?;
    writeln!(out, "    <table border=\"1\">")?;
    writeln!(out, "        <thead>")?;
    writeln!(out, "            <tr>")?;
    let titles = [
        "Mois".to_string(),
        "Journées".to_string(),
        format!("Matchs {}", division),
        format!("Moy. Non désigné sur {}", division),
        format!("% Non désigné sur {}", division),
        "Moy. Restant à domicile".to_string(),
        "% Restant à domicile".to_string(),
        "Moy. Autres divisions".to_string(),
    ];
    for title in &titles {
        writeln!(out, "                <th>{}</th>", title)?;
    }
    writeln!(out, "            </tr>")?;
    writeln!(out, "        </thead>")?;
    writeln!(out, "        <tbody>")?;

    for (month, totals) in report.months() {
        let not_on_top = totals.avg_not_on_top();
        let staying_home = totals.avg_staying_home();
        let cells = [
            month.french_name().to_string(),
            totals.days.to_string(),
            totals.top_division_games.to_string(),
            format!("{:.1}", not_on_top),
            format!("{:.1}%", percentage(not_on_top, qualified)),
            format!("{:.1}", staying_home),
            format!("{:.1}%", percentage(staying_home, qualified)),
            format!("{:.1}", totals.avg_working_other()),
        ];
        writeln!(out, "            <tr>")?;
        for cell in &cells {
            writeln!(out, "                <td>{}</td>", cell)?;
        }
        writeln!(out, "            </tr>")?;
    }

    writeln!(out, "        </tbody>")?;
    writeln!(out, "    </table>")
}

fn write_day(out: &mut String, day: &DayStat, division: &str) -> std::fmt::Result {
    writeln!(out, "\n    <h3>{}</h3>", day.date.format("%d/%m/%Y"))?;
    metric_table_start(out)?;
    metric_row(
        out,
        &format!("Matchs {}", division),
        &day.top_division_games.to_string(),
    )?;
    metric_row(
        out,
        &format!("Arbitres {0} désignés sur {0}", division),
        &day.qualified_on_top.to_string(),
    )?;
    metric_row(
        out,
        &format!("Arbitres non-{0} désignés sur {0}", division),
        &day.unqualified_on_top.to_string(),
    )?;
    metric_row(
        out,
        &format!("Arbitres {0} Non désigné sur {0}", division),
        &format!("{} ({:.1}%)", day.not_on_top, day.pct_not_on_top),
    )?;
    metric_row(
        out,
        "Restant à domicile",
        &format!("{} ({:.1}%)", day.staying_home_count(), day.pct_staying_home),
    )?;
    metric_row(
        out,
        "Travaillant autres divisions",
        &day.working_other_count().to_string(),
    )?;
    writeln!(out, "    </table>")?;

    if !day.staying_home.is_empty() {
        writeln!(
            out,
            "\n    <h4>Arbitres {} restant à domicile</h4>\n    <ul>",
            division
        )?;
        for referee in &day.staying_home {
            writeln!(out, "        <li>{}</li>", escape_html(&referee.to_string()))?;
        }
        writeln!(out, "    </ul>")?;
    }

    if !day.working_other.is_empty() {
        writeln!(
            out,
            "\n    <h4>Arbitres {} travaillant autres divisions</h4>\n    <ul>",
            division
        )?;
        for (referee, competitions) in &day.working_other {
            let competitions: Vec<&str> = competitions.iter().map(String::as_str).collect();
            writeln!(
                out,
                "        <li>{}: {}</li>",
                escape_html(&referee.to_string()),
                escape_html(&competitions.join(", "))
            )?;
        }
        writeln!(out, "    </ul>")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Month;
    use crate::referee::RefereeId;
    use crate::staying_home::AnalysisConfig;
    use chrono::NaiveDate;
    use std::collections::{BTreeMap, BTreeSet};

    fn sample_report() -> StayingHomeReport {
        let mut working_other = BTreeMap::new();
        working_other.insert(
            RefereeId::new("D'ARTOIS", "Loïc"),
            BTreeSet::from(["Division 1".to_string()]),
        );
        let day = DayStat {
            date: NaiveDate::from_ymd_opt(2025, 1, 18).unwrap(),
            top_division_games: 3,
            qualified_on_top: 8,
            unqualified_on_top: 1,
            not_on_top: 2,
            pct_not_on_top: 20.0,
            pct_staying_home: 10.0,
            staying_home: vec![RefereeId::new("DUPONT", "Jean")],
            working_other,
        };

        let mut report = StayingHomeReport {
            qualified_count: 10,
            ..Default::default()
        };
        report.global.add(&day);
        report.monthly.entry(Month::January).or_default().add(&day);
        report.days.push(day);
        report
    }

    #[test]
    fn test_render_sections_in_order() {
        let html = render_staying_home(&sample_report()).unwrap();
        let global = html.find("Statistiques Globales").unwrap();
        let monthly = html.find("Statistiques Mensuelles").unwrap();
        let details = html.find("<h3>18/01/2025</h3>").unwrap();
        assert!(global < monthly && monthly < details);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn test_render_referee_lists() {
        let html = render_staying_home(&sample_report()).unwrap();
        assert!(html.contains("<li>DUPONT Jean</li>"));
        assert!(html.contains("<li>D&#39;ARTOIS Loïc: Division 1</li>"));
        assert!(html.contains("<td>Janvier</td>"));
        assert!(!html.contains("<td>Février</td>"));
    }

    #[test]
    fn test_render_monthly_average() {
        let mut report = StayingHomeReport {
            qualified_count: 10,
            ..Default::default()
        };
        report.monthly.insert(
            Month::February,
            Totals {
                days: 2,
                staying_home: 5,
                ..Default::default()
            },
        );
        let html = render_staying_home(&report).unwrap();
        assert!(html.contains("<td>2.5</td>"));
        assert!(html.contains("<td>25.0%</td>"));
    }

    #[test]
    fn test_render_labels_follow_configuration() {
        let mut report = sample_report();
        report.config = AnalysisConfig {
            top_division: "Division 1".to_string(),
            qualification_threshold: 5,
            min_top_division_games: 2,
        };
        let html = render_staying_home(&report).unwrap();

        assert!(html.contains(
            "<h1>Statistiques Arbitres Division 1 - Absences sur Journées à 2+ Matchs</h1>"
        ));
        assert!(html.contains("<td>Total arbitres Division 1 qualifiés (5+ matchs)</td>"));
        assert!(html.contains("<td>Journées analysées (2+ matchs Division 1)</td>"));
        assert!(html.contains("<th>Matchs Division 1</th>"));
        assert!(!html.contains("SLM"));
        assert!(!html.contains("3+"));
    }

    #[test]
    fn test_render_default_labels() {
        let html = render_staying_home(&sample_report()).unwrap();
        assert!(html.contains("<h1>Statistiques Arbitres SLM - Absences sur Journées à 3+ Matchs</h1>"));
        assert!(html.contains("<td>Total arbitres SLM qualifiés (3+ matchs)</td>"));
        assert!(html.contains("<td>Moyenne arbitres non-SLM désignés sur SLM par journée</td>"));
    }

    #[test]
    fn test_render_without_days() {
        let html = render_staying_home(&StayingHomeReport::default()).unwrap();
        assert!(html.contains("<td>0.0 (0.0%)</td>"));
        assert!(!html.contains("<h3>"));
    }
}
