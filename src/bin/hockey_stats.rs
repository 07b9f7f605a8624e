//! Hockey stats - referee designation and penalty reports
//!
//! Fetches designations from hockeynet (or a saved export) and penalties from
//! the league websites, and renders them as static HTML pages.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hockey_stats::designation::{CsvFileSource, DesignationSource};
use hockey_stats::hockeynet::{Credentials, HockeynetClient};
use hockey_stats::pipeline::{
    self, DesignationExportConfig, PenaltiesConfig, StayingHomeConfig,
};
use hockey_stats::staying_home::{AnalysisConfig, TOP_DIVISION};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hockey-stats")]
#[command(about = "Referee designation and penalty reports for French ice hockey")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the designation export comes from.
#[derive(Args)]
struct SourceArgs {
    /// Saved designation export; fetched from hockeynet when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Hockeynet login
    #[arg(long, env = "HOCKEYNET_USER")]
    username: Option<String>,

    /// Hockeynet password
    #[arg(long, env = "HOCKEYNET_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Season to export (year the season starts)
    #[arg(long, default_value = "2025")]
    season: i32,
}

impl SourceArgs {
    fn into_source(self) -> Result<Box<dyn DesignationSource>> {
        if let Some(input) = self.input {
            return Ok(Box::new(CsvFileSource::new(input)));
        }
        let credentials = Credentials {
            username: self
                .username
                .context("--username or HOCKEYNET_USER is required without --input")?,
            password: self
                .password
                .context("--password or HOCKEYNET_PASSWORD is required without --input")?,
        };
        Ok(Box::new(HockeynetClient::new(credentials, self.season)?))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Report top-division referees left without a game on busy days
    StayingHome {
        #[command(flatten)]
        source: SourceArgs,

        /// Output HTML file
        #[arg(short, long, default_value = "data/staying_home.html")]
        output: PathBuf,

        /// Competition whose referees are audited
        #[arg(long, default_value = TOP_DIVISION)]
        top_division: String,

        /// Top-division games needed to count as a top-division referee
        #[arg(long, default_value = "3")]
        threshold: usize,

        /// Top-division games needed on a date for it to be analysed
        #[arg(long, default_value = "3")]
        min_games: usize,
    },

    /// Scrape penalties of finished Magnus and D1 games
    Penalties {
        /// Results cache of already scraped games
        #[arg(long, default_value = "data/finished_games.json")]
        cache: PathBuf,

        /// Directory receiving the generated pages
        #[arg(short, long, default_value = "data")]
        output_dir: PathBuf,

        /// Table page template (`%DATA%`)
        #[arg(long, default_value = "templates/table.html")]
        table_template: PathBuf,

        /// Index page template (`%MAGNUS_DATA%`, `%D1_DATA%`)
        #[arg(long, default_value = "templates/index.html")]
        index_template: PathBuf,
    },

    /// Render the designation table, one row per official
    Designations {
        #[command(flatten)]
        source: SourceArgs,

        /// Page template (`%DATA%`)
        #[arg(long, default_value = "templates/designations.html")]
        template: PathBuf,

        /// Output HTML file
        #[arg(short, long, default_value = "data/designations.html")]
        output: PathBuf,
    },

    /// Save the raw designation export from hockeynet
    FetchDesignations {
        #[command(flatten)]
        source: SourceArgs,

        /// Output CSV file
        #[arg(short, long, default_value = "designations.csv")]
        output: PathBuf,
    },
}

fn run(command: Commands) -> Result<String> {
    match command {
        Commands::StayingHome {
            source,
            output,
            top_division,
            threshold,
            min_games,
        } => {
            let config = StayingHomeConfig {
                output,
                analysis: AnalysisConfig {
                    top_division,
                    qualification_threshold: threshold,
                    min_top_division_games: min_games,
                },
            };
            pipeline::staying_home(source.into_source()?.as_mut(), &config)
        }
        Commands::Penalties {
            cache,
            output_dir,
            table_template,
            index_template,
        } => pipeline::penalties(&PenaltiesConfig {
            cache,
            output_dir,
            table_template,
            index_template,
        }),
        Commands::Designations {
            source,
            template,
            output,
        } => pipeline::designation_table(
            source.into_source()?.as_mut(),
            &DesignationExportConfig { template, output },
        ),
        Commands::FetchDesignations { source, output } => {
            let export = source.into_source()?.fetch_designations()?;
            hockey_stats::output::write_file(&output, &export)?;
            Ok(format!("Designation export saved to {}", output.display()))
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = run(cli.command);
    log::logger().flush();

    println!("{}", result?);
    Ok(())
}
