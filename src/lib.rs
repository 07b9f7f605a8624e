//! Hockey stats
//!
//! Referee designation and penalty statistics for French ice hockey.
//!
//! This library provides:
//! - `referee` / `designation`: parsing of the hockeynet designation export
//! - `staying_home`: availability of top-division referees on busy days
//! - `report`: HTML rendering of that analysis
//! - `penalties`: penalty scraping from the league websites
//! - `assignments`: one-row-per-official designation table
//! - `template` / `output`: page templates and written files
//!
//! Binaries:
//! - `hockey-stats`: CLI running each report

pub mod assignments;
pub mod calendar;
pub mod designation;
pub mod hockeynet;
pub mod output;
pub mod penalties;
pub mod pipeline;
pub mod referee;
pub mod report;
pub mod staying_home;
pub mod template;

pub use designation::Game;
pub use referee::RefereeId;
