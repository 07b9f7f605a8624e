//! Authenticated access to the hockeynet.fr designation export.
//!
//! The site is a session/cookie application protected by CSRF tokens: the
//! login form and the designation page each embed a token in a `<meta>` tag,
//! and the export endpoint expects the latter in an `X-CSRF-TOKEN` header.

use crate::designation::DesignationSource;
use anyhow::{Context, Result};
use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use serde::Serialize;
use std::time::Duration;

const BASE_URL: &str = "https://hockeynet.fr";
const LOGIN_PATH: &str = "/auth/login";
const DESIGNATION_PATH: &str = "/arbitrage/designation";
const EXPORT_PATH: &str = "/arbitrage/designation/export";

/// Ice hockey discipline code on hockeynet.
const DISCIPLINE: &str = "HG";

lazy_static::lazy_static! {
    static ref CSRF_TOKEN: Regex = Regex::new(r#"name="csrf-token" content="([^"]+)""#).unwrap();
}

/// Extract the CSRF token embedded in a hockeynet page.
pub fn extract_csrf_token(page: &str) -> Result<String> {
    CSRF_TOKEN
        .captures(page)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| anyhow::anyhow!("Could not find CSRF token"))
}

/// Login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginForm<'a> {
    #[serde(rename = "_token")]
    token: &'a str,
    username: &'a str,
    password: &'a str,
}

/// Filters of the designation export; everything empty selects the whole season.
#[derive(Debug, Serialize)]
struct ExportQuery {
    etat: Option<String>,
    competitions_ids: Vec<u64>,
    phases_ids: Vec<u64>,
    dates: serde_json::Map<String, serde_json::Value>,
    role_id: Option<u64>,
    etat_rencontre: Option<String>,
    lieu_pratique: Option<String>,
    horaire: Option<String>,
    libelle: Option<String>,
    saison: i32,
    discipline_code: &'static str,
    show_all: bool,
}

impl ExportQuery {
    fn season(saison: i32) -> Self {
        ExportQuery {
            etat: None,
            competitions_ids: Vec::new(),
            phases_ids: Vec::new(),
            dates: serde_json::Map::new(),
            role_id: None,
            etat_rencontre: None,
            lieu_pratique: None,
            horaire: None,
            libelle: None,
            saison,
            discipline_code: DISCIPLINE,
            show_all: false,
        }
    }
}

/// Designation source backed by a logged-in hockeynet session.
pub struct HockeynetClient {
    client: Client,
    credentials: Credentials,
    season: i32,
}

impl HockeynetClient {
    pub fn new(credentials: Credentials, season: i32) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/112.0",
            ),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(REFERER, HeaderValue::from_static("https://hockeynet.fr/"));

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HockeynetClient {
            client,
            credentials,
            season,
        })
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        log::debug!("Requesting {}", url);
        request
            .send()
            .and_then(Response::error_for_status)
            .with_context(|| format!("An error occurred while fetching {}", url))
    }

    fn get_page(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", BASE_URL, path);
        let response = self.send(self.client.get(&url), &url)?;
        response
            .text()
            .with_context(|| format!("Failed to read {}", url))
    }

    /// Open an authenticated session.
    pub fn login(&self) -> Result<()> {
        let login_page = self.get_page(LOGIN_PATH)?;
        let token = extract_csrf_token(&login_page).context("Login page has no CSRF token")?;

        let url = format!("{}{}", BASE_URL, LOGIN_PATH);
        let form = LoginForm {
            token: &token,
            username: &self.credentials.username,
            password: &self.credentials.password,
        };
        self.send(self.client.post(&url).json(&form), &url)?;
        log::info!("Logged in to hockeynet as {}", self.credentials.username);
        Ok(())
    }

    /// Download the designation export of the configured season.
    pub fn export_designations(&self) -> Result<String> {
        let designation_page = self.get_page(DESIGNATION_PATH)?;
        let token = extract_csrf_token(&designation_page)
            .context("Designation page has no CSRF token")?;

        let url = format!("{}{}", BASE_URL, EXPORT_PATH);
        let request = self
            .client
            .post(&url)
            .header("X-CSRF-TOKEN", token)
            .json(&ExportQuery::season(self.season));
        let export = self
            .send(request, &url)?
            .text()
            .context("Failed to read designation export")?;

        log::info!("Fetched {} games", export.lines().count().saturating_sub(1));
        Ok(export)
    }
}

impl DesignationSource for HockeynetClient {
    fn fetch_designations(&mut self) -> Result<String> {
        self.login()?;
        self.export_designations()
    }
}
