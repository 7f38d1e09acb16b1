//! Gaugeboard CLI
//!
//! Command-line client for a running Gaugeboard API:
//! - Sign in (account or guest)
//! - Manage series and log measurements
//! - Stream simulated sensor readings
//! - Inspect chart and table views, export CSV

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use gaugeboard::seed::random_reading;
use gaugeboard::storage::{MeasurementRecord, Series, SeriesId};
use gaugeboard::store::validate::parse_number;
use gaugeboard::time::{format_instant, parse_instant};
use gaugeboard::view::{build_table, EditDraft, Highlight};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gaugeboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Range-checked sensor series with chart and table views")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:5000", global = true)]
    pub api_url: String,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Session token (default: $GAUGEBOARD_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and print its session token
    Register { username: String, password: String },

    /// Sign in and print a session token
    Login { username: String, password: String },

    /// Start a read-only guest session
    Guest,

    /// Change the signed-in account's password
    Password { old: String, new: String },

    /// Manage series
    Series {
        #[command(subcommand)]
        action: SeriesCommand,
    },

    /// Log a measurement
    Log {
        /// Series name or id
        series: String,
        /// Value, must lie within the series bounds
        #[arg(allow_hyphen_values = true)]
        value: String,
        /// Timestamp (default: now). Supports: "now", "2h", "now-3d", RFC 3339, Unix millis
        #[arg(short, long)]
        time: Option<String>,
    },

    /// Edit a stored measurement; only changed fields are sent
    Edit {
        id: i64,
        #[arg(short, long, allow_hyphen_values = true)]
        value: Option<String>,
        #[arg(short, long)]
        time: Option<String>,
        /// Move to another series (name or id)
        #[arg(short, long)]
        series: Option<String>,
    },

    /// Delete a measurement
    Remove { id: i64 },

    /// Post random in-range readings on an interval
    Simulate {
        /// Series to feed (empty = all)
        #[arg(short, long)]
        series: Vec<String>,
        /// Delay between rounds (e.g., 500ms, 3s, 1m)
        #[arg(short, long, default_value = "3s")]
        interval: String,
        /// Stop after this many rounds
        #[arg(short, long)]
        count: Option<usize>,
        /// Log in first instead of using an existing token
        #[arg(short, long, requires = "password")]
        user: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show the chart view
    Chart {
        /// Time range (e.g., 12h, 7d, 4w)
        #[arg(short, long, default_value = "7d")]
        last: String,
        /// Series to plot (empty = all)
        #[arg(short, long)]
        series: Vec<String>,
    },

    /// Show the table view
    Table {
        #[arg(short, long, default_value = "7d")]
        last: String,
        #[arg(short, long)]
        series: Vec<String>,
        /// Highlight rows at this instant
        #[arg(long)]
        highlight: Option<String>,
    },

    /// Export measurements as CSV
    Export {
        #[arg(short, long, default_value = "30d")]
        last: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SeriesCommand {
    List,
    Create {
        name: String,
        #[arg(allow_hyphen_values = true)]
        min: String,
        #[arg(allow_hyphen_values = true)]
        max: String,
        #[arg(short, long)]
        color: Option<String>,
    },
    Update {
        series: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        min: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        max: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a series and all of its measurements
    Delete { series: String },
}

/// Thin wrapper over reqwest that carries the base URL and bearer token
struct Api {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl Api {
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn series(&self) -> anyhow::Result<Vec<Series>> {
        let response = self.request(reqwest::Method::GET, "/series").send().await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn measurements(&self, query: &[(&str, String)]) -> anyhow::Result<Vec<MeasurementRecord>> {
        let response = checked(
            self.request(reqwest::Method::GET, "/measurements")
                .query(query)
                .send()
                .await?,
        )
        .await?;
        Ok(response.json().await?)
    }

    /// Resolve a series by id or case-insensitive name
    async fn find_series(&self, key: &str) -> anyhow::Result<Series> {
        let all = self.series().await?;
        let id = key.trim().parse::<i64>().ok().map(SeriesId);
        all.into_iter()
            .find(|s| Some(s.id) == id || s.name.eq_ignore_ascii_case(key.trim()))
            .with_context(|| format!("No series named {:?}", key))
    }

    async fn series_ids(&self, keys: &[String]) -> anyhow::Result<String> {
        let mut ids = Vec::with_capacity(keys.len());
        for key in keys.iter().flat_map(|k| k.split(',')) {
            ids.push(self.find_series(key).await?.id.0.to_string());
        }
        Ok(ids.join(","))
    }
}

/// Pass successful responses through, turn the rest into an error carrying
/// the server's message
async fn checked(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(text);
    bail!("Request failed ({}): {}", status, message)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    use reqwest::Method;

    let mut api = Api {
        http: reqwest::Client::new(),
        base: cli.api_url.trim_end_matches('/').to_string(),
        token: cli
            .token
            .clone()
            .or_else(|| std::env::var("GAUGEBOARD_TOKEN").ok()),
    };

    match cli.command {
        Commands::Register { username, password } => {
            let body = serde_json::json!({ "username": username, "password": password });
            let response =
                checked(api.request(Method::POST, "/users/register").json(&body).send().await?)
                    .await?;
            print_session(response.json().await?);
        }

        Commands::Login { username, password } => {
            let body = serde_json::json!({ "username": username, "password": password });
            let response =
                checked(api.request(Method::POST, "/users/login").json(&body).send().await?)
                    .await?;
            print_session(response.json().await?);
        }

        Commands::Guest => {
            let response = checked(api.request(Method::POST, "/users/guest").send().await?).await?;
            print_session(response.json().await?);
        }

        Commands::Password { old, new } => {
            let body = serde_json::json!({ "old_password": old, "new_password": new });
            checked(api.request(Method::PUT, "/users/password").json(&body).send().await?).await?;
            println!("Password changed");
        }

        Commands::Series { action } => match action {
            SeriesCommand::List => {
                let series = api.series().await?;
                match cli.format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&series)?),
                    "csv" => {
                        let mut writer = csv::Writer::from_writer(std::io::stdout());
                        writer.write_record(["id", "name", "min_value", "max_value", "color"])?;
                        for s in &series {
                            writer.write_record([
                                s.id.0.to_string(),
                                s.name.clone(),
                                s.min_value.to_string(),
                                s.max_value.to_string(),
                                s.color.clone(),
                            ])?;
                        }
                        writer.flush()?;
                    }
                    _ if series.is_empty() => {
                        println!("No series defined yet.");
                        println!();
                        println!("Create your first series with:");
                        println!("  gaugeboard-cli series create Temperature -20 50");
                    }
                    _ => {
                        println!("{:<6} {:<20} {:>10} {:>10}  {}", "ID", "Name", "Min", "Max", "Color");
                        println!("{}", "-".repeat(60));
                        for s in series {
                            println!(
                                "{:<6} {:<20} {:>10} {:>10}  {}",
                                s.id, s.name, s.min_value, s.max_value, s.color
                            );
                        }
                    }
                }
            }
            SeriesCommand::Create {
                name,
                min,
                max,
                color,
            } => {
                let body = serde_json::json!({
                    "name": name,
                    "min_value": parse_number("min_value", &min)?,
                    "max_value": parse_number("max_value", &max)?,
                    "color": color,
                });
                let response =
                    checked(api.request(Method::POST, "/series").json(&body).send().await?)
                        .await?;
                let series: Series = response.json().await?;
                println!(
                    "Created series {} ({}) [{} .. {}]",
                    series.name, series.id, series.min_value, series.max_value
                );
            }
            SeriesCommand::Update {
                series,
                name,
                min,
                max,
                color,
            } => {
                let target = api.find_series(&series).await?;
                let mut body = serde_json::Map::new();
                if let Some(name) = name {
                    body.insert("name".into(), name.into());
                }
                if let Some(min) = min {
                    body.insert("min_value".into(), parse_number("min_value", &min)?.into());
                }
                if let Some(max) = max {
                    body.insert("max_value".into(), parse_number("max_value", &max)?.into());
                }
                if let Some(color) = color {
                    body.insert("color".into(), color.into());
                }
                if body.is_empty() {
                    println!("Nothing to change");
                    return Ok(());
                }
                let response = checked(
                    api.request(Method::PUT, &format!("/series/{}", target.id))
                        .json(&body)
                        .send()
                        .await?,
                )
                .await?;
                let updated: Series = response.json().await?;
                println!(
                    "Updated series {} ({}) [{} .. {}]",
                    updated.name, updated.id, updated.min_value, updated.max_value
                );
            }
            SeriesCommand::Delete { series } => {
                let target = api.find_series(&series).await?;
                let response = checked(
                    api.request(Method::DELETE, &format!("/series/{}", target.id))
                        .send()
                        .await?,
                )
                .await?;
                let deleted: serde_json::Value = response.json().await?;
                println!(
                    "Deleted series {} and {} measurements",
                    target.name,
                    deleted["measurements_removed"].as_u64().unwrap_or(0)
                );
            }
        },

        Commands::Log {
            series,
            value,
            time,
        } => {
            let target = api.find_series(&series).await?;
            let value = parse_number("value", &value)?;
            let timestamp = time.as_deref().map(parse_instant).transpose()?;

            let body = serde_json::json!({
                "value": value,
                "series_id": target.id,
                "timestamp": timestamp,
            });
            let response =
                checked(api.request(Method::POST, "/measurements").json(&body).send().await?)
                    .await?;
            let logged: serde_json::Value = response.json().await?;
            println!(
                "Logged {}: {} at {}",
                target.name,
                value,
                logged["timestamp"]
                    .as_i64()
                    .map(format_instant)
                    .unwrap_or_else(|| "unknown".to_string())
            );
        }

        Commands::Edit {
            id,
            value,
            time,
            series,
        } => {
            let records = api.measurements(&[]).await?;
            let Some(record) = records.into_iter().find(|r| r.id.0 == id) else {
                bail!("No measurement with id {}", id);
            };

            let table = build_table(std::slice::from_ref(&record), Highlight::none());
            let Some(row) = table.rows.first() else {
                bail!("No measurement with id {}", id);
            };
            let mut draft = EditDraft::from_row(row);
            if let Some(value) = value {
                draft.value = value;
            }
            if let Some(time) = time {
                draft.timestamp = time;
            }
            if let Some(series) = series {
                draft.series_id = api.find_series(&series).await?.id;
            }

            let patch = draft.commit()?;
            if patch.is_empty() {
                println!("Nothing to change");
                return Ok(());
            }
            checked(
                api.request(Method::PUT, &format!("/measurements/{}", id))
                    .json(&patch)
                    .send()
                    .await?,
            )
            .await?;
            println!("Updated measurement {}", id);
        }

        Commands::Remove { id } => {
            checked(
                api.request(Method::DELETE, &format!("/measurements/{}", id))
                    .send()
                    .await?,
            )
            .await?;
            println!("Deleted measurement {}", id);
        }

        Commands::Simulate {
            series,
            interval,
            count,
            user,
            password,
        } => {
            if let (Some(username), Some(password)) = (user, password) {
                let body = serde_json::json!({ "username": username, "password": password });
                let response =
                    checked(api.request(Method::POST, "/users/login").json(&body).send().await?)
                        .await?;
                let session: serde_json::Value = response.json().await?;
                api.token = session["token"].as_str().map(str::to_string);
            }

            let period = parse_duration(&interval)?
                .to_std()
                .context("interval must be positive")?;
            let mut targets = Vec::new();
            if series.is_empty() {
                targets = api.series().await?;
            } else {
                for key in &series {
                    targets.push(api.find_series(key).await?);
                }
            }
            if targets.is_empty() {
                bail!("No series to simulate");
            }

            println!(
                "Simulating {} series every {} (Ctrl-C to stop)",
                targets.len(),
                interval
            );
            let mut rng = rand::rng();
            let mut ticker = tokio::time::interval(period);
            let mut rounds = 0usize;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tokio::signal::ctrl_c() => break,
                }
                for target in &targets {
                    let value = random_reading(&mut rng, target.min_value, target.max_value);
                    let body = serde_json::json!({ "value": value, "series_id": target.id });
                    match api
                        .request(Method::POST, "/measurements")
                        .json(&body)
                        .send()
                        .await
                    {
                        Ok(resp) if resp.status().is_success() => {
                            println!("{:<20} {:>10.2}", target.name, value)
                        }
                        Ok(resp) => eprintln!("{}: rejected ({})", target.name, resp.status()),
                        Err(e) => eprintln!("{}: {}", target.name, e),
                    }
                }
                rounds += 1;
                if count.is_some_and(|n| rounds >= n) {
                    break;
                }
            }
            println!("Posted {} rounds", rounds);
        }

        Commands::Chart { last, series } => {
            let start = Utc::now() - parse_duration(&last)?;
            let mut query = vec![("start", start.timestamp_millis().to_string())];
            if !series.is_empty() {
                query.push(("series", api.series_ids(&series).await?));
            }
            let response = checked(
                api.request(Method::GET, "/views/chart")
                    .query(&query)
                    .send()
                    .await?,
            )
            .await?;
            let chart: serde_json::Value = response.json().await?;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&chart)?),
                "csv" => print_chart_csv(&chart)?,
                _ => print_chart(&chart),
            }
        }

        Commands::Table {
            last,
            series,
            highlight,
        } => {
            let start = Utc::now() - parse_duration(&last)?;
            let mut query = vec![("start", start.timestamp_millis().to_string())];
            if !series.is_empty() {
                query.push(("series", api.series_ids(&series).await?));
            }
            if let Some(highlight) = highlight {
                query.push(("highlight", parse_instant(&highlight)?.to_string()));
            }
            let response = checked(
                api.request(Method::GET, "/views/table")
                    .query(&query)
                    .send()
                    .await?,
            )
            .await?;
            let table: serde_json::Value = response.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                print_table(&table);
            }
        }

        Commands::Export { last, output } => {
            let start = Utc::now() - parse_duration(&last)?;
            let mut records = api
                .measurements(&[
                    ("start", start.timestamp_millis().to_string()),
                    ("order", "asc".to_string()),
                ])
                .await?;
            records.sort_by_key(|r| (r.timestamp, r.id));

            let sink: Box<dyn std::io::Write> = match &output {
                Some(path) => Box::new(
                    std::fs::File::create(path)
                        .with_context(|| format!("creating {:?}", path))?,
                ),
                None => Box::new(std::io::stdout()),
            };
            let mut writer = csv::Writer::from_writer(sink);
            writer.write_record(["id", "timestamp", "series", "value"])?;
            for r in &records {
                writer.write_record([
                    r.id.0.to_string(),
                    format_instant(r.timestamp),
                    r.series_name.clone(),
                    r.value.to_string(),
                ])?;
            }
            writer.flush()?;

            if let Some(path) = output {
                println!("Exported {} measurements to {:?}", records.len(), path);
            }
        }

        Commands::Status => {
            let response = api.http.get(format!("{}/health", api.base)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    println!("Gaugeboard v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!(
                        "Storage:    {}",
                        health["storage"].as_str().unwrap_or("unknown")
                    );
                    println!();
                    println!("Series:       {}", health["series"].as_u64().unwrap_or(0));
                    println!(
                        "Measurements: {}",
                        health["measurements"].as_u64().unwrap_or(0)
                    );

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => bail!("API returned error: {}", resp.status()),
                Err(e) => {
                    eprintln!("Cannot connect to Gaugeboard API at {}", api.base);
                    eprintln!();
                    eprintln!("Make sure the Gaugeboard API server is running:");
                    eprintln!("  cargo run --bin gaugeboard-api");
                    return Err(e.into());
                }
            }
        }

        Commands::Config { output } => {
            let config = gaugeboard::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn print_session(session: serde_json::Value) {
    let token = session["token"].as_str().unwrap_or_default();
    let role = if session["is_guest"].as_bool().unwrap_or(false) {
        "guest (read-only)"
    } else {
        "user"
    };
    println!(
        "Signed in as {} [{}]",
        session["username"].as_str().unwrap_or("-"),
        role
    );
    println!();
    println!("  export GAUGEBOARD_TOKEN={}", token);
}

fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim().to_lowercase();
    let amount = |digits: &str| -> anyhow::Result<i64> {
        digits
            .trim()
            .parse()
            .with_context(|| format!("Invalid duration: {}. Use: 500ms, 3s, 5m, 12h, 7d, 4w", s))
    };

    if let Some(ms) = s.strip_suffix("ms") {
        Ok(Duration::milliseconds(amount(ms)?))
    } else if let Some(secs) = s.strip_suffix('s') {
        Ok(Duration::seconds(amount(secs)?))
    } else if let Some(mins) = s.strip_suffix('m') {
        Ok(Duration::minutes(amount(mins)?))
    } else if let Some(hours) = s.strip_suffix('h') {
        Ok(Duration::hours(amount(hours)?))
    } else if let Some(days) = s.strip_suffix('d') {
        Ok(Duration::days(amount(days)?))
    } else if let Some(weeks) = s.strip_suffix('w') {
        Ok(Duration::weeks(amount(weeks)?))
    } else {
        bail!("Invalid duration: {}. Use: 500ms, 3s, 5m, 12h, 7d, 4w", s)
    }
}

fn format_duration(seconds: u64) -> String {
    match seconds {
        0..=59 => format!("{}s", seconds),
        60..=3599 => format!("{}m {}s", seconds / 60, seconds % 60),
        3600..=86399 => format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60),
        _ => format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600),
    }
}

fn print_warnings(view: &serde_json::Value) {
    for warning in view["warnings"].as_array().into_iter().flatten() {
        match warning["kind"].as_str() {
            Some("reversed_window") => {
                eprintln!("warning: end time precedes start time; no measurements can match")
            }
            _ => eprintln!("warning: {}", warning),
        }
    }
}

/// (series id key, column name) pairs in chart order
fn chart_columns(chart: &serde_json::Value) -> Vec<(String, String)> {
    chart["columns"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|c| {
            (
                c["series_id"].to_string(),
                c["name"].as_str().unwrap_or("-").to_string(),
            )
        })
        .collect()
}

fn print_chart(chart: &serde_json::Value) {
    print_warnings(chart);
    let rows = chart["rows"].as_array().cloned().unwrap_or_default();
    if rows.is_empty() {
        println!("No data for the selected time range");
        return;
    }

    let columns = chart_columns(chart);
    let by_date = chart["recommended_tick_granularity"] == "date";
    let label = |ts: i64| {
        let format = if by_date { "%Y-%m-%d" } else { "%H:%M" };
        chrono::DateTime::from_timestamp_millis(ts)
            .map(|dt| dt.format(format).to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    print!("{:<12}", if by_date { "Date" } else { "Time" });
    for (_, name) in &columns {
        print!(" | {:<12}", name);
    }
    println!();
    println!("{}", "-".repeat(14 + columns.len() * 15));

    for row in rows {
        print!("{:<12}", label(row["timestamp"].as_i64().unwrap_or(0)));
        for (key, _) in &columns {
            let val = row["values"][key.as_str()]
                .as_f64()
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string());
            print!(" | {:<12}", val);
        }
        println!();
    }
}

fn print_chart_csv(chart: &serde_json::Value) -> anyhow::Result<()> {
    let columns = chart_columns(chart);
    let mut writer = csv::Writer::from_writer(std::io::stdout());

    let mut header = vec!["timestamp".to_string()];
    header.extend(columns.iter().map(|(_, name)| name.clone()));
    writer.write_record(&header)?;

    for row in chart["rows"].as_array().into_iter().flatten() {
        let mut record = vec![row["timestamp"].as_i64().unwrap_or(0).to_string()];
        for (key, _) in &columns {
            record.push(
                row["values"][key.as_str()]
                    .as_f64()
                    .map(|v| format!("{:.2}", v))
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_table(table: &serde_json::Value) {
    print_warnings(table);
    let rows = table["rows"].as_array().cloned().unwrap_or_default();
    if rows.is_empty() {
        println!("No data for the selected time range");
        return;
    }

    println!("  {:<6} {:<26} {:<20} {:>10}", "ID", "Time", "Series", "Value");
    println!("{}", "-".repeat(68));
    for row in rows {
        let marker = if row["highlighted"].as_bool().unwrap_or(false) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<6} {:<26} {:<20} {:>10}",
            marker,
            row["id"],
            row["timestamp"]
                .as_i64()
                .map(format_instant)
                .unwrap_or_else(|| "-".to_string()),
            row["series_name"].as_str().unwrap_or("-"),
            row["value"]
        );
    }
}
