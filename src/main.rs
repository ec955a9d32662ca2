//! Weatheria CLI
//!
//! Terminal front end for the Weatheria client:
//! - Log in and out
//! - Show the home, dashboard, history, day-detail and map screens
//! - Download stored days and report floods

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use weatheria::config::{generate_default_config, Config};
use weatheria::views::{
    DashboardView, DayDetailView, HistoryView, HomeView, LoginSubmission, MapView, ReportOutcome,
    MISSING,
};
use weatheria::{App, ConsoleNotifier, Route};

#[derive(Parser)]
#[command(name = "weatheria")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Weather-station dashboard client")]
#[command(long_about = "Weatheria shows live conditions, the rain forecast and stored history\nfrom the station, and lets you report floods on the map.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        /// User name (prompted if missing)
        #[arg(short, long)]
        username: Option<String>,
        /// Password (prompted if missing)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Drop the stored session
    Logout,

    /// Show session status
    Status,

    /// Open a route (e.g. /home, /dashboard, /day-detail/2025-11-10)
    Open {
        path: String,
    },

    /// Current conditions and forecast
    Home,

    /// Live station readings
    Dashboard {
        /// Keep refreshing until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// Stored days
    History {
        /// Download the day with this id
        #[arg(short, long)]
        download: Option<usize>,
    },

    /// One stored day (default: today)
    Day {
        /// Date as YYYY-MM-DD
        date: Option<String>,
        /// Save the day as CSV
        #[arg(short, long)]
        download: bool,
    },

    /// Flood map
    Map {
        #[command(subcommand)]
        action: MapAction,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum MapAction {
    /// List current markers
    Markers,
    /// Report a flood, optionally at a given point
    Report {
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&config);

    if let Commands::Config { output } = &cli.command {
        let text = generate_default_config();
        match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &text)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", text),
        }
        return Ok(());
    }

    let app = App::new(config, Arc::new(ConsoleNotifier))?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Login { username, password } => {
            let username = match username {
                Some(u) => u,
                None => prompt("Usuario")?,
            };
            let password = match password {
                Some(p) => p,
                None => prompt("Contraseña")?,
            };

            match app.login_screen().submit(&username, &password).await {
                LoginSubmission::LoggedIn => {
                    println!("Sesión iniciada como {}", username);
                    render(&app, app.router.current(), json).await?;
                }
                _ => std::process::exit(1),
            }
        }

        Commands::Logout => {
            app.session.logout();
            println!("Sesión cerrada");
        }

        Commands::Status => {
            println!("Weatheria v{}", env!("CARGO_PKG_VERSION"));
            println!();
            match app.session.current_user() {
                Some(user) if app.session.is_authenticated() => println!("Session: {}", user),
                _ => println!("Session: not logged in"),
            }
            println!("API:     {}", app.config.api.base_url);
            println!("Data:    {}", app.config.data.base_url);
            println!("History: {:?}", app.config.history.source);
        }

        Commands::Open { path } => {
            let route = app.open(&path);
            render(&app, route, json).await?;
        }

        Commands::Home => {
            let route = app.open("/home");
            render(&app, route, json).await?;
        }

        Commands::Dashboard { watch } => {
            let route = app.open("/dashboard");
            if watch && route == Route::Dashboard {
                watch_dashboard(&app, json).await?;
            } else {
                render(&app, route, json).await?;
            }
        }

        Commands::History { download } => {
            let route = app.open("/historial");
            if route != Route::Historial {
                return render(&app, route, json).await;
            }

            let screen = app.history_screen();
            let view = screen.activate().await;
            match download {
                Some(id) => match view.record(id) {
                    Some(record) => match screen.download(record).await {
                        Some(path) => println!("Descargado en {}", path.display()),
                        None => std::process::exit(1),
                    },
                    None => {
                        eprintln!("No day with id {}", id);
                        std::process::exit(1);
                    }
                },
                None => output(&view, json, print_history)?,
            }
        }

        Commands::Day { date, download } => {
            let path = match &date {
                Some(d) => format!("/day-detail/{}", d),
                None => "/day-detail".to_string(),
            };
            let route = app.open(&path);
            let screen = app.day_detail_screen();
            let view = match &route {
                Route::DayDetail(id) => screen.activate(id.as_deref()).await,
                other => return render(&app, other.clone(), json).await,
            };
            output(&view, json, print_day)?;

            if download {
                match view.date {
                    Some(date) => match screen.download(date).await {
                        Some(path) => println!("Descargado en {}", path.display()),
                        None => std::process::exit(1),
                    },
                    None => std::process::exit(1),
                }
            }
        }

        Commands::Map { action } => {
            app.open("/mapa");
            let screen = app.map_screen();
            screen.activate().await;

            match action {
                MapAction::Markers => output(&screen.view(), json, print_map)?,
                MapAction::Report { lat, lng } => {
                    if let (Some(lat), Some(lng)) = (lat, lng) {
                        screen.click(lat, lng);
                    }
                    match screen.report_flood().await {
                        ReportOutcome::Sent => output(&screen.view(), json, print_map)?,
                        ReportOutcome::Failed | ReportOutcome::Busy => std::process::exit(1),
                    }
                }
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weatheria={}", config.logging.level)));
    let json = config.logging.format == "json";

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Show whatever screen a route landed on
async fn render(app: &App, route: Route, json: bool) -> anyhow::Result<()> {
    match route {
        Route::Login => {
            println!("Inicia sesión para continuar:");
            println!("  weatheria login");
        }
        Route::Root | Route::Home => {
            let view = app.home_screen().activate().await;
            output(&view, json, print_home)?;
        }
        Route::Dashboard => {
            let screen = app.dashboard_screen();
            screen.refresh().await;
            output(&screen.view(), json, print_dashboard)?;
        }
        Route::Historial => {
            let view = app.history_screen().activate().await;
            output(&view, json, print_history)?;
        }
        Route::DayDetail(id) => {
            let view = app.day_detail_screen().activate(id.as_deref()).await;
            output(&view, json, print_day)?;
        }
        Route::Mapa => {
            let screen = app.map_screen();
            screen.activate().await;
            output(&screen.view(), json, print_map)?;
        }
    }
    Ok(())
}

async fn watch_dashboard(app: &App, json: bool) -> anyhow::Result<()> {
    let screen = app.dashboard_screen();
    let mut updates = screen.subscribe();
    let handle = screen.activate();
    tracing::info!("Refreshing every {:?}, Ctrl+C to stop", screen.interval());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = updates.borrow_and_update().clone();
                output(&view, json, print_dashboard)?;
            }
        }
    }

    handle.deactivate();
    Ok(())
}

fn output<T: Serialize>(view: &T, json: bool, table: fn(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        table(view);
    }
    Ok(())
}

fn print_home(view: &HomeView) {
    println!("{}", view.current_date);
    println!("{}", view.location);
    println!();
    println!("{} {}  {}", view.icon, view.current_temp, view.description);

    if !view.forecast.is_empty() {
        println!();
        for tile in &view.forecast {
            println!("  {:<4} {} {:>5}", tile.day, tile.icon, tile.temp);
        }
    }
}

fn print_dashboard(view: &DashboardView) {
    println!("{}", view.last_update);
    for card in &view.cards {
        println!();
        println!("{} {}", card.icon, card.title);
        for detail in &card.details {
            println!("   {}", detail);
        }
    }

    if !view.general.is_empty() {
        println!();
        println!("{:<26} {}", "Dato", "Valor");
        println!("{}", "-".repeat(40));
        for row in &view.general {
            println!("{:<26} {}", row.label, row.value);
        }
    }
}

fn print_history(view: &HistoryView) {
    if let Some(status) = &view.status {
        println!("{}", status);
        return;
    }

    println!("{}", view.current_month);
    println!();
    println!("{:<4} {:<12} {}", "ID", "Fecha", "");
    println!("{}", "-".repeat(50));
    for day in &view.days {
        println!("{:<4} {:<12} {}", day.id, day.date, day.date_label);
    }
}

fn print_day(view: &DayDetailView) {
    println!("{}", view.selected_date);
    if let Some(status) = &view.status {
        println!("{}", status);
        return;
    }

    for card in &view.cards {
        println!();
        println!(
            "{} {}  {}",
            card.icon,
            card.title,
            card.main_value.as_deref().unwrap_or(MISSING)
        );
        for detail in &card.details {
            println!("   {}", detail);
        }
    }

    println!();
    for row in &view.general {
        println!("{:<26} {}", row.label, row.value);
    }
}

fn print_map(view: &MapView) {
    println!("{} {}  {}", view.icon, view.current_temp, view.description);
    println!(
        "Centro: {:.4}, {:.4}  zoom {}",
        view.center.lat, view.center.lng, view.zoom
    );
    println!();

    if view.markers.is_empty() {
        println!("Sin reportes recientes.");
        return;
    }
    for marker in &view.markers {
        println!(
            "  {:.4}, {:.4}  {}",
            marker.position.lat, marker.position.lng, marker.title
        );
    }
}
