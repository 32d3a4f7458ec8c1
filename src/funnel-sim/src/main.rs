//! Funnel Simulator: what-if conversion projections per market.
//!
//! `serve` runs the HTTP API; `project`, `report` and `presets` print
//! projections straight to the terminal.

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use funnel_api::ApiServer;
use funnel_core::config::AppConfig;
use funnel_core::{FunnelParameters, MarketId, ParameterPatch, PresetName, StageKind, TracingSink};
use funnel_engine::FunnelProjection;
use funnel_presets::PresetLibrary;
use funnel_reporting::FunnelReport;
use funnel_store::{ParameterStore, SimulationSession};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "funnel-sim")]
#[command(about = "Funnel conversion what-if calculator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Node identifier (overrides config)
        #[arg(long, env = "FUNNEL_SIM__NODE_ID")]
        node_id: Option<String>,

        /// HTTP port (overrides config)
        #[arg(long, env = "FUNNEL_SIM__API__HTTP_PORT")]
        http_port: Option<u16>,

        /// Start the Prometheus exporter
        #[arg(long, default_value_t = false)]
        metrics: bool,
    },

    /// Print the projected funnel for a market
    Project {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Clamp every input to the market's control bounds first
        #[arg(long, default_value_t = false)]
        clamp: bool,

        /// Emit JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print a report snapshot for a market
    Report {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Output format: text, json or csv
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List preset tables
    Presets {
        /// Restrict to one market
        #[arg(short, long)]
        market: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ScenarioArgs {
    /// Market code: CH, DE, UK or RO
    #[arg(short, long, default_value = "CH")]
    market: String,

    /// Preset to start from
    #[arg(short, long, default_value = "realistic")]
    preset: String,

    /// Total views
    #[arg(long)]
    views: Option<u64>,

    /// Segment share, percent
    #[arg(long)]
    share: Option<f64>,

    /// Profile visit rate, percent
    #[arg(long)]
    visit: Option<f64>,

    /// Link click rate, percent
    #[arg(long)]
    click: Option<f64>,

    /// Registration rate, percent
    #[arg(long)]
    signup: Option<f64>,

    /// FTD rate, percent
    #[arg(long)]
    ftd: Option<f64>,
}

impl ScenarioArgs {
    fn patch(&self) -> ParameterPatch {
        ParameterPatch {
            total_views: self.views,
            target_share: self.share,
            profile_visit_rate: self.visit,
            link_click_rate: self.click,
            registration_rate: self.signup,
            ftd_rate: self.ftd,
            ..Default::default()
        }
    }

    /// Preset record with the command-line overrides merged on top.
    fn resolve(&self, library: &PresetLibrary) -> anyhow::Result<(MarketId, FunnelParameters)> {
        let market: MarketId = self.market.parse()?;
        let preset: PresetName = self.preset.parse()?;
        let mut params = library.preset(market, preset)?;
        params.merge(&self.patch());
        Ok((market, params))
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "funnel_sim=info,funnel_api=info,tower_http=info".into());
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn load_config() -> AppConfig {
    AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Serve { .. }));

    let library = Arc::new(PresetLibrary::reference());

    match cli.command {
        Commands::Serve {
            node_id,
            http_port,
            metrics,
        } => {
            let mut config = load_config();
            if let Some(node_id) = node_id {
                config.node_id = node_id;
            }
            if let Some(port) = http_port {
                config.api.http_port = port;
            }
            if metrics {
                config.metrics.enabled = true;
            }
            serve(config, library).await?;
        }
        Commands::Project {
            scenario,
            clamp,
            json,
        } => {
            let (market, mut params) = scenario.resolve(&library)?;
            if clamp {
                params = library.bounds(market)?.clamp(&params);
            }
            let projection = FunnelProjection::compute(&params);
            if json {
                println!("{}", serde_json::to_string_pretty(&projection)?);
            } else {
                print_projection(&library, market, &params, &projection)?;
            }
        }
        Commands::Report { scenario, format } => {
            let (market, params) = scenario.resolve(&library)?;
            let report =
                FunnelReport::build(market, library.display_name(market)?, &params, Utc::now());
            match format.as_str() {
                "json" => println!("{}", report.to_json_pretty()?),
                "csv" => print!("{}", report.to_csv()),
                "text" => {
                    println!("# {}", report.file_stem());
                    print!("{}", report.to_text());
                }
                other => anyhow::bail!("unknown report format: {other}"),
            }
        }
        Commands::Presets { market } => {
            let markets = match market {
                Some(m) => vec![m.parse::<MarketId>()?],
                None => library.markets().collect(),
            };
            for market in markets {
                print_presets(&library, market)?;
            }
        }
    }

    Ok(())
}

async fn serve(config: AppConfig, library: Arc<PresetLibrary>) -> anyhow::Result<()> {
    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        default_market = %config.simulation.default_market,
        default_preset = %config.simulation.default_preset,
        "Configuration loaded"
    );

    let session = SimulationSession::new(
        config.simulation.default_market,
        config.simulation.muted,
    )
    .with_sink(Arc::new(TracingSink));
    let store = Arc::new(
        ParameterStore::with_default_preset(library, config.simulation.default_preset)
            .with_sink(session.sink()),
    );
    let session = Arc::new(Mutex::new(session));

    let api_server = ApiServer::new(config.clone(), store, session);

    if config.metrics.enabled {
        if let Err(e) = api_server.start_metrics().await {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    info!("Funnel simulator is ready to serve traffic");
    api_server.start_http().await
}

fn print_projection(
    library: &PresetLibrary,
    market: MarketId,
    params: &FunnelParameters,
    projection: &FunnelProjection,
) -> anyhow::Result<()> {
    println!("{} ({market})", library.display_name(market)?);
    if let Some(preset) = library.active_preset(market, params)? {
        println!("Preset: {preset}");
    }
    let violations = library.bounds(market)?.violations(params);
    if !violations.is_empty() {
        let names: Vec<&str> = violations.iter().map(|s| s.as_str()).collect();
        println!("Outside control bounds: {}", names.join(", "));
    }
    println!("{:<10} {:>14} {:>8} {:>14}", "stage", "input", "rate", "output");
    for stage in &projection.stages {
        println!(
            "{:<10} {:>14} {:>7}% {:>14}",
            stage.kind.as_str(),
            stage.input,
            stage.rate,
            stage.output
        );
    }
    println!(
        "FTDs {} / {} views = {}",
        projection.stage(StageKind::Ftd).output,
        projection.total_views,
        projection.format_efficiency_percent()
    );
    Ok(())
}

fn print_presets(library: &PresetLibrary, market: MarketId) -> anyhow::Result<()> {
    let profile = library.profile(market)?;
    println!("{} ({market})", profile.display_name);
    for preset in profile.presets.iter() {
        let p = &preset.params;
        let label = if preset.label == preset.name.as_str() {
            preset.name.to_string()
        } else {
            format!("{} ({})", preset.name, preset.label)
        };
        println!(
            "  {:<26} views={:<11} share={}% visit={}% click={}% signup={}% ftd={}%",
            label,
            p.total_views,
            p.target_share,
            p.profile_visit_rate,
            p.link_click_rate,
            p.registration_rate,
            p.ftd_rate
        );
    }
    Ok(())
}
