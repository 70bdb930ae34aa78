pub mod types;
pub mod config;
pub mod data;
pub mod analytics;
pub mod insights;
pub mod maps;
pub mod render;
pub mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the overview metrics without starting the server
    Summary {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            tracing::info!("Serving dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;
            server::start_server(app_config).await?;
        }
        Commands::Summary { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let top = app_config.display.top_neighborhoods;
            let datasets = tokio::task::spawn_blocking(move || data::load_datasets(&app_config)).await??;
            print!("{}", summary_text(&datasets, top));
        }
    }

    Ok(())
}

fn summary_text(datasets: &types::Datasets, top_neighborhoods: usize) -> String {
    let mei = analytics::mei_summary(&datasets.businesses.records);
    let transport = analytics::transport_summary(&datasets.bus_stops.records);
    let top = analytics::top_n(&datasets.businesses.records, |b| b.neighborhood.as_str(), top_neighborhoods);

    let mut out = String::new();
    out.push_str(&format!("Bairros:          {}\n", render::format_count(datasets.neighborhoods.len())));
    out.push_str(&format!("Empresas:         {}\n", render::format_count(mei.total)));
    out.push_str(&format!("MEIs:             {} ({:.1}%)\n", render::format_count(mei.mei), mei.mei_percentage));
    out.push_str(&format!("Pontos de ônibus: {}\n", render::format_count(transport.stops)));
    out.push_str(&format!("Linhas:           {}\n", render::format_count(transport.lines)));
    out.push_str(&format!("Média pontos/linha: {:.1}\n\n", transport.stops_per_line));
    out.push_str(&format!("Top {} bairros por número de empresas:\n", top.len()));
    for (i, (name, count)) in top.iter().enumerate() {
        out.push_str(&format!("{:>3}. {:<40} {:>8}\n", i + 1, name, render::format_count(*count)));
    }
    out
}
