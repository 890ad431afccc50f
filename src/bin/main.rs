use fpna_copilot::{CopilotConfig, LedgerCache, Planner};
use fpna_copilot::tools::charts::FigureBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        eprintln!("usage: fpna-ask <question>");
        eprintln!("  e.g. fpna-ask \"What was June 2025 revenue vs budget?\"");
        std::process::exit(2);
    }

    let config = CopilotConfig::from_env()?;
    info!(data_dir = %config.data_dir.display(), "FP&A copilot starting");

    let planner = Planner::from_config(Box::new(FigureBuilder), &config);
    let cache = LedgerCache::new(&config.data_dir);

    match planner.answer_cached(&query, &cache) {
        Ok(answer) => {
            println!("{}", answer.text);
            if let Some(figure) = &answer.figure {
                println!("\n{}", serde_json::to_string_pretty(figure)?);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Could not answer: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
