use std::io::{self, BufRead, Write};

use clap::Parser;
use tracing::info;

use medroute::build_agent;
use medroute::config::{Config, ExhaustedPolicy};

/// Ask a medical question; get a cited summary from PubMed or the web.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Question to answer. Read from stdin when omitted.
    query: Option<String>,

    /// Opaque correlation id for the checkpoint trail
    #[arg(long, default_value = "1")]
    thread_id: String,

    /// Maximum Refine → Search cycles (overrides MEDROUTE_MAX_REFINEMENTS)
    #[arg(long)]
    max_refinements: Option<u32>,

    /// Results requested from each provider (overrides MEDROUTE_MAX_RESULTS)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=20))]
    max_results: Option<u8>,

    /// Re-run classification after each refinement
    #[arg(long)]
    reclassify: bool,

    /// Fail instead of summarizing when the refinement budget is spent
    #[arg(long)]
    fail_on_exhausted: bool,

    /// Print the workflow steps taken to stderr
    #[arg(long)]
    show_steps: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medroute=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(n) = cli.max_refinements {
        config.workflow.max_refinements = n;
    }
    if let Some(n) = cli.max_results {
        config.workflow.max_results = n;
    }
    if cli.reclassify {
        config.workflow.reclassify_after_refine = true;
    }
    if cli.fail_on_exhausted {
        config.workflow.on_exhausted = ExhaustedPolicy::Fail;
    }

    let query = match cli.query {
        Some(q) => q,
        None => read_query()?,
    };

    let agent = build_agent(&config)?;
    info!(model = %config.llm.model, "medical decision agent ready");

    let result = agent.run(&query, &cli.thread_id).await;

    if cli.show_steps {
        for checkpoint in agent.checkpoints().history(&cli.thread_id) {
            eprintln!(
                "[{}] query={:?} results={} chars",
                checkpoint.step,
                checkpoint.state.query,
                checkpoint.state.results.chars().count()
            );
        }
    }

    let answer = match result {
        Ok(answer) => answer,
        Err(e) => {
            tracing::error!("run failed: {e}");
            std::process::exit(1);
        }
    };
    println!("\n--- Answer ---\n");
    println!("{answer}");
    Ok(())
}

fn read_query() -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "Enter your medical question: ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
