use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::info;

use ecolink_pipeline::{
    builtin_sources, write_export, FileSourceProvider, InProcessStore, Pipeline,
};
use ecolink_resolve::HttpSparqlClient;

fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("ecolink=info,ecolink_pipeline=info,ecolink_resolve=info,ecolink_geo=info,ecolink_frame=info")
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact());

    let _ = tracing::dispatcher::set_global_default(tracing::Dispatch::new(subscriber));
}

#[derive(Parser)]
#[command(name = "ecolink", about = "Integrate boundary and ecoregion datasets")]
struct Args {
    /// Directory of extracted source dumps (one <source-id>.tsv each).
    #[arg(long)]
    sources_dir: PathBuf,

    /// Output path for the region export JSON.
    #[arg(long, default_value = "regions.json")]
    out: PathBuf,

    /// SPARQL endpoint of the knowledge base.
    #[arg(long, default_value = "https://query.wikidata.org/sparql")]
    endpoint: String,

    /// Remote request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse();
    let start = Instant::now();

    let kb =
        HttpSparqlClient::with_timeout(&args.endpoint, Duration::from_secs(args.timeout_secs))?;

    let pipeline = Pipeline::new(
        FileSourceProvider::new(&args.sources_dir),
        InProcessStore::new(),
        Arc::new(kb),
        builtin_sources(),
    );

    let output = pipeline.run().await?;

    let file = std::fs::File::create(&args.out)?;
    write_export(std::io::BufWriter::new(file), &output.export)?;

    info!(
        out = %args.out.display(),
        regions = output.export.len(),
        summary = %serde_json::to_string(&output.summary)?,
        elapsed_secs = format!("{:.1}", start.elapsed().as_secs_f64()).as_str(),
        "run complete"
    );
    Ok(())
}
