//! `riskgate serve` and `riskgate score`

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::args::{ScoreArgs, ServeArgs};
use crate::pipeline::ArtifactStore;
use crate::scoring::{DecisionPolicy, ScoringService};
use crate::server;

pub fn run_serve(args: &ServeArgs) -> Result<()> {
    let policy = DecisionPolicy::new(args.threshold)?;
    let service: ScoringService = ScoringService::from_store(ArtifactStore::new(&args.artifacts), policy);

    if args.lazy {
        info!(artifacts = %args.artifacts.display(), "Model will load on first request");
    } else {
        service
            .ensure_loaded()
            .context("Cannot start the scoring server")?;
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server::serve(Arc::new(service), addr))
}

pub fn run_score(args: &ScoreArgs) -> Result<()> {
    let policy = DecisionPolicy::new(args.threshold)?;
    let service: ScoringService = ScoringService::from_store(ArtifactStore::new(&args.artifacts), policy);

    let body = match &args.request {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };

    let response = service.score_bytes(&body)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
