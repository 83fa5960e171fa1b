//! Run describe and query operations against an org from the command line.
//!
//! ```sh
//! sf-ops state.json --describe Account --query "SELECT Id, Name FROM Account LIMIT 5"
//! RUST_LOG=sf_ops=debug sf-ops state.json --fake --query "SELECT Id FROM Contact"
//! ```
//!
//! The state file is the job's initial state:
//! `{"configuration": {"loginUrl", "username", "password", "securityToken"}, "data": {}}`.
//! The final state is printed to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use sf_ops::adaptor::{
    describe, execute, query, BoxedOperation, Configuration, Connector, FakeConnection, Session,
};

#[derive(Parser)]
#[command(name = "sf-ops")]
#[command(about = "Run Salesforce operations over a job state")]
struct Cli {
    /// Path to the initial state JSON
    state: PathBuf,

    /// Describe an sObject (repeatable)
    #[arg(long, value_name = "SOBJECT")]
    describe: Vec<String>,

    /// Run a SOQL query (repeatable)
    #[arg(long, value_name = "SOQL")]
    query: Vec<String>,

    /// Use the in-memory connection instead of an org
    #[arg(long)]
    fake: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("sf_ops=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let content = std::fs::read_to_string(&cli.state)
        .with_context(|| format!("reading {}", cli.state.display()))?;
    let initial: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", cli.state.display()))?;

    let mut operations: Vec<BoxedOperation<Session>> = Vec::new();
    for sobject in cli.describe {
        operations.push(Box::new(describe(sobject)));
    }
    for soql in cli.query {
        operations.push(Box::new(query(soql)));
    }
    info!(operations = operations.len(), fake = cli.fake, "Running job");

    let mut job = execute(operations);
    if cli.fake {
        let connector: Connector = Arc::new(|_: &Configuration| -> sf_ops::adaptor::Result<Session> {
            Ok(Arc::new(FakeConnection::new()) as Session)
        });
        job = job.with_connector(connector);
    }

    let output = job.run_json(initial).await.context("job failed")?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
