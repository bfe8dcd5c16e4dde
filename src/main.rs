use clap::Parser;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use portti::config::Config;
use portti::gate::{select_strategy, Gate, KubePodSource, Outcome};
use portti::server::{bind_discovery, serve_discovery};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    if let Err(reason) = config.validate() {
        error!(reason = %reason, "Invalid configuration");
        anyhow::bail!("invalid configuration: {}", reason);
    }

    let strategy = select_strategy(&config);
    info!(
        namespace = %config.namespace,
        selector = config.selector.as_deref().unwrap_or("<none>"),
        quorum = config.wait_for,
        timeout = ?config.timeout,
        mode = ?config.mode,
        strategy = strategy.name(),
        "Starting readiness gate"
    );

    // Discovery endpoint for sibling gates. An unusable port is fatal;
    // a failure after bind is not, the gate can still reach its own verdict
    let listener = bind_discovery(config.port).await?;
    tokio::spawn(async move {
        if let Err(e) = serve_discovery(listener).await {
            warn!(error = %e, "Discovery server failed");
        }
    });

    let client = match Client::try_default().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to create Kubernetes client");
            return Err(e.into());
        }
    };
    info!("Connected to Kubernetes cluster");

    let pods: Api<Pod> = Api::namespaced(client, &config.namespace);
    let source = KubePodSource::new(pods, config.selector.clone());
    let gate = Gate::new(source, strategy, &config);

    match gate.run().await {
        Ok(Outcome::Satisfied { ready }) => {
            info!(ready, quorum = config.wait_for, "Quorum reached, opening the gate");
            // Sibling gates mid-probe still need an answer from this pod;
            // keep the discovery endpoint up briefly before exiting
            tokio::time::sleep(config.linger).await;
            info!("Gate open");
            Ok(())
        }
        Ok(Outcome::TimedOut { ready }) => {
            error!(
                ready,
                quorum = config.wait_for,
                timeout = ?config.timeout,
                "Timed out waiting for pod quorum"
            );
            anyhow::bail!(
                "timed out after {:?} with {}/{} pods ready",
                config.timeout,
                ready,
                config.wait_for
            )
        }
        Err(e) => {
            error!(error = %e, "Lost the pod source");
            Err(e.into())
        }
    }
}
