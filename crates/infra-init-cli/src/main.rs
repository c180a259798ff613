mod cli;

use std::process;

use clap::Parser;
use log::{error, info, warn};

use infra_init::backend::{CouchbaseConnector, KafkaAdminConnector};
use infra_init::logging::init_logging;
use infra_init::{CancelToken, ConfigLoader, InitRunner, InitSummary, Service};

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_format, &cli.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    info!("Starting infra-init");

    let services = match cli.services() {
        Ok(services) => services,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping after the current step");
        handler_token.cancel();
    }) {
        warn!("Failed to install signal handler: {}", e);
    }

    let runner = InitRunner::new(ConfigLoader::new(cli.config_dir.clone()), cli.environment.clone())
        .with_policy(cli.retry_policy())
        .with_cancel(cancel);

    let plan = match runner.prepare(&services) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Error: {}", e);
            return 1;
        }
    };

    let mut summary = InitSummary::default();
    for catalog in &plan.catalogs {
        let report = match catalog.service {
            Service::Couchbase => {
                let settings = match cli.couchbase_settings() {
                    Ok(settings) => settings,
                    Err(e) => {
                        error!("Couchbase credentials unavailable: {}", e);
                        return 1;
                    }
                };
                runner
                    .run_catalog(catalog, CouchbaseConnector::new(settings))
                    .await
            }
            Service::Redpanda => {
                runner
                    .run_catalog(catalog, KafkaAdminConnector::new(cli.kafka_settings()))
                    .await
            }
        };
        summary.push(report);
    }

    if summary.is_success() {
        info!("All operations completed successfully");
    } else {
        error!("Initialization finished with failures:\n{}", summary);
    }

    summary.exit_code()
}
