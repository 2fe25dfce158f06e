//! ec2-session - persistent cloud work sessions

#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;

use ec2_session::cli::Cli;
use ec2_session::infra::logging;
use ec2_session::output::json;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.no_color);
    let as_json = cli.json;

    if let Err(e) = cli.run().await {
        tracing::debug!(error = ?e, "command failed");
        let doc = as_json
            .then(|| json::format_error(&format!("{e:#}"), &json::error_code(&e)).ok())
            .flatten();
        match doc {
            Some(doc) => println!("{doc}"),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
