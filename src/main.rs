use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use http::Method;
use inline_colorization::*;
use serde_json::Value;
use tracing::{error, info};

use salessync_client::config::{load_config, print_schema};
use salessync_client::error::ApiError;
use salessync_client::models::request::{ApiRequest, Location};
use salessync_client::navigation::ConsoleNavigator;
use salessync_client::startup::build;
use salessync_client::state::AppState;
use salessync_client::utils::logger::init_logging;

#[derive(Parser)]
#[command(name = "salessync-client", version, about = "Command-line client for the SalesSync API")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "./config.yaml")]
    config: String,

    /// Page URL the session runs on; drives tenant resolution.
    #[arg(long, default_value = "http://localhost/")]
    url: String,

    /// Print the Prometheus metrics collected during the command.
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the JSON schema of the configuration file.
    Schema,
    /// Show which tenant the session resolves to.
    Tenant,
    /// Switch to another tenant; drops the stored session.
    SwitchTenant { code: String },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Send one request through the pipeline and print the response body.
    Request {
        method: String,
        path: String,
        /// JSON request body.
        #[arg(long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::Schema = cli.command {
        print_schema();
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&cli.config) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::from(1);
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        return ExitCode::from(1);
    }

    let location = match Location::parse(&cli.url) {
        Ok(location) => location,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(1);
        }
    };
    let navigator = Arc::new(ConsoleNavigator::new(location.path.clone()));
    let app = match build(config, navigator.clone()) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to build client: {}", e);
            return ExitCode::from(1);
        }
    };

    let tenant = app.tenant.resolve(&location).await;
    info!("Session tenant: {} ({})", tenant.code, tenant.name);

    let outcome = match cli.command {
        Command::Schema => Ok(()),
        Command::Tenant => print_json(&serde_json::to_value(&tenant).unwrap_or(Value::Null)),
        Command::SwitchTenant { code } => {
            let switched =
                app.tenant
                    .switch_tenant(&code, &app.client.state().credentials, navigator.as_ref());
            print_json(&serde_json::to_value(&switched).unwrap_or(Value::Null))
        }
        Command::Login { email, password } => match app.session.login(&email, &password).await {
            Ok(result) => {
                if let Some(target) = &result.redirect_to {
                    eprintln!("{color_green}Logged in{color_reset}; you were last on {}", target);
                }
                print_json(&result.user)
            }
            Err(e) => Err(e),
        },
        Command::Logout => {
            app.session.logout();
            Ok(())
        }
        Command::Request { method, path, data } => send(&app, &method, path, data).await,
    };

    if cli.metrics {
        print!("{}", app.client.state().metrics.render());
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{color_red}{}{color_reset} ({}, status {})",
                e.message, e.code, e.status
            );
            if let Some(data) = &e.data {
                eprintln!("{}", data);
            }
            if e.is_unauthorized() || e.is_forbidden() {
                eprintln!("Hint: `salessync-client login --email <EMAIL> --password <PASSWORD>`");
            }
            ExitCode::from(2)
        }
    }
}

async fn send(app: &AppState, method: &str, path: String, data: Option<String>) -> Result<(), ApiError> {
    let method = Method::from_bytes(method.to_uppercase().as_bytes())
        .map_err(|e| ApiError::serialization(format!("Invalid method '{}': {}", method, e)))?;

    let mut request = ApiRequest::new(method, path);
    if let Some(data) = data {
        let body: Value = serde_json::from_str(&data)
            .map_err(|e| ApiError::serialization(format!("Invalid --data JSON: {}", e)))?;
        request = request.with_body(body);
    }

    let response = app.client.execute(request).await?;
    match response.json::<Value>() {
        Ok(body) => print_json(&body),
        Err(_) => {
            println!("{}", response.text());
            Ok(())
        }
    }
}

fn print_json(value: &Value) -> Result<(), ApiError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| ApiError::serialization(e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}
