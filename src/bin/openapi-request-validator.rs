//! OpenAPI Request Validator CLI
//!
//! Command-line interface for checking a single request against an API
//! document and listing the routes it declares.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use openapi_request_validator::{
    load_config, ApiSpec, Request, ValidateError, ValidationService, ValidatorConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openapi-request-validator")]
#[command(about = "Validate HTTP requests against OpenAPI 3 and Swagger 2 documents")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one request
    Validate {
        /// API document: file path or URL (http:// or https://).
        /// Defaults to the configured schema-location.
        #[arg(long)]
        spec: Option<String>,

        /// HTTP method
        #[arg(long, short = 'X')]
        method: String,

        /// Request path, optionally with a query string
        #[arg(long)]
        path: String,

        /// Request header as 'Name: value' (repeatable)
        #[arg(long = "header", short = 'H')]
        headers: Vec<String>,

        /// File containing the request body
        #[arg(long)]
        body: Option<PathBuf>,

        /// Validator configuration file (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the document's base path
        #[arg(long)]
        base_path: Option<String>,

        /// Skip header parameter validation
        #[arg(long)]
        skip_headers: bool,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// List path templates and their methods
    Routes {
        /// API document: file path or URL (http:// or https://)
        #[arg(long)]
        spec: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate {
            spec,
            method,
            path,
            headers,
            body,
            config,
            base_path,
            skip_headers,
            json,
        } => run_validate(ValidateArgs {
            spec,
            method,
            path,
            headers,
            body,
            config,
            base_path,
            skip_headers,
            json_output: json,
        }),

        Commands::Routes { spec, json } => run_routes(&spec, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

struct ValidateArgs {
    spec: Option<String>,
    method: String,
    path: String,
    headers: Vec<String>,
    body: Option<PathBuf>,
    config: Option<PathBuf>,
    base_path: Option<String>,
    skip_headers: bool,
    json_output: bool,
}

fn run_validate(args: ValidateArgs) -> Result<(), u8> {
    let json_output = args.json_output;

    let mut config = match &args.config {
        Some(path) => load_config(path).map_err(|e| {
            report_error(json_output, &format!("loading config: {}", e));
            e.exit_code() as u8
        })?,
        None => ValidatorConfig::default(),
    };
    if let Some(spec) = args.spec {
        config.schema_location = spec;
    }
    if args.base_path.is_some() {
        config.base_path = args.base_path;
    }
    if args.skip_headers {
        config.validate_headers = false;
    }

    let service = ValidationService::from_config(&config).map_err(|e| {
        report_error(json_output, &format!("loading API document: {}", e));
        e.exit_code() as u8
    })?;

    let mut builder = Request::builder(args.method, &args.path);
    for header in &args.headers {
        builder = builder.raw_header(header);
    }
    if let Some(path) = &args.body {
        let body = std::fs::read(path).map_err(|e| {
            report_error(json_output, &format!("reading body {}: {}", path.display(), e));
            3u8
        })?;
        builder = builder.body(body);
    }
    let request = builder.build();

    match service.validate_request(&request) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e @ ValidateError::MethodNotSupported { .. }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": [e.to_string()],
                    "allowed": e.allowed_methods()
                });
                println!("{}", output);
            } else {
                eprintln!("Error: {}", e);
            }
            Err(1)
        }
        Err(ValidateError::Spec(e)) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

fn run_routes(spec_source: &str, json_output: bool) -> Result<(), u8> {
    let spec = ApiSpec::load(spec_source).map_err(|e| {
        report_error(json_output, &format!("loading API document: {}", e));
        e.exit_code() as u8
    })?;

    if json_output {
        let routes: Vec<_> = spec
            .path_templates()
            .map(|template| {
                serde_json::json!({
                    "path": template,
                    "methods": spec.methods(template)
                })
            })
            .collect();
        let output = serde_json::json!({
            "basePath": spec.base_path(),
            "routes": routes
        });
        println!("{}", output);
    } else {
        if let Some(base_path) = spec.base_path() {
            println!("base path: {}", base_path);
        }
        for template in spec.path_templates() {
            println!("{:<40} {}", template, spec.methods(template).join(", "));
        }
    }
    Ok(())
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
