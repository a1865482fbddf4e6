use actix_web::{web, App, HttpServer};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use scormhub::config::{Cli, Command, PackageArgs, ServeArgs};
use scormhub::packaging::codec::{LaunchIdentity, TokenCodec};
use scormhub::packaging::materializer::Materializer;
use scormhub::packaging::Pipeline;
use scormhub::services;
use scormhub::state::AppState;
use std::error::Error;
use std::fs;
use std::time::Duration;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Keygen => {
            println!("{}", TokenCodec::generate_key());
            Ok(())
        }
        Command::Package(args) => package(args),
    }
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn Error>> {
    let state = AppState::from_args(&args)?;
    state.db.init_schema()?;
    info!("Using database {}", state.db.path().display());
    fs::create_dir_all(&args.media_root)?;
    if !args.wrapper_template.is_file() {
        warn!(
            "Wrapper template {} not found; package generation will fail until it exists",
            args.wrapper_template.display()
        );
    }
    if !state.lms.is_configured() {
        warn!("SCORMHUB_LMS_URL is not set; launches will fail");
    }

    let state = web::Data::new(state);
    let url = format!("http://{}:{}", args.host, args.port);
    info!("Server running at {}", url);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(services::JSON_LIMIT))
            .app_data(state.clone())
            .configure(services::configure)
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await?;
    Ok(())
}

fn package(args: PackageArgs) -> Result<(), Box<dyn Error>> {
    let codec = TokenCodec::from_base64_key(&args.token_key)?;
    // The command line build is not bounded by the server timeout.
    let pipeline = Pipeline::new(codec, Materializer::new(), &args.template, Duration::MAX);
    let identity = LaunchIdentity::new(args.client_id, args.course_id);
    let bytes = pipeline.build_blocking(&identity, &args.title)?;
    fs::write(&args.output, &bytes)?;
    info!(
        "Wrote {} ({} bytes) for client {}",
        args.output.display(),
        bytes.len(),
        identity.client_id
    );
    Ok(())
}
