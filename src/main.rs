use std::{
    fs,
    io::{self, Read},
    process,
};

use richdoc::{
    application::{
        convert::convert_legacy_to_modern,
        error::AppError,
        reading::{ReadingStats, estimate_read_minutes_for},
        render::{RenderPipelineConfig, configure_render_service, render_service},
        toc::{build_toc_tree, extract_toc},
    },
    config::{self, Command, InputArgs, RenderFormat},
    domain::{
        document::Document,
        error::DomainError,
        format::{DocumentFormat, classify},
    },
    infra::telemetry,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{Dispatch, Level, debug, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(i32::from(error.exit_code()));
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(target = "richdoc::cli", error = %error, "command failed");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(target = "richdoc::cli", error = %error, "command failed");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;
    configure_render_service(RenderPipelineConfig::from(&settings.render))?;

    let value = read_document(cli_args.command.input())?;
    debug!(
        target = "richdoc::cli",
        format = %classify(&value),
        "document loaded"
    );

    match &cli_args.command {
        Command::Classify(_) => {
            println!("{}", classify(&value));
        }
        Command::Render(args) => {
            let tree = render_service().render_value(&value);
            match args.format {
                RenderFormat::Html => println!("{}", tree.to_html()),
                RenderFormat::Json => print_json(&tree)?,
            }
        }
        Command::Convert(_) => {
            match Document::try_from_value(&value)? {
                Document::Block(block_doc) => print_json(&convert_legacy_to_modern(&block_doc))?,
                other => {
                    return Err(
                        DomainError::unexpected(DocumentFormat::Block, other.format()).into(),
                    );
                }
            }
        }
        Command::Toc(args) => {
            let entries = match Document::from_value(&value) {
                Some(document) => extract_toc(&document, settings.render.anchors),
                None => Vec::new(),
            };
            if args.tree {
                print_json(&build_toc_tree(&entries))?;
            } else {
                print_json(&entries)?;
            }
        }
        Command::ReadTime(_) => {
            let (minutes, stats) = match Document::from_value(&value) {
                Some(document) => (
                    estimate_read_minutes_for(&document, &settings.reading),
                    ReadingStats::of_document(&document),
                ),
                None => (1, ReadingStats::default()),
            };
            print_json(&json!({
                "minutes": minutes,
                "words": stats.words,
                "images": stats.images,
                "code_blocks": stats.code_blocks,
            }))?;
        }
    }

    Ok(())
}

fn read_document(input: &InputArgs) -> Result<Value, AppError> {
    let raw = match input.path() {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    if raw.trim().is_empty() {
        return Err(AppError::validation("no document supplied"));
    }
    Ok(serde_json::from_str(&raw)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
