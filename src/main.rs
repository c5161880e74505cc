#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use yansi::Paint;

use crate::application::cli;
use crate::configuration::Config;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "todo-sync stopped with the following error.\n\nVersion: {}\nCommit: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_LOG=todo_sync RUST_BACKTRACE=1 {args}");
        eprintln!("\nDebug logs are written to {}", Config::log_dir());
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let file_appender = tracing_appender::rolling::never(Config::log_dir(), "debug.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("todo_sync")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let res = cli::parse().await;
    drop(guard);

    if let Err(err) = res {
        handle_error(err);
    }
}
