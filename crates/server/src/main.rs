//! Development server binary.
//!
//! Serves the script endpoints over the simulated driver and a static vision
//! engine, which is enough to exercise scripts end to end without a device.
//! Real deployments embed [`tapkit_server::router`] next to their own driver
//! implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tapkit_driver::Rect;
use tapkit_driver::sim::{SimElement, SimulatedDriver, TapEffect};
use tapkit_server::{ServerState, router};
use tapkit_vision::{NormalizedRect, StaticVision};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tapkit-serverd", about = "tapkit script server over a simulated device")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8100")]
    bind: String,

    /// Log output format.
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    log_format: String,
}

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_env("TAPKIT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    if format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// A small scene to poke at: a demo app with a button that flips a status
/// label, a text field, a picker, and an alert.
fn demo_driver() -> SimulatedDriver {
    let driver = SimulatedDriver::new();
    let app = "com.tapkit.demo";
    driver.install_app(app);
    driver.add_element(
        app,
        SimElement::button("Go").frame(Rect::new(24.0, 120.0, 120.0, 44.0)).on_tap(TapEffect::SetLabel {
            target: "Status".into(),
            label: "OK".into(),
        }),
    );
    driver.add_element(app, SimElement::text("Status", "Idle").frame(Rect::new(24.0, 180.0, 200.0, 30.0)));
    driver.add_element(
        app,
        SimElement::new(tapkit_driver::ElementType::TextField, "name")
            .placeholder("Your name")
            .frame(Rect::new(24.0, 240.0, 280.0, 36.0)),
    );
    driver.add_element(app, SimElement::picker("size", &["Small", "Medium", "Large"]));
    driver.add_element(app, SimElement::button("Allow").in_alert().on_tap(TapEffect::DismissAlert));
    driver
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_format);

    let state = ServerState::new(
        Arc::new(demo_driver()),
        Arc::new(StaticVision::new().with_text("Welcome to the demo", NormalizedRect::new(0.2, 0.9, 0.6, 0.05))),
    );

    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("bind {}", args.bind))?;
    info!(addr = %args.bind, "tapkit server listening");
    axum::serve(listener, router(state)).await.context("serve")?;
    Ok(())
}
