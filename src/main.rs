mod app;
mod catalog;
mod config;
mod media;
mod mpris;
mod runtime;
mod session;
mod transport;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
