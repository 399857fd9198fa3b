mod audio;
mod config;
mod engine;
mod error;
mod library;
mod queue;
mod runtime;
mod session;
mod sync;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
