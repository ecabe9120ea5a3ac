mod cli;

/// The entry point of the application.
fn main() -> anyhow::Result<()> {
    cli::run()
}
