use clap::Parser;
use notelock::cli::{output, Cli, Commands};

#[tokio::main]
async fn main() {
    // Logs go to stderr so they never mix with command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::New { ref path, ref hint } => {
            notelock::cli::commands::new::execute(&cli, path, hint.as_deref()).await
        }
        Commands::Encrypt { ref path, ref hint } => {
            notelock::cli::commands::encrypt::execute(&cli, path, hint.as_deref()).await
        }
        Commands::Decrypt { ref path } => notelock::cli::commands::decrypt::execute(&cli, path).await,
        Commands::Cat { ref path } => notelock::cli::commands::cat::execute(&cli, path).await,
        Commands::Edit { ref path } => notelock::cli::commands::edit::execute(&cli, path).await,
        Commands::ChangePassword { ref path, ref hint } => {
            notelock::cli::commands::change_password::execute(&cli, path, hint.as_deref()).await
        }
        Commands::EncryptAll { ref ignore, yes } => {
            notelock::cli::commands::bulk::execute_encrypt_all(&cli, ignore, yes).await
        }
        Commands::DecryptAll { ref ignore, yes } => {
            notelock::cli::commands::bulk::execute_decrypt_all(&cli, ignore, yes).await
        }
        Commands::CheckPaths => notelock::cli::commands::check_paths::execute(&cli).await,
    };

    match result {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => output::info("Cancelled, nothing was changed."),
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    }
}
