use clap::Parser;
use teamwatch::cli::{
    handle_completions, handle_config_init, notifications, snapshot, Cli, Commands,
    ConfigCommands, NotificationsCommands,
};

fn print_output(result: Result<String, Box<dyn std::error::Error>>) -> Result<(), Box<dyn std::error::Error>> {
    let output = result?;
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch(args) => teamwatch::cli::watch::run_watch(args).await,
        Commands::Snapshot(args) => print_output(snapshot::run_snapshot(args).await),
        Commands::Notifications(cmd) => match cmd {
            NotificationsCommands::List(args) => print_output(notifications::handle_list(&args)),
            NotificationsCommands::MarkRead(args) => {
                print_output(notifications::handle_mark_read(&args))
            }
            NotificationsCommands::Clear(args) => print_output(notifications::handle_clear(&args)),
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
