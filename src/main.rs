use clap::Parser;
use nc_addressbook::cli::{run_books, run_list, run_search, run_show, Cli, Commands, Context};
use nc_addressbook::config::Config;
use tracing::Level;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.apply(Config::from_env()?)?;
    init_logging(cli.verbose, config.sql_debug);

    let ctx = Context::open(config, cli.user.clone(), cli.json)?;

    match &cli.command {
        Commands::Books(args) => run_books(&ctx, args)?,
        Commands::List(args) => run_list(&ctx, args)?,
        Commands::Search(args) => run_search(&ctx, args)?,
        Commands::Show(args) => run_show(&ctx, args)?,
    }

    Ok(())
}

fn init_logging(verbose: u8, sql_debug: bool) {
    let level = match verbose {
        0 | 1 if sql_debug => Level::DEBUG,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
