use clap::Parser;
use miette::Result;
use repairdesk::cli::{Cli, Commands};
use repairdesk::core::store::EntityKind;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head` or `grep -q` panics on a broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(global.verbose);

    use repairdesk::cli::commands as cmd;
    match cli.command {
        Commands::Init => cmd::init::run(&global),
        Commands::Item(c) => cmd::item::run(c, &global),
        Commands::Person(c) => cmd::entity::run_person(c, &global),
        Commands::Type(c) => cmd::entity::run_named(EntityKind::ItemType, c, &global),
        Commands::Pcb(c) => cmd::entity::run_named(EntityKind::PcbModel, c, &global),
        Commands::Finance(c) => cmd::finance::run(c, &global),
        Commands::Completions(args) => cmd::completions::run(args),
    }
}

/// Log to stderr, filtered by REPAIRDESK_LOG (default warn, debug with -v)
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = if verbose { "repairdesk=debug" } else { "warn" };
    let filter_directive = std::env::var("REPAIRDESK_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_directive.to_string());

    let _ = fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
