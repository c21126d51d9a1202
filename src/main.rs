use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use easy_make_installer::commands::install;
use easy_make_installer::config;
use easy_make_installer::release::InterruptGuard;
use easy_make_installer::InstallError;

#[derive(Parser)]
#[command(name = "install-easy-make")]
#[command(about = "Download and install a prebuilt easy-make release", long_about = None)]
#[command(version)]
struct Cli {
    /// Version to install, e.g. 1.2.0 (defaults to the latest release)
    ///
    /// Collected as a list so that extra arguments are reported as a usage
    /// error instead of being rejected by the parser.
    #[arg(value_name = "VERSION")]
    versions: Vec<String>,
}

/// First line of clap's rendered error, without its own `error:` prefix
fn parse_failure(e: &clap::Error) -> String {
    let rendered = e.render().to_string();
    let first = rendered.lines().next().unwrap_or_default();
    let message = first.strip_prefix("error: ").unwrap_or(first).trim();

    if message.is_empty() {
        e.kind().as_str().unwrap_or("invalid arguments").to_string()
    } else {
        message.to_string()
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            println!("{} {}", "Error:".red().bold(), parse_failure(&e));
            println!("Usage: install-easy-make [VERSION]");
            std::process::exit(1);
        }
    };

    // Argument errors win over a broken config file
    let result = install::check_arguments(&cli.versions)
        .and_then(|()| config::load_config())
        .and_then(|config| {
            let guard = InterruptGuard::new();
            guard.install_handler()?;
            install::execute(&cli.versions, &config, &guard)
        });

    if let Err(e) = result {
        match e.downcast_ref::<InstallError>() {
            Some(install_error) => install::report(install_error),
            None => println!("{} {:#}", "Error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}
