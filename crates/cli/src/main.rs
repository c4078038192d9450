mod cmd;
mod output;
mod prompts;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmd::InstallArgs;
use output::OutputFormat;

/// impforge - fetch, configure and build IMP with its analysis tools
#[derive(Parser)]
#[command(name = "impforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  install: InstallArgs,

  /// Enable verbose output
  #[arg(short, long, env = "IMPFORGE_VERBOSE")]
  verbose: bool,

  /// Output format for the final report
  #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "IMPFORGE_OUTPUT")]
  output: OutputFormat,
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let code = match cmd::cmd_install(cli.install, cli.output) {
    Ok(code) => code,
    Err(e) => {
      output::print_error(&format!("{:#}", e));
      1
    }
  };
  std::process::exit(code);
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
  }

  #[test]
  fn disabled_modules_accept_colons_and_repeats() {
    let cli = Cli::try_parse_from(["impforge", "-d", "npc:foxs", "-d", "em2d"]).unwrap();
    assert_eq!(cli.install.disabled_modules, vec!["npc", "foxs", "em2d"]);
  }

  #[test]
  fn zero_processes_rejected_by_parser() {
    assert!(Cli::try_parse_from(["impforge", "-j", "0"]).is_err());
  }

  #[test]
  fn profile_conflicts_with_no_profile() {
    assert!(Cli::try_parse_from(["impforge", "--profile", "/tmp/rc", "--no-profile"]).is_err());
  }
}
