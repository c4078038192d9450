use std::io::{self, IsTerminal, Write};

/// Ask a yes/no question on stderr. Fails when there is no terminal to ask on.
pub fn confirm(message: &str) -> io::Result<bool> {
  if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
    return Err(io::Error::other(
      "cannot prompt for confirmation in non-interactive mode; drop --confirm to proceed",
    ));
  }

  write!(io::stderr(), "{} [y/N] ", message)?;
  io::stderr().flush()?;

  let mut input = String::new();
  io::stdin().read_line(&mut input)?;

  Ok(matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Show the build summary and ask whether to start the build.
pub fn confirm_build(summary: &str) -> io::Result<bool> {
  let mut stderr = io::stderr();
  writeln!(stderr)?;
  write!(stderr, "{}", summary)?;
  writeln!(stderr)?;
  confirm("Start the build?")
}
