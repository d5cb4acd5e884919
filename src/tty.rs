use is_terminal::IsTerminal;

/// Check if stderr is connected to a TTY
pub fn is_stderr_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Determine if log output should be styled, from the process environment
pub fn should_style_output() -> bool {
    style_output_from(is_stderr_tty(), |key| std::env::var(key).ok())
}

/// Styling decision from an explicit TTY flag and environment lookup
pub fn style_output_from<F>(is_tty: bool, env: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    // Logs go to stderr, so that is the stream that has to be a terminal
    if !is_tty {
        return false;
    }

    // Any NO_COLOR value except "0" turns styling off, including empty
    if env("NO_COLOR").is_some_and(|v| v != "0") {
        return false;
    }

    if env("TERM").as_deref() == Some("dumb") {
        return false;
    }

    true
}
