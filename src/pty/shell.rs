//! Shell selection utilities

/// Select the shell used to run the recorded command:
/// 1. CLI argument (if provided)
/// 2. $SHELL environment variable
/// 3. /bin/bash (fallback)
///
/// # Arguments
/// * `cli_shell` - Optional shell path from --shell CLI argument
///
/// # Returns
/// Path to the shell to use
pub fn select_shell(cli_shell: Option<&str>) -> String {
    if let Some(shell) = cli_shell {
        return shell.to_string();
    }

    if let Ok(shell) = std::env::var("SHELL") {
        if !shell.is_empty() {
            return shell;
        }
    }

    "/bin/bash".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_shell_with_cli_arg() {
        // CLI arg takes highest priority
        let shell = select_shell(Some("/bin/fish"));
        assert_eq!(shell, "/bin/fish");
    }

    #[test]
    fn test_select_shell_without_cli_falls_back_to_env() {
        // Without CLI arg, should use $SHELL (which is typically set)
        let shell = select_shell(None);
        assert!(
            shell.starts_with('/'),
            "Shell path should be absolute: {}",
            shell
        );
    }
}
