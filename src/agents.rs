//! Supported-agent registry and command building.
//!
//! Agents are external collaborators: all this module knows about them is
//! the binary to invoke and how to hand over an instruction. Whether an
//! agent honors the proxy environment is up to the agent.

/// An AI coding agent the wrapper knows how to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agent {
    Claude,
    Auggie,
    Cursor,
    Copilot,
    Codeium,
    Chatgpt,
}

impl Agent {
    pub const ALL: [Agent; 6] = [
        Agent::Claude,
        Agent::Auggie,
        Agent::Cursor,
        Agent::Copilot,
        Agent::Codeium,
        Agent::Chatgpt,
    ];

    /// Parse an agent name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "claude" => Some(Agent::Claude),
            "auggie" => Some(Agent::Auggie),
            "cursor" => Some(Agent::Cursor),
            "copilot" => Some(Agent::Copilot),
            "codeium" => Some(Agent::Codeium),
            "chatgpt" => Some(Agent::Chatgpt),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Agent::Claude => "claude",
            Agent::Auggie => "auggie",
            Agent::Cursor => "cursor",
            Agent::Copilot => "copilot",
            Agent::Codeium => "codeium",
            Agent::Chatgpt => "chatgpt",
        }
    }

    /// Comma-separated list for usage/error messages
    pub fn supported_list() -> String {
        Agent::ALL
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Build the shell command that runs this agent with an instruction
    pub fn command_for(self, instruction: &str) -> String {
        format!("{} {}", self.name(), shell_quote(instruction))
    }
}

/// Quote a string for use as a single shell argument
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_known_agents() {
        assert_eq!(Agent::from_name("claude"), Some(Agent::Claude));
        assert_eq!(Agent::from_name("AUGGIE"), Some(Agent::Auggie));
        assert_eq!(Agent::from_name("Cursor"), Some(Agent::Cursor));
    }

    #[test]
    fn test_from_name_unknown_agent() {
        assert_eq!(Agent::from_name("clippy"), None);
    }

    #[test]
    fn test_supported_list_mentions_all() {
        let list = Agent::supported_list();
        for agent in Agent::ALL {
            assert!(list.contains(agent.name()));
        }
    }

    #[test]
    fn test_command_for_quotes_instruction() {
        let cmd = Agent::Claude.command_for("Fix the login bug");
        assert_eq!(cmd, "claude 'Fix the login bug'");
    }

    #[test]
    fn test_command_for_escapes_single_quotes() {
        let cmd = Agent::Auggie.command_for("don't break");
        assert_eq!(cmd, "auggie 'don'\\''t break'");
    }
}
