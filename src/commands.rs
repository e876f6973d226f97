/// Available commands and autocomplete logic

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Hidden from farmers
  pub admin_only: bool,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "disease",
    aliases: &["d", "detect", "scan"],
    description: "Detect crop disease from a photo",
    admin_only: false,
  },
  Command {
    name: "yield",
    aliases: &["y", "predict"],
    description: "Predict crop yield",
    admin_only: false,
  },
  Command {
    name: "irrigation",
    aliases: &["i", "water"],
    description: "Irrigation schedule",
    admin_only: false,
  },
  Command {
    name: "fertilizer",
    aliases: &["f", "npk"],
    description: "Fertilizer recommendation",
    admin_only: false,
  },
  Command {
    name: "weather",
    aliases: &["w", "forecast"],
    description: "Weather and field advisory",
    admin_only: false,
  },
  Command {
    name: "admin",
    aliases: &["a", "farmers"],
    description: "Manage registered farmers",
    admin_only: true,
  },
  Command {
    name: "logout",
    aliases: &["signout"],
    description: "Sign out",
    admin_only: false,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit cropdoc",
    admin_only: false,
  },
];

fn visible(cmd: &Command, is_admin: bool) -> bool {
  is_admin || !cmd.admin_only
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str, is_admin: bool) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();
  let commands = COMMANDS.iter().filter(|cmd| visible(cmd, is_admin));

  if input_lower.is_empty() {
    return commands.collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in commands {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all_for_admin() {
    assert_eq!(get_suggestions("", true).len(), COMMANDS.len());
  }

  #[test]
  fn test_admin_commands_hidden_from_farmers() {
    let names: Vec<&str> = get_suggestions("", false).iter().map(|c| c.name).collect();
    assert!(!names.contains(&"admin"));
    assert!(get_suggestions("adm", false).is_empty());
    assert!(get_suggestions("admin", false).is_empty());
    assert_eq!(get_suggestions("farmers", true)[0].name, "admin");
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("weather", false);
    assert_eq!(suggestions[0].name, "weather");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("w", false);
    assert_eq!(suggestions[0].name, "weather");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("irr", false);
    assert_eq!(suggestions[0].name, "irrigation");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("tili", false);
    assert_eq!(suggestions[0].name, "fertilizer");
  }
}
