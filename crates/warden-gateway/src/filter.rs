//! Shell command denylist.
//!
//! A command is rejected if it contains any listed shell metacharacter
//! (sequencing, substitution, input redirection) or names a listed program as
//! a whole word. Metacharacters are checked first, so a command that trips
//! both is reported for the metacharacter.
//!
//! This is a denylist and known to be incomplete: pipes, output redirection,
//! and any destructive program not listed here all pass. An allowlist would be
//! stronger; switching to one is a behavioral change, not a fix.

/// Destructive programs, matched as whole words.
pub const DENIED_PROGRAMS: [&str; 4] = ["rm", "sudo", "mv", "cp"];

/// Sequencing, substitution, and redirection metacharacters, matched anywhere.
pub const DENIED_METACHARACTERS: [&str; 6] = ["&&", "||", ";", "`", "$(", "<"];

/// Why a command was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disallowed {
    Metacharacter(&'static str),
    Program(&'static str),
}

impl std::fmt::Display for Disallowed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disallowed::Metacharacter(m) => write!(f, "shell metacharacter '{m}'"),
            Disallowed::Program(p) => write!(f, "denied program '{p}'"),
        }
    }
}

/// Check `command` against the denylist.
pub fn check_command(command: &str) -> Result<(), Disallowed> {
    if let Some(meta) = DENIED_METACHARACTERS.iter().find(|m| command.contains(**m)) {
        return Err(Disallowed::Metacharacter(*meta));
    }

    let words = command.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty());
    for word in words {
        if let Some(program) = DENIED_PROGRAMS.iter().find(|p| **p == word) {
            return Err(Disallowed::Program(*program));
        }
    }
    Ok(())
}

/// ASCII word characters, as a regex `\b` sees them.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
