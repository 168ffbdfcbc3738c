//! Command-line parsing (minimal, no clap dependency needed)

use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Which wallets `delete` removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    All,
    /// 1-based positions from the current listing
    Positions(BTreeSet<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init,
    Create { name: String, passphrase: bool },
    Import { name: String, passphrase: bool },
    List,
    Delete(DeleteTarget),
    Export(usize),
    Passwd,
}

/// Parsed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run {
        command: Command,
        config_path: Option<PathBuf>,
        vault_path: Option<PathBuf>,
    },
    Help,
    Version,
}

/// Parse `1,3` style position lists, or `all`
pub fn parse_delete_target(input: &str) -> Result<DeleteTarget> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return Ok(DeleteTarget::All);
    }

    let mut positions = BTreeSet::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let position: usize = part
            .parse()
            .with_context(|| format!("Invalid position '{}'", part))?;
        if position == 0 {
            bail!("Positions start at 1");
        }
        positions.insert(position);
    }
    if positions.is_empty() {
        bail!("Expected positions like 1,3 or 'all'");
    }
    Ok(DeleteTarget::Positions(positions))
}

fn parse_position(input: &str) -> Result<usize> {
    let position: usize = input
        .trim()
        .parse()
        .with_context(|| format!("Invalid position '{}'", input))?;
    if position == 0 {
        bail!("Positions start at 1");
    }
    Ok(position)
}

/// Parse everything after the program name
pub fn parse(args: &[String]) -> Result<Invocation> {
    let mut config_path = None;
    let mut vault_path = None;
    let mut passphrase = false;
    let mut positional: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                match args.get(i) {
                    Some(path) => config_path = Some(PathBuf::from(path)),
                    None => bail!("--config requires a path argument"),
                }
            }
            "--vault" => {
                i += 1;
                match args.get(i) {
                    Some(path) => vault_path = Some(PathBuf::from(path)),
                    None => bail!("--vault requires a path argument"),
                }
            }
            "--passphrase" => passphrase = true,
            "--help" | "-h" => return Ok(Invocation::Help),
            "--version" | "-V" => return Ok(Invocation::Version),
            other if other.starts_with('-') => bail!("Unknown argument: {}", other),
            other => positional.push(other),
        }
        i += 1;
    }

    let (name, rest) = match positional.split_first() {
        Some((name, rest)) => (*name, rest),
        None => return Ok(Invocation::Help),
    };

    let command = match (name, rest) {
        ("init", []) => Command::Init,
        ("create", [wallet]) => Command::Create {
            name: wallet.to_string(),
            passphrase,
        },
        ("import", [wallet]) => Command::Import {
            name: wallet.to_string(),
            passphrase,
        },
        ("list", []) => Command::List,
        ("delete", [target]) => Command::Delete(parse_delete_target(target)?),
        ("export", [position]) => Command::Export(parse_position(position)?),
        ("passwd", []) => Command::Passwd,
        ("create" | "import", _) => bail!("Usage: localwallet {} <name> [--passphrase]", name),
        ("delete", _) => bail!("Usage: localwallet delete <1,3,...|all>"),
        ("export", _) => bail!("Usage: localwallet export <position>"),
        ("init" | "list" | "passwd", _) => bail!("'{}' takes no arguments", name),
        (other, _) => bail!("Unknown command: {}", other),
    };

    if passphrase && !matches!(command, Command::Create { .. } | Command::Import { .. }) {
        bail!("--passphrase only applies to create and import");
    }

    Ok(Invocation::Run {
        command,
        config_path,
        vault_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn command(line: &str) -> Command {
        match parse(&args(line)).unwrap() {
            Invocation::Run { command, .. } => command,
            other => panic!("expected a command, got {:?}", other),
        }
    }

    fn set(p: &[usize]) -> BTreeSet<usize> {
        p.iter().copied().collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(command("init"), Command::Init);
        assert_eq!(command("list"), Command::List);
        assert_eq!(command("passwd"), Command::Passwd);
        assert_eq!(command("export 2"), Command::Export(2));
        assert_eq!(
            command("create savings"),
            Command::Create {
                name: "savings".into(),
                passphrase: false
            }
        );
        assert_eq!(
            command("import --passphrase cold"),
            Command::Import {
                name: "cold".into(),
                passphrase: true
            }
        );
    }

    #[test]
    fn test_parse_global_options() {
        let parsed = parse(&args("--config my.toml list --vault /mnt/usb/vault")).unwrap();
        assert_eq!(
            parsed,
            Invocation::Run {
                command: Command::List,
                config_path: Some(PathBuf::from("my.toml")),
                vault_path: Some(PathBuf::from("/mnt/usb/vault")),
            }
        );
        assert!(parse(&args("list --vault")).is_err());
        assert!(parse(&args("--config")).is_err());
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&[]).unwrap(), Invocation::Help);
        assert_eq!(parse(&args("-h")).unwrap(), Invocation::Help);
        assert_eq!(parse(&args("list --version")).unwrap(), Invocation::Version);
    }

    #[test]
    fn test_rejects_bad_usage() {
        assert!(parse(&args("frobnicate")).is_err());
        assert!(parse(&args("create")).is_err());
        assert!(parse(&args("create a b")).is_err());
        assert!(parse(&args("list extra")).is_err());
        assert!(parse(&args("export")).is_err());
        assert!(parse(&args("export zero")).is_err());
        assert!(parse(&args("export 0")).is_err());
        assert!(parse(&args("list --passphrase")).is_err());
        assert!(parse(&args("list --bogus")).is_err());
    }

    #[test]
    fn test_delete_targets() {
        assert_eq!(parse_delete_target("all").unwrap(), DeleteTarget::All);
        assert_eq!(parse_delete_target(" ALL ").unwrap(), DeleteTarget::All);
        assert_eq!(
            parse_delete_target("1,3").unwrap(),
            DeleteTarget::Positions(set(&[1, 3]))
        );
        assert_eq!(
            parse_delete_target("4, 2,,4").unwrap(),
            DeleteTarget::Positions(set(&[2, 4]))
        );
        assert_eq!(
            command("delete 2,4"),
            Command::Delete(DeleteTarget::Positions(set(&[2, 4])))
        );
    }

    #[test]
    fn test_delete_target_rejects_garbage() {
        assert!(parse_delete_target("").is_err());
        assert!(parse_delete_target(",").is_err());
        assert!(parse_delete_target("1,x").is_err());
        assert!(parse_delete_target("0").is_err());
        assert!(parse_delete_target("-1").is_err());
    }
}
