use display_config_provider::{DisplayBackend, DisplayLibrary, library};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::profile::{self, ProfileStore};

pub const USAGE: &str = "\
Usage: display-profiles <command> [--debug]

Commands:
  print          Print the active display configuration
  identifiers    Print the identifiers of the connected displays
  save <name>    Save the active display configuration as a profile
  check <name>   Check if a profile can be applied, or is already active
  apply <name>   Apply a profile";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Print,
    Identifiers,
    Save(String),
    Check(String),
    Apply(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to use the display library:\n{0}")]
    Library(#[from] library::Error),

    #[error("Failed to use the profile:\n{0}")]
    Profile(#[from] profile::Error),

    #[error("Profile '{0}' uses displays that are not connected")]
    NotPossible(String),
}

impl Command {
    /// Parses the command from the program arguments, `None` if they do not name one.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Option<Self> {
        let mut args = args.into_iter().filter(|arg| !arg.starts_with("--"));

        let command = match args.next()?.as_str() {
            "print" => Self::Print,
            "identifiers" => Self::Identifiers,
            "save" => Self::Save(args.next()?),
            "check" => Self::Check(args.next()?),
            "apply" => Self::Apply(args.next()?),
            _ => return None,
        };

        if args.next().is_some() {
            return None;
        }

        Some(command)
    }

    #[instrument(skip_all, err)]
    pub fn run<B: DisplayBackend>(
        &self,
        library: &DisplayLibrary<B>,
        store: &ProfileStore,
    ) -> Result<(), Error> {
        match self {
            Self::Print => {
                library.refresh()?;
                print!("{}", library.active_config()?);
            }

            Self::Identifiers => {
                library.refresh()?;
                let active = library.current_display_identifiers()?;

                for identifier in library.connected_display_identifiers()? {
                    if active.contains(&identifier) {
                        println!("{identifier}");
                    } else {
                        println!("{identifier} (inactive)");
                    }
                }
            }

            Self::Save(name) => {
                library.refresh()?;
                let path = store.save(name, &library.active_config()?)?;
                println!("Saved '{name}' to {}", path.display());
            }

            Self::Check(name) => {
                let profile = store.load(name)?;
                library.refresh()?;

                println!("Valid: {}", library.is_config_valid(&profile)?);
                println!("Possible: {}", library.is_config_possible(&profile)?);
                println!("Active: {}", library.is_config_active(&profile)?);
            }

            Self::Apply(name) => {
                let profile = store.load(name)?;
                library.refresh()?;

                if library.is_config_active(&profile)? {
                    info!("Profile '{name}' is already active");
                    println!("'{name}' is already active");
                    return Ok(());
                }

                if !library.is_config_possible(&profile)? {
                    return Err(Error::NotPossible(name.clone()));
                }

                let report = library.apply(&profile)?;
                if report.failed > 0 {
                    warn!("{} displays did not accept their HDR state", report.failed);
                }

                if library.is_config_active(&profile)? {
                    println!("Applied '{name}'");
                } else {
                    println!(
                        "Applied '{name}', the active configuration still differs from it; see the logs for details"
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Command;

    fn parse(args: &[&str]) -> Option<Command> {
        Command::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn commands_are_parsed() {
        assert_eq!(parse(&["print"]), Some(Command::Print));
        assert_eq!(parse(&["--debug", "identifiers"]), Some(Command::Identifiers));
        assert_eq!(
            parse(&["save", "desk", "--debug"]),
            Some(Command::Save("desk".to_string()))
        );
        assert_eq!(parse(&["apply", "desk"]), Some(Command::Apply("desk".to_string())));
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["save"]), None);
        assert_eq!(parse(&["print", "extra"]), None);
        assert_eq!(parse(&["reboot"]), None);
    }
}
