use clap::{ArgGroup, Parser};
use discovery_core::ModeKind;

/// Supplier discovery - search a backend for component suppliers
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "discovery_app", about = "Search for suppliers of a component in a country")]
#[command(group(ArgGroup::new("mode").args(["mock", "legacy", "debug"])))]
pub struct Cli {
    /// Simulate a run without contacting the backend
    #[arg(long)]
    pub mock: bool,

    /// Use the synchronous discovery endpoints
    #[arg(long)]
    pub legacy: bool,

    /// Follow an existing backend task instead of submitting a new one
    #[arg(long, value_name = "TASK_ID")]
    pub debug: Option<String>,

    /// Print the last completed result again
    #[arg(long, conflicts_with_all = ["mode", "component", "country"])]
    pub last: bool,

    /// Component to search for (e.g. "hex bolts")
    #[arg(required_unless_present_any = ["last", "debug"])]
    pub component: Option<String>,

    /// Country to search in
    #[arg(required_unless_present_any = ["last", "debug"])]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(SearchArgs),
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchArgs {
    pub mode: ModeKind,
    pub component: String,
    pub country: String,
    pub debug_task_id: String,
}

impl Cli {
    pub fn into_command(self) -> Command {
        if self.last {
            return Command::Last;
        }
        let mode = if self.mock {
            ModeKind::Mock
        } else if self.legacy {
            ModeKind::Legacy
        } else if self.debug.is_some() {
            ModeKind::Debug
        } else {
            ModeKind::Normal
        };
        // A debug lookup learns its query from the server.
        Command::Search(SearchArgs {
            mode,
            component: self.component.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
            debug_task_id: self.debug.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn parse(raw: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("discovery_app").chain(raw.iter().copied()))
            .map(Cli::into_command)
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plain_search_is_normal_mode() {
        assert_eq!(
            parse(&["bolts", "usa"]).unwrap(),
            Command::Search(SearchArgs {
                mode: ModeKind::Normal,
                component: "bolts".to_string(),
                country: "usa".to_string(),
                debug_task_id: String::new(),
            })
        );
    }

    #[test]
    fn mode_flags_select_the_mode() {
        let Command::Search(mock) = parse(&["--mock", "bolts", "usa"]).unwrap() else {
            panic!("expected a search");
        };
        assert_eq!(mock.mode, ModeKind::Mock);

        let Command::Search(legacy) = parse(&["bolts", "usa", "--legacy"]).unwrap() else {
            panic!("expected a search");
        };
        assert_eq!(legacy.mode, ModeKind::Legacy);
    }

    #[test]
    fn debug_takes_a_task_id_and_no_query() {
        let Command::Search(search) = parse(&["--debug", "T9"]).unwrap() else {
            panic!("expected a search");
        };
        assert_eq!(search.mode, ModeKind::Debug);
        assert_eq!(search.debug_task_id, "T9");
        assert!(search.component.is_empty());
        assert!(search.country.is_empty());
    }

    #[test]
    fn modes_are_exclusive() {
        let err = parse(&["--mock", "--legacy", "bolts", "usa"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let err = parse(&["--mock", "--debug", "T9"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn missing_values_are_reported() {
        assert!(parse(&["--debug"]).is_err());
        assert_eq!(
            parse(&["--mock", "bolts"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(
            parse(&["--verbose", "bolts", "usa"]).unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
        assert_eq!(
            parse(&["bolts", "usa", "extra"]).unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
    }

    #[test]
    fn last_stands_alone() {
        assert_eq!(parse(&["--last"]).unwrap(), Command::Last);
        assert_eq!(
            parse(&["--last", "--mock"]).unwrap_err().kind(),
            ErrorKind::ArgumentConflict
        );
    }

    #[test]
    fn help_is_handled_by_the_parser() {
        assert_eq!(parse(&["-h"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
    }
}
