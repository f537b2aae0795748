// Subset selection: the observed team/location values, the pure resolution
// of a textual choice, and the interactive console prompt on top of it.

use std::io::Write;

use likert_stats::{distinct_locations, distinct_teams, GroupChoice, ResponseRow, SubsetSelection};

use crate::analysis::io_common::sanitize_text;
use crate::analysis::{AnResult, PromptIoSnafu};
use snafu::prelude::*;

/// The wildcard a caller passes to include a whole dimension.
pub const ALL_CHOICE: &str = "all";

/// The distinct team and location values observed in the loaded data, with
/// response counts. This is what the selection layer presents as valid
/// choices.
#[derive(Debug, Clone)]
pub struct AvailableGroups {
    pub teams: Vec<(String, usize)>,
    pub locations: Vec<(String, usize)>,
}

pub fn available_groups(rows: &[ResponseRow]) -> AvailableGroups {
    AvailableGroups {
        teams: distinct_teams(rows),
        locations: distinct_locations(rows),
    }
}

/// Resolves one textual choice against the observed values. `all` (in any
/// case) is the wildcard; anything else must be an observed value.
pub fn resolve_choice(
    available: &[(String, usize)],
    requested: &str,
    dimension: &str,
) -> AnResult<GroupChoice> {
    if requested.eq_ignore_ascii_case(ALL_CHOICE) {
        return Ok(GroupChoice::All);
    }
    let cleaned = sanitize_text(requested);
    if available.iter().any(|(name, _)| *name == cleaned) {
        Ok(GroupChoice::Value(cleaned))
    } else {
        let names: Vec<&str> = available.iter().map(|(name, _)| name.as_str()).collect();
        whatever!(
            "Unknown {} {:?}. Observed values: {:?} (or 'all')",
            dimension,
            requested,
            names
        )
    }
}

/// Pure mapping from (observed groups, user choices) to a selection.
pub fn resolve_selection(
    groups: &AvailableGroups,
    team: &str,
    location: &str,
) -> AnResult<SubsetSelection> {
    Ok(SubsetSelection {
        team: resolve_choice(&groups.teams, team, "team")?,
        location: resolve_choice(&groups.locations, location, "location")?,
    })
}

/// Maps a 1-based menu index to a choice: entries `1..=n` are the observed
/// values, `n + 1` is the wildcard.
pub fn choice_from_index(available: &[(String, usize)], index: usize) -> Option<GroupChoice> {
    if index >= 1 && index <= available.len() {
        Some(GroupChoice::Value(available[index - 1].0.clone()))
    } else if index == available.len() + 1 {
        Some(GroupChoice::All)
    } else {
        None
    }
}

/// Asks for a team and a location on the console. All the decision logic
/// lives in `choice_from_index`; this loop only reads lines.
pub fn prompt_selection(groups: &AvailableGroups) -> AnResult<SubsetSelection> {
    let team = prompt_dimension("team", &groups.teams)?;
    let location = prompt_dimension("location", &groups.locations)?;
    Ok(SubsetSelection { team, location })
}

fn prompt_dimension(dimension: &str, available: &[(String, usize)]) -> AnResult<GroupChoice> {
    if available.is_empty() {
        // Nothing to choose from, e.g. every cell in the column was blank.
        return Ok(GroupChoice::All);
    }
    println!("Available {}s ({}):", dimension, available.len());
    for (i, (name, count)) in available.iter().enumerate() {
        println!("   {}. {} ({} responses)", i + 1, name, count);
    }
    println!("   {}. All {}s", available.len() + 1, dimension);

    loop {
        print!("Select {} (1-{}): ", dimension, available.len() + 1);
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        let read = std::io::stdin()
            .read_line(&mut line)
            .context(PromptIoSnafu {})?;
        if read == 0 {
            whatever!("Selection aborted (end of input)");
        }
        match line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| choice_from_index(available, index))
        {
            Some(choice) => return Ok(choice),
            None => println!(
                "Please enter a number between 1 and {}.",
                available.len() + 1
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> AvailableGroups {
        AvailableGroups {
            teams: vec![("Eng".to_string(), 2), ("Ops".to_string(), 1)],
            locations: vec![("HQ".to_string(), 3)],
        }
    }

    #[test]
    fn resolves_values_and_wildcards() {
        let selection = resolve_selection(&groups(), "Eng", "all").unwrap();
        assert_eq!(selection.team, GroupChoice::Value("Eng".to_string()));
        assert_eq!(selection.location, GroupChoice::All);
        let selection = resolve_selection(&groups(), "ALL", "HQ").unwrap();
        assert_eq!(selection.team, GroupChoice::All);
        assert_eq!(selection.location, GroupChoice::Value("HQ".to_string()));
    }

    #[test]
    fn rejects_unobserved_values() {
        assert!(resolve_selection(&groups(), "Marketing", "all").is_err());
        assert!(resolve_selection(&groups(), "Eng", "Moon").is_err());
    }

    #[test]
    fn menu_indexes_map_to_choices() {
        let teams = groups().teams;
        assert_eq!(
            choice_from_index(&teams, 1),
            Some(GroupChoice::Value("Eng".to_string()))
        );
        assert_eq!(
            choice_from_index(&teams, 2),
            Some(GroupChoice::Value("Ops".to_string()))
        );
        assert_eq!(choice_from_index(&teams, 3), Some(GroupChoice::All));
        assert_eq!(choice_from_index(&teams, 0), None);
        assert_eq!(choice_from_index(&teams, 4), None);
    }
}
