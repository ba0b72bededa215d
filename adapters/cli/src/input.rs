//! Line-oriented input parsing for the text client.

use magic_tower_core::{CellCoord, Command, Direction};

/// Parsed user request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Input {
    /// Commands forwarded to the world in order.
    Commands(Vec<Command>),
    /// Keep ticking until automatic movement finishes.
    Walk,
    /// Print the command reference.
    Help,
    /// Leave the client.
    Exit,
}

/// Largest tick count a single `tick` request may ask for.
const MAX_TICKS: usize = 10_000;

pub(crate) const HELP: &str = "\
w/a/s/d          step north/west/south/east
click X Y        walk to a cell (then `walk` or `tick N`)
inspect X Y      show monster or item details
walk             tick until automatic movement stops
tick [N]         advance the timer
menu | jump      open the game or floor jump menu
store N          open store N
up | down        move menu focus
ok | choose N    select the focused or numbered entry
esc              close the current menu or detail view
<empty line>     dismiss the current message
save [NAME]      save into an archive
load [NAME]      load an archive
new              restart from the beginning
quit             leave";

/// Parses one input line; `default_archive` names the archive when none is given.
pub(crate) fn parse(line: &str, default_archive: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(Input::Commands(vec![Command::Dismiss]));
    };

    let single = |command: Command| Ok(Input::Commands(vec![command]));
    let step = |direction: Direction| single(Command::MoveHero { direction });

    match word.to_ascii_lowercase().as_str() {
        "w" => step(Direction::North),
        "a" => step(Direction::West),
        "s" => step(Direction::South),
        "d" => step(Direction::East),
        "click" => single(Command::ClickCell {
            cell: cell(&mut words)?,
        }),
        "inspect" => single(Command::InspectCell {
            cell: cell(&mut words)?,
        }),
        "walk" => Ok(Input::Walk),
        "tick" => {
            let count = match words.next() {
                Some(count) => number(count)?,
                None => 1,
            };
            if count > MAX_TICKS {
                return Err(format!("tick accepts at most {MAX_TICKS} ticks at once"));
            }
            Ok(Input::Commands(vec![Command::Tick; count]))
        }
        "menu" => single(Command::OpenGameMenu),
        "jump" => single(Command::OpenJumpMenu),
        "store" => single(Command::OpenStoreMenu {
            store: number(words.next().ok_or("store needs an index")?)?,
        }),
        "up" => single(Command::MenuUp),
        "down" => single(Command::MenuDown),
        "ok" => single(Command::MenuSelect),
        "choose" => single(Command::MenuChoose {
            index: number(words.next().ok_or("choose needs an index")?)?,
        }),
        "esc" => single(Command::MenuClose),
        "save" => single(Command::SaveGame {
            archive: words.next().unwrap_or(default_archive).to_owned(),
        }),
        "load" => single(Command::LoadGame {
            archive: words.next().unwrap_or(default_archive).to_owned(),
        }),
        "new" => single(Command::NewGame),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Exit),
        other => Err(format!("unknown command `{other}`, try `help`")),
    }
}

fn cell<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<CellCoord, String> {
    let x = words.next().ok_or("missing x coordinate")?;
    let y = words.next().ok_or("missing y coordinate")?;
    Ok(CellCoord::new(number(x)?, number(y)?))
}

fn number<T: std::str::FromStr>(word: &str) -> Result<T, String> {
    word.parse().map_err(|_| format!("`{word}` is not a number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_map_to_directions() {
        assert_eq!(
            parse("d", "auto"),
            Ok(Input::Commands(vec![Command::MoveHero {
                direction: Direction::East
            }]))
        );
        assert_eq!(
            parse("W", "auto"),
            Ok(Input::Commands(vec![Command::MoveHero {
                direction: Direction::North
            }]))
        );
    }

    #[test]
    fn clicks_carry_coordinates() {
        assert_eq!(
            parse("click 3 4", "auto"),
            Ok(Input::Commands(vec![Command::ClickCell {
                cell: CellCoord::new(3, 4)
            }]))
        );
        assert!(parse("click 3", "auto").is_err());
        assert!(parse("click x 4", "auto").is_err());
    }

    #[test]
    fn ticks_repeat() {
        assert_eq!(
            parse("tick 3", "auto"),
            Ok(Input::Commands(vec![Command::Tick; 3]))
        );
    }

    #[test]
    fn huge_tick_counts_are_refused() {
        assert!(parse("tick 99999999999999", "auto").is_err());
        assert_eq!(
            parse("tick 10000", "auto").map(|input| match input {
                Input::Commands(commands) => commands.len(),
                _ => 0,
            }),
            Ok(10_000)
        );
    }

    #[test]
    fn archives_default_when_unnamed() {
        assert_eq!(
            parse("save", "auto"),
            Ok(Input::Commands(vec![Command::SaveGame {
                archive: "auto".to_owned()
            }]))
        );
        assert_eq!(
            parse("load slot2", "auto"),
            Ok(Input::Commands(vec![Command::LoadGame {
                archive: "slot2".to_owned()
            }]))
        );
    }

    #[test]
    fn blank_lines_dismiss_messages() {
        assert_eq!(
            parse("   ", "auto"),
            Ok(Input::Commands(vec![Command::Dismiss]))
        );
    }
}
