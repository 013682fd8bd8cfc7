use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use sokoban::{
    Command, DEFAULT_LEVEL_DIR, Direction, Game, GameConfig, GameError, LevelCollection,
    LevelDirectory, LevelSource, MAX_LEVEL, Outcome, UndoMode,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UndoType {
    Replay,
    Restore,
}

impl From<UndoType> for UndoMode {
    fn from(undo: UndoType) -> Self {
        match undo {
            UndoType::Replay => UndoMode::Replay,
            UndoType::Restore => UndoMode::Restore,
        }
    }
}

#[derive(Parser)]
#[command(name = "sokoban")]
#[command(about = "Play Sokoban in the terminal", long_about = None)]
struct Args {
    /// Directory holding one level.NN.txt file per level
    #[arg(
        short = 'L',
        long,
        value_name = "DIR",
        env = "SOKOBAN_LEVELS",
        default_value = DEFAULT_LEVEL_DIR
    )]
    levels: PathBuf,

    /// Read levels from a single XSB collection file instead of a directory
    #[arg(short, long, value_name = "FILE")]
    collection: Option<PathBuf>,

    /// Level number to start on (0-indexed)
    #[arg(short, long, default_value = "0")]
    level: usize,

    /// Last level number reachable by navigation or completion
    #[arg(long, default_value_t = MAX_LEVEL)]
    max_level: usize,

    /// How undo reverses a move
    #[arg(short, long, value_enum, default_value = "replay")]
    undo_mode: UndoType,

    /// Apply a move script (n/s/e/w or u/d/l/r to move, z to undo, > and <
    /// to change level, ! to restart) and print the final board
    #[arg(short, long, value_name = "MOVES")]
    moves: Option<String>,
}

enum Input {
    Command(Command),
    Quit,
}

fn parse_line(line: &str) -> Option<Input> {
    let command = match line.trim().to_lowercase().as_str() {
        "n" | "north" | "up" => Command::Move(Direction::North),
        "s" | "south" | "down" => Command::Move(Direction::South),
        "e" | "east" | "right" => Command::Move(Direction::East),
        "w" | "west" | "left" => Command::Move(Direction::West),
        "u" | "undo" => Command::Undo,
        "next" | ">" => Command::NextLevel,
        "prev" | "previous" | "<" => Command::PreviousLevel,
        "r" | "restart" => Command::Restart,
        "q" | "quit" | "exit" => return Some(Input::Quit),
        _ => return None,
    };
    Some(Input::Command(command))
}

fn script_command(ch: char) -> Option<Command> {
    let command = match ch.to_ascii_lowercase() {
        'n' | 'u' => Command::Move(Direction::North),
        's' | 'd' => Command::Move(Direction::South),
        'e' | 'r' => Command::Move(Direction::East),
        'w' | 'l' => Command::Move(Direction::West),
        'z' => Command::Undo,
        '>' => Command::NextLevel,
        '<' => Command::PreviousLevel,
        '!' => Command::Restart,
        _ => return None,
    };
    Some(command)
}

fn print_status(game: &Game) {
    let board = game.board();
    let history = game.history();
    let on_goal = board
        .box_positions()
        .filter(|&pos| board.cell(pos).is_some_and(|cell| cell.is_goal()))
        .count();
    println!(
        "\nLevel {}  moves: {}  pushes: {}  boxes on goals: {}/{}{}\n{}",
        game.level(),
        history.len(),
        history.pushes(),
        on_goal,
        board.boxes().len(),
        if board.is_complete() { "  complete" } else { "" },
        board
    );
}

/// Apply one command. Returns `true` once the final level is complete.
fn run_command(game: &mut Game, command: Command) -> Result<bool> {
    match game.apply(command) {
        Ok(Outcome::Completed { level, next }) => {
            println!("Level {} complete! On to level {}.", level, next);
            Ok(false)
        }
        Ok(Outcome::Finished { level }) => {
            println!("Level {} complete! That was the last level.", level);
            Ok(true)
        }
        Ok(Outcome::Playing | Outcome::LevelChanged { .. }) => Ok(false),
        // A failed navigation leaves the current level playable
        Err(GameError::Level(err)) if !game.board().is_complete() => {
            warn!("{}", err);
            println!("Cannot change level: {}", err);
            Ok(false)
        }
        Err(err) => Err(err).with_context(|| format!("game stopped on level {}", game.level())),
    }
}

fn play_script(game: &mut Game, script: &str) -> Result<()> {
    for ch in script.chars().filter(|c| !c.is_whitespace()) {
        let command = script_command(ch).with_context(|| format!("unknown move '{}'", ch))?;
        if run_command(game, command)? {
            break;
        }
    }
    print_status(game);
    Ok(())
}

fn play_interactive(game: &mut Game) -> Result<()> {
    println!(
        "Push every box ($) onto a goal (.).\n\
         Commands: n, s, e, w to move, u to undo, next, prev, r to restart, q to quit."
    );
    print_status(game);

    let mut lines = io::stdin().lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("cannot read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(&line) {
            Some(Input::Quit) => break,
            Some(Input::Command(command)) => {
                let finished = run_command(game, command)?;
                print_status(game);
                if finished {
                    break;
                }
            }
            None => println!("Unknown command `{}`, please try again.", line.trim()),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.level > args.max_level {
        bail!(
            "start level {} is past the last level {}",
            args.level,
            args.max_level
        );
    }

    let source: Box<dyn LevelSource> = match &args.collection {
        Some(path) => {
            let collection = LevelCollection::from_file(path)
                .with_context(|| format!("cannot load collection {}", path.display()))?;
            if collection.is_empty() {
                bail!("no levels found in {}", path.display());
            }
            info!("read {} levels from {}", collection.len(), path.display());
            Box::new(collection)
        }
        None => Box::new(LevelDirectory::new(args.levels.clone())),
    };

    let config = GameConfig {
        start_level: args.level,
        max_level: args.max_level,
        undo_mode: args.undo_mode.into(),
    };
    let mut game =
        Game::new(source, config).with_context(|| format!("cannot start on level {}", args.level))?;
    info!("starting on level {} with {} undo", game.level(), game.undo_mode());

    match args.moves {
        Some(script) => play_script(&mut game, &script),
        None => play_interactive(&mut game),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert!(matches!(
            parse_line(" North "),
            Some(Input::Command(Command::Move(Direction::North)))
        ));
        assert!(matches!(parse_line("u"), Some(Input::Command(Command::Undo))));
        assert!(matches!(
            parse_line("prev"),
            Some(Input::Command(Command::PreviousLevel))
        ));
        assert!(matches!(parse_line("q"), Some(Input::Quit)));
        assert!(parse_line("jump").is_none());
    }

    #[test]
    fn test_script_command() {
        let commands: Vec<Command> = "nEsWuRdLz><!".chars().filter_map(script_command).collect();
        assert_eq!(
            commands,
            vec![
                Command::Move(Direction::North),
                Command::Move(Direction::East),
                Command::Move(Direction::South),
                Command::Move(Direction::West),
                Command::Move(Direction::North),
                Command::Move(Direction::East),
                Command::Move(Direction::South),
                Command::Move(Direction::West),
                Command::Undo,
                Command::NextLevel,
                Command::PreviousLevel,
                Command::Restart,
            ]
        );
        assert_eq!(script_command('x'), None);
    }

    #[test]
    fn test_run_script_through_levels() {
        let levels = LevelCollection::from_text("#@$.#\n\n#.$@ #\n");
        let mut game = Game::new(Box::new(levels), GameConfig::default()).unwrap();

        assert!(!run_command(&mut game, Command::Move(Direction::East)).unwrap());
        assert_eq!(game.level(), 1);

        // Completing level 1 tries to load the missing level 2
        let result = run_command(&mut game, Command::Move(Direction::West));
        assert!(result.is_err());
    }

    #[test]
    fn test_failed_navigation_is_not_fatal() {
        let levels = LevelCollection::from_text("#@$ .#\n");
        let mut game = Game::new(Box::new(levels), GameConfig::default()).unwrap();

        assert!(!run_command(&mut game, Command::NextLevel).unwrap());
        assert_eq!(game.level(), 0);
    }
}
