use rating_engine::universe::{BIG_TECH, PENNY, SMALL_CAP};
use rating_engine::{parse_custom_list, TickerUniverse};
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A named list from the universe
    List(String),
    /// Print the metric guide and exit
    Info,
    /// Ask for a comma-separated list
    CustomPrompt,
    Custom(Vec<String>),
}

/// Map a menu number or list name to a selection.
pub fn parse_choice(choice: &str, universe: &TickerUniverse) -> Option<Selection> {
    match choice.trim() {
        "1" => Some(Selection::List(PENNY.to_string())),
        "2" => Some(Selection::List(SMALL_CAP.to_string())),
        "3" => Some(Selection::List(BIG_TECH.to_string())),
        "4" => Some(Selection::Info),
        "5" => Some(Selection::CustomPrompt),
        other => universe
            .resolve(other)
            .map(|list| Selection::List(list.key.clone())),
    }
}

pub fn menu_text(universe: &TickerUniverse) -> String {
    let mut text = String::from("Input a number and press enter:\n");
    text.push_str("1: Penny Stocks\n");
    text.push_str("2: Small Cap Stocks\n");
    text.push_str("3: Big Tech Stocks\n");
    text.push_str("4: Info on Metrics and Weighing\n");
    text.push_str("5: Custom Ticker List\n");

    let extra: Vec<&str> = universe
        .lists()
        .iter()
        .map(|l| l.key.as_str())
        .filter(|k| ![PENNY, SMALL_CAP, BIG_TECH].contains(k))
        .collect();
    if !extra.is_empty() {
        text.push_str(&format!("Or a list name: {}\n", extra.join(", ")));
    }
    text
}

/// Print `message` and read one line from stdin.
pub fn prompt(message: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", message)?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn prompt_custom_list() -> io::Result<Vec<String>> {
    let input = prompt("Enter custom ticker symbols separated by commas: ")?;
    Ok(parse_custom_list(&input))
}
