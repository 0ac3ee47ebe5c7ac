use clap::Parser;
use routh::{RouthBuilder, RouthError};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "routh")]
#[command(version)]
#[command(allow_negative_numbers = true)]
#[command(about = "Routh array of a characteristic polynomial")]
struct Args {
    /// Coefficients from the highest degree, e.g. `1 2 3 1`, `"1 2 3 1"` or
    /// `"[1, a, b, c]"`. Quoted lists without commas are split on whitespace.
    /// Starts an interactive prompt when omitted.
    #[arg(value_name = "COEFFICIENTS")]
    coefficients: Vec<String>,

    /// Keep entries as exact expressions
    #[arg(short, long)]
    symbolic: bool,

    /// Value replacing a zero first element in numeric mode
    #[arg(short, long, default_value = "0.01")]
    epsilon: f64,

    /// Symbol replacing a zero first element in symbolic mode
    #[arg(long, default_value = "eps")]
    epsilon_symbol: String,

    /// Polynomial variable
    #[arg(long, default_value = "s")]
    variable: String,

    /// Log details of the construction (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ["1 2 3", "a*b"] => "1,2,3,a*b", lists with commas or brackets are left alone
fn coefficient_text(args: &[String]) -> String {
    args.iter()
        .flat_map(|arg| {
            if arg.contains([',', '[', '{']) {
                vec![arg.as_str()]
            } else {
                arg.split_whitespace().collect()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn evaluate(builder: &RouthBuilder, input: &str) -> Result<String, RouthError> {
    let polynomial = routh::parse_coefficients(input)?;
    let ra = builder.build(&polynomial)?;
    Ok(ra.to_string())
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to set tracing subscriber: {}", e))?;

    let builder = RouthBuilder::new()
        .symbolic(args.symbolic)
        .epsilon(args.epsilon)
        .epsilon_symbol(&args.epsilon_symbol)
        .variable(&args.variable);

    if !args.coefficients.is_empty() {
        let input = coefficient_text(&args.coefficients);
        return evaluate(&builder, &input)
            .map(|table| print!("{}", table))
            .map_err(|e| e.to_string());
    }

    use rustyline::error::ReadlineError;
    let mut rl = rustyline::DefaultEditor::new().map_err(|e| e.to_string())?;
    loop {
        match rl.readline("~> ") {
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(format!("Readline err: {:?}", e)),
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match evaluate(&builder, &line) {
                    Err(e) => println!("Err: {}", e),
                    Ok(table) => print!("{}", table),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(args: &[&str]) -> String {
        coefficient_text(&args.iter().map(|a| a.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn whitespace_separated_coefficients() {
        assert_eq!(text(&["1", "2", "3", "1"]), "1,2,3,1");
        assert_eq!(text(&["1 2 3 1"]), "1,2,3,1");
        assert_eq!(text(&["1 2", "a*b"]), "1,2,a*b");
        assert_eq!(text(&["[1, a, b, c]"]), "[1, a, b, c]");
        assert_eq!(text(&["1, 2 * k"]), "1, 2 * k");
    }

    #[test]
    fn evaluates_quoted_list() -> Result<(), RouthError> {
        let builder = RouthBuilder::new();
        assert_eq!(
            evaluate(&builder, &text(&["1 2 3 1"]))?,
            evaluate(&builder, "1, 2, 3, 1")?
        );
        Ok(())
    }
}
