use std::io::{self, Read};
use std::process::ExitCode;

use hexp::{parse_html, Attributes, HtmlOptions, Node};
use tracing::{info, span, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// What to do with the nodes the selector picks
#[derive(Debug, PartialEq)]
enum Action {
    Print,
    Count,
    Remove,
    AddClass(String),
    Wrap(String),
}

#[derive(Debug)]
struct Args {
    pub selector: String,
    pub action: Action,
    pub doctype: bool,
    pub encoding: Option<String>,
    pub trace: bool,
}

#[derive(Debug, thiserror::Error)]
enum ArgsError {
    #[error(transparent)]
    Args(#[from] pico_args::Error),
    #[error("only one of {0} can be given")]
    ConflictingActions(String),
    #[error("unexpected arguments: {0}")]
    Unexpected(String),
}

fn main() -> ExitCode {
    let args = match parse_args(pico_args::Arguments::from_env()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("usage: hexp [--trace] [--count|--remove|--add-class C|--wrap T] [--no-doctype] [--encoding E] SELECTOR < input.html");
            return ExitCode::from(2);
        }
    };
    if args.trace {
        tracing_subscriber::fmt::fmt()
            .with_span_events(FmtSpan::ACTIVE)
            .with_max_level(Level::DEBUG)
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .finish()
            .init();
        info!("Logger initialized");
    }

    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_args(mut pargs: pico_args::Arguments) -> Result<Args, ArgsError> {
    let trace = pargs.contains(["-t", "--trace"]);
    let doctype = !pargs.contains("--no-doctype");
    let encoding = pargs.opt_value_from_str("--encoding")?;

    let mut actions = Vec::new();
    if pargs.contains("--count") {
        actions.push(("--count", Action::Count));
    }
    if pargs.contains("--remove") {
        actions.push(("--remove", Action::Remove));
    }
    if let Some(class) = pargs.opt_value_from_str("--add-class")? {
        actions.push(("--add-class", Action::AddClass(class)));
    }
    if let Some(tag) = pargs.opt_value_from_str("--wrap")? {
        actions.push(("--wrap", Action::Wrap(tag)));
    }
    let action = match actions.pop() {
        None => Action::Print,
        Some((_, action)) if actions.is_empty() => action,
        Some((last, _)) => {
            let mut flags: Vec<&str> = actions.iter().map(|(flag, _)| *flag).collect();
            flags.push(last);
            return Err(ArgsError::ConflictingActions(flags.join(", ")));
        }
    };

    let selector = pargs.free_from_str()?;
    let rest = pargs.finish();
    if !rest.is_empty() {
        let rest: Vec<_> = rest.iter().map(|arg| arg.to_string_lossy()).collect();
        return Err(ArgsError::Unexpected(rest.join(" ")));
    }
    Ok(Args {
        selector,
        action,
        doctype,
        encoding,
        trace,
    })
}

#[cfg(test)]
fn arguments(list: &[&str]) -> pico_args::Arguments {
    pico_args::Arguments::from_vec(list.iter().map(std::ffi::OsString::from).collect())
}

#[cfg(test)]
#[test]
fn test_parse_args() {
    let parsed = parse_args(arguments(&["--add-class", "seen", "ul li"])).unwrap();
    assert_eq!(parsed.selector, "ul li");
    assert_eq!(parsed.action, Action::AddClass("seen".to_string()));
    assert!(parsed.doctype);

    let parsed = parse_args(arguments(&["-t", "--no-doctype", "--encoding", "latin1", "p"])).unwrap();
    assert_eq!(parsed.action, Action::Print);
    assert_eq!(parsed.encoding.as_deref(), Some("latin1"));
    assert!(parsed.trace && !parsed.doctype);

    assert!(matches!(
        parse_args(arguments(&["--count", "--remove", "p"])),
        Err(ArgsError::ConflictingActions(flags)) if flags == "--count, --remove"
    ));
    assert!(matches!(
        parse_args(arguments(&["p", "extra"])),
        Err(ArgsError::Unexpected(rest)) if rest == "extra"
    ));
    assert!(matches!(parse_args(arguments(&[])), Err(ArgsError::Args(_))));
}

fn run(args: &Args) -> hexp::Result<String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| hexp::Error::illegal_request(format!("could not read stdin: {}", e)))?;
    let document = parse_html(&input)?;

    let span = span!(Level::DEBUG, "run", selector = args.selector.as_str());
    let _enter = span.enter();

    let mut options = HtmlOptions::default().include_doctype(args.doctype);
    if let Some(encoding) = &args.encoding {
        options = options.encoding(encoding.as_str());
    }
    let selection = document.select(&args.selector)?;
    let rewritten: Node = match &args.action {
        Action::Print => {
            let fragment = HtmlOptions::fragment();
            let matches: Vec<String> = selection.map(|node| node.to_html(&fragment)).collect();
            return Ok(matches.join("\n"));
        }
        Action::Count => return Ok(selection.count().to_string()),
        Action::Remove => selection.remove()?,
        Action::AddClass(class) => selection.add_class(class)?,
        Action::Wrap(tag) => selection.wrap(tag.as_str(), Attributes::new())?,
    };
    Ok(rewritten.to_html(&options))
}
