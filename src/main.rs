mod debug_report;

use std::io::{self, IsTerminal, Read};
use std::sync::Arc;

use memberfind::{
    ClassPool, ClassRules, ConfigurationError, ConstructorRules, FieldRules, MethodRules, Modifiers, Options, ParamType,
    Positional, PositionalSelector, Reflector,
};
use tracing_subscriber::EnvFilter;

use debug_report::Report;

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    let options = Options { log_failures: false, ..Options::from_env() };
    init_tracing(options.debug_timing);

    let pool = match ClassPool::from_json(&config.model) {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };
    let reflector = Reflector::new(Arc::new(pool)).options(options);

    match run(&reflector, &config) {
        Ok(report) => {
            debug_report::print_report(&report, config.color);
            std::process::exit(if report.diagnostics.is_none() { 0 } else { 1 });
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "memberfind=debug" } else { "memberfind=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Query {
    Field,
    Method,
    Constructor,
    Class,
}

#[derive(Debug)]
struct CliConfig {
    model: String,
    query: Query,
    target: Option<String>,
    class_name: Option<String>,
    packages: Vec<String>,
    filters: Filters,
    color: bool,
}

/// Member-level flags, shared by direct lookups and nested class rules.
#[derive(Debug, Clone, Default)]
struct Filters {
    member_name: Option<String>,
    param_count: Option<usize>,
    params: Option<Vec<ParamType>>,
    returns: Option<String>,
    ty: Option<String>,
    selector: Option<PositionalSelector>,
    superclass: bool,
    superclass_only: bool,
}

fn run(reflector: &Reflector, config: &CliConfig) -> Result<Report, ConfigurationError> {
    let target = config.target.clone().unwrap_or_default();
    let report = match config.query {
        Query::Field => {
            Report::from_result(&target, reflector.field(target.as_str(), |r| field_rules(&config.filters, r))?)
        }
        Query::Method => {
            Report::from_result(&target, reflector.method(target.as_str(), |r| method_rules(&config.filters, r))?)
        }
        Query::Constructor => Report::from_result(
            &target,
            reflector.constructor(target.as_str(), |r| constructor_rules(&config.filters, r))?,
        ),
        Query::Class => {
            let label = reflector.host().label();
            Report::from_result(&label, reflector.class(|r| class_rules(config, r))?)
        }
    };
    Ok(report)
}

/// Hand the selector to the first slot that gets set.
fn attach(slot: Positional<'_>, selector: &mut Option<PositionalSelector>) {
    if let Some(selector) = selector.take() {
        slot.select(selector);
    }
}

fn field_rules(filters: &Filters, r: &mut FieldRules) {
    let mut selector = filters.selector;
    if let Some(name) = &filters.member_name {
        attach(r.name(name.as_str()), &mut selector);
    }
    if let Some(ty) = &filters.ty {
        attach(r.ty(ty.as_str()), &mut selector);
    }
    if filters.superclass_only {
        r.superclass_only();
    } else if filters.superclass {
        r.superclass();
    }
}

fn method_rules(filters: &Filters, r: &mut MethodRules) {
    let mut selector = filters.selector;
    if let Some(name) = &filters.member_name {
        attach(r.name(name.as_str()), &mut selector);
    }
    if let Some(n) = filters.param_count {
        attach(r.param_count(n), &mut selector);
    }
    if let Some(types) = &filters.params {
        attach(r.param_types(types.clone()), &mut selector);
    }
    if let Some(ty) = &filters.returns {
        attach(r.return_type(ty.as_str()), &mut selector);
    }
    if filters.superclass_only {
        r.superclass_only();
    } else if filters.superclass {
        r.superclass();
    }
}

fn constructor_rules(filters: &Filters, r: &mut ConstructorRules) {
    let mut selector = filters.selector;
    if let Some(n) = filters.param_count {
        attach(r.param_count(n), &mut selector);
    }
    if let Some(types) = &filters.params {
        attach(r.param_types(types.clone()), &mut selector);
    }
    if filters.superclass_only {
        r.superclass_only();
    } else if filters.superclass {
        r.superclass();
    }
}

fn class_rules(config: &CliConfig, r: &mut ClassRules) {
    for package in &config.packages {
        r.from_package(package.as_str(), false);
    }
    if let Some(name) = &config.class_name {
        if name.contains('.') {
            r.full_name(name.as_str(), false);
        } else {
            r.simple_name(name.as_str(), false);
        }
    }
    let filters = &config.filters;
    // --index / --last pick among the classes that pass every other rule.
    if let Some(selector) = filters.selector {
        r.modifiers(Modifiers::empty()).select(selector);
    }
    if filters.member_name.is_some() || filters.param_count.is_some() || filters.params.is_some() {
        let nested = Filters { selector: None, superclass: false, superclass_only: false, ty: None, ..filters.clone() };
        r.method(|m| method_rules(&nested, m));
    }
    if let Some(ty) = &filters.ty {
        r.field(|f| {
            f.ty(ty.as_str());
        });
    }
}

// --- Arguments ----------------------------------------------------------------

fn parse_args() -> Result<CliConfig, String> {
    let mut model_path: Option<String> = None;
    let mut query: Option<Query> = None;
    let mut config = CliConfig {
        model: String::new(),
        query: Query::Method,
        target: None,
        class_name: None,
        packages: Vec::new(),
        filters: Filters::default(),
        color: io::stdout().is_terminal(),
    };
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            match inline.clone() {
                Some(v) => Ok(v),
                None => args.next().ok_or_else(|| format!("error: {name} expects a value")),
            }
        };
        match flag.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("memberfind {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => config.color = true,
            "--no-color" => config.color = false,
            "--model" | "-m" => model_path = Some(value("--model")?),
            "--class" | "-c" => config.target = Some(value("--class")?),
            "--field" => {
                set_query(&mut query, Query::Field)?;
                config.filters.member_name = Some(value("--field")?);
            }
            "--method" => {
                set_query(&mut query, Query::Method)?;
                config.filters.member_name = Some(value("--method")?);
            }
            "--constructor" => set_query(&mut query, Query::Constructor)?,
            "--find-class" => {
                query = Some(Query::Class);
                let name = value("--find-class")?;
                config.class_name = (name != "*").then_some(name);
            }
            "--param-count" => {
                let raw = value("--param-count")?;
                config.filters.param_count =
                    Some(raw.parse().map_err(|_| format!("error: invalid --param-count '{raw}'"))?);
            }
            "--params" => config.filters.params = Some(parse_params(&value("--params")?)),
            "--returns" => config.filters.returns = Some(value("--returns")?),
            "--type" => config.filters.ty = Some(value("--type")?),
            "--index" => {
                let raw = value("--index")?;
                let ordinal = raw.parse().map_err(|_| format!("error: invalid --index '{raw}'"))?;
                config.filters.selector = Some(PositionalSelector::at(ordinal));
            }
            "--last" => config.filters.selector = Some(PositionalSelector::last()),
            "--super" => config.filters.superclass = true,
            "--super-only" => config.filters.superclass_only = true,
            "--package" => config.packages.push(value("--package")?),
            _ => return Err(format!("error: unknown option '{arg}'\n\n{}", help_text())),
        }
    }

    // No explicit kind: --type alone means a field lookup.
    config.query = match query {
        Some(query) => query,
        None if config.filters.ty.is_some() => Query::Field,
        None => Query::Method,
    };
    if config.query != Query::Class && config.target.is_none() {
        return Err(format!("error: --class is required for member lookups\n\n{}", help_text()));
    }

    config.model = match model_path {
        Some(path) if path != "-" => {
            std::fs::read_to_string(&path).map_err(|err| format!("error: failed to read {path}: {err}"))?
        }
        _ => read_stdin()?,
    };
    Ok(config)
}

fn set_query(query: &mut Option<Query>, next: Query) -> Result<(), String> {
    match *query {
        Some(Query::Class) => Ok(()),
        Some(current) if current != next => Err(format!("error: {next:?} lookup conflicts with {current:?} lookup")),
        _ => {
            *query = Some(next);
            Ok(())
        }
    }
}

/// `java.lang.String,_,int` -> exact, wildcard, exact. An empty list stays
/// empty so validation can reject it.
fn parse_params(raw: &str) -> Vec<ParamType> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| if s == "_" || s == "*" { ParamType::Any } else { ParamType::from(s) })
        .collect()
}

fn read_stdin() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn help_text() -> String {
    format!(
        "memberfind {version}

Resolve fields, methods, constructors or classes in a JSON class model.

Usage:
  memberfind --model <file> --class <name> --method <name> [OPTIONS]
  memberfind --model <file> --find-class <name|*> [--package <pkg>] [OPTIONS]

Lookup:
  -m, --model <file>         Class model (JSON). '-' or omitted reads stdin.
  -c, --class <name>         Class whose declared members are searched.
  --field <name>             Find a field by name.
  --method <name>            Find a method by name.
  --constructor              Find a constructor.
  --find-class <name|*>      Search every class; simple or full name, '*' for any.
                             Member flags then describe a method the class declares.

Rules:
  --param-count <n>          Exact parameter count.
  --params <a,b,_>           Exact parameter types; '_' matches any type.
  --returns <type>           Method return type.
  --type <type>              Field type.
  --index <k>                Pick the k-th match (negative counts from the end).
  --last                     Pick the last match.
  --super                    Search superclasses when the class has no match.
  --super-only               Start the search at the direct superclass.
  --package <pkg>            Restrict class search to a package (repeatable).

Output:
  --color / --no-color       Force or disable ANSI colour.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {debug_env}=1         Log resolution timings to stderr.
  RUST_LOG                   Override the log filter.

Exit codes:
  0  Found.
  1  Not found.
  2  Invalid arguments, model or rules.
",
        version = env!("CARGO_PKG_VERSION"),
        debug_env = memberfind::DEBUG_ENV,
    )
}
