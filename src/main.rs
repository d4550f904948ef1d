use std::env;
use std::process;
use clap::{AppSettings, Parser};
use log::{debug, LevelFilter};
use rust_jvm::classpath::Classpath;
use rust_jvm::vm::thread::slot::Slot;
use rust_jvm::vm::thread::thread::{DEFAULT_MAX_STACK_DEPTH, ThreadStatus};
use rust_jvm::vm::vm::{Vm, VmOptions};

/// Runs the `main` method of a Java class.
#[derive(Parser, Debug)]
#[clap(name = "rust-jvm", version)]
#[clap(setting = AppSettings::TrailingVarArg)]
struct Cli {
    /// JRE directory holding lib/rt.jar and lib/ext
    #[clap(long = "Xjre", value_name = "DIR")]
    jre: Option<String>,

    /// User class path: directories, jars and `dir/*` wildcards
    #[clap(long = "classpath", alias = "cp", value_name = "PATH")]
    classpath: Option<String>,

    /// Log every loaded class
    #[clap(long)]
    verbose_class: bool,

    /// Log every executed instruction
    #[clap(long)]
    verbose_inst: bool,

    /// off, error, warn, info, debug or trace
    #[clap(long, value_name = "LEVEL")]
    log_level: Option<LevelFilter>,

    #[clap(long, default_value_t = DEFAULT_MAX_STACK_DEPTH)]
    max_stack_depth: usize,

    /// Main class, with dots or slashes
    main_class: String,

    #[clap(multiple_values = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Cli {
    fn level(&self) -> LevelFilter {
        match self.log_level {
            Some(level) => level,
            None if self.verbose_inst => LevelFilter::Trace,
            None if self.verbose_class => LevelFilter::Info,
            None => LevelFilter::Warn,
        }
    }
}

/// Accepts the java launcher spellings `-Xjre`, `-cp` and `-classpath` for the options before
/// the main class.
fn launcher_args(args: impl Iterator<Item=String>) -> Vec<String> {
    let mut in_options = true;
    let mut expects_value = false;
    let mut result = vec![];

    for arg in args {
        if in_options && !expects_value {
            let arg = match arg.as_str() {
                "-Xjre" => "--Xjre".to_string(),
                "-cp" | "-classpath" => "--classpath".to_string(),
                _ => arg,
            };
            expects_value = matches!(arg.as_str(), "--Xjre" | "--classpath" | "--log-level" | "--max-stack-depth");
            in_options = result.is_empty() || arg.starts_with('-');
            result.push(arg);
        } else {
            expects_value = false;
            result.push(arg);
        }
    }
    result
}

fn setup_logger(level: LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), String> {
    let classpath = Classpath::parse(cli.jre.as_deref(), cli.classpath.as_deref());
    debug!("{:?}", classpath);

    let options = VmOptions {
        max_stack_depth: cli.max_stack_depth,
        verbose_inst: cli.verbose_inst,
    };
    let mut vm = Vm::new(Box::new(classpath), options);
    vm.load_basic_classes().map_err(|e| format!("Error: could not load the core classes: {}", e))?;

    let class = vm.load_class(&cli.main_class.replace('.', "/"))
        .map_err(|e| format!("Error: Could not find or load main class {}\nCaused by: {}", cli.main_class, e))?;
    let main = vm.main_method(class)
        .ok_or_else(|| format!("Error: Main method not found in class {}, please define the main method as:\n   \
                                public static void main(String[] args)", cli.main_class))?;
    let args = vm.string_array(&cli.args).map_err(|e| format!("Error: {}", e))?;

    match vm.interpret(main, &[Slot::Ref(Some(args))]) {
        ThreadStatus::FAILED(message) => Err(format!("Exception in thread \"main\" {}", message)),
        status => {
            debug!("main returned: {:?}", status);
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse_from(launcher_args(env::args()));

    if let Err(e) = setup_logger(cli.level()) {
        eprintln!("Could not set up logging: {}", e);
    }

    if let Err(message) = run(&cli) {
        eprintln!("{}", message);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::launcher_args;

    fn args(values: &[&str]) -> Vec<String> {
        launcher_args(values.iter().map(|s| s.to_string()))
    }

    #[test]
    fn launcher_spellings() {
        assert_eq!(args(&["rust-jvm", "-cp", "out", "-Xjre", "/jre", "pkg.Main", "-cp"]),
                   vec!["rust-jvm", "--classpath", "out", "--Xjre", "/jre", "pkg.Main", "-cp"]);
    }

    #[test]
    fn option_values_are_kept() {
        assert_eq!(args(&["rust-jvm", "-classpath", "-cp", "Main"]),
                   vec!["rust-jvm", "--classpath", "-cp", "Main"]);
    }
}
