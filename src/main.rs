//! mathshell entry point

use std::cell::RefCell;
use std::io::Read;
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, ValueEnum};
use tracing::debug;

use mathshell::engine::definitions::Definitions;
use mathshell::shell::{
    self, interactive_eval_loop, BackendOptions, BatchShell, EditModeOpt, LoopOptions,
    MinimalShell, RichShell,
};
use mathshell::util::logger;
use mathshell::{Context, NAME, VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// Raw-mode editor with live highlighting and a status toolbar
    Rich,
    /// rustyline editor with history and completion
    Minimal,
    /// No line editing; reads stdin to exhaustion
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EditModeArg {
    Emacs,
    Vi,
}

#[derive(Debug, Parser)]
#[command(name = "mathshell", version, about = "Terminal shell for symbolic-expression evaluation")]
struct Cli {
    /// Input backend
    #[arg(long, value_enum, default_value = "rich")]
    backend: BackendArg,

    /// Highlight style name, or "none" to disable styling
    #[arg(long)]
    style: Option<String>,

    /// Disable tab completion
    #[arg(long)]
    no_completion: bool,

    /// Disable unicode input normalization
    #[arg(long)]
    no_unicode: bool,

    /// Suppress In[n]/Out[n] prompts and the banner
    #[arg(long)]
    no_prompt: bool,

    /// Initial editing mode
    #[arg(long, value_enum, default_value = "emacs")]
    edit_mode: EditModeArg,

    /// Print string results bare instead of re-quoted
    #[arg(long)]
    strict_output: bool,

    /// Evaluate an expression before (or instead of) interaction;
    /// repeatable
    #[arg(short = 'c', long = "code")]
    code: Vec<String>,

    /// Evaluate a file before (or instead of) interaction
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// Stay interactive after --code / --file evaluation
    #[arg(long)]
    persist: bool,

    /// Suppress the startup banner
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Resolve the effective highlight style: an explicit "none" or the
    /// NO_COLOR convention disables styling
    fn resolved_style(&self) -> Option<String> {
        match &self.style {
            Some(name) if name.eq_ignore_ascii_case("none") => None,
            Some(name) => Some(name.clone()),
            None => {
                if std::env::var_os("NO_COLOR").is_some() {
                    None
                } else {
                    Some("default".to_string())
                }
            }
        }
    }

    /// Source text collected from --code and --file
    fn batch_source(&self) -> mathshell::Result<Option<String>> {
        let mut source = String::new();
        if let Some(path) = &self.file {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            source.push_str(&text);
            if !source.ends_with('\n') {
                source.push('\n');
            }
        }
        for code in &self.code {
            source.push_str(code);
            source.push('\n');
        }
        if source.is_empty() {
            Ok(None)
        } else {
            Ok(Some(source))
        }
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("mathshell: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run() -> mathshell::Result<i32> {
    let cli = Cli::parse();
    if cli.verbose {
        logger::init_debug();
    } else {
        logger::init();
    }

    let style = cli.resolved_style();
    let definitions = Rc::new(RefCell::new(Definitions::new()));
    let options = BackendOptions {
        style: style.clone(),
        want_completion: !cli.no_completion,
        use_unicode: !cli.no_unicode,
        show_prompt: !cli.no_prompt,
        edit_mode: match cli.edit_mode {
            EditModeArg::Emacs => EditModeOpt::Emacs,
            EditModeArg::Vi => EditModeOpt::Vi,
        },
    };
    shell::config::install_settings(&definitions, &options);

    // --code / --file evaluate first; without --persist they are the
    // whole session
    if let Some(source) = cli.batch_source()? {
        let code = run_batch(&definitions, &source, &cli, style.clone())?;
        if !cli.persist || code != 0 {
            return Ok(code);
        }
    }

    if options.show_prompt && !cli.quiet {
        println!("{NAME} {VERSION}");
        println!("Type Quit[] or press Ctrl-D to exit.");
        println!();
    }

    let loop_options = LoopOptions {
        show_prompt: options.show_prompt,
        strict: cli.strict_output,
        output_style: None,
    };

    match cli.backend {
        BackendArg::Rich => {
            debug!("starting rich backend");
            let mut shell = RichShell::new(Rc::clone(&definitions), &options)?;
            Ok(interactive_eval_loop(&mut shell, &definitions, &loop_options)?)
        }
        BackendArg::Minimal => {
            debug!("starting minimal backend");
            let mut shell = MinimalShell::new(Rc::clone(&definitions), &options)?;
            Ok(interactive_eval_loop(&mut shell, &definitions, &loop_options)?)
        }
        BackendArg::Plain => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("cannot read stdin")?;
            run_batch(&definitions, &source, &cli, style)
        }
    }
}

/// Evaluate in-memory source without prompts, printing plain text results
fn run_batch(
    definitions: &Rc<RefCell<Definitions>>,
    source: &str,
    cli: &Cli,
    style: Option<String>,
) -> mathshell::Result<i32> {
    let mut shell = BatchShell::new(Rc::clone(definitions), source, style, !cli.no_unicode);
    let loop_options = LoopOptions {
        show_prompt: false,
        strict: cli.strict_output,
        output_style: Some("text".to_string()),
    };
    Ok(interactive_eval_loop(&mut shell, definitions, &loop_options)?)
}
