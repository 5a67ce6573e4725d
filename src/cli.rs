//! Minimal CLI: build an editor for one ADL type, then check or draw a value with it.
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use adl_veditor::outline::TextOutline;
use adl_veditor::path_de::load_ast_map;
use adl_veditor::tree::Resolver;
use adl_veditor::{create_veditor, AstMap, Customizers, EditState, JsonBinding, TypeExpr, VEditor};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use tracing::debug;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build a value editor from ADL schema JSON and use it to check or render values
#[derive(Parser, Debug)]
#[command(name = "adl-veditor", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// load a value through the editor, validate it and print its serialized form
    Check(CheckOut),
    /// print a text outline of the editor and a validation summary
    Render(RenderOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more AST map files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    schema: Vec<String>,

    /// type expression to edit (e.g. examples.Person or sys.types.Maybe<Int32>)
    #[arg(long = "type", short = 't')]
    type_expr: String,

    /// serialized value to load (.json); the editor's initial state is used if omitted
    #[arg(long)]
    value: Option<PathBuf>,

    /// JSON Pointer to select a subnode in the value document (e.g. /data/items/0)
    #[arg(long, requires = "value")]
    json_pointer: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file for the round-tripped value (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct RenderOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// render as read-only
    #[arg(long)]
    disabled: bool,
}

struct Session {
    editor: VEditor,
    binding: JsonBinding,
    state: EditState,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Session> {
        let schema_paths =
            resolve_file_path_patterns(&self.schema).context("failed to resolve schema file paths")?;
        let mut ast = AstMap::new();
        for schema_path in &schema_paths {
            ast.extend(load_ast_map(schema_path)?);
        }
        debug!(files = schema_paths.len(), decls = ast.len(), "schemas loaded");

        let texpr: TypeExpr = self.type_expr.parse()?;
        let resolver: Resolver = Rc::new(ast);
        let editor = create_veditor(&texpr, resolver.clone(), Customizers::new())
            .with_context(|| format!("cannot build an editor for {texpr}"))?;
        let binding = JsonBinding::new(texpr, resolver);
        let state = match self.load_value()? {
            Some(json) => {
                let value = binding
                    .from_json(&json)
                    .context("value does not match the requested type")?;
                editor.state_from_value(value)?
            }
            None => editor.initial_state()?,
        };
        Ok(Session {
            editor,
            binding,
            state,
        })
    }

    fn load_value(&self) -> Result<Option<Value>> {
        let Some(value_path) = self.value.as_ref() else {
            return Ok(None);
        };
        let source = std::fs::read_to_string(value_path)
            .with_context(|| format!("failed to read value file {}", value_path.display()))?;
        let json_value = serde_json::from_str::<Value>(&source)
            .with_context(|| format!("failed to parse JSON value file ({})", value_path.display()))?;
        match self.json_pointer.as_ref() {
            None => Ok(Some(json_value)),
            Some(pointer) => json_value
                .pointer(pointer)
                .cloned()
                .map(Some)
                .with_context(|| format!("JSON pointer {pointer} selects nothing in {}", value_path.display())),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Check(target) => {
                let session = target.input_settings.load()?;
                let checked = session.editor.value_and_errors(&session.state)?;
                let Some(value) = checked.value else {
                    report_errors(&checked.errors);
                    return Ok(ExitCode::FAILURE);
                };
                let json_value = session.binding.to_json(&value)?;
                let json_src = serde_json::to_string_pretty(&json_value)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(out, &json_src).with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{json_src}");
                }
                eprintln!("{} value is valid", "OK".green().bold());
                Ok(ExitCode::SUCCESS)
            }
            Command::Render(target) => {
                let session = target.input_settings.load()?;
                let outline = TextOutline::new();
                let rendered = session
                    .editor
                    .render(&outline, &session.state, target.disabled, Rc::new(|_| {}))?;
                println!("{}", outline.to_text(rendered));
                let errors = session.editor.validate(&session.state)?;
                if errors.is_empty() {
                    eprintln!("{} no validation errors", "OK".green().bold());
                } else {
                    report_errors(&errors);
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report_errors(errors: &[String]) {
    eprintln!("{} {} validation error(s)", "error".red().bold(), errors.len());
    for error in errors {
        eprintln!("  {} {error}", "-".red());
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
