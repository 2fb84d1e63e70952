//! The shell environment: registry, session stack, editors and input in one
//! explicitly constructed object.

use std::fs;
use std::path::{Path, PathBuf};

use uesh_editor::EditorSet;
use uesh_types::config::UeshConfig;
use uesh_types::error::{Result, UeshError};
use uesh_types::kind::ShellType;

use crate::command::{CommandContext, ShellSignal};
use crate::dispatcher::dispatch;
use crate::input::InputSource;
use crate::parser::{parse_segment, split_segments};
use crate::registry::CommandRegistry;
use crate::stack::{PopOutcome, ShellStack};

/// Deepest allowed `run` nesting.
pub const MAX_SCRIPT_DEPTH: usize = 8;

/// Outcome of one command within a line.
#[derive(Debug)]
pub struct CommandReport {
    pub command: String,
    pub exit_code: i32,
    pub fault: Option<UeshError>,
    pub output: Vec<String>,
}

impl CommandReport {
    fn failed(command: &str, inner: &UeshError) -> Self {
        let fault = UeshError::command_failed(command, inner);
        Self {
            command: command.to_string(),
            exit_code: fault.exit_code(),
            fault: Some(fault),
            output: Vec::new(),
        }
    }
}

/// Everything that happened while executing one input line.
#[derive(Debug, Default)]
pub struct LineReport {
    pub commands: Vec<CommandReport>,
    /// `exit` was issued at the root shell.
    pub shutdown: bool,
}

impl LineReport {
    /// Exit code of the last command, or 0 for an empty line.
    pub fn exit_code(&self) -> i32 {
        self.commands.last().map_or(0, |c| c.exit_code)
    }

    /// Output lines of every command, in order.
    pub fn output(&self) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .flat_map(|c| c.output.iter().map(String::as_str))
    }

    pub fn faults(&self) -> impl Iterator<Item = &UeshError> {
        self.commands.iter().filter_map(|c| c.fault.as_ref())
    }
}

/// A complete interactive shell.
pub struct ShellEnvironment {
    registry: CommandRegistry,
    stack: ShellStack,
    editors: EditorSet,
    config: UeshConfig,
    maintenance: bool,
    input: Box<dyn InputSource>,
    home: PathBuf,
    script_depth: usize,
    shutdown: bool,
}

impl ShellEnvironment {
    /// An environment with the built-in commands and a root main shell in
    /// the process working directory.
    pub fn new(config: UeshConfig, input: Box<dyn InputSource>) -> Result<Self> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let home = std::env::var_os("HOME").map_or_else(|| cwd.clone(), PathBuf::from);
        let registry = CommandRegistry::with_builtins()?;
        log::info!(
            "shell environment ready for {}@{} ({} main shell commands)",
            config.user.name,
            config.hostname,
            registry.len(ShellType::Main)
        );
        Ok(Self {
            registry,
            stack: ShellStack::new(ShellType::Main, cwd.display().to_string()),
            editors: EditorSet::from_config(&config.editor),
            maintenance: config.maintenance_mode,
            config,
            input,
            home,
            script_depth: 0,
            shutdown: false,
        })
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Mutable registry access for loading and unloading addon commands.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn stack(&self) -> &ShellStack {
        &self.stack
    }

    pub fn editors(&self) -> &EditorSet {
        &self.editors
    }

    pub fn config(&self) -> &UeshConfig {
        &self.config
    }

    pub fn maintenance(&self) -> bool {
        self.maintenance
    }

    /// Whether `exit` has been issued at the root shell.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Prompt for the active session.
    pub fn prompt(&self) -> String {
        self.stack
            .prompt(&self.config.user.name, &self.config.hostname)
    }

    /// Show the prompt and read the next command line.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let prompt = self.prompt();
        self.input.read_line(&prompt)
    }

    /// Parse and run one input line.
    ///
    /// Each `;`-separated segment is dispatched in the session that is
    /// active when it is reached, so `$name` sees variables set earlier in
    /// the same line. A failed command does not stop the chain; a fatal
    /// fault or a parse error does, and is returned as `Err`.
    pub fn execute_line(&mut self, line: &str) -> Result<LineReport> {
        let mut report = LineReport::default();
        for segment in split_segments(line)? {
            if self.shutdown {
                break;
            }
            let vars = self.stack.active().variables.clone();
            let Some(parsed) = parse_segment(&segment, &vars)? else {
                continue;
            };
            let command = parsed.command.clone();

            let mut ctx = CommandContext {
                session: self.stack.active_mut(),
                editors: &mut self.editors,
                registry: &self.registry,
                input: &mut *self.input,
                user: &self.config.user,
                hostname: &self.config.hostname,
                home: &self.home,
                maintenance: self.maintenance,
                output: Vec::new(),
                signals: Vec::new(),
                variable_output: None,
            };
            let outcome = dispatch(&self.registry, parsed, &mut ctx);
            let (output, signals) = (ctx.output, ctx.signals);

            let fault = match outcome.fault {
                Some(e) if e.is_fatal() => {
                    log::error!("fatal fault in '{command}': {e}");
                    return Err(e);
                },
                other => other,
            };
            let failed = fault.is_some();
            report.commands.push(CommandReport {
                command,
                exit_code: outcome.exit_code,
                fault,
                output,
            });
            if failed {
                continue;
            }
            for signal in signals {
                self.apply(signal, &mut report)?;
            }
        }
        report.shutdown = self.shutdown;
        Ok(report)
    }

    /// Run a script file, one line at a time. Blank lines and lines
    /// starting with `#` are skipped.
    pub fn run_script(&mut self, path: &Path) -> Result<LineReport> {
        if self.script_depth >= MAX_SCRIPT_DEPTH {
            return Err(UeshError::InvalidState(format!(
                "scripts nested deeper than {MAX_SCRIPT_DEPTH}"
            )));
        }
        let text = fs::read_to_string(path)?;
        log::info!("running script {}", path.display());
        self.script_depth += 1;
        let result = self.run_script_text(&text);
        self.script_depth -= 1;
        result
    }

    fn run_script_text(&mut self, text: &str) -> Result<LineReport> {
        let mut report = LineReport::default();
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));
        for line in lines {
            let lr = self.execute_line(line)?;
            report.commands.extend(lr.commands);
            if self.shutdown {
                break;
            }
        }
        report.shutdown = self.shutdown;
        Ok(report)
    }

    fn apply(&mut self, signal: ShellSignal, report: &mut LineReport) -> Result<()> {
        match signal {
            ShellSignal::Enter(shell_type) => {
                self.stack.push(shell_type);
            },
            ShellSignal::Exit => self.exit_session(),
            ShellSignal::RunScript(path) => match self.run_script(&path) {
                Ok(nested) => report.commands.extend(nested.commands),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::warn!("script {} aborted: {e}", path.display());
                    report.commands.push(CommandReport::failed("run", &e));
                },
            },
            ShellSignal::SetMaintenance(on) => {
                log::info!("maintenance mode {}", if on { "on" } else { "off" });
                self.maintenance = on;
            },
        }
        Ok(())
    }

    /// Pop the active session. Leaving the last session of an editor kind
    /// closes its buffer.
    fn exit_session(&mut self) {
        let session = match self.stack.pop() {
            PopOutcome::Popped(session) => session,
            PopOutcome::Shutdown => {
                self.shutdown = true;
                return;
            },
        };
        let shell_type = session.shell_type();
        if let Some(kind) = shell_type.editor_kind()
            && !self.stack.contains(shell_type)
            && self.editors.is_open(kind)
            && let Err(e) = self.editors.close(kind)
        {
            log::warn!("closing {kind} buffer failed: {e}");
        }
    }

    /// Close every editor buffer, discarding unsaved edits.
    pub fn close_editors(&mut self) {
        self.editors.close_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use uesh_types::FaultKind;
    use uesh_types::error::Result;
    use uesh_types::kind::ShellType;

    use super::*;
    use crate::argument::ArgumentSpec;
    use crate::command::{CommandFlags, CommandInfo};
    use crate::input::ScriptedInput;
    use crate::parser::ParsedCommandLine;

    fn config(admin: bool) -> UeshConfig {
        let mut config = UeshConfig::default();
        config.user.admin = admin;
        config.editor.text.autosave = false;
        config.editor.json.autosave = false;
        config.editor.hex.autosave = false;
        config
    }

    fn env_with(admin: bool, input: ScriptedInput) -> ShellEnvironment {
        ShellEnvironment::new(config(admin), Box::new(input)).unwrap()
    }

    fn env() -> ShellEnvironment {
        env_with(true, ScriptedInput::default())
    }

    fn kind_of(report: &LineReport, i: usize) -> Option<FaultKind> {
        report.commands[i].fault.as_ref().map(UeshError::kind)
    }

    #[test]
    fn missing_arguments_never_reach_the_handler() {
        let mut env = env();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        env.registry_mut()
            .register_mod(CommandInfo::addon(
                "adduser",
                ShellType::Main,
                "Add a user",
                ArgumentSpec::required(1, ["<name>"]),
                move |_: &ParsedCommandLine, _: &mut CommandContext<'_>| -> Result<i32> {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(0)
                },
            ))
            .unwrap();

        let report = env.execute_line("adduser").unwrap();
        assert_eq!(kind_of(&report, 0), Some(FaultKind::InsufficientArguments));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let report = env.execute_line("adduser alice").unwrap();
        assert_eq!(report.exit_code(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn chain_continues_after_a_failure() {
        let mut env = env();
        let report = env.execute_line("frob; echo ok").unwrap();
        assert_eq!(report.commands.len(), 2);
        assert_eq!(kind_of(&report, 0), Some(FaultKind::UnknownCommand));
        assert_eq!(report.commands[1].output, ["ok"]);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn variables_flow_through_a_chain() {
        let mut env = env();
        let report = env.execute_line("set name big world; echo hello $name").unwrap();
        assert_eq!(report.output().collect::<Vec<_>>(), ["hello big world"]);
    }

    #[test]
    fn set_switch_stores_command_result() {
        let mut env = env();
        env.execute_line("echo -set=greeting hi there").unwrap();
        assert_eq!(env.stack().active().variable("greeting"), Some("hi there"));
        env.execute_line("whoami -set=me").unwrap();
        assert_eq!(env.stack().active().variable("me"), Some("root"));
    }

    #[test]
    fn alias_expands_with_fixed_arguments() {
        let mut env = env();
        let report = env.execute_line("alias greet=echo hi; greet you").unwrap();
        assert_eq!(report.commands[1].output, ["hi you"]);
    }

    #[test]
    fn unterminated_quote_is_a_parse_error() {
        let mut env = env();
        let err = env.execute_line("echo \"open").unwrap_err();
        assert_eq!(err.kind(), FaultKind::Parse);
    }

    #[test]
    fn edit_and_exit_saves_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut env = env();

        env.execute_line(&format!("edit {}", path.display())).unwrap();
        assert_eq!(env.stack().depth(), 2);
        assert_eq!(env.stack().active().shell_type(), ShellType::TextEditor);
        assert!(env.prompt().contains("(text)"));

        env.execute_line("addline hello world; addline second").unwrap();
        assert!(env.editors().text.is_dirty());
        let report = env.execute_line("exit").unwrap();
        assert!(!report.shutdown);
        assert_eq!(env.stack().depth(), 1);
        assert!(!env.editors().text.is_open());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world\nsecond");
    }

    #[test]
    fn exitnosave_discards_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.txt");
        fs::write(&path, "keep").unwrap();
        let mut env = env();

        env.execute_line(&format!("edit {}", path.display())).unwrap();
        let report = env.execute_line("addline lost; exitnosave").unwrap();
        assert_eq!(report.commands[1].output, ["unsaved changes discarded"]);
        assert_eq!(env.stack().depth(), 1);
        assert!(!env.editors().text.is_open());
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep");
    }

    #[test]
    fn failed_command_keeps_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.txt");
        fs::write(&path, "a\nb\nc").unwrap();
        let mut env = env();

        env.execute_line(&format!("edit {}", path.display())).unwrap();
        let report = env.execute_line("delline 5").unwrap();
        assert_eq!(kind_of(&report, 0), Some(FaultKind::CommandFailed));
        assert_eq!(env.stack().depth(), 2);
        assert!(!env.editors().text.is_dirty());
    }

    #[test]
    fn hex_editor_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        let mut env = env_with(true, ScriptedInput::new(["01 02", "0x03", "EOF"]));

        env.execute_line(&format!("hexedit {}", path.display())).unwrap();
        let report = env.execute_line("addbytes; addbyte FF; querybyte 02").unwrap();
        assert_eq!(report.commands[0].output, ["3 bytes added"]);
        assert_eq!(report.commands[2].output, ["02 found at position 2"]);
        env.execute_line("exit").unwrap();
        assert_eq!(fs::read(&path).unwrap(), [0x01, 0x02, 0x03, 0xFF]);
    }

    #[test]
    fn save_clear_writes_then_empties_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.txt");
        let mut env = env();

        env.execute_line(&format!("edit {}", path.display())).unwrap();
        let report = env.execute_line("addline first; save -clear").unwrap();
        assert_eq!(report.commands[1].output, ["saved and cleared"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
        assert!(env.editors().text.is_open());
        assert!(env.editors().text.content().unwrap().is_empty());
        assert!(env.editors().text.is_dirty());

        env.execute_line("exitnosave").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn hex_replace_sequences_and_regex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch.bin");
        fs::write(&path, [0xCA, 0xFE, 0x00, 0xCA, 0xFE, 0x7F]).unwrap();
        let mut env = env();

        env.execute_line(&format!("hexedit {}", path.display())).unwrap();
        let report = env
            .execute_line(r"replace CAFE BEEF01 1 3; replaceregex '[\xC0-\xFF]+' 11")
            .unwrap();
        assert_eq!(report.commands[0].output, ["1 replacement"]);
        assert_eq!(report.commands[1].output, ["2 replacements"]);
        env.execute_line("exit").unwrap();
        assert_eq!(fs::read(&path).unwrap(), [0xBE, 0x11, 0x01, 0x00, 0x11, 0x7F]);
    }

    #[test]
    fn json_editor_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let mut env = env();

        env.execute_line(&format!("jsonedit {}", path.display())).unwrap();
        env.execute_line("addproperty \"\" name \"uesh\"; addarray \"\" tags a b; minify; exit")
            .unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"{"name":"uesh","tags":["a","b"]}"#
        );
    }

    #[test]
    fn nested_shell_leaves_root_aliases_alone() {
        let mut env = env();
        env.execute_line("alias ll=vars").unwrap();
        let before = env.stack().root().aliases.clone();

        env.execute_line("shell").unwrap();
        assert_eq!(env.stack().depth(), 2);
        let report = env.execute_line("alias").unwrap();
        assert_eq!(report.commands[0].output, ["no aliases defined"]);
        env.execute_line("alias tmp=echo").unwrap();
        env.execute_line("exit").unwrap();

        assert_eq!(env.stack().depth(), 1);
        assert_eq!(env.stack().root().aliases, before);
    }

    #[test]
    fn exit_at_root_stops_the_chain() {
        let mut env = env();
        let report = env.execute_line("exit; echo never").unwrap();
        assert!(report.shutdown);
        assert!(env.is_shutdown());
        assert_eq!(report.commands.len(), 1);
        assert_eq!(env.stack().depth(), 1);
    }

    #[test]
    fn maintenance_gates_editors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        let mut env = env();

        env.execute_line("maintenance on").unwrap();
        assert!(env.maintenance());
        let report = env.execute_line(&format!("edit {}", path.display())).unwrap();
        assert_eq!(kind_of(&report, 0), Some(FaultKind::MaintenanceRestricted));
        assert_eq!(env.stack().depth(), 1);

        env.execute_line("maintenance off").unwrap();
        env.execute_line(&format!("edit {}", path.display())).unwrap();
        assert_eq!(env.stack().depth(), 2);
    }

    #[test]
    fn maintenance_requires_admin() {
        let mut env = env_with(false, ScriptedInput::default());
        let report = env.execute_line("maintenance on").unwrap();
        assert_eq!(kind_of(&report, 0), Some(FaultKind::PermissionDenied));
        assert!(!env.maintenance());
    }

    #[test]
    fn scripts_skip_comments_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("setup.uesh");
        fs::write(&script, "# greeting\n\nset who script\necho hi $who\n").unwrap();
        let mut env = env();

        let report = env.run_script(&script).unwrap();
        assert_eq!(report.commands.len(), 2);
        assert_eq!(report.output().collect::<Vec<_>>(), ["hi script"]);

        let report = env.execute_line(&format!("run {}", script.display())).unwrap();
        assert_eq!(report.commands.len(), 3);
        assert_eq!(report.commands[0].command, "run");
        assert_eq!(report.output().collect::<Vec<_>>(), ["hi script"]);
    }

    #[test]
    fn script_recursion_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("loop.uesh");
        fs::write(&script, format!("run {}\n", script.display())).unwrap();
        let mut env = env();

        let report = env.execute_line(&format!("run {}", script.display())).unwrap();
        let failed: Vec<_> = report
            .faults()
            .filter(|f| f.kind() == FaultKind::CommandFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].to_string().contains("nested deeper"));
        assert_eq!(env.stack().depth(), 1);
    }

    #[test]
    fn input_reads_from_the_input_source() {
        let mut env = env_with(true, ScriptedInput::new(["Ada"]));
        let report = env.execute_line("input name What is your name?; echo $name").unwrap();
        assert_eq!(report.output().collect::<Vec<_>>(), ["Ada"]);
    }

    #[test]
    fn obsolete_mod_commands_still_run() {
        let mut env = env();
        env.registry_mut()
            .register_mod(
                CommandInfo::addon(
                    "legacy",
                    ShellType::Main,
                    "Old command",
                    ArgumentSpec::none(),
                    |_: &ParsedCommandLine, ctx: &mut CommandContext<'_>| -> Result<i32> {
                        ctx.print("still here");
                        Ok(0)
                    },
                )
                .with_flags(CommandFlags::OBSOLETE),
            )
            .unwrap();
        let report = env.execute_line("legacy").unwrap();
        assert_eq!(report.commands[0].output, ["still here"]);
        assert!(env.registry().list(ShellType::Main).iter().all(|c| c.name != "legacy"));
    }
}
