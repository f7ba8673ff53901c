use anyhow::{anyhow, Result};
use crossterm::style::Stylize;
use reedline::{
    default_emacs_keybindings, ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers,
    MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline,
    ReedlineEvent, ReedlineMenu, Signal,
};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cur_workbench::api::{HttpQueryBackend, HttpQueryGenerator, JsonHttpClient};
use cur_workbench::config::Config;
use cur_workbench::data::data_exporter::{DataExporter, ExportFormat};
use cur_workbench::data::filter_spec::{NumericOperator, SortDirection};
use cur_workbench::sql::select_items;
use cur_workbench::utils::app_paths::AppPaths;
use cur_workbench::utils::logging::{init_tracing, LogRingBuffer};
use cur_workbench::workbench::Workbench;

mod completer;
mod table_display;

use completer::WorkbenchCompleter;
use table_display::{display_catalog, display_matches, display_profile, display_profiles, display_view};

const COMMANDS: &[&str] = &[
    "\\help",
    "\\columns",
    "\\find",
    "\\toggle",
    "\\query",
    "\\run",
    "\\ask",
    "\\load",
    "\\search",
    "\\filter",
    "\\pick",
    "\\num",
    "\\sort",
    "\\clear-filters",
    "\\profile",
    "\\show",
    "\\export",
    "\\logs",
    "\\clear",
    "\\quit",
];

struct WorkbenchPrompt {
    selected: usize,
}

impl Prompt for WorkbenchPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(format!("cur[{}]", self.selected))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => "> ".into(),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                reedline::PromptViMode::Normal => "N> ".into(),
                reedline::PromptViMode::Insert => "I> ".into(),
            },
            PromptEditMode::Custom(str) => format!("{str}> ").into(),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

fn print_help() {
    println!("{}", "CUR Workbench - cost and usage query workbench".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  cur-workbench [OPTIONS] [RESULT.json]");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}     - Write default configuration", "--init-config".green());
    println!("  {} - Write commented configuration template", "--generate-config".green());
    println!();
    println!("{}", "Query text:".yellow());
    println!("  Any line not starting with \\ replaces the query text");
    println!("  {}           - Show catalog columns (optionally one group)", "\\columns [group]".green());
    println!("  {}           - Fuzzy-search catalog columns", "\\find <pattern>".green());
    println!("  {}          - Add or remove a column in the select list", "\\toggle <column>".green());
    println!("  {}                    - Show the query text and select list", "\\query".green());
    println!("  {}                      - Execute the query text", "\\run".green());
    println!("  {}              - Generate query text from a prompt", "\\ask <prompt>".green());
    println!();
    println!("{}", "Results:".yellow());
    println!("  {}                - Load a result from a JSON file", "\\load <file>".green());
    println!("  {}             - Global search (no text clears)", "\\search [text]".green());
    println!("  {}  - Column substring filter", "\\filter <column> [text]".green());
    println!("  {}    - Toggle a value in a column's value filter", "\\pick <column> <value>".green());
    println!("  {} - Numeric filter (no operator clears)", "\\num <column> [op value]".green());
    println!("  {}     - Sort (no direction cycles, no column clears)", "\\sort [column] [dir]".green());
    println!("  {}            - Remove all filters", "\\clear-filters".green());
    println!("  {}         - Column profile (no column: all)", "\\profile [column]".green());
    println!("  {}                     - Show the filtered, sorted view", "\\show".green());
    println!("  {}            - Export the view to CSV or JSON", "\\export [file]".green());
    println!("  {}                 - Show recent log entries", "\\logs [n]".green());
    println!("  {}                    - Clear screen", "\\clear".green());
    println!("  {}                     - Exit", "\\quit".green());
    println!();
}

/// Split off the first whitespace-delimited word
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn report(outcome: Result<String>) {
    match outcome {
        Ok(message) => println!("{}", message),
        Err(e) => eprintln!("{}", format!("Error: {:#}", e).red()),
    }
}

struct Session {
    workbench: Workbench,
    config: Config,
    backend: HttpQueryBackend,
    generator: HttpQueryGenerator,
    logs: LogRingBuffer,
}

impl Session {
    fn show_view(&mut self) {
        let total = self.workbench.result().map(|r| r.rows.len()).unwrap_or(0);
        match self.workbench.view() {
            Some(view) => display_view(&view, total, self.config.display.max_display_rows),
            None => eprintln!("{}", "No result loaded. Use \\run or \\load first.".red()),
        }
    }

    fn show_query(&self) {
        let text = self.workbench.query_text();
        if text.trim().is_empty() {
            println!("{}", "(empty query)".dark_grey());
            return;
        }
        println!("{}", text.cyan());
        println!(
            "{}",
            format!("select list: [{}]", select_items(text).join(" | ")).dark_grey()
        );
    }

    /// Dispatch one command; returns false to exit
    fn handle_command(&mut self, line: &str) -> bool {
        let (command, args) = split_word(line);
        match command {
            "\\help" => print_help(),
            "\\quit" | "\\q" => return false,
            "\\clear" => print!("{esc}[2J{esc}[1;1H", esc = 27 as char),
            "\\columns" => {
                let selected = self.workbench.selected_columns();
                let group = (!args.is_empty()).then_some(args);
                display_catalog(self.workbench.catalog(), &selected, group);
            }
            "\\find" => {
                let matches = self.workbench.catalog().search(args);
                display_matches(&matches, &self.workbench.selected_columns(), 20);
            }
            "\\toggle" => {
                report(self.workbench.toggle_column(args).map(|selected| {
                    format!("{} {}", if selected { "+" } else { "-" }, args)
                }));
                self.show_query();
            }
            "\\query" => self.show_query(),
            "\\run" => {
                println!("{}", format!("Executing: {}", self.workbench.query_text()).cyan());
                let outcome = self
                    .workbench
                    .execute(&self.backend)
                    .map(|rows| format!("{} rows returned", rows));
                let ok = outcome.is_ok();
                report(outcome);
                if ok {
                    self.show_view();
                }
            }
            "\\ask" => {
                let outcome = self
                    .workbench
                    .generate(&self.generator, args)
                    .map(str::to_string);
                report(outcome);
            }
            "\\load" => {
                let outcome = self
                    .workbench
                    .load_result_file(Path::new(args))
                    .map(|rows| format!("Loaded {} rows from {}", rows, args));
                report(outcome);
            }
            "\\search" => {
                self.workbench.set_global_search(args);
                self.show_view();
            }
            "\\filter" => {
                let (header, text) = split_word(args);
                self.workbench.set_column_filter(header, text);
                self.show_view();
            }
            "\\pick" => {
                let (header, value) = split_word(args);
                self.workbench.toggle_excel_value(header, value);
                self.show_view();
            }
            "\\num" => self.numeric_filter(args),
            "\\sort" => self.sort(args),
            "\\clear-filters" => {
                self.workbench.clear_filters();
                self.show_view();
            }
            "\\profile" => {
                if args.is_empty() {
                    display_profiles(&self.workbench.profiles());
                } else {
                    match self.workbench.profile(args) {
                        Some(profile) => display_profile(profile, 25),
                        None => eprintln!("{}", format!("Unknown column '{}'", args).red()),
                    }
                }
            }
            "\\show" => self.show_view(),
            "\\export" => report(self.export(args)),
            "\\logs" => {
                let count = args.parse().unwrap_or(20);
                for entry in self.logs.get_recent(count) {
                    println!("{}", entry.format_for_display());
                }
            }
            other => eprintln!("{}", format!("Unknown command '{}'. Try \\help", other).red()),
        }
        true
    }

    fn numeric_filter(&mut self, args: &str) {
        let (header, rest) = split_word(args);
        if header.is_empty() {
            eprintln!("{}", "Usage: \\num <column> [op value]".red());
            return;
        }
        if rest.is_empty() {
            self.workbench.clear_numeric_filter(header);
        } else {
            let (op, value) = split_word(rest);
            match op.parse::<NumericOperator>() {
                Ok(operator) => self.workbench.set_numeric_filter(header, operator, value),
                Err(e) => {
                    eprintln!("{}", e.red());
                    return;
                }
            }
        }
        self.show_view();
    }

    fn sort(&mut self, args: &str) {
        let (header, direction) = split_word(args);
        if header.is_empty() {
            self.workbench.clear_sort();
        } else if direction.is_empty() {
            self.workbench.click_header(header);
        } else {
            match direction.parse::<SortDirection>() {
                Ok(direction) => self.workbench.sort_by(header, direction),
                Err(e) => {
                    eprintln!("{}", e.red());
                    return;
                }
            }
        }
        self.show_view();
    }

    fn export(&mut self, args: &str) -> Result<String> {
        let path = if args.is_empty() {
            PathBuf::from(DataExporter::default_filename(ExportFormat::Csv))
        } else {
            PathBuf::from(args)
        };
        let format = ExportFormat::from_path(&path)
            .ok_or_else(|| anyhow!("Export file must end in .csv or .json"))?;
        self.workbench.export(format, &path)
    }
}

fn write_config_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if args.contains(&"--init-config".to_string()) {
        let config = Config::default();
        config.save()?;
        println!("Configuration initialized at: {:?}", Config::get_config_path()?);
        return Ok(());
    }

    if args.contains(&"--generate-config".to_string()) {
        let path = Config::get_config_path()?;
        write_config_file(&path, &Config::create_default_with_comments())?;
        println!("Configuration file created at: {:?}", path);
        println!("Edit this file to customize the workbench.");
        return Ok(());
    }

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: using default configuration ({:#})", e);
        Config::default()
    });
    if !config.display.use_color {
        crossterm::style::force_color_output(false);
    }

    let logging = init_tracing(&config.logging);
    if let Some(path) = &logging.log_path {
        eprintln!("📝 Logs: {}", path.display());
    }

    let mut workbench = Workbench::from_config(&config)?;

    let data_file = args
        .iter()
        .skip(1)
        .find(|arg| !arg.starts_with("--") && arg.ends_with(".json"));
    if let Some(file) = data_file {
        let rows = workbench.load_result_file(Path::new(file))?;
        println!("{}", format!("Loaded {} rows from {}", rows, file).green());
    }

    let http = JsonHttpClient::new(Duration::from_secs(config.backend.timeout_secs))?;
    let backend = HttpQueryBackend::new(config.backend.query_url.clone(), http.clone());
    let generator = HttpQueryGenerator::new(config.backend.generator_url.clone(), http);

    print_help();
    println!("{}", format!("Query backend: {}", backend.url()).cyan());

    let history_file = AppPaths::history_file()
        .unwrap_or_else(|_| PathBuf::from(".cur_workbench_history"));
    let history = Box::new(FileBackedHistory::with_file(500, history_file)?);

    let mut columns: Vec<String> = workbench.catalog().column_names().map(str::to_string).collect();
    if let Some(result) = workbench.result() {
        columns.extend(result.headers.iter().cloned());
    }
    let completer = Box::new(WorkbenchCompleter::new(COMMANDS, columns));

    let completion_menu = Box::new(
        ColumnarMenu::default()
            .with_name("completion")
            .with_columns(1)
            .with_column_width(None)
            .with_column_padding(2),
    );

    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Menu("completion".to_string()),
    );

    let mut line_editor = Reedline::create()
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_history(history)
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let mut session = Session {
        workbench,
        config,
        backend,
        generator,
        logs: logging.buffer,
    };

    loop {
        let prompt = WorkbenchPrompt {
            selected: session.workbench.selected_columns().len(),
        };
        match line_editor.read_line(&prompt)? {
            Signal::Success(buffer) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.starts_with('\\') {
                    if !session.handle_command(trimmed) {
                        break;
                    }
                } else {
                    session.workbench.set_query_text(trimmed);
                    session.show_query();
                }
            }
            Signal::CtrlD | Signal::CtrlC => break,
        }
    }

    println!("\nGoodbye!");
    Ok(())
}
