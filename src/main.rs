use chatguard::cli::{is_quit_command, load_table, usage, CliArgs, OutputFormat};
use chatguard::scoring::{CategoryTable, Scorer};
use chatguard::settings::settings;
use chatguard::utils::{
    init_tracing, log_generic_error, log_keywords_loaded, log_load_error, log_prompt,
    log_usage_error, render_analysis, render_json,
};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

fn emit(message: &str, scorer: &Scorer, table: &CategoryTable, format: OutputFormat) -> bool {
    let result = scorer.analyze(message, table);
    match format {
        OutputFormat::Json => match render_json(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                log_generic_error("failed to render analysis", &e.to_string());
                return false;
            }
        },
        OutputFormat::Text => {
            println!(
                "{}\n",
                render_analysis(message, &result, settings().scoring.flag_threshold)
            );
        }
    }
    true
}

fn interactive(scorer: &Scorer, table: &CategoryTable, format: OutputFormat) -> io::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        log_prompt();
        io::stderr().flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line?;

        if is_quit_command(&line) {
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        emit(&line, scorer, table, format);
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            log_usage_error(&e.to_string(), usage());
            return ExitCode::from(e.exit_code());
        }
    };

    if args.help {
        println!("{}", usage());
        return ExitCode::SUCCESS;
    }

    if let Err(e) = init_tracing(args.debug) {
        log_generic_error("failed to initialise logging", &e.to_string());
    }

    let loaded = match load_table(&args, settings()) {
        Ok(loaded) => loaded,
        Err(e) => {
            log_load_error(&e);
            return ExitCode::from(e.exit_code());
        }
    };
    let table = loaded.table;

    let scorer = args
        .policy
        .map(Scorer::new)
        .unwrap_or_else(Scorer::from_settings);
    log_keywords_loaded(&loaded.source, &table, scorer.policy());

    match args.text {
        Some(text) => {
            if emit(&text, &scorer, &table, args.format) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        None => match interactive(&scorer, &table, args.format) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log_generic_error("failed to read input", &e.to_string());
                ExitCode::FAILURE
            }
        },
    }
}
