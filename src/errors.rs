use color_eyre::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
};
use tracing::error;

/// Leave raw mode and the alternate screen; safe to call more than once
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
}

/// Install the color-eyre report hook and a panic hook that puts the
/// terminal back before anything is printed
pub fn init() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .panic_section("This is a bug. Please attach wiggletui.log when reporting it.")
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();

        let msg = format!("{}", panic_hook.panic_report(panic_info));
        error!("Error: {}", plain_report(&msg));

        #[cfg(not(debug_assertions))]
        {
            use human_panic::{handle_dump, metadata, print_msg};
            let metadata = metadata!();
            let file_path = handle_dump(&metadata, panic_info);
            let _ = print_msg(file_path, &metadata);
            eprintln!("{msg}");
        }

        #[cfg(debug_assertions)]
        {
            better_panic::Settings::auto()
                .most_recent_first(false)
                .lineno_suffix(true)
                .verbosity(better_panic::Verbosity::Full)
                .create_panic_handler()(panic_info);
        }

        std::process::exit(1);
    }));
    Ok(())
}

/// Report text for the log file, without colour or hyperlink escapes
fn plain_report(report: &str) -> String {
    strip_ansi_escapes::strip_str(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_report_drops_escapes() {
        assert_eq!(plain_report("\u{1b}[31mboom\u{1b}[0m at x"), "boom at x");
        assert_eq!(plain_report("\u{1b}]8;;http://x\u{7}link\u{1b}]8;;\u{7} done"), "link done");
        assert_eq!(plain_report("plain"), "plain");
    }
}
