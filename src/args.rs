use std::env;
use std::path::PathBuf;

pub const DEFAULT_SETTINGS_PATH: &str = "snips/settings.json";

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Search the screen and click until stopped
    Run,
    /// Match the configured templates against a saved screenshot
    Probe(PathBuf),
}

#[derive(Debug)]
pub struct Args {
    pub mode: Mode,
    pub settings_path: PathBuf,
    pub preview_only: bool,
    pub debug_mode: bool,
    pub timeout_secs: Option<u64>,
}

impl Args {
    pub fn parse() -> Option<Self> {
        Self::parse_from(env::args().skip(1))
    }

    /// Returns `None` when the process should exit (help, version, bad flag)
    pub fn parse_from<I, S>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mode = Mode::Run;
        let mut settings_path = PathBuf::from(DEFAULT_SETTINGS_PATH);
        let mut preview_only = false;
        let mut debug_mode = false;
        let mut timeout_secs: Option<u64> = None;

        for arg in args {
            let arg = arg.as_ref();
            if arg == "--help" || arg == "-h" {
                print_help();
                return None;
            } else if arg == "--version" || arg == "-v" {
                println!(
                    "Snip Clicker v{} (c) {}",
                    env!("APP_VERSION_DISPLAY"),
                    env!("APP_BUILD_YEAR")
                );
                return None;
            } else if arg == "--debug" {
                debug_mode = true;
            } else if arg == "--preview" {
                preview_only = true;
            } else if let Some(val) = arg.strip_prefix("--settings=") {
                settings_path = PathBuf::from(val);
            } else if let Some(val) = arg.strip_prefix("--probe=") {
                mode = Mode::Probe(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--timeout=") {
                match val.parse::<u64>() {
                    Ok(secs) => timeout_secs = Some(secs),
                    Err(_) => {
                        eprintln!("❌ Invalid timeout value: {}", val);
                        return None;
                    }
                }
            } else {
                eprintln!("❌ Unknown argument: {}", arg);
                print_help();
                return None;
            }
        }

        Some(Args {
            mode,
            settings_path,
            preview_only,
            debug_mode,
            timeout_secs,
        })
    }
}

fn print_help() {
    println!("🖱️ Snip Clicker - find an image on screen and click it");
    println!();
    println!("USAGE:");
    println!("    snip-clicker [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    (no flags)          Search and click using {}", DEFAULT_SETTINGS_PATH);
    println!("    --settings=PATH     Read settings from PATH");
    println!("    --probe=PNG         Match the target images against a saved screenshot");
    println!("    --preview           Move the mouse onto matches but never click");
    println!("    --debug             Enable debug logging");
    println!("    --timeout=N         Stop after N seconds");
    println!("    --help, -h          Show this help message");
    println!("    --version, -v       Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    snip-clicker --preview --timeout=30");
    println!("    snip-clicker --settings=work.json");
    println!("    snip-clicker --probe=screenshot.png --debug");
}
