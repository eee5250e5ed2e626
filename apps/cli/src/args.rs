use std::env;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct CliArgs {
    pub database: String,
    pub table: String,
    pub server: Option<String>,
    pub run_name: Option<String>,
    pub files: Vec<PathBuf>,
}

pub fn parse_args() -> Result<CliArgs, String> {
    parse_from(env::args().skip(1))
}

fn parse_from(args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut args = args;
    let mut database = None;
    let mut table = None;
    let mut parsed = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--database" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --database".to_string())?;
                database = Some(value);
            }
            "--table" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --table".to_string())?;
                table = Some(value);
            }
            "--server" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --server".to_string())?;
                parsed.server = Some(value);
            }
            "--run-name" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --run-name".to_string())?;
                parsed.run_name = Some(value);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            value if value.starts_with("--") => {
                return Err(format!("unknown argument: {value}"));
            }
            _ => {
                parsed.files.push(PathBuf::from(arg));
            }
        }
    }

    parsed.database = database.ok_or_else(|| "missing required argument: --database".to_string())?;
    parsed.table = table.ok_or_else(|| "missing required argument: --table".to_string())?;
    Ok(parsed)
}

pub fn print_help() {
    println!(
        "Ingestion Portal CLI\n\n\
Usage:\n  ingest-portal --database <name> --table <name> [options] [files...]\n\n\
Options:\n  --database <name>  Database directory the files land under\n  --table <name>     Table directory the files land under\n  --server <url>     Portal server to talk to (overrides the config file)\n  --run-name <name>  Name for the submitted ingestion job run\n  -h, --help         Show this help message\n"
    );
}
