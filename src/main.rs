use std::fmt;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use error_stack::fmt::{Charset, ColorMode};
use error_stack::{IntoReport, Report, ResultExt};
use strum::IntoEnumIterator;
use url::Url;

use mercadopago_sdk::{CredentialKey, MpConf, ResourceRoots};

#[derive(Debug)]
pub struct MpConfCliError;
impl fmt::Display for MpConfCliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("mp-conf error")
    }
}
impl std::error::Error for MpConfCliError {}

pub type MpConfCliResult<T> = error_stack::Result<T, MpConfCliError>;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Mercado Pago SDK configuration")]
struct Cli {
    #[command(subcommand)]
    command: MpConfCommands,
}

#[derive(Args, Debug, PartialEq, Clone)]
struct SourceArgs {
    /// Properties resource holding clientSecret, clientId, accessToken and appId
    #[clap(long, short, conflicts_with = "env")]
    properties: Option<String>,
    /// Read the credentials from the MP_* environment variables (and .env)
    #[clap(long, action)]
    env: bool,
    /// Override the API base url
    #[clap(long)]
    base_url: Option<Url>,
}

impl SourceArgs {
    fn load(&self) -> MpConfCliResult<MpConf> {
        let mut conf = MpConf::new();
        if let Some(path) = &self.properties {
            let roots = ResourceRoots::from_env();
            conf.set_from_properties_resource(path, &roots)
                .attach_printable_lazy(|| format!("Searched in {:?}", roots.roots()))
                .change_context(MpConfCliError)?;
        }
        if self.env {
            dotenvy::dotenv().ok();
            conf.set_from_env().change_context(MpConfCliError)?;
        }
        if let Some(base_url) = &self.base_url {
            conf.set_base_url(base_url.as_str().trim_end_matches('/'));
        }
        Ok(conf)
    }
}

#[derive(Subcommand, Debug, PartialEq, Clone)]
enum MpConfCommands {
    /// Prints the loaded configuration with secrets masked
    Show {
        #[command(flatten)]
        source: SourceArgs,
        /// Print as JSON
        #[clap(long, action)]
        json: bool,
    },
    /// Reports which credentials are set, failing if any is missing
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
}

impl MpConfCommands {
    pub fn execute(&self) -> MpConfCliResult<()> {
        match self {
            MpConfCommands::Show { source, json } => {
                let conf = source.load()?;
                if *json {
                    let output = serde_json::to_string_pretty(&conf.snapshot())
                        .into_report()
                        .change_context(MpConfCliError)?;
                    println!("{}", output);
                } else {
                    println!("Current config:\n{:#?}", conf);
                }
                Ok(())
            }
            MpConfCommands::Check { source } => {
                let conf = source.load()?;
                for key in CredentialKey::iter() {
                    let status = if conf.credential(key).is_some() {
                        "set".green()
                    } else {
                        "missing".red()
                    };
                    println!("{:<14}{}", key.to_string(), status);
                }
                println!("{:<14}{}", "baseUrl", conf.base_url().cyan());
                let missing = conf.missing_credentials();
                if !missing.is_empty() {
                    let names: Vec<&str> = missing.iter().map(|key| key.name()).collect();
                    return Err(Report::new(MpConfCliError)
                        .attach_printable(format!("Missing credentials: {}", names.join(", ")))
                        .attach(Suggestion(
                            "pass --properties <resource> or --env with the MP_* variables set"
                                .to_string(),
                        )));
                }
                println!("{}", "Configuration is complete".green());
                Ok(())
            }
        }
    }
}

pub struct Suggestion(String);

impl Suggestion {
    pub fn set_report() {
        Report::set_charset(Charset::Utf8);
        Report::set_color_mode(ColorMode::Color);
        Report::install_debug_hook::<Self>(|Self(value), context| {
            context.push_body(format!("{}: {value}", "suggestion".yellow()))
        });
    }
}

fn run() -> MpConfCliResult<()> {
    let cli = Cli::parse();

    Suggestion::set_report();

    cli.command.execute()
}

fn main() -> MpConfCliResult<()> {
    run()
}
