//! Print the authorization header for a client id and secret.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};
use oas_client::{AuthConfig, ClientAuth, Credentials};

fn command() -> Command {
    Command::new("generate-jwt")
        .about("Generate a JWT for a set of credentials")
        .arg(
            Arg::new("client-id")
                .long("client-id")
                .help("Client ID to authenticate with")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("secret")
                .long("secret")
                .help("Secret belonging to the Client ID")
                .action(ArgAction::Set),
        )
}

fn value_or_prompt(matches: &ArgMatches, id: &str, prompt: &str) -> io::Result<String> {
    if let Some(value) = matches.get_one::<String>(id) {
        return Ok(value.clone());
    }

    print!("{prompt}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let matches = command().get_matches();
    let client_id = value_or_prompt(&matches, "client-id", "Client ID")?;
    let secret = value_or_prompt(&matches, "secret", "Secret")?;

    let auth = ClientAuth::new(AuthConfig::new(client_id, secret));
    let credentials = auth.credentials()?;

    println!("Use the following header(s) for authorization:");
    for (name, value) in &credentials {
        println!("  {name}: {}", value.to_str()?);
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
