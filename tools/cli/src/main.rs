//! PassVault CLI - interactive password manager.
//!
//! Presents a menu, collects input (secrets without echo) and prints the
//! outcome of each vault operation. Every operation that touches stored
//! credentials asks for the user's name and password again.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use passvault_vault::{
    open_vault, CredentialId, Error, Login, RejectReason, SecretText, SqliteVault as Vault,
    VaultConfig,
};

#[derive(Parser)]
#[command(name = "passvault")]
#[command(about = "PassVault - Encrypted password manager")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Master key file [default: encryption_key.key].
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Credential database [default: data/password_manager.db].
    #[arg(long)]
    database: Option<PathBuf>,
}

impl Cli {
    fn vault_config(&self) -> Result<VaultConfig> {
        let mut config = match &self.config {
            Some(path) => VaultConfig::load(path).context("Failed to load configuration")?,
            None => VaultConfig::default(),
        };
        if let Some(key_file) = &self.key_file {
            config.key_file = key_file.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        Ok(config)
    }
}

/// Menu entries, in display order.
#[derive(Debug, Clone, Copy)]
enum MenuChoice {
    Register,
    ChangeLoginPassword,
    AddPassword,
    ChangeSitePassword,
    ChangeSiteUsername,
    ViewPasswords,
    DeletePassword,
    DeleteAccount,
    Exit,
}

impl MenuChoice {
    const ALL: [MenuChoice; 9] = [
        MenuChoice::Register,
        MenuChoice::ChangeLoginPassword,
        MenuChoice::AddPassword,
        MenuChoice::ChangeSitePassword,
        MenuChoice::ChangeSiteUsername,
        MenuChoice::ViewPasswords,
        MenuChoice::DeletePassword,
        MenuChoice::DeleteAccount,
        MenuChoice::Exit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuChoice::Register => "Register",
            MenuChoice::ChangeLoginPassword => "Change User-Password",
            MenuChoice::AddPassword => "Add Password",
            MenuChoice::ChangeSitePassword => "Change Website-Password",
            MenuChoice::ChangeSiteUsername => "Change Website-Username",
            MenuChoice::ViewPasswords => "View Passwords",
            MenuChoice::DeletePassword => "Delete Password",
            MenuChoice::DeleteAccount => "Delete Account",
            MenuChoice::Exit => "Exit",
        }
    }

    fn parse(input: &str) -> Option<Self> {
        let index: usize = input.trim().parse().ok()?;
        index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.vault_config()?;
    debug!(
        key_file = %config.key_file.display(),
        database = %config.database.display(),
        "Using vault files"
    );

    let vault = open_vault(&config).context("Failed to open vault")?;
    run_menu(&vault)
}

fn run_menu(vault: &Vault) -> Result<()> {
    loop {
        println!("\nPassword Manager:");
        for (i, choice) in MenuChoice::ALL.iter().enumerate() {
            println!("\t{}. {}", i + 1, choice.label());
        }

        let Some(input) = prompt("Select an option: ")? else {
            break;
        };
        let Some(choice) = MenuChoice::parse(&input) else {
            println!("Invalid Input");
            continue;
        };

        let result = match choice {
            MenuChoice::Register => cmd_register(vault),
            MenuChoice::ChangeLoginPassword => cmd_change_login_password(vault),
            MenuChoice::AddPassword => cmd_add_password(vault),
            MenuChoice::ChangeSitePassword => cmd_change_site_password(vault),
            MenuChoice::ChangeSiteUsername => cmd_change_site_username(vault),
            MenuChoice::ViewPasswords => cmd_view_passwords(vault),
            MenuChoice::DeletePassword => cmd_delete_password(vault),
            MenuChoice::DeleteAccount => cmd_delete_account(vault),
            MenuChoice::Exit => break,
        };

        match result {
            Ok(()) => {}
            Err(CommandError::Vault(e)) if e.is_recoverable() => println!("{}", describe(&e)),
            Err(CommandError::Vault(e)) => return Err(e).context("Vault operation failed"),
            Err(CommandError::Input(e)) => return Err(e).context("Failed to read input"),
            Err(CommandError::EndOfInput) => break,
        }
    }

    println!("Exiting the app...");
    Ok(())
}

/// Why a menu command stopped.
enum CommandError {
    Vault(Error),
    Input(io::Error),
    EndOfInput,
}

impl From<Error> for CommandError {
    fn from(e: Error) -> Self {
        CommandError::Vault(e)
    }
}

impl From<io::Error> for CommandError {
    fn from(e: io::Error) -> Self {
        CommandError::Input(e)
    }
}

type CommandResult = std::result::Result<(), CommandError>;

/// User-facing text for a recoverable error.
fn describe(err: &Error) -> String {
    match err {
        Error::AuthenticationRejected(RejectReason::UnknownUser) => {
            "User does not exist. You must register first.".to_string()
        }
        Error::AuthenticationRejected(RejectReason::WrongSecret) => {
            "Wrong password. Please try again.".to_string()
        }
        Error::AuthenticationRejected(RejectReason::CorruptRecord) => {
            "Your stored password could not be verified; the vault data may be damaged.".to_string()
        }
        Error::DuplicateUser(_) => {
            "Error: Username already exists! Please choose a different username.".to_string()
        }
        Error::InvalidInput(msg) => format!("Invalid input: {}", msg),
        Error::NotFound(what) => format!("No such {}.", what),
        other => other.to_string(),
    }
}

/// Read one line from stdin. Returns `None` at end of input.
fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn prompt_required(label: &str) -> std::result::Result<String, CommandError> {
    prompt(label)?.ok_or(CommandError::EndOfInput)
}

/// Read a secret without echo.
fn prompt_secret(label: &str) -> io::Result<Zeroizing<String>> {
    rpassword::prompt_password(label).map(Zeroizing::new)
}

/// Collect the name and password for a gated operation.
fn ask_login() -> std::result::Result<(String, Zeroizing<String>), CommandError> {
    let name = prompt_required("Please enter your name: ")?;
    let secret = prompt_secret("Please enter your password: ")?;
    Ok((name, secret))
}

fn show_generated(generated: Option<SecretText>) {
    if let Some(secret) = generated {
        println!(
            "Your password is: {} Please save this password securely.",
            secret.expose()
        );
    }
}

fn cmd_register(vault: &Vault) -> CommandResult {
    let name = prompt_required("Please enter your name: ")?;
    let secret =
        prompt_secret("Please set your password (leave blank to generate strong password): ")?;

    let outcome = vault.register(&name, &secret)?;
    println!("User registration successful.");
    show_generated(outcome.generated);
    Ok(())
}

fn cmd_change_login_password(vault: &Vault) -> CommandResult {
    let (name, secret) = ask_login()?;
    let login = Login::new(&name, &secret);
    vault.login(&login)?;

    let new_secret =
        prompt_secret("Please set your new password (leave blank to generate strong password): ")?;
    let outcome = vault.change_login_secret(&login, &new_secret)?;
    println!("Password changed successfully.");
    show_generated(outcome.generated);
    Ok(())
}

fn cmd_add_password(vault: &Vault) -> CommandResult {
    let (name, secret) = ask_login()?;
    let login = Login::new(&name, &secret);
    vault.login(&login)?;

    let site = prompt_required("Please enter the name of the website/service: ")?;
    let site_username = prompt_required("Please enter your username for this website/service: ")?;
    let site_secret =
        prompt_secret("Please enter the password (leave blank to generate strong password): ")?;

    let outcome = vault.add_site_credential(&login, &site, &site_username, &site_secret)?;
    println!("Password successfully added (ID {}).", outcome.value);
    show_generated(outcome.generated);
    Ok(())
}

fn cmd_change_site_password(vault: &Vault) -> CommandResult {
    let (name, secret) = ask_login()?;
    let login = Login::new(&name, &secret);
    vault.login(&login)?;

    let site = prompt_required(
        "Please enter the name of the website/service you want to change its password: ",
    )?;
    let new_secret =
        prompt_secret("Please set your new password (leave blank to generate strong password): ")?;

    let outcome = vault.change_site_secret(&login, &site, &new_secret)?;
    println!(
        "Password successfully changed for {} ({} entr{}).",
        site,
        outcome.value,
        if outcome.value == 1 { "y" } else { "ies" }
    );
    show_generated(outcome.generated);
    Ok(())
}

fn cmd_change_site_username(vault: &Vault) -> CommandResult {
    let (name, secret) = ask_login()?;
    let login = Login::new(&name, &secret);
    vault.login(&login)?;

    let site = prompt_required(
        "Please enter the name of the website/service you want to change its username: ",
    )?;
    let new_username = prompt_required("Please enter the new username: ")?;

    let updated = vault.change_site_username(&login, &site, &new_username)?;
    println!("Username successfully changed for {} ({} updated).", site, updated);
    Ok(())
}

fn cmd_view_passwords(vault: &Vault) -> CommandResult {
    let (name, secret) = ask_login()?;
    let credentials = vault.list_credentials(&Login::new(&name, &secret))?;

    if credentials.is_empty() {
        println!("No passwords stored.");
    }
    for credential in credentials {
        let secret = credential
            .secret
            .as_ref()
            .map(|s| s.expose())
            .unwrap_or("<unreadable: integrity check failed>");
        println!(
            "ID: {} - Website/Service: {} - Username: {} - Password: {}",
            credential.id, credential.site, credential.site_username, secret
        );
    }
    Ok(())
}

fn cmd_delete_password(vault: &Vault) -> CommandResult {
    let (name, secret) = ask_login()?;
    let login = Login::new(&name, &secret);
    vault.login(&login)?;

    let input = prompt_required(
        "Please enter the ID of the password you want to delete (see View Passwords): ",
    )?;
    let id = CredentialId::parse(&input)?;

    vault.delete_credential(&login, id)?;
    println!("Deletion successful.");
    Ok(())
}

fn cmd_delete_account(vault: &Vault) -> CommandResult {
    let (name, secret) = ask_login()?;
    let login = Login::new(&name, &secret);
    vault.login(&login)?;

    let confirm = prompt_required("Type the account name again to delete it: ")?;
    if confirm != name {
        println!("Account deletion cancelled.");
        return Ok(());
    }

    let removed = vault.delete_account(&login)?;
    println!("Account deleted together with {} stored password(s).", removed);
    Ok(())
}
