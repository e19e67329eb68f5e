use clap::{Parser, Subcommand};
use bloodlink_backend::config::Config;
use bloodlink_backend::models::db_operations::users_db_operations;
use bloodlink_backend::models::Role;
use bloodlink_backend::setup::db_setup;
use rusqlite::Connection;
use redb::Database;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial application setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Create the stores. Pass `users` or `records` to create only one of them.
    Setup {
        db_type: Option<String>,
    }
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// Grant the admin role to a user who has already signed in once.
    Promote {
        #[arg(long)]
        email: String,
    },
    List,
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup { db_type } => {
                match db_type.as_deref() {
                    Some("users") => setup_users_database(&config),
                    Some("records") => setup_records_database(&config),
                    Some(other) => eprintln!("❌ Error: Unknown database type '{}'. Use 'users' or 'records'.", other),
                    None => {
                        setup_users_database(&config);
                        setup_records_database(&config);
                    }
                }
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Promote { email } => promote_admin(&config, email),
            AdminAction::List => list_admin_users(&config),
        },
    }
}

fn setup_users_database(config: &Config) {
    let db_path = config.users_db_path();
    if db_path.exists() {
        println!("ℹ️ Users database already exists at '{}'. Skipping creation.", db_path.display());
        return;
    }
    println!("\nSetting up users database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let mut conn = Connection::open(&db_path).expect("Could not create users database file.");
    match db_setup::setup_users_db(&mut conn) {
        Ok(_) => println!("✅ Users database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up users database: {}", e),
    }
}

fn setup_records_database(config: &Config) {
    let db_path = config.records_db_path();
    if db_path.exists() {
        println!("ℹ️ Records database already exists at '{}'. Skipping creation.", db_path.display());
        return;
    }
    println!("\nSetting up records database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let db = Database::create(&db_path).expect("Failed to create records database file.");
    match db_setup::setup_records_db(&db) {
        Ok(_) => println!("✅ Records database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up records database: {}", e),
    }
}

fn open_users_db(config: &Config) -> Option<Connection> {
    let db_path = config.users_db_path();
    if !db_path.exists() {
        eprintln!("❌ Error: Users database not found at '{}'. Please run `setup_cli db setup` first.", db_path.display());
        return None;
    }
    match Connection::open(&db_path) {
        Ok(conn) => Some(conn),
        Err(e) => {
            eprintln!("❌ Error opening users database: {}", e);
            None
        }
    }
}

fn promote_admin(config: &Config, email: &str) {
    let Some(conn) = open_users_db(config) else { return };

    match users_db_operations::update_role_by_email(&conn, email.trim(), Role::Admin) {
        Ok(0) => eprintln!("❌ Error: No user with email '{}' found. The user must sign in once before promotion.", email),
        Ok(_) => println!("✅ User '{}' is now an admin.", email),
        Err(e) => eprintln!("❌ Error promoting user: {}", e),
    }
}

fn list_admin_users(config: &Config) {
    let Some(conn) = open_users_db(config) else { return };

    println!("Listing Admin Users:");
    match users_db_operations::read_users_by_role(&conn, Role::Admin) {
        Ok(admins) => {
            for admin in admins {
                println!("- {} <{}> ({})", admin.name, admin.email, admin.status);
            }
        }
        Err(e) => eprintln!("❌ Error fetching admins: {}", e),
    }
}
