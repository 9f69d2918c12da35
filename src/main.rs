use std::sync::Arc;

use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};

use kiraana::auth::{AuthProvider, GoTrueAuth};
use kiraana::config::GateConfig;
use kiraana::entitlement::NewStore;
use kiraana::error::ConfigError;
use kiraana::onboarding::{spawn_session_listener, OnboardingSequencer, RouteState, Screen};
use kiraana::store::{EntitlementStore, PostgrestStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let api_url = std::env::var("KIRAANA_API_URL")
        .map_err(|_| ConfigError::MissingEnvVar("KIRAANA_API_URL".to_string()))?;
    let api_key = std::env::var("KIRAANA_API_KEY")
        .map_err(|_| ConfigError::MissingEnvVar("KIRAANA_API_KEY".to_string()))?;
    let config = GateConfig::from_env()?;

    eprintln!("🛒 Kiraana v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: {}", api_url);
    eprintln!("   Missing-subscription policy: {:?}", config.missing_subscription);
    eprintln!("   Commands: login <email> <password> | redeem <code> |");
    eprintln!("             setup-store <name> | <address> | <phone> |");
    eprintln!("             status | logout | quit\n");

    let auth = Arc::new(GoTrueAuth::new(
        api_url.clone(),
        SecretString::from(api_key.clone()),
    ));
    let store = Arc::new(PostgrestStore::new(api_url, SecretString::from(api_key)));

    let sequencer = OnboardingSequencer::new(
        Arc::clone(&auth) as Arc<dyn AuthProvider>,
        Arc::clone(&store) as Arc<dyn EntitlementStore>,
        config,
    );
    let _listener = spawn_session_listener(Arc::clone(&sequencer));

    // Initial load: resolve before any user action.
    print_route(sequencer.resolve().await);

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "quit" | "/quit" | "exit" => break,
            "login" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some(email), Some(password)) => {
                        match auth.sign_in(email, password).await {
                            Ok(session) => {
                                store.set_bearer(Some(session.access_token.clone())).await;
                                println!("Signed in as {}", session.user_id);
                            }
                            Err(e) => println!("Sign-in failed: {e}"),
                        }
                        print_route(sequencer.resolve().await);
                    }
                    _ => println!("Usage: login <email> <password>"),
                }
            }
            "redeem" => match sequencer.submit_coupon(rest).await {
                Ok(redemption) => {
                    println!(
                        "Coupon {} accepted: {} days, access through {}",
                        redemption.code, redemption.days, redemption.extended_until
                    );
                    print_route(sequencer.resolve().await);
                }
                Err(e) => println!("Redemption failed: {e}"),
            },
            "setup-store" => {
                let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
                match fields.as_slice() {
                    [name, address, phone]
                        if !name.is_empty() && !address.is_empty() && !phone.is_empty() =>
                    {
                        let new_store = NewStore {
                            name: (*name).to_string(),
                            address: (*address).to_string(),
                            phone: (*phone).to_string(),
                            image_url: None,
                        };
                        match sequencer.complete_store_setup(new_store).await {
                            Ok(record) => println!("Store '{}' created", record.name),
                            Err(e) => println!("Store setup failed: {e}"),
                        }
                        print_route(sequencer.resolve().await);
                    }
                    _ => println!("Usage: setup-store <name> | <address> | <phone>"),
                }
            }
            "status" => print_route(sequencer.resolve().await),
            "logout" => {
                if let Err(e) = sequencer.sign_out().await {
                    println!("Sign-out failed: {e}");
                }
                store.set_bearer(None).await;
                print_route(sequencer.resolve().await);
            }
            other => println!("Unknown command: {other}"),
        }
        eprint!("> ");
    }

    Ok(())
}

fn print_route(state: RouteState) {
    let screen = match state.screen() {
        Screen::SignIn => "sign-in",
        Screen::CouponPrompt => "coupon prompt",
        Screen::StoreSetup => "store setup",
        Screen::MainApp => "main app",
    };
    println!("[route] {state} → {screen}");
}
