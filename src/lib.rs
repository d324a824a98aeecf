pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod state;

use anyhow::Context;
pub use config::Config;
use db::Store;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "alumnet")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "serve" | "daemon" | "-d" | "--daemon" => run_server(config, prometheus_handle).await,

        "seed" => cmd_seed(&config).await,

        "init" | "--init" => {
            if Config::create_default_if_missing()? {
                println!("Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists.");
            }
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Alumnet - Alumni Relationship Management Server");
    println!();
    println!("USAGE:");
    println!("  alumnet <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("  serve             Start the API server");
    println!("  seed              Insert sample alumni, partners and engagements");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml (or set ALUMNET_CONFIG) to configure the server.");
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Alumnet v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }
}

async fn cmd_seed(config: &Config) -> anyhow::Result<()> {
    use db::{AlumniInput, EngagementInput, PartnerInput};

    let store = Store::new(&config.general.database_path).await?;

    let sample_alumni = [
        AlumniInput {
            first_name: "John".to_string(),
            last_name: "Smith".to_string(),
            email: "john.smith@example.com".to_string(),
            phone: Some("555-0101".to_string()),
            degree: "BS".to_string(),
            field_of_study: "Computer Engineering".to_string(),
            graduation_year: 2018,
            current_company: "Initech".to_string(),
            job_title: "Software Engineer".to_string(),
            industry: "Technology".to_string(),
            status: "active".to_string(),
            linkedin_url: None,
            bio: "Passionate about software development".to_string(),
        },
        AlumniInput {
            first_name: "Sarah".to_string(),
            last_name: "Johnson".to_string(),
            email: "sarah.johnson@example.com".to_string(),
            phone: Some("555-0102".to_string()),
            degree: "MS".to_string(),
            field_of_study: "Electrical Engineering".to_string(),
            graduation_year: 2020,
            current_company: "Globex".to_string(),
            job_title: "Management Consultant".to_string(),
            industry: "Consulting".to_string(),
            status: "active".to_string(),
            linkedin_url: None,
            bio: "Strategy and business transformation".to_string(),
        },
        AlumniInput {
            first_name: "Michael".to_string(),
            last_name: "Lee".to_string(),
            email: "michael.lee@example.com".to_string(),
            phone: None,
            degree: "PhD".to_string(),
            field_of_study: "Civil Engineering".to_string(),
            graduation_year: 2015,
            current_company: String::new(),
            job_title: String::new(),
            industry: String::new(),
            status: "lost_contact".to_string(),
            linkedin_url: None,
            bio: String::new(),
        },
    ];

    let mut alumni_ids = Vec::new();
    for input in sample_alumni {
        let label = format!("{} {}", input.first_name, input.last_name);
        match store.create_alumni(input, None).await {
            Ok(model) => {
                alumni_ids.push(model.id);
                println!("Created alumni: {label}");
            }
            Err(e) => println!("Skipped alumni {label}: {e}"),
        }
    }

    let sample_partners = [
        PartnerInput {
            name: "Acme Engineering".to_string(),
            partner_type: "corporate".to_string(),
            email: "contact@acme.example.com".to_string(),
            engagement_level: "gold".to_string(),
            industry: "Technology".to_string(),
            city: "Springfield".to_string(),
            country: "US".to_string(),
            primary_contact_name: "Jane Roe".to_string(),
            ..Default::default()
        },
        PartnerInput {
            name: "Bridgewater Foundation".to_string(),
            partner_type: "nonprofit".to_string(),
            email: "hello@bridgewater.example.org".to_string(),
            engagement_level: "prospective".to_string(),
            ..Default::default()
        },
    ];

    let mut partner_ids = Vec::new();
    for input in sample_partners {
        let label = input.name.clone();
        match store.create_partner(input).await {
            Ok(model) => {
                partner_ids.push(model.id);
                println!("Created partner: {label}");
            }
            Err(e) => println!("Skipped partner {label}: {e}"),
        }
    }

    if let (Some(&alumni_id), Some(&partner_id)) = (alumni_ids.first(), partner_ids.first()) {
        store
            .create_engagement(EngagementInput {
                alumni_id,
                partner_id,
                engagement_type: "mentorship".to_string(),
                description: "Quarterly mentorship program".to_string(),
                engagement_date: chrono::Utc::now().to_rfc3339(),
                notes: String::new(),
            })
            .await?;
        println!("Created sample engagement");
    }

    println!();
    println!("Seed complete. Default admin login: admin / admin");

    Ok(())
}
