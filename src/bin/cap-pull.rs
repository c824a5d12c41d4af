use cap_feed::client::{Client, ClientConfig, NWS_ATOM_FEED_URI};
use cap_feed::Filter;
use std::io::Write;

/// Pulls a CAP Atom feed and writes the selected entries (or, with `CAP_FOLLOW`, the full alerts
/// they link to) to stdout as newline-delimited JSON.
#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter(None, log::LevelFilter::Info)
        .filter_module("cap_feed", log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = run(Config::from_env()).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[derive(Debug)]
struct Config {
    uri: String,
    client: ClientConfig,
    filter: Filter,
    follow: bool,
}

impl Config {
    fn from_env() -> Self {
        let uri = std::env::var("CAP_FEED_URI").unwrap_or_else(|_| {
            log::info!("defaulting to CAP_FEED_URI={}", NWS_ATOM_FEED_URI);
            NWS_ATOM_FEED_URI.to_string()
        });

        let mut client = ClientConfig::default();
        if let Ok(size) = std::env::var("CAP_MAX_BODY_SIZE") {
            client.max_body_size = size
                .parse()
                .expect("CAP_MAX_BODY_SIZE must be a number of bytes if set");
        }

        let filter = std::env::var("CAP_FILTER")
            .map(|query| Filter::from_query(&query))
            .unwrap_or_default();

        let follow = std::env::var_os("CAP_FOLLOW")
            .filter(|v| !v.is_empty())
            .is_some();

        Self {
            uri,
            client,
            filter,
            follow,
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::with_config(config.client);

    let feed = client.atom_feed(&config.uri).await?;
    log::info!(
        "{} entries in {:?}, updated {}",
        feed.entries.len(),
        feed.title,
        feed.updated
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for entry in config.filter.select(&feed.entries) {
        if config.follow {
            let link = match entry.alert_link() {
                Some(link) => link,
                None => {
                    log::warn!("entry {:?} has no link", entry.id);
                    continue;
                }
            };

            let alert = match client.follow_alert(link).await {
                Ok(alert) => alert,
                Err(e) => {
                    log::error!("{}: {}", link.href, e);
                    continue;
                }
            };

            if let Some(expected) = entry.alert_identifier() {
                if expected != alert.identifier {
                    log::warn!(
                        "entry {:?} links to alert {:?}",
                        entry.id,
                        alert.identifier
                    );
                }
            }

            serde_json::to_writer(&mut out, &alert)?;
        } else {
            serde_json::to_writer(&mut out, entry)?;
        }
        out.write_all(b"\n")?;
    }

    Ok(())
}
