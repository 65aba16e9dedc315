use anyhow::bail;
use anyhow::Context;
use mailchimp_connector::configuration::get_configuration;
use mailchimp_connector::mailchimp_client::MergeFields;
use mailchimp_connector::telemetry::get_subscriber;
use mailchimp_connector::telemetry::init_subscriber;

const USAGE: &str = "\
usage:
    mailchimp status <list-key> <email>
    mailchimp subscribe <list-key> <email> [language] [ip]
    mailchimp unsubscribe <list-key> <email>
    mailchimp delete <list-key> <email>";

/// Load config, pick the list, run one operation and print MailChimp's answer
#[tokio::main] // requires tokio features: macros, rt-multi-thread
async fn main() -> Result<(), anyhow::Error> {
    // logs go to stderr, so that stdout only carries the member record
    let subscriber = get_subscriber("mailchimp", "info", std::io::stderr);
    init_subscriber(subscriber)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, list_key, email) = match args.as_slice() {
        [command, list_key, email, ..] => (command.as_str(), list_key, email),
        _ => bail!("{USAGE}"),
    };

    let cfg = get_configuration().context("Failed to load configuration")?;
    let mut client = cfg.mailchimp.client()?;
    client.set_list_from_key(list_key)?;

    let record = match (command, &args[3..]) {
        ("status", []) => client.status(email).await,
        ("subscribe", rest) if rest.len() <= 2 => {
            let language = rest.first().map(String::as_str);
            let ip = rest.get(1).map(String::as_str);
            client
                .subscribe(email, MergeFields::new(), language, ip)
                .await
        }
        ("unsubscribe", []) => client.unsubscribe(email).await,
        ("delete", []) => client.delete(email).await,
        _ => bail!("{USAGE}"),
    };

    match record {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => bail!("MailChimp returned no result for {email}"),
    }
}
