use std::{env, sync::Arc};

use anyhow::Context;
use clap::Args;
use clinic_core::{ListParams, Paginated, TimeRange, Timestamp};
use clinic_gateway::{
    ClinicClient, FileSessionPersistence, GatewayConfig, KeyringSessionPersistence,
    ReqwestBackend, Session, SessionStore, Subscription,
};
use url::Url;

const KEYRING_SERVICE: &str = "clinic";
const DEFAULT_PROFILE: &str = "default";

pub(crate) type Client = ClinicClient<ReqwestBackend>;

pub(crate) fn load_gateway_config(default_user_agent: &'static str) -> anyhow::Result<GatewayConfig> {
    let raw_url = required_env("CLINIC_API_URL")?;
    let base_url =
        Url::parse(&raw_url).with_context(|| format!("invalid CLINIC_API_URL `{raw_url}`"))?;

    let mut config = GatewayConfig::new(
        base_url,
        env::var("CLINIC_USER_AGENT").unwrap_or_else(|_| default_user_agent.into()),
    );
    if let Ok(refresh_path) = env::var("CLINIC_REFRESH_PATH") {
        config.refresh_path = refresh_path;
    }
    config.validate()?;
    Ok(config)
}

pub(crate) fn open_session() -> anyhow::Result<SessionStore> {
    let profile = env::var("CLINIC_PROFILE").unwrap_or_else(|_| DEFAULT_PROFILE.to_owned());

    match env::var("CLINIC_SESSION_STORE").as_deref() {
        Ok("file") => {
            let persistence = FileSessionPersistence::in_config_dir(&profile)
                .context("failed to locate session file")?;
            log::debug!("using session file {}", persistence.path().display());
            Ok(SessionStore::load(persistence))
        }
        Ok("keyring") | Err(_) => Ok(SessionStore::load(KeyringSessionPersistence::new(
            KEYRING_SERVICE,
            &profile,
        ))),
        Ok(other) => anyhow::bail!("unknown CLINIC_SESSION_STORE `{other}`; expected keyring or file"),
    }
}

pub(crate) fn build_client(default_user_agent: &'static str) -> anyhow::Result<Client> {
    let config = load_gateway_config(default_user_agent)?;
    let session = open_session()?;
    ClinicClient::connect(&config, session).context("failed to create clinic client")
}

/// Like [`build_client`], but refuses to run without a stored session.
pub(crate) fn signed_in_client(default_user_agent: &'static str) -> anyhow::Result<Client> {
    let client = build_client(default_user_agent)?;
    if !client.session().get().is_authenticated() {
        anyhow::bail!("not signed in; run `auth login` first");
    }
    Ok(client)
}

pub(crate) async fn resolve<T>(mut query: Subscription<T>) -> anyhow::Result<Arc<T>>
where
    T: Send + Sync + 'static,
{
    let key = query.key().to_string();
    query
        .result()
        .await
        .with_context(|| format!("query {key} failed"))
}

#[derive(Debug, Args)]
pub(crate) struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long, default_value_t = 20)]
    page_size: u32,

    #[arg(long)]
    search: Option<String>,

    /// One of all, today, week, month.
    #[arg(long)]
    time_range: Option<TimeRange>,

    #[arg(long)]
    status: Option<String>,

    /// Extra `name=value` filter; repeatable.
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
}

impl ListArgs {
    pub(crate) fn params(&self) -> ListParams {
        let mut params = ListParams::page(self.page, self.page_size);
        if let Some(search) = &self.search {
            params = params.with_search(search.clone());
        }
        if let Some(time_range) = self.time_range {
            params = params.with_time_range(time_range);
        }
        if let Some(status) = &self.status {
            params = params.with_status(status.clone());
        }
        for (name, value) in &self.filters {
            params = params.with_filter(name.clone(), value.clone());
        }
        params
    }
}

pub(crate) fn print_page<T>(page: &Paginated<T>, line: impl Fn(&T) -> String) {
    for record in &page.data {
        println!("{}", line(record));
    }
    let pagination = &page.pagination;
    println!(
        "Page {}/{} ({} total)",
        pagination.current_page, pagination.total_pages, pagination.total_items
    );
}

pub(crate) fn print_session_details(session: &Session) {
    let user = session.user.as_ref();
    println!("Signed in: {}", session.is_authenticated());
    println!(
        "User: {}",
        user.and_then(|user| user.name.as_deref())
            .unwrap_or("<unknown>")
    );
    println!(
        "Email: {}",
        user.and_then(|user| user.email.as_deref())
            .unwrap_or("<unknown>")
    );
    println!(
        "Role: {}",
        user.and_then(|user| user.role.as_deref())
            .unwrap_or("<unknown>")
    );
    println!("Refresh token stored: {}", session.refresh_token.is_some());
    match session.updated_at {
        Some(updated_at) => println!("Updated at: {updated_at}"),
        None => println!("Updated at: <never>"),
    }
}

pub(crate) fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or("<none>")
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<Timestamp, String> {
    Timestamp::parse_rfc3339(raw).ok_or_else(|| format!("`{raw}` is not an RFC 3339 timestamp"))
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(format!("expected name=value, got `{raw}`")),
    }
}

fn required_env(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("missing required env var `{name}`"))
}
