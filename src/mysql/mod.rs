// ABOUTME: MySQL source adapter - connection setup and DSN normalization
// ABOUTME: Accepts mysql:// URLs and Go-driver style user:pass@tcp(host:port)/db DSNs

pub mod converter;
pub mod reader;

use anyhow::{bail, Context, Result};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, Pool};
use url::Url;

use crate::utils::sanitize_url;

const DEFAULT_PORT: u16 = 3306;

/// A single MySQL connection used as the sync source.
pub struct MySqlSource {
    pool: Pool,
    conn: Conn,
}

impl MySqlSource {
    /// Connect to MySQL and verify the connection with a ping.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let url = normalize_dsn(dsn)?;
        tracing::info!("Connecting to MySQL at {}", sanitize_url(&url));

        let opts = Opts::from_url(&url).context("Invalid MySQL connection string")?;
        let pool = Pool::new(opts);
        let mut conn = pool
            .get_conn()
            .await
            .context("Failed to connect to MySQL")?;
        conn.ping().await.context("Failed to ping MySQL")?;

        let version: Option<String> = conn.query_first("SELECT VERSION()").await.ok().flatten();
        if let Some(version) = version {
            tracing::info!("Connected to MySQL {}", version);
        }

        Ok(Self { pool, conn })
    }

    /// Close the connection and shut the pool down.
    pub async fn disconnect(self) -> Result<()> {
        let Self { pool, conn } = self;
        drop(conn);
        pool.disconnect()
            .await
            .context("Failed to disconnect from MySQL")?;
        Ok(())
    }
}

/// Normalize a MySQL connection string into a `mysql://` URL.
///
/// `mysql://` URLs are returned unchanged. Go-driver DSNs of the form
/// `[user[:password]@][tcp(host[:port])|unix(socket)]/dbname[?params]` are
/// rewritten. Their parameters are driver-specific and are dropped.
///
/// # Examples
///
/// ```
/// # use mysql_sqlite_sync::mysql::normalize_dsn;
/// assert_eq!(
///     normalize_dsn("club:pw@tcp(db.local:3307)/club?parseTime=true").unwrap(),
///     "mysql://club:pw@db.local:3307/club"
/// );
/// ```
pub fn normalize_dsn(dsn: &str) -> Result<String> {
    let dsn = dsn.trim();
    if dsn.is_empty() {
        bail!("MySQL connection string is empty");
    }
    if dsn.starts_with("mysql://") {
        return Ok(dsn.to_string());
    }

    let Some((head, tail)) = dsn.rsplit_once('/') else {
        bail!(
            "Invalid MySQL DSN '{}': expected user:password@tcp(host:port)/dbname",
            dsn
        );
    };
    let database = match tail.split_once('?') {
        Some((database, params)) => {
            tracing::debug!("Ignoring MySQL DSN parameters: {}", params);
            database
        }
        None => tail,
    };

    let (credentials, address) = match head.rsplit_once('@') {
        Some((credentials, address)) => (Some(credentials), address),
        None => (None, head),
    };

    let mut url = Url::parse("mysql://localhost").context("Failed to build MySQL URL")?;
    if let Some(credentials) = credentials {
        let (user, password) = match credentials.split_once(':') {
            Some((user, password)) => (user, Some(password)),
            None => (credentials, None),
        };
        set_url_part(url.set_username(user), "user name")?;
        set_url_part(url.set_password(password), "password")?;
    }

    match parse_address(address)? {
        Address::Tcp { host, port } => {
            set_url_part(url.set_host(Some(host)).map_err(|_| ()), "host")?;
            set_url_part(url.set_port(Some(port)), "port")?;
        }
        Address::Unix(socket) => {
            url.query_pairs_mut().append_pair("socket", socket);
        }
    }
    url.set_path(database);

    Ok(url.to_string())
}

enum Address<'a> {
    Tcp { host: &'a str, port: u16 },
    Unix(&'a str),
}

fn parse_address(address: &str) -> Result<Address<'_>> {
    if address.is_empty() {
        return Ok(Address::Tcp {
            host: "localhost",
            port: DEFAULT_PORT,
        });
    }

    let Some((protocol, rest)) = address.split_once('(') else {
        bail!("Invalid MySQL DSN address '{}'", address);
    };
    let Some(inner) = rest.strip_suffix(')') else {
        bail!("Invalid MySQL DSN address '{}': missing ')'", address);
    };

    match protocol {
        "tcp" => {
            // [::1]:3306 keeps its brackets as the host
            let (host, port) = match inner.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && !port.contains(']') => {
                    let port = port
                        .parse::<u16>()
                        .with_context(|| format!("Invalid MySQL port '{}'", port))?;
                    (host, port)
                }
                _ => (inner, DEFAULT_PORT),
            };
            let host = if host.is_empty() { "localhost" } else { host };
            Ok(Address::Tcp { host, port })
        }
        "unix" => Ok(Address::Unix(inner)),
        other => bail!("Unsupported MySQL DSN protocol '{}'", other),
    }
}

fn set_url_part(result: std::result::Result<(), ()>, part: &str) -> Result<()> {
    result.map_err(|_| anyhow::anyhow!("Invalid {} in MySQL DSN", part))
}
