//! etcd backed config store
//!
//! Node records live under a prefix, one key per field:
//!
//! ```text
//! /config/<url-safe base64 pubkey>/address4  = 10.0.0.1
//! /config/<url-safe base64 pubkey>/wg_keepalive = 25
//! /config/default/wg_keepalive = 15
//! ```
//!
//! The whole prefix is read with one range request per fetch.

use async_trait::async_trait;
use etcd_client::{Certificate, Client, ConnectOptions, GetOptions, Identity, TlsOptions};
use tracing::{debug, info};

use super::mapping::find_field;
use super::node::NodeInfo;
use super::{ConfigStore, StoreSnapshot};
use crate::config::EtcdClientConfig;
use crate::error::StoreError;

/// Store key of the record holding default values
pub const DEFAULT_NODE_KEY: &str = "default";

/// Config store reading node records from etcd
#[derive(Clone)]
pub struct EtcdStore {
    client: Client,
    prefix: String,
}

impl EtcdStore {
    /// Connect to the cluster described by `config`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Tls` if TLS material cannot be read and
    /// `StoreError::Connect` if no endpoint is reachable.
    pub async fn connect(config: &EtcdClientConfig) -> Result<Self, StoreError> {
        let mut options = ConnectOptions::new()
            .with_connect_timeout(config.dial_timeout)
            .with_timeout(config.request_timeout);

        if let (Some(user), Some(password)) = (&config.username, &config.password) {
            options = options.with_user(user.clone(), password.clone());
        }

        if config.uses_tls() {
            options = options.with_tls(load_tls(config)?);
        }

        let client = Client::connect(&config.endpoints, Some(options))
            .await
            .map_err(|e| StoreError::Connect {
                endpoints: config.endpoints.join(","),
                reason: e.to_string(),
            })?;

        info!(
            "Connected to etcd at {} (prefix {})",
            config.endpoints.join(","),
            config.prefix
        );

        Ok(Self {
            client,
            prefix: config.prefix.clone(),
        })
    }

    /// Key prefix this store reads
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[async_trait]
impl ConfigStore for EtcdStore {
    async fn fetch_all(&self) -> Result<StoreSnapshot, StoreError> {
        // Client is a cheap handle over a shared channel
        let mut client = self.client.clone();
        let response = client
            .get(self.prefix.as_str(), Some(GetOptions::new().with_prefix()))
            .await
            .map_err(|e| StoreError::request(e.to_string()))?;

        let mut pairs = Vec::with_capacity(response.kvs().len());
        for kv in response.kvs() {
            let key = kv.key_str().map_err(|_| StoreError::Encoding {
                key: String::from_utf8_lossy(kv.key()).into_owned(),
            })?;
            let value = kv.value_str().map_err(|_| StoreError::Encoding {
                key: key.to_string(),
            })?;
            pairs.push((key, value));
        }

        debug!("Fetched {} keys below {}", pairs.len(), self.prefix);

        build_snapshot(&self.prefix, pairs)
    }
}

fn load_tls(config: &EtcdClientConfig) -> Result<TlsOptions, StoreError> {
    let read = |path: &std::path::Path| {
        std::fs::read(path).map_err(|e| StoreError::Tls {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    };

    let mut tls = TlsOptions::new();

    if let Some(cacert) = &config.cacert {
        tls = tls.ca_certificate(Certificate::from_pem(read(cacert)?));
    }

    if let (Some(cert), Some(key)) = (&config.cert, &config.key) {
        tls = tls.identity(Identity::from_pem(read(cert)?, read(key)?));
    }

    Ok(tls)
}

/// Assemble node records from `(key, value)` pairs below `prefix`
///
/// Keys without a field component and keys naming an unknown field are
/// ignored. A known field whose value does not parse fails the whole
/// snapshot.
///
/// # Errors
///
/// Returns `StoreError::InvalidValue` for an unparseable field value.
pub fn build_snapshot<'a, I>(prefix: &str, pairs: I) -> Result<StoreSnapshot, StoreError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut snapshot = StoreSnapshot::default();

    for (key, value) in pairs {
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };
        let Some((node_key, field_name)) = rest.split_once('/') else {
            debug!("Ignoring key without field: {}", key);
            continue;
        };
        if node_key.is_empty() {
            continue;
        }
        let Some(field) = find_field(field_name) else {
            debug!("Ignoring unknown field: {}", key);
            continue;
        };

        let record: &mut NodeInfo = if node_key == DEFAULT_NODE_KEY {
            &mut snapshot.defaults
        } else {
            snapshot.nodes.entry(node_key.to_string()).or_default()
        };

        (field.parse)(record, value)
            .map_err(|reason| StoreError::invalid_value(node_key, field.name, reason))?;
    }

    Ok(snapshot)
}
