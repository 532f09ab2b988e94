use std::collections::HashMap;
use std::fmt;

use error_stack::{Report, ResultExt};
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::errors::{MpConfError, MpConfResult};
use crate::properties::Properties;
use crate::resource::ResourceLoader;

use self::write_once::WriteOnce;

pub mod shared;
pub mod write_once;

pub const DEFAULT_BASE_URL: &str = "https://api.mercadopago.com";
pub const BASE_URL_VAR: &str = "MP_BASE_URL";

/// The credential fields, in the order bulk loads apply them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum CredentialKey {
    ClientSecret,
    ClientId,
    AccessToken,
    AppId,
}

impl CredentialKey {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            CredentialKey::ClientSecret => "MP_CLIENT_SECRET",
            CredentialKey::ClientId => "MP_CLIENT_ID",
            CredentialKey::AccessToken => "MP_ACCESS_TOKEN",
            CredentialKey::AppId => "MP_APP_ID",
        }
    }

    fn is_secret(&self) -> bool {
        matches!(self, CredentialKey::ClientSecret | CredentialKey::AccessToken)
    }
}

fn mask(value: &str) -> String {
    let count = value.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

/// Printable view of a configuration. Client secret and access token only
/// keep their last four characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfSnapshot {
    pub client_secret: Option<String>,
    pub client_id: Option<String>,
    pub access_token: Option<String>,
    pub app_id: Option<String>,
    pub base_url: String,
}

/// SDK credentials and base URL.
///
/// Each credential can be set once; a second attempt fails with
/// [`MpConfError::Configuration`] and keeps the first value. Only
/// [`MpConf::reset`] reopens them. The base URL can be reassigned freely.
#[derive(Clone, PartialEq, Eq)]
pub struct MpConf {
    client_secret: WriteOnce<String>,
    client_id: WriteOnce<String>,
    access_token: WriteOnce<String>,
    app_id: WriteOnce<String>,
    base_url: String,
}

impl Default for MpConf {
    fn default() -> Self {
        Self {
            client_secret: WriteOnce::Unset,
            client_id: WriteOnce::Unset,
            access_token: WriteOnce::Unset,
            app_id: WriteOnce::Unset,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl MpConf {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: CredentialKey) -> &WriteOnce<String> {
        match key {
            CredentialKey::ClientSecret => &self.client_secret,
            CredentialKey::ClientId => &self.client_id,
            CredentialKey::AccessToken => &self.access_token,
            CredentialKey::AppId => &self.app_id,
        }
    }

    fn slot_mut(&mut self, key: CredentialKey) -> &mut WriteOnce<String> {
        match key {
            CredentialKey::ClientSecret => &mut self.client_secret,
            CredentialKey::ClientId => &mut self.client_id,
            CredentialKey::AccessToken => &mut self.access_token,
            CredentialKey::AppId => &mut self.app_id,
        }
    }

    pub fn credential(&self, key: CredentialKey) -> Option<&str> {
        self.slot(key).get().map(String::as_str)
    }

    pub fn set_credential(
        &mut self,
        key: CredentialKey,
        value: impl Into<String>,
    ) -> MpConfResult<()> {
        self.slot_mut(key)
            .set_non_empty(value.into())
            .change_context_lazy(|| {
                MpConfError::Configuration(format!("{} setting can not be changed", key))
            })?;
        if self.slot(key).is_set() {
            log::debug!("{} configured", key);
        }
        Ok(())
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.credential(CredentialKey::ClientSecret)
    }

    pub fn set_client_secret(&mut self, value: impl Into<String>) -> MpConfResult<()> {
        self.set_credential(CredentialKey::ClientSecret, value)
    }

    pub fn client_id(&self) -> Option<&str> {
        self.credential(CredentialKey::ClientId)
    }

    pub fn set_client_id(&mut self, value: impl Into<String>) -> MpConfResult<()> {
        self.set_credential(CredentialKey::ClientId, value)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.credential(CredentialKey::AccessToken)
    }

    pub fn set_access_token(&mut self, value: impl Into<String>) -> MpConfResult<()> {
        self.set_credential(CredentialKey::AccessToken, value)
    }

    pub fn app_id(&self) -> Option<&str> {
        self.credential(CredentialKey::AppId)
    }

    pub fn set_app_id(&mut self, value: impl Into<String>) -> MpConfResult<()> {
        self.set_credential(CredentialKey::AppId, value)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, value: impl Into<String>) {
        self.base_url = value.into();
        log::debug!("base url set to {}", self.base_url);
    }

    pub fn missing_credentials(&self) -> Vec<CredentialKey> {
        CredentialKey::iter()
            .filter(|key| !self.slot(*key).is_set())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_credentials().is_empty()
    }

    // Keys are applied one at a time: a failure leaves the earlier ones set.
    fn apply_credentials<F>(&mut self, mut lookup: F) -> MpConfResult<()>
    where
        F: FnMut(CredentialKey) -> Option<String>,
    {
        for key in CredentialKey::iter() {
            let value = lookup(key).filter(|value| !value.is_empty()).ok_or_else(|| {
                Report::new(MpConfError::InvalidArgument(format!("Invalid {} value", key)))
            })?;
            self.set_credential(key, value)?;
        }
        Ok(())
    }

    /// Applies `clientSecret`, `clientId`, `accessToken` and `appId` from
    /// `entries`, in that order. Other keys are ignored.
    pub fn set_from_map(&mut self, entries: &HashMap<String, String>) -> MpConfResult<()> {
        self.apply_credentials(|key| entries.get(key.name()).cloned())
    }

    /// Loads a properties resource through `loader` and applies the same
    /// keys as [`MpConf::set_from_map`].
    pub fn set_from_properties_resource(
        &mut self,
        path: &str,
        loader: &dyn ResourceLoader,
    ) -> MpConfResult<()> {
        if path.is_empty() {
            return Err(Report::new(MpConfError::InvalidArgument(
                "File path can not be empty".to_string(),
            )));
        }
        let load_error =
            || MpConfError::Configuration(format!("Failed to load properties resource {}", path));
        let properties = {
            let reader = loader
                .open(path)
                .change_context_lazy(load_error)?
                .ok_or_else(|| {
                    Report::new(MpConfError::InvalidArgument("File not found".to_string()))
                        .attach_printable(format!("Resource path: {}", path))
                })?;
            Properties::load(reader).change_context_lazy(load_error)?
        };
        log::info!("Applying credentials from properties resource {}", path);
        self.apply_credentials(|key| properties.get(key.name()).map(str::to_string))
    }

    /// Reads the credentials from `MP_CLIENT_SECRET`, `MP_CLIENT_ID`,
    /// `MP_ACCESS_TOKEN` and `MP_APP_ID`, then `MP_BASE_URL` when present.
    pub fn set_from_env(&mut self) -> MpConfResult<()> {
        self.set_from_env_with(|name| std::env::var(name).ok())
    }

    pub fn set_from_env_with<F>(&mut self, mut lookup: F) -> MpConfResult<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        log::info!("Applying credentials from environment");
        self.apply_credentials(|key| lookup(key.env_var()))
            .attach_printable("Credentials are read from the MP_* environment variables")?;
        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|value| !value.is_empty()) {
            self.set_base_url(base_url);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        for key in CredentialKey::iter() {
            self.slot_mut(key).clear();
        }
        self.base_url = DEFAULT_BASE_URL.to_string();
        log::info!("Configuration reset");
    }

    pub fn snapshot(&self) -> ConfSnapshot {
        let view = |key: CredentialKey| {
            self.credential(key).map(|value| {
                if key.is_secret() {
                    mask(value)
                } else {
                    value.to_string()
                }
            })
        };
        ConfSnapshot {
            client_secret: view(CredentialKey::ClientSecret),
            client_id: view(CredentialKey::ClientId),
            access_token: view(CredentialKey::AccessToken),
            app_id: view(CredentialKey::AppId),
            base_url: self.base_url.clone(),
        }
    }
}

impl fmt::Debug for MpConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("MpConf")
            .field("client_secret", &snapshot.client_secret)
            .field("client_id", &snapshot.client_id)
            .field("access_token", &snapshot.access_token)
            .field("app_id", &snapshot.app_id)
            .field("base_url", &snapshot.base_url)
            .finish()
    }
}
