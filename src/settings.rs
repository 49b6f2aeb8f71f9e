//! Key/value site settings stored as JSON text, and the branding record.

use crate::db::Store;
use crate::error::{CmsError, CmsResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

pub const BRANDING_KEY: &str = "branding";

/// Parsed JSON value of a setting, `None` when unset.
pub async fn get_setting<T: DeserializeOwned>(store: &dyn Store, key: &str) -> CmsResult<Option<T>> {
    match store.get_setting(key).await? {
        Some(setting) => Ok(Some(serde_json::from_str(&setting.value)?)),
        None => Ok(None),
    }
}

pub async fn put_setting<T: Serialize>(store: &dyn Store, key: &str, value: &T) -> CmsResult<()> {
    let text = serde_json::to_string(value)?;
    store.put_setting(key, &text).await
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginBranding {
    pub title: String,
    pub description: String,
    pub background_image: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoweredBy {
    pub name: String,
    pub url: String,
}

impl Default for PoweredBy {
    fn default() -> Self {
        Self {
            name: "Neskeep".to_string(),
            url: String::new(),
        }
    }
}

/// Admin panel look. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Branding {
    pub name: String,
    pub logo: String,
    pub primary_color: String,
    pub favicon: String,
    pub login: LoginBranding,
    pub powered_by: PoweredBy,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "CMS".to_string(),
            logo: String::new(),
            primary_color: "#2563eb".to_string(),
            favicon: String::new(),
            login: LoginBranding::default(),
            powered_by: PoweredBy::default(),
        }
    }
}

/// Stored branding, or the defaults when unset, unreadable or the database
/// is unavailable.
pub async fn get_branding(store: &dyn Store) -> Branding {
    match get_setting::<Branding>(store, BRANDING_KEY).await {
        Ok(Some(branding)) => branding,
        Ok(None) => Branding::default(),
        Err(e) => {
            log::warn!("Falling back to default branding: {}", e);
            Branding::default()
        }
    }
}

pub async fn put_branding(store: &dyn Store, body: Value) -> CmsResult<Branding> {
    if !body.is_object() {
        return Err(CmsError::bad_request("Request body is required"));
    }
    let branding: Branding = serde_json::from_value(body)
        .map_err(|e| CmsError::bad_request(format!("Invalid branding: {}", e)))?;
    put_setting(store, BRANDING_KEY, &branding).await?;
    log::info!("Branding settings saved");
    Ok(branding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_branding_shape() {
        let value = serde_json::to_value(Branding::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "CMS",
                "logo": "",
                "primaryColor": "#2563eb",
                "favicon": "",
                "login": { "title": "", "description": "", "backgroundImage": "" },
                "poweredBy": { "name": "Neskeep", "url": "" },
            })
        );
    }

    #[test]
    fn test_partial_branding_keeps_defaults() {
        let branding: Branding =
            serde_json::from_value(json!({ "name": "Acme", "login": { "title": "Welcome" } })).unwrap();
        assert_eq!(branding.name, "Acme");
        assert_eq!(branding.login.title, "Welcome");
        assert_eq!(branding.primary_color, "#2563eb");
        assert_eq!(branding.powered_by.name, "Neskeep");
    }
}
