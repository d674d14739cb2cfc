//! `[[servers]]` presets: sessions created when the client starts

use serde::Deserialize;

use crate::session::SessionForm;

/// One `[[servers]]` entry
///
/// Presets go through the same validation as the creation form, so every
/// field is kept raw here.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ServerPreset {
    pub name: String,
    /// `host:port`
    pub address: String,
    #[serde(default)]
    pub tls: bool,
    /// Empty means the configured default nick
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub channels: Vec<String>,
    /// Connect as soon as the client starts
    #[serde(default)]
    pub autoconnect: bool,
}

impl ServerPreset {
    /// The form input equivalent to this preset
    pub fn to_form(&self) -> SessionForm {
        SessionForm {
            tls: if self.tls { "true" } else { "false" }.to_string(),
            name: self.name.clone(),
            address: self.address.clone(),
            nick: self.nick.clone(),
            channels: self.channels.join(","),
        }
    }
}
