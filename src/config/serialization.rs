//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::{Config, ServerPreset};

impl Config {
    /// Serialize server presets to `[[servers]]` tables
    pub(super) fn servers_to_toml(&self) -> String {
        if self.servers.is_empty() {
            // Show an example when nothing is configured
            return r##"
# [[servers]]
# name = "libera"
# address = "irc.libera.chat:6697"
# tls = true
# nick = ""                # empty uses the nick above
# channels = ["#rust"]
# autoconnect = false
"##
            .to_string();
        }

        let mut output = String::new();
        for preset in &self.servers {
            output.push('\n');
            output.push_str(&preset_to_toml(preset));
        }
        output
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r##"# zuse configuration

# Nick used when a server leaves it empty (env: ZUSE_NICK)
nick = {nick:?}

# Sent with QUIT on /quit and when a server is deleted
quit_message = {quit:?}

# Width of the server list in columns
left_pane_width = {width}

# Seconds to wait for a connection to come up; 0 waits forever
# (env: ZUSE_CONNECT_TIMEOUT)
connect_timeout_secs = {timeout}

# ─────────────────────────────────────────────────────────────────────────────
# LOGGING
# ─────────────────────────────────────────────────────────────────────────────
# Records are kept in memory while the UI runs (F2 shows them).
# Level can be overridden with ZUSE_LOG_LEVEL or RUST_LOG.

[logging]
level = {log_level:?}
file_enabled = {log_file_enabled}
file_dir = {log_file_dir:?}
file_rotation = "{log_file_rotation}"
file_prefix = {log_file_prefix:?}

# ─────────────────────────────────────────────────────────────────────────────
# SERVERS
# ─────────────────────────────────────────────────────────────────────────────
# Created at startup. Validated like the "add server" form; invalid entries
# are skipped.
{servers_section}"##,
            nick = self.nick,
            quit = self.quit_message,
            width = self.left_pane_width,
            timeout = self.connect_timeout.map(|d| d.as_secs()).unwrap_or(0),
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = self.logging.file_dir.display().to_string(),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = self.logging.file_prefix,
            servers_section = self.servers_to_toml(),
        )
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }
}

fn preset_to_toml(preset: &ServerPreset) -> String {
    let mut output = String::from("[[servers]]\n");
    output.push_str(&format!("name = {:?}\n", preset.name));
    output.push_str(&format!("address = {:?}\n", preset.address));
    output.push_str(&format!("tls = {}\n", preset.tls));
    if !preset.nick.is_empty() {
        output.push_str(&format!("nick = {:?}\n", preset.nick));
    }
    output.push_str(&format!("channels = {:?}\n", preset.channels));
    output.push_str(&format!("autoconnect = {}\n", preset.autoconnect));
    output
}
