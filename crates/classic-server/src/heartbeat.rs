//! Directory heartbeat.
//!
//! A periodic form-encoded POST advertising the server to a public listing
//! service. The request runs on its own task; the directory is advisory,
//! so failures only warn.

use tracing::warn;

use classic_proto::packets::PROTOCOL_VERSION;

/// Software identifier reported to the directory.
pub const SOFTWARE: &str = "classicd";

/// Population snapshot sent with each heartbeat.
#[derive(Debug, Clone)]
pub struct HeartbeatReport {
    pub public: bool,
    pub max_users: usize,
    pub users: usize,
    pub port: u16,
    pub salt: String,
    pub name: String,
}

impl HeartbeatReport {
    /// Form fields in the order the listing service documents them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("public", if self.public { "True" } else { "False" }.into()),
            ("max", self.max_users.to_string()),
            ("users", self.users.to_string()),
            ("port", self.port.to_string()),
            ("version", PROTOCOL_VERSION.to_string()),
            ("salt", self.salt.clone()),
            ("name", self.name.clone()),
            ("software", SOFTWARE.into()),
        ]
    }
}

/// Fire one heartbeat without stalling the caller.
pub fn send(client: reqwest::Client, url: String, report: HeartbeatReport) {
    tokio::spawn(async move {
        let fields = report.form_fields();
        match client.post(&url).form(&fields).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => warn!("Heartbeat rejected by {url}: {}", resp.status()),
            Err(e) => warn!("Failed to send heartbeat: {e}"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_fields_complete_and_ordered() {
        let report = HeartbeatReport {
            public: true,
            max_users: 8,
            users: 3,
            port: 25565,
            salt: "abcdefghijklmnop".into(),
            name: "A Server".into(),
        };
        let fields = report.form_fields();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            ["public", "max", "users", "port", "version", "salt", "name", "software"]
        );
        assert_eq!(fields[0].1, "True");
        assert_eq!(fields[3].1, "25565");
        assert_eq!(fields[4].1, "7");
        assert_eq!(fields[7].1, SOFTWARE);
    }

    #[test]
    fn private_servers_report_false() {
        let report = HeartbeatReport {
            public: false,
            max_users: 8,
            users: 0,
            port: 25565,
            salt: String::new(),
            name: String::new(),
        };
        assert_eq!(report.form_fields()[0].1, "False");
    }
}
