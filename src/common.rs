use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::provision::Provisioned;

pub const APP_ID: &str = "com.markodevcic.wordtwist";
pub const DB_NAME: &str = "foods.db";
pub const DB_DIR: &str = "databases";

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DatabaseSettings {
    /// File name of the installed database
    pub database_name: String,
    /// Directory below the app data dir that holds databases
    pub database_dir: String,
    /// Channel name the frontend addresses host calls to
    pub channel: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            database_name: DB_NAME.into(),
            database_dir: DB_DIR.into(),
            channel: APP_ID.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ProvisionReport {
    Installed {
        #[ts(type = "number")]
        bytes: u64,
    },
    AlreadyPresent,
}

impl From<Provisioned> for ProvisionReport {
    fn from(p: Provisioned) -> Self {
        match p {
            Provisioned::Installed { bytes } => ProvisionReport::Installed { bytes },
            Provisioned::AlreadyPresent => ProvisionReport::AlreadyPresent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_settings_target_foods_db() {
        let settings = DatabaseSettings::default();
        assert_eq!(settings.database_name, "foods.db");
        assert_eq!(settings.database_dir, "databases");
        assert_eq!(settings.channel, APP_ID);
    }

    #[test]
    fn report_is_tagged_for_the_frontend() {
        let installed = ProvisionReport::from(Provisioned::Installed { bytes: 6 });
        assert_eq!(
            serde_json::to_value(&installed).unwrap(),
            json!({ "status": "installed", "bytes": 6 })
        );
        assert_eq!(
            serde_json::to_value(ProvisionReport::AlreadyPresent).unwrap(),
            json!({ "status": "alreadyPresent" })
        );
    }
}
