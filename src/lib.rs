use common::{DatabaseSettings, ProvisionReport};
use tauri::ipc::{InvokeBody, Request};
use tauri::{AppHandle, State};

use channel::{Command, MethodCall};
use provision::DatabaseProvisioner;

pub mod channel;
mod common;
pub mod provision;
mod storage;

fn copy_db_command(body: &InvokeBody) -> Result<Command, channel::ChannelError> {
    match body {
        InvokeBody::Raw(bytes) => Ok(Command::CopyDb {
            db_data: bytes.clone(),
        }),
        InvokeBody::Json(arguments) => Command::copy_db(arguments.clone()),
    }
}

/// Installs the bundled database on first launch.
///
/// The request body is either the raw database bytes or `{ "dbData": ... }`.
#[tauri::command]
fn copy_db(
    request: Request<'_>,
    app_handle: AppHandle,
    settings: State<'_, DatabaseSettings>,
    provisioner: State<'_, DatabaseProvisioner>,
) -> Result<ProvisionReport, String> {
    let Command::CopyDb { db_data } =
        copy_db_command(request.body()).map_err(|e| e.to_string())?;
    storage::prepare_database_path(&app_handle, &settings)
        .and_then(|path| provisioner.provision(&path, &db_data))
        .map(ProvisionReport::from)
        .map_err(|e| {
            log::error!("Error creating source database: {e}");
            e.to_string()
        })
}

#[tauri::command]
fn method_call(
    call: MethodCall,
    app_handle: AppHandle,
    settings: State<'_, DatabaseSettings>,
    provisioner: State<'_, DatabaseProvisioner>,
) -> Result<bool, String> {
    log::debug!("Host call '{}' on {}", call.method, settings.channel);
    let command = Command::try_from(call).map_err(|e| e.to_string())?;
    let path =
        storage::prepare_database_path(&app_handle, &settings).map_err(|e| e.to_string())?;
    channel::dispatch(command, &provisioner, &path).map_err(|e| {
        log::error!("Host call failed: {e}");
        e.to_string()
    })
}

#[tauri::command]
fn get_settings(settings: State<'_, DatabaseSettings>) -> DatabaseSettings {
    settings.inner().clone()
}

#[tauri::command]
fn storage_info(app_handle: AppHandle, settings: State<'_, DatabaseSettings>) -> String {
    storage::debug_info(&app_handle, &settings)
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_os::init())
        .plugin(tauri_plugin_log::Builder::new().build())
        .manage(DatabaseSettings::default())
        .manage(DatabaseProvisioner::new())
        .invoke_handler(tauri::generate_handler![
            copy_db,
            method_call,
            get_settings,
            storage_info
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frontend_refuses_to_install_a_failed_asset_fetch() {
        let page = include_str!("../dist/index.html");
        let check = page.find("if (!response.ok)").unwrap();
        let read = page.find("response.arrayBuffer()").unwrap();
        let install = page.find("invoke(\"copy_db\"").unwrap();
        assert!(check < read && read < install);
    }

    #[test]
    fn raw_body_is_the_payload() {
        let command = copy_db_command(&InvokeBody::Raw(vec![0x53, 0x51])).unwrap();
        assert_eq!(
            command,
            Command::CopyDb {
                db_data: vec![0x53, 0x51]
            }
        );
    }

    #[test]
    fn json_body_carries_db_data() {
        let body = InvokeBody::Json(json!({ "dbData": [1, 2, 3] }));
        assert_eq!(
            copy_db_command(&body).unwrap(),
            Command::CopyDb {
                db_data: vec![1, 2, 3]
            }
        );
    }
}
