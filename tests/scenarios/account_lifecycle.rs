//! Scenario: account setup, save, reload and erase
//!
//! Steps:
//! 1. Declare metadata with a required, account-exclusive password
//! 2. Start an account, try to save early (refused), fill it in, save
//! 3. Reload in a fresh stack and drive a dispatcher with it
//! 4. Erase the account

use serde_json::json;
use tempfile::TempDir;
use tessera::domain::services::SetupHints;
use tessera::settings::PathSettings;
use tessera::{
    AccountConfig, AttributeMeta, Dispatcher, MetadataModel, MockController, Need, Operation,
    Params, SchemaRegistry, Settings, TesseraError,
};

fn registry() -> SchemaRegistry {
    let required = SetupHints {
        required: true,
        ..SetupHints::default()
    };
    let mut registry = SchemaRegistry::new();
    registry
        .define_attribute(
            "account",
            "password",
            AttributeMeta::default()
                .account_exclusive()
                .with_setup(required.clone()),
        )
        .define_attribute(
            "compute",
            "region",
            AttributeMeta::default()
                .with_default("eu-west")
                .with_setup(required),
        )
        .define_object("server", |obj| {
            obj.use_controller([Operation::Create])
                .needs(Need::data("region").required())
        });
    registry
}

fn settings(dir: &TempDir) -> Settings {
    Settings {
        paths: PathSettings {
            config_dir: dir.path().to_path_buf(),
            accounts_dir: None,
            local_file: None,
            defaults_file: None,
        },
        ..Settings::default()
    }
}

#[test]
fn scenario_account_lifecycle() {
    let dir = TempDir::new().unwrap();
    let registry = registry();
    let schema = registry.build();
    let metadata = MetadataModel::new(schema.app().clone()).into_shared();

    // Steps 1-2: new account, refused until complete
    let accounts = AccountConfig::new(&settings(&dir), metadata.clone()).unwrap();
    accounts.ac_new("alice").unwrap();
    let err = accounts.ac_save().unwrap_err();
    assert!(matches!(err, TesseraError::AccountNotReady { ref missing } if missing.len() == 2));

    {
        let mut stack = accounts.config().write().unwrap();
        // exclusive keys never land in the shared local layer
        assert_eq!(stack.set_in("local", "password", "pw").unwrap(), None);
        stack.set_in("account", "password", "pw").unwrap();
        stack.set_in("local", "region", "us-east").unwrap();
    }
    accounts.ac_save().unwrap();
    {
        let mut stack = accounts.config().write().unwrap();
        assert!(stack.save("local").unwrap());
    }

    // Step 3: reload and dispatch
    let reloaded = AccountConfig::new(&settings(&dir), metadata.clone()).unwrap();
    reloaded.load_base().unwrap();
    reloaded.ac_load("alice").unwrap();
    assert_eq!(reloaded.current_account(), Some("alice".to_string()));

    let controller = std::sync::Arc::new(MockController::new());
    let dispatcher = Dispatcher::new(schema, controller.clone())
        .with_settings(&settings(&dir).dispatch)
        .with_metadata(metadata)
        .with_config(reloaded.config().clone());
    let server = dispatcher.create("server", Params::new()).unwrap();
    assert_eq!(server.get("region"), Some(json!("us-east")));

    // Step 4: erase
    assert!(reloaded.ac_erase().unwrap());
    assert!(!reloaded.account_path("alice").exists());
    assert_eq!(reloaded.current_account(), None);
}
