//! Integration tests for the project documenter.
//!
//! These drive the application layer the way a front end would: commands
//! mutate the owned `AppState`, and scan results come back over a tokio
//! MPSC channel that the test feeds into `app::wait_for_scan`.

use project_documenter::app::{self, commands, events::UserEvent, proxy::EventProxy, state::AppState};
use project_documenter::config::{session, settings, AppConfig};
use project_documenter::core::TriState;
use project_documenter::utils::test_helpers::setup_test_logging;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Contains the test infrastructure.
mod helpers {
    use super::*;
    use std::fs;

    /// A test double for the event proxy using a tokio MPSC channel.
    #[derive(Clone)]
    pub struct TestEventProxy {
        pub sender: mpsc::UnboundedSender<UserEvent>,
    }

    impl EventProxy for TestEventProxy {
        fn send_event(&self, event: UserEvent) {
            if let Err(e) = self.sender.send(event) {
                panic!("Test receiver dropped: {}", e);
            }
        }
    }

    /// `TestHarness` sets up an isolated project and config directory per test.
    pub struct TestHarness {
        pub state: AppState,
        pub proxy: TestEventProxy,
        pub event_rx: mpsc::UnboundedReceiver<UserEvent>,
        pub root_path: PathBuf,
        pub config_path: PathBuf,
        _project_dir: TempDir,
        _config_dir: TempDir,
    }

    impl TestHarness {
        pub fn new() -> Self {
            setup_test_logging();
            let project_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let config_dir = tempfile::tempdir().expect("Failed to create config dir");
            let config_path = config_dir.path().to_path_buf();
            let (event_tx, event_rx) = mpsc::unbounded_channel();

            let state = AppState::new(
                AppConfig::default(),
                Default::default(),
                Some(config_path.clone()),
            );

            Self {
                state,
                proxy: TestEventProxy { sender: event_tx },
                event_rx,
                root_path: project_dir.path().to_path_buf(),
                config_path,
                _project_dir: project_dir,
                _config_dir: config_dir,
            }
        }

        /// Replaces the state with one loaded from the harness config directory,
        /// as a fresh process would see it.
        pub fn restart(&mut self) {
            let dir = Some(self.config_path.as_path());
            let config = settings::load_config(dir).expect("config should load");
            let session = session::load_session(dir).expect("session should load");
            self.state = AppState::new(config, session, Some(self.config_path.clone()));
        }

        pub fn create_file(&self, path: &str, content: &str) {
            let file_path = self.root_path.join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent dir");
            }
            fs::write(file_path, content).expect("Failed to write file");
        }

        pub fn setup_basic_project(&self) {
            self.create_file("app/main.py", "print('hi')");
            self.create_file("app/util.py", "def util(): pass");
            self.create_file("db/schema.sql", "CREATE TABLE a (id INT);");
            self.create_file("requirements.txt", "flask");
            self.create_file("README.md", "# Demo");
            self.create_file("node_modules/pkg/index.js", "ignored");
            self.create_file(".hidden.py", "ignored");
            self.create_file("image.png", "ignored");
        }

        pub async fn load(&mut self) {
            commands::load_project(self.root_path.clone(), self.proxy.clone(), &mut self.state)
                .await
                .expect("load_project should start a scan");
            self.wait_for_scan().await;
        }

        pub async fn wait_for_scan(&mut self) {
            let proxy = self.proxy.clone();
            tokio::time::timeout(
                Duration::from_secs(10),
                app::wait_for_scan(&mut self.event_rx, &proxy, &mut self.state),
            )
            .await
            .expect("Scan did not complete within timeout")
            .expect("Scan failed");
        }

        pub fn relative_checked(&self) -> Vec<String> {
            self.state
                .checked_files()
                .iter()
                .map(|p| p.strip_prefix(&self.root_path).unwrap().to_string_lossy().replace('\\', "/"))
                .collect()
        }
    }
}

#[tokio::test]
async fn test_scan_builds_filtered_tree() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_project();

    harness.load().await;

    let tree = &harness.state.tree;
    let mut keys: Vec<&str> = tree.ids().map(|id| tree.relative_key(id)).collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["README.md", "app", "app/main.py", "app/util.py", "db", "db/schema.sql", "requirements.txt"]
    );
    assert!(!harness.state.is_scanning);
    assert!(harness.state.checked_files().is_empty());
}

#[tokio::test]
async fn test_toggle_then_generate_document() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_project();
    harness.load().await;

    commands::toggle_entry(Path::new("app"), None, &harness.proxy, &mut harness.state).unwrap();
    commands::toggle_entry(Path::new("db/schema.sql"), None, &harness.proxy, &mut harness.state).unwrap();
    commands::toggle_entry(Path::new("requirements.txt"), None, &harness.proxy, &mut harness.state).unwrap();
    commands::update_prompt("Add logging".to_string(), &harness.proxy, &mut harness.state);

    assert_eq!(
        harness.relative_checked(),
        vec!["app/main.py", "app/util.py", "db/schema.sql", "requirements.txt"]
    );

    let document = commands::generate_document(&harness.state);
    let objective = document.find("# 🎯 Objective\n\nAdd logging").unwrap();
    let structure = document.find("### 1. Project Structure").unwrap();
    let dependencies = document.find("### 2. Dependencies").unwrap();
    let contents = document.find("### 3. File Contents").unwrap();
    assert!(objective < structure && structure < dependencies && dependencies < contents);
    assert!(document.contains("#### `requirements.txt`\n*path: `requirements.txt`*\n\n```\nflask\n```"));
    assert!(document.contains("#### 📂 `app`"));
    assert!(document.contains("```python\nprint('hi')\n```"));
    assert!(document.contains("##### 🗄️ SQL Files (Consolidated)"));
    assert!(document.contains("-- From: schema.sql | path: db/schema.sql\nCREATE TABLE a (id INT);"));
    assert!(!document.contains("README.md"));
}

#[tokio::test]
async fn test_rescan_discards_previous_scan() {
    let mut harness = helpers::TestHarness::new();
    for i in 0..500 {
        harness.create_file(&format!("pkg{}/mod{}.py", i % 20, i), "x = 1");
    }

    commands::load_project(harness.root_path.clone(), harness.proxy.clone(), &mut harness.state)
        .await
        .unwrap();
    commands::rescan_project(harness.proxy.clone(), &mut harness.state)
        .await
        .unwrap();
    harness.wait_for_scan().await;

    assert_eq!(harness.state.scan_generation, 2);
    assert_eq!(harness.state.tree.len(), 520);
    assert!(!harness.state.is_scanning);
}

#[tokio::test]
async fn test_selection_is_restored_in_a_new_session() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_project();
    harness.load().await;
    commands::toggle_entry(Path::new("app/util.py"), None, &harness.proxy, &mut harness.state).unwrap();
    commands::set_expanded(Path::new("app"), true, &mut harness.state).unwrap();

    harness.restart();
    assert_eq!(
        harness.state.session.last_project_path,
        harness.root_path.to_string_lossy()
    );
    harness.load().await;

    assert_eq!(harness.relative_checked(), vec!["app/util.py"]);
    let tree = &harness.state.tree;
    let app_dir = tree.find(Path::new("app")).unwrap();
    assert_eq!(tree.state(app_dir), TriState::Partial);
    assert!(tree.is_expanded(app_dir));
}

#[tokio::test]
async fn test_settings_change_rescans_with_new_filters() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_project();
    harness.load().await;
    commands::toggle_all(TriState::Checked, &harness.proxy, &mut harness.state).unwrap();

    let edit = commands::SettingsEdit {
        extension_map_text: r#"{".py": "python", "PNG": "binary"}"#.to_string(),
        exclude_list_text: "db\nnode_modules\n".to_string(),
        exclude_dotfiles: true,
        show_project_structure: false,
        remember_project_path: true,
        restore_tree_selection: true,
    };
    commands::update_config(edit, harness.proxy.clone(), &mut harness.state)
        .await
        .unwrap();
    harness.wait_for_scan().await;

    assert_eq!(harness.relative_checked(), vec!["app/main.py", "app/util.py"]);
    assert!(harness.state.tree.find(Path::new("image.png")).is_some());
    assert!(harness.state.tree.find(Path::new("db")).is_none());
    assert!(!commands::generate_document(&harness.state).contains("Project Structure"));

    let stored = settings::load_config(Some(harness.config_path.as_path())).unwrap();
    assert_eq!(stored.exclude_list, vec!["db", "node_modules"]);
}

#[tokio::test]
async fn test_export_writes_document_and_reports() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_project();
    harness.load().await;
    commands::toggle_entry(Path::new("README.md"), None, &harness.proxy, &mut harness.state).unwrap();
    let destination = harness.config_path.join("context.md");

    commands::export_document(Some(&destination), &harness.proxy, &harness.state).unwrap();

    let written = std::fs::read_to_string(&destination).unwrap();
    assert_eq!(written, commands::generate_document(&harness.state));
    let mut reported = false;
    while let Ok(event) = harness.event_rx.try_recv() {
        if let UserEvent::ExportComplete(true, path) = event {
            assert_eq!(path, destination.display().to_string());
            reported = true;
        }
    }
    assert!(reported);
}

#[tokio::test]
async fn test_cancel_scan_stops_scanning() {
    let mut harness = helpers::TestHarness::new();
    for i in 0..300 {
        harness.create_file(&format!("pkg{}/mod{}.py", i % 10, i), "x = 1");
    }

    commands::load_project(harness.root_path.clone(), harness.proxy.clone(), &mut harness.state)
        .await
        .unwrap();
    commands::cancel_scan(&mut harness.state).await;

    assert!(!harness.state.is_scanning);
    assert!(harness.state.scan_task.is_none());
    assert!(harness.state.tree.is_empty());
}

#[tokio::test]
async fn test_folder_of_unlisted_files_does_not_block_parent_state() {
    let mut harness = helpers::TestHarness::new();
    harness.create_file("web/main.py", "run()");
    harness.create_file("web/assets/logo.png", "png");
    harness.load().await;
    assert!(harness.state.tree.find(Path::new("web/assets")).is_some());

    commands::toggle_entry(Path::new("web/main.py"), None, &harness.proxy, &mut harness.state).unwrap();
    let web = harness.state.tree.find(Path::new("web")).unwrap();
    assert_eq!(harness.state.tree.state(web), TriState::Checked);

    commands::toggle_all(TriState::Checked, &harness.proxy, &mut harness.state).unwrap();
    commands::toggle_entry(Path::new("web/main.py"), None, &harness.proxy, &mut harness.state).unwrap();
    assert_eq!(harness.state.tree.state(web), TriState::Unchecked);
    assert!(harness.state.checked_files().is_empty());
}

#[tokio::test]
async fn test_toggle_accepts_dot_prefixed_paths() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_project();
    harness.load().await;

    commands::toggle_entry(Path::new("./app"), Some(TriState::Checked), &harness.proxy, &mut harness.state)
        .unwrap();

    assert_eq!(harness.relative_checked(), vec!["app/main.py", "app/util.py"]);
}
