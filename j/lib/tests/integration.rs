//! Cross-module checks over the built-in catalog and persisted settings.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use j_lib::actions::{self, InstallOutcome};
use j_lib::catalog::{self, CheckResult, InstallMethod, LogReporter, Style, Tool};
use j_lib::remote::{AuthMethod, RemoteMode};
use j_lib::status::{Item, ItemKind, Job, SECTION_RESOURCES};
use j_lib::{ConfigPaths, RemoteManager, RemoteSettings, StatusEngine, resolver};
use tempfile::tempdir;

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn install_order_puts_dependencies_first() {
    let order = resolver::install_order();
    let mut seen = HashSet::new();
    for tool in &order {
        for dep in tool.dependencies {
            let installable = catalog::tool_by_name(dep).is_some_and(|t| t.is_installable());
            if installable {
                assert!(seen.contains(dep), "{} installed before {dep}", tool.name);
            }
        }
        assert!(seen.insert(tool.name), "{} listed twice", tool.name);
    }
    assert_eq!(order.len(), catalog::installable_tools().len());
}

static RUNTIME_READY: AtomicBool = AtomicBool::new(false);

fn runtime_check() -> CheckResult {
    if RUNTIME_READY.load(Ordering::SeqCst) {
        CheckResult::with_version("1.2.0")
    } else {
        CheckResult::not_installed()
    }
}

fn install_runtime() -> j_lib::error::Result<()> {
    RUNTIME_READY.store(true, Ordering::SeqCst);
    Ok(())
}

fn not_installed() -> CheckResult {
    CheckResult::not_installed()
}

fn install_noop() -> j_lib::error::Result<()> {
    Ok(())
}

#[test]
fn requested_tool_installs_after_its_missing_dependency() {
    let catalog = [
        Tool {
            name: "docs",
            method: InstallMethod::Manual,
            check: Some(not_installed),
            install: Some(install_noop),
            dependencies: &["runtime"],
            ..Tool::BLANK
        },
        Tool {
            name: "runtime",
            method: InstallMethod::BrewFormula,
            check: Some(runtime_check),
            install: Some(install_runtime),
            ..Tool::BLANK
        },
    ];

    let order: Vec<&str> = resolver::plan_in(&catalog, &["docs"])
        .iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(order, ["runtime", "docs"]);

    for name in order {
        let outcome = actions::install_in(&catalog, name, &LogReporter).unwrap();
        assert!(matches!(outcome, InstallOutcome::Installed { .. }), "{name}");
    }
}

#[test]
fn built_in_plan_puts_bun_before_qmd() {
    let order: Vec<&str> = resolver::plan(&["qmd"]).iter().map(|t| t.name).collect();
    let bun = order.iter().position(|n| *n == "bun").unwrap();
    assert_eq!(order.last(), Some(&"qmd"));
    assert!(bun < order.len() - 1);
}

#[test]
fn every_dependency_names_a_catalog_tool() {
    for tool in catalog::all_tools() {
        for dep in tool.dependencies {
            assert!(
                catalog::tool_by_name(dep).is_some(),
                "{} depends on unknown {dep}",
                tool.name
            );
        }
    }
}

#[test]
fn package_manager_flags_are_unique() {
    let flags: HashSet<&str> = catalog::package_managers().iter().map(|pm| pm.flag).collect();
    assert_eq!(flags.len(), catalog::package_managers().len());
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn remote_settings_persist_across_managers() {
    let dir = tempdir().unwrap();
    let settings = RemoteSettings {
        mode: RemoteMode::Userspace,
        auth_method: AuthMethod::Authkey,
        secret: "tskey-auth-123".into(),
        hostname: "studio".into(),
    };

    {
        let manager = RemoteManager::with_paths(ConfigPaths::with_home(dir.path()));
        assert!(!manager.has_settings());
        manager.save_settings(&settings).unwrap();
    }

    let manager = RemoteManager::with_paths(ConfigPaths::with_home(dir.path()));
    assert!(manager.has_settings());
    assert_eq!(manager.load_settings().unwrap(), settings);
}

#[test]
fn authkey_without_secret_is_not_saved() {
    let dir = tempdir().unwrap();
    let manager = RemoteManager::with_paths(ConfigPaths::with_home(dir.path()));
    let settings = RemoteSettings {
        auth_method: AuthMethod::Authkey,
        ..RemoteSettings::default()
    };
    assert!(manager.save_settings(&settings).is_err());
    assert!(!manager.paths().jrc().exists());
}

// ============================================================================
// Status engine
// ============================================================================

#[tokio::test]
async fn engine_loads_custom_items() {
    let items = vec![
        Item::header("header-disk".into(), SECTION_RESOURCES, "Disk Usage"),
        Item::new("disk-a".into(), ItemKind::Disk, SECTION_RESOURCES, "Disk Usage", "a"),
        Item::new("disk-b".into(), ItemKind::Disk, SECTION_RESOURCES, "Disk Usage", "b"),
    ];
    let jobs: Vec<(String, Job)> = ["disk-a", "disk-b"]
        .into_iter()
        .map(|id| {
            let job: Job = Box::new(|mut item: Item| {
                item.available = true;
                item.value = "1.0 KB".into();
                item.style = Style::Success;
                item
            });
            (id.to_string(), job)
        })
        .collect();

    let mut engine = StatusEngine::from_parts(items, jobs);
    assert_eq!(engine.total(), 2);
    engine.start();
    engine.wait_all().await;

    assert!(engine.is_all_loaded());
    assert_eq!(engine.loaded(), 2);
    let a = engine.item("disk-a").unwrap();
    assert!(a.loaded);
    assert_eq!(a.value, "1.0 KB");
}
