//! Integration tests for layered Settings loading.
//!
//! These tests run without a global config (temp directories only), so they
//! effectively test local files merged over compiled defaults.

use std::env;
use std::fs;

use tempfile::TempDir;

use ordtree::config::Settings;
use ordtree::{Items, TreeBuilder, TreeError};

#[test]
fn given_partial_file_when_load_file_then_unspecified_values_keep_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ordtree.toml");
    fs::write(&path, "max_depth = 8\n").unwrap();

    let settings = Settings::load_file(&path).expect("load settings");

    assert_eq!(settings.max_depth, 8);
    assert_eq!(settings.capacity, Settings::default().capacity);
}

#[test]
fn given_malformed_file_when_load_file_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ordtree.toml");
    fs::write(&path, "max_depth = \"deep\"\n").unwrap();

    let result = Settings::load_file(&path);

    assert!(matches!(result, Err(TreeError::Config { .. })));
}

#[test]
fn given_zero_depth_when_load_file_then_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ordtree.toml");
    fs::write(&path, "max_depth = 0\n").unwrap();

    assert!(matches!(
        Settings::load_file(&path),
        Err(TreeError::Config { .. })
    ));
}

#[test]
fn given_loaded_limit_when_building_then_builder_enforces_it() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ordtree.toml");
    fs::write(&path, "max_depth = 2\ncapacity = 16\n").unwrap();
    let settings = Settings::load_file(&path).unwrap();
    let builder = TreeBuilder::from_settings(&settings);

    let flat = builder.build(Items::leaves([1, 2, 3])).unwrap();
    assert_eq!(flat.node_count(), 4);

    let nested = builder.build(Items::branch([Items::leaves([1])]));
    assert!(matches!(nested, Err(TreeError::DepthLimitExceeded(2))));
}

/// Local file and environment layers, kept in one test since all of them read process env.
#[test]
fn given_local_file_and_env_when_load_then_env_wins() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ordtree.toml");
    fs::write(&path, "max_depth = 16\ncapacity = 32\n").unwrap();

    let settings = Settings::load(Some(&path)).expect("load settings");
    assert_eq!(settings.max_depth, 16);
    assert_eq!(settings.capacity, 32);

    // Missing local file falls back to defaults
    let missing = dir.path().join("absent.toml");
    let settings = Settings::load(Some(&missing)).expect("load settings");
    assert_eq!(settings, Settings::default());

    env::set_var("ORDTREE_CAPACITY", "128");
    let settings = Settings::load(Some(&path)).expect("load settings");
    env::remove_var("ORDTREE_CAPACITY");

    assert_eq!(settings.max_depth, 16);
    assert_eq!(settings.capacity, 128);

    env::set_var("ORDTREE_MAX_DEPTH", "4");
    let settings = Settings::load(None).expect("load settings");
    env::remove_var("ORDTREE_MAX_DEPTH");
    assert_eq!(settings.max_depth, 4);

    // Present but malformed is rejected rather than ignored
    env::set_var("ORDTREE_CAPACITY", "lots");
    let result = Settings::load(Some(&path));
    env::remove_var("ORDTREE_CAPACITY");
    assert!(matches!(result, Err(TreeError::Config { .. })));
}
