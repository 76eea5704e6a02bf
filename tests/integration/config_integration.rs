//! Layered configuration feeding the pipeline

use super::test_utils::with_isolated_env;
use ideagen::config::{ConfigLoader, ProviderType};
use ideagen::Pipeline;
use std::fs;

#[test]
fn workspace_config_overrides_global_and_defaults() {
    with_isolated_env(|temp| {
        let global = temp.path().join(".config/ideagen");
        fs::create_dir_all(&global).unwrap();
        fs::write(
            global.join("config.toml"),
            r#"
[text_provider]
provider_type = "ollama"
model = "llama3"

[defaults.fallback_image]
default_keyword = "idea"
"#,
        )
        .unwrap();

        let workspace = temp.path().join("project");
        fs::create_dir_all(workspace.join("config")).unwrap();
        fs::write(
            workspace.join("config/config.toml"),
            r#"
[defaults.seed]
title = "Idea pending"

[prompts]
ideation = "Give me {count} ideas as JSON."
"#,
        )
        .unwrap();

        let config = ConfigLoader::load(&workspace).unwrap();
        assert!(config.validate().is_ok());
        let text = config.text_provider.as_ref().unwrap();
        assert_eq!(text.provider_type, ProviderType::Ollama);
        assert_eq!(config.defaults.fallback_image.default_keyword, "idea");
        assert_eq!(config.defaults.seed.title, "Idea pending");
        assert_eq!(config.prompts.ideation, "Give me {count} ideas as JSON.");
        // Untouched prompts keep their defaults.
        assert!(config.prompts.personas.contains("{count}"));

        let pipeline = Pipeline::from_config(&config);
        assert!(pipeline.client().has_text_service());
        assert!(!pipeline.client().has_image_service());
        assert_eq!(pipeline.defaults().seed.title, "Idea pending");
    });
}

#[test]
fn environment_selects_overlay_and_overrides() {
    with_isolated_env(|temp| {
        let workspace = temp.path().join("project");
        fs::create_dir_all(workspace.join("config")).unwrap();
        fs::write(
            workspace.join("config/test.toml"),
            r#"
[defaults.concept]
opportunity_score = 50
"#,
        )
        .unwrap();
        std::env::set_var("IDEAGEN_ENV", "test");
        std::env::set_var("IDEAGEN__LOGGING__LEVEL", "warn");

        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.defaults.concept.opportunity_score, 50);
        assert_eq!(config.logging.level, "warn");
    });
}

#[test]
fn invalid_values_are_all_reported() {
    with_isolated_env(|temp| {
        let path = temp.path().join("bad.toml");
        fs::write(
            &path,
            r#"
[text_provider]
provider_type = "local"
model = ""

[logging]
format = "xml"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        let errors = config.validate().unwrap_err();
        assert!(errors.len() >= 2);
        assert!(config.ensure_valid().is_err());
    });
}

#[test]
fn no_files_means_offline_defaults() {
    with_isolated_env(|temp| {
        let config = ConfigLoader::load(temp.path()).unwrap();
        assert!(config.text_provider.is_none());
        assert!(!Pipeline::from_config(&config).client().has_text_service());
    });
}
