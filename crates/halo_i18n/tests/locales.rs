use std::fs;

use halo_i18n::{t, I18nError, I18nState, LocaleCatalog};
use pretty_assertions::assert_eq;

fn write_locales(root: &std::path::Path) {
    let en = root.join("en-US");
    let zh = root.join("zh-CN");
    let broken = root.join("fr-FR");
    for dir in [&en, &zh, &broken] {
        fs::create_dir_all(dir).unwrap();
    }

    fs::write(
        en.join("main.ftl"),
        "app-title = Halo\nwelcome = Welcome back, { $name }!\n",
    )
    .unwrap();
    fs::write(
        en.join("settings.ftl"),
        "settings-theme = Theme\nsettings-language = Language\n",
    )
    .unwrap();
    fs::write(zh.join("main.ftl"), "app-title = 光环\n").unwrap();
    fs::write(broken.join("main.ftl"), "app-title = {\n").unwrap();
    fs::write(root.join("README.md"), "not a locale").unwrap();
}

#[test]
fn loads_a_locales_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_locales(dir.path());

    let catalog = LocaleCatalog::load_dir(dir.path()).unwrap();
    assert_eq!(catalog.locales(), vec!["en-US", "zh-CN"]);
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = LocaleCatalog::load_dir(dir.path().join("nope")).err().unwrap();
    assert!(matches!(err, I18nError::Io { .. }));
}

#[test]
fn falls_back_to_default_then_key() {
    let dir = tempfile::tempdir().unwrap();
    write_locales(dir.path());
    let state = I18nState::new(LocaleCatalog::load_dir(dir.path()).unwrap(), "en-US", "zh-CN");

    assert_eq!(state.tr(&t!("app-title")), "光环");
    assert_eq!(state.tr(&t!("settings-theme")), "Theme");
    assert_eq!(
        state.tr(&t!("welcome", { name: "Ada" })),
        "Welcome back, Ada!"
    );
    assert_eq!(state.tr(&t!("settings-unknown")), "settings-unknown");

    // The dropped locale behaves like any unknown one.
    state.set_language("fr-FR");
    assert_eq!(state.active_locales(), vec!["en-US"]);
    assert_eq!(state.t("app-title"), "Halo");
}
