use std::sync::Arc;

use halo_core::{commands, Color, MemoryBackend};
use halo_theme::palette::{variable_names, CHART_COUNT, VARIABLE_COUNT};
use halo_theme::{
    contrast_text, generate, EffectMode, MemoryStyleSink, Platform, ThemeConfig, ThemeError,
    ThemeMode, ThemeState,
};
use pretty_assertions::assert_eq;

const SEEDS: &[&str] = &[
    "#01ca8a", "#000000", "#ffffff", "#3b82f6", "#ef4444", "#7f8c8d", "#fde047", "#1e1b4b",
    "f0f", "#12345680",
];

#[test]
fn every_seed_yields_complete_palettes() {
    let expected: Vec<&str> = variable_names().collect();
    assert_eq!(expected.len(), VARIABLE_COUNT);

    for seed in SEEDS {
        let set = generate(seed).unwrap();
        for palette in [&set.light, &set.dark] {
            let names: Vec<&str> = palette.iter().map(|(name, _)| name).collect();
            assert_eq!(names, expected, "seed {seed}");
            assert_eq!(palette.charts().len(), CHART_COUNT, "seed {seed}");
            assert!(palette.iter().all(|(_, value)| !value.is_empty()));
        }
    }
}

#[test]
fn foreground_text_follows_seed_darkness() {
    for seed in SEEDS {
        let color = Color::parse_hex(seed).unwrap();
        let set = generate(seed).unwrap();
        let expected = if color.is_dark() { "#ffffff" } else { "#0f172a" };
        assert_eq!(set.light.get("--primary-foreground"), Some(expected), "seed {seed}");
        assert_eq!(set.dark.get("--primary-foreground"), Some(expected), "seed {seed}");
        assert_eq!(set.dark.get("--sidebar-primary-foreground"), Some("#ffffff"));
    }

    assert_eq!(contrast_text(Color::from_hex(0x1e1b4b)), "#ffffff");
    assert_eq!(contrast_text(Color::from_hex(0xfde047)), "#0f172a");
}

#[test]
fn dark_charts_are_lighter() {
    let set = generate("#01ca8a").unwrap();
    assert_eq!(
        set.dark.charts(),
        vec![
            "hsl(131.0 99.0% 50.0%)",
            "hsl(161.0 99.0% 50.0%)",
            "hsl(191.0 99.0% 50.0%)",
            "hsl(231.0 99.0% 60.0%)",
            "hsl(271.0 99.0% 70.0%)",
        ]
    );
}

#[test]
fn invalid_seed_is_an_error() {
    assert!(matches!(generate("not a color"), Err(ThemeError::InvalidColor(_))));
    assert!(matches!(generate(""), Err(ThemeError::InvalidColor(_))));
}

#[test]
fn stylesheet_is_stable() {
    let sink = Arc::new(MemoryStyleSink::new());
    let state = ThemeState::with_platform(sink.clone(), false, Platform::Linux);
    state.apply(ThemeConfig::default()).unwrap();
    let once = sink.content();

    let other = ThemeState::with_platform(sink.clone(), false, Platform::Linux);
    other.apply(ThemeConfig::default()).unwrap();
    assert_eq!(sink.content(), once);
}

#[tokio::test]
async fn load_and_push_round_trip_through_the_host() {
    let backend = MemoryBackend::new().with_theme(ThemeConfig {
        mode: ThemeMode::Dark,
        effect: EffectMode::Vibrancy,
        primary_hex: "#3b82f6".into(),
    });
    let sink = Arc::new(MemoryStyleSink::new());
    let state = ThemeState::with_platform(sink.clone(), false, Platform::Windows);

    state.load(&backend).await.unwrap();
    assert!(state.is_dark());
    // Vibrancy is unavailable on Windows.
    assert_eq!(state.effect(), EffectMode::Auto);
    assert_eq!(sink.writes(), 1);

    state.set_mode(ThemeMode::Light);
    state.push(&backend).await.unwrap();

    assert_eq!(backend.theme_config().mode, ThemeMode::Light);
    assert_eq!(backend.call_count(commands::SET_THEME_CONFIG), 1);
    assert_eq!(backend.call_count(commands::REFRESH_WINDOW_THEME), 1);
    let stored: serde_json::Value =
        serde_json::from_str(&backend.calls()[1].args[0]).unwrap();
    assert_eq!(stored["primaryHex"], "#3b82f6");
}

#[tokio::test]
async fn push_stops_at_first_failure() {
    let backend = MemoryBackend::new();
    backend.fail(commands::SET_THEME_CONFIG);
    let state = ThemeState::with_platform(Arc::new(MemoryStyleSink::new()), false, Platform::Linux);

    assert!(matches!(state.push(&backend).await, Err(ThemeError::Bridge(_))));
    assert_eq!(backend.call_count(commands::REFRESH_WINDOW_THEME), 0);
}
