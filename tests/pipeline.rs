use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;

use metagame_analysis::config::AppConfig;
use metagame_analysis::errors::MetagameError;
use metagame_analysis::rules::RuleRepository;
use metagame_analysis::services::{AnalysisRequest, AnalysisService};

const RULES: &str = r#"[
  {
    "name": "Prowess",
    "priority": 1,
    "includeColorInName": true,
    "conditions": [
      { "type": "OneOrMoreInMainboard", "cards": ["Monastery Swiftspear"] },
      { "type": "InMainboard", "cards": ["Lightning Bolt"], "minCount": 2 }
    ]
  },
  {
    "name": "Tron",
    "priority": 2,
    "includeColorInName": true,
    "conditions": [
      { "type": "TwoOrMoreInMainboard", "cards": ["Urza's Tower", "Urza's Mine", "Urza's Power Plant"] }
    ]
  },
  {
    "name": "Burn",
    "isFallback": true,
    "conditions": [
      { "type": "InMainboard", "cards": ["Lightning Bolt"], "minCount": 4 }
    ]
  }
]"#;

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn deck(player: &str, wins: u32, losses: u32, cards: &[(&str, u32)]) -> Value {
    let mainboard: Vec<Value> = cards
        .iter()
        .map(|(name, count)| json!({ "name": name, "count": count }))
        .collect();
    json!({
        "player": player,
        "record": { "wins": wins, "losses": losses, "draws": 0 },
        "mainboard": mainboard,
        "sideboard": []
    })
}

fn prowess(player: &str, wins: u32, losses: u32) -> Value {
    deck(
        player,
        wins,
        losses,
        &[
            ("Monastery Swiftspear", 4),
            ("Lightning Bolt", 4),
            ("Expressive Iteration", 2),
        ],
    )
}

fn tron(player: &str, wins: u32, losses: u32) -> Value {
    deck(
        player,
        wins,
        losses,
        &[
            ("Urza's Tower", 4),
            ("Urza's Mine", 4),
            ("Urza's Power Plant", 4),
            ("Karn, the Great Creator", 1),
        ],
    )
}

struct Workspace {
    _dir: TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();

        fs::create_dir_all(root.join("rules")).unwrap();
        fs::create_dir_all(root.join("tournaments")).unwrap();
        fs::write(root.join("rules/modern.json"), RULES).unwrap();

        write_json(
            &root.join("cards.json"),
            &json!([
                { "name": "Monastery Swiftspear", "mana_cost": "{R}", "type_line": "Creature" },
                { "name": "Lightning Bolt", "mana_cost": "{R}", "type_line": "Instant" },
                { "name": "Expressive Iteration", "mana_cost": "{U}{R}", "type_line": "Sorcery" },
                { "name": "Urza's Tower", "mana_cost": "", "type_line": "Land" },
                { "name": "Urza's Mine", "mana_cost": "", "type_line": "Land" },
                { "name": "Urza's Power Plant", "mana_cost": "", "type_line": "Land" },
                { "name": "Karn, the Great Creator", "mana_cost": "{4}", "type_line": "Planeswalker" }
            ]),
        );

        Self { _dir: dir, root }
    }

    fn with_tournaments(self) -> Self {
        let dir = self.root.join("tournaments");
        write_json(
            &dir.join("t1.json"),
            &json!({
                "id": "t1",
                "name": "Modern Challenge",
                "date": "2024-03-02",
                "format": "Modern",
                "source": "mtgo",
                "decks": [
                    prowess("alice", 5, 2),
                    tron("bob", 4, 3),
                    deck("carol", 3, 4, &[("Lightning Bolt", 4), ("Lava Spike", 4)]),
                    deck("dave", 2, 5, &[("Island", 20)])
                ]
            }),
        );
        write_json(
            &dir.join("t2.json"),
            &json!({
                "id": 2,
                "name": "Modern League",
                "date": "2024-03-12T18:00:00Z",
                "format": "modern",
                "decks": [prowess("erin", 4, 1), tron("frank", 3, 2), prowess("alice", 2, 3)]
            }),
        );
        write_json(
            &dir.join("t3.json"),
            &json!({
                "id": "t3",
                "date": "2024-03-05",
                "format": "legacy",
                "decks": [prowess("gina", 5, 0)]
            }),
        );
        fs::write(dir.join("broken.json"), "{ not json").unwrap();
        self
    }

    fn with_matches(self) -> Self {
        write_json(
            &self.root.join("matches.json"),
            &json!([
                { "tournament": "t1", "round": 1, "playerA": "alice", "playerB": "bob", "wins": 2, "losses": 1 },
                { "tournament": "t1", "round": 1, "playerA": "carol", "playerB": "dave", "wins": 0, "losses": 2 },
                { "tournament": 2, "round": 1, "playerA": "erin", "playerB": "frank", "wins": 2, "losses": 0 },
                { "tournament": 2, "round": 2, "playerA": "alice", "playerB": "frank", "wins": 1, "losses": 2 },
                { "tournament": 2, "round": 3, "playerA": "nobody", "playerB": "frank", "wins": 2, "losses": 0 }
            ]),
        );
        self
    }

    fn request(&self, format: &str) -> AnalysisRequest {
        AnalysisRequest {
            format: format.to_string(),
            tournaments_dir: self.root.join("tournaments"),
            rules_dir: self.root.join("rules"),
            cards: Some(self.root.join("cards.json")),
            matches: self
                .root
                .join("matches.json")
                .exists()
                .then(|| self.root.join("matches.json")),
            output_dir: self.root.join("output"),
            from: None,
            to: None,
            deadline: None,
        }
    }

    fn output(&self, name: &str) -> Value {
        let text = fs::read_to_string(self.root.join("output").join(name)).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

#[test]
fn test_full_batch_writes_reports() {
    let workspace = Workspace::new().with_tournaments().with_matches();
    let service = AnalysisService::new(AppConfig::default(), workspace.request("modern"));

    let outcome = service.run().unwrap();

    assert_eq!(outcome.classified.skipped_files, 1);
    assert_eq!(outcome.classified.decks.len(), 7);

    let report = &outcome.report;
    assert_eq!(report.total_decks, 7);
    assert_eq!(report.most_played.as_deref(), Some("Izzet Prowess"));
    assert_eq!(report.archetype("Izzet Prowess").unwrap().deck_count, 3);
    assert_eq!(report.archetype("Tron").unwrap().deck_count, 2);
    assert_eq!(report.archetype("Burn").unwrap().deck_count, 1);
    assert_eq!(report.unclassified_decks, 1);

    let total_share: f64 = report.archetypes.iter().map(|a| a.meta_share).sum();
    assert!((total_share - 1.0).abs() < 1e-9);
    for stat in &report.archetypes {
        assert!(stat.ci_lower <= stat.win_rate && stat.win_rate <= stat.ci_upper);
        assert!(stat.insufficient_data);
        assert!(stat.tier.is_none());
    }

    let classified = workspace.output("classified_decks.json");
    let classified = classified.as_array().unwrap();
    assert_eq!(classified.len(), 7);
    assert!(classified
        .iter()
        .all(|d| !d["archetype"].as_str().unwrap().is_empty()));
    assert!(classified.iter().any(|d| d["color_identity"] == "UR"));

    let saved = workspace.output("report.json");
    assert_eq!(saved["archetype_count"], 4);
    assert_eq!(workspace.output("archetype_statistics.json").as_array().unwrap().len(), 4);
}

#[test]
fn test_matchup_matrix_is_symmetric() {
    let workspace = Workspace::new().with_tournaments().with_matches();
    let service = AnalysisService::new(AppConfig::default(), workspace.request("modern"));

    let outcome = service.run().unwrap();
    let matrix = outcome.matchups.unwrap();

    assert_eq!(matrix.unmatched_results, 1);
    let ab = matrix.cell("Izzet Prowess", "Tron").unwrap();
    let ba = matrix.cell("Tron", "Izzet Prowess").unwrap();
    assert_eq!(ab.sample_size, 3);
    assert_eq!(ab.sample_size, ba.sample_size);
    assert_eq!((ab.wins, ab.losses), (2, 1));
    assert!((ab.win_rate.unwrap() + ba.win_rate.unwrap() - 1.0).abs() < 1e-12);
    assert!(ab.insufficient_data);

    let cells = workspace.output("matchup_matrix.json");
    assert_eq!(cells.as_array().unwrap().len(), 16);
}

#[test]
fn test_date_window_filters_tournaments() {
    let workspace = Workspace::new().with_tournaments();
    let mut request = workspace.request("modern");
    request.from = chrono::NaiveDate::from_ymd_opt(2024, 3, 10);

    let outcome = AnalysisService::new(AppConfig::default(), request).run().unwrap();

    assert_eq!(outcome.report.total_decks, 3);
    assert!(outcome.matchups.is_none());
}

#[test]
fn test_empty_batch_produces_empty_report() {
    let workspace = Workspace::new();

    let outcome = AnalysisService::new(AppConfig::default(), workspace.request("modern"))
        .run()
        .unwrap();

    assert!(outcome.report.is_empty());
    assert_eq!(outcome.report.most_played, None);
    assert_eq!(workspace.output("report.json")["total_decks"], 0);
}

#[test]
fn test_missing_rule_file_is_fatal() {
    let workspace = Workspace::new().with_tournaments();

    let err = AnalysisService::new(AppConfig::default(), workspace.request("pioneer"))
        .run()
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MetagameError>(),
        Some(MetagameError::RuleLoad { .. })
    ));
}

#[test]
fn test_broken_rules_of_another_format_do_not_block_run() {
    let workspace = Workspace::new().with_tournaments();
    fs::write(
        workspace.root.join("rules/legacy.json"),
        r#"{ "name": "Doomsday", "conditions": [] }"#,
    )
    .unwrap();

    let outcome = AnalysisService::new(AppConfig::default(), workspace.request("modern"))
        .run()
        .unwrap();
    assert_eq!(outcome.report.total_decks, 7);

    let err = AnalysisService::new(AppConfig::default(), workspace.request("legacy"))
        .run()
        .unwrap_err();
    match err.downcast_ref::<MetagameError>() {
        Some(MetagameError::RuleLoad { path, .. }) => assert!(path.ends_with("legacy.json")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_blank_unclassified_label_is_rejected() {
    let workspace = Workspace::new().with_tournaments();
    let mut config = AppConfig::default();
    config.classification.unclassified_label = String::new();

    let err = AnalysisService::new(config, workspace.request("modern"))
        .classify()
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MetagameError>(),
        Some(MetagameError::Config(_))
    ));
    assert!(!workspace.root.join("output/classified_decks.json").exists());
}

#[test]
fn test_deadline_aborts_the_batch() {
    let workspace = Workspace::new().with_tournaments();
    let mut request = workspace.request("modern");
    request.deadline = Some(Duration::ZERO);

    let err = AnalysisService::new(AppConfig::default(), request)
        .run()
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MetagameError>(),
        Some(MetagameError::DeadlineExceeded { .. })
    ));
}

#[test]
fn test_classify_writes_only_deck_list() {
    let workspace = Workspace::new().with_tournaments();

    let run = AnalysisService::new(AppConfig::default(), workspace.request("modern"))
        .classify()
        .unwrap();

    assert_eq!(run.decks.len(), 7);
    assert!(workspace.root.join("output/classified_decks.json").exists());
    assert!(!workspace.root.join("output/report.json").exists());
}

#[test]
fn test_shipped_rules_load() {
    let rules_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/rules");

    let repository = RuleRepository::load(&rules_dir).unwrap();
    let modern = repository.get_definitions("modern").unwrap();

    assert!(modern.primary().iter().any(|d| d.name == "Bant Amulet"));
    assert!(modern.fallback().iter().all(|d| d.is_fallback));
}
