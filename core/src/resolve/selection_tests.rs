//! Tests for entry selection priority

use crit_types::{ConfigurationEntry, EntityType, TriggerKind, TriggerTag};

use super::{MatchTier, Trigger, select_entry, select_with_tier};

fn make_pc(id: &str, user: &str, trigger: TriggerKind) -> ConfigurationEntry {
    let mut entry = ConfigurationEntry::new(id, EntityType::PlayerCharacter, trigger);
    entry.id = id.to_string();
    entry.user_id = Some(user.to_string());
    entry
}

fn make_adversary(id: &str, actor: Option<&str>, trigger: TriggerKind) -> ConfigurationEntry {
    let mut entry = ConfigurationEntry::new(id, EntityType::Adversary, trigger);
    entry.id = id.to_string();
    entry.adversary_id = actor.map(str::to_string);
    entry
}

fn defaults() -> Vec<ConfigurationEntry> {
    vec![
        ConfigurationEntry::reserved_default(EntityType::PlayerCharacter),
        ConfigurationEntry::reserved_default(EntityType::Adversary),
    ]
}

fn selected_id(entries: &[ConfigurationEntry], trigger: &Trigger) -> Option<String> {
    select_entry(entries, trigger).map(|e| e.id.clone())
}

#[test]
fn specific_beats_wildcard_beats_default() {
    let mut entries = vec![
        make_pc("specific", "user-42", TriggerKind::ActionAndReaction),
        make_pc("wildcard", "all", TriggerKind::ActionAndReaction),
    ];
    entries.extend(defaults());
    let trigger = Trigger::player("user-42", TriggerTag::Action);

    let (entry, tier) = select_with_tier(&entries, &trigger).unwrap();
    assert_eq!((entry.id.as_str(), tier), ("specific", MatchTier::Specific));

    entries.remove(0);
    let (entry, tier) = select_with_tier(&entries, &trigger).unwrap();
    assert_eq!((entry.id.as_str(), tier), ("wildcard", MatchTier::Wildcard));

    entries.remove(0);
    let (entry, tier) = select_with_tier(&entries, &trigger).unwrap();
    assert_eq!(
        (entry.id.as_str(), tier),
        ("default-player-character", MatchTier::Default)
    );
}

#[test]
fn list_position_does_not_override_tier() {
    let mut entries = defaults();
    entries.push(make_pc("wildcard", "all", TriggerKind::OnlyAction));
    entries.push(make_pc("specific", "user-42", TriggerKind::OnlyAction));

    let trigger = Trigger::player("user-42", TriggerTag::Action);
    assert_eq!(selected_id(&entries, &trigger).as_deref(), Some("specific"));
}

#[test]
fn ties_resolve_by_list_order() {
    let entries = vec![
        make_pc("first", "all", TriggerKind::OnlyReaction),
        make_pc("second", "all", TriggerKind::ActionAndReaction),
    ];
    let trigger = Trigger::player("anyone", TriggerTag::Reaction);
    assert_eq!(selected_id(&entries, &trigger).as_deref(), Some("first"));
}

#[test]
fn trigger_kind_filters_candidates() {
    let mut entries = vec![make_pc("reactions", "user-42", TriggerKind::OnlyReaction)];
    entries.extend(defaults());

    let trigger = Trigger::player("user-42", TriggerTag::Action);
    assert_eq!(
        selected_id(&entries, &trigger).as_deref(),
        Some("default-player-character")
    );
}

#[test]
fn unknown_tag_never_matches() {
    let mut entries = vec![make_adversary("boss", Some("Actor.b"), TriggerKind::OnlyAction)];
    entries.extend(defaults());

    // The defaults only handle action/reaction
    let fumble = Trigger::adversary(Some("Actor.b"), TriggerTag::Fumble);
    assert_eq!(select_entry(&entries, &fumble), None);

    let level_up = Trigger::player("user-1", TriggerTag::LevelUp);
    assert_eq!(select_entry(&entries, &level_up), None);

    assert_eq!(select_entry(&[], &level_up), None);
}

#[test]
fn fumble_entry_fires_for_adversaries() {
    let mut entries = defaults();
    entries.push(make_adversary("fumbles", None, TriggerKind::Fumble));

    let fumble = Trigger::adversary(Some("Actor.b"), TriggerTag::Fumble);
    assert_eq!(selected_id(&entries, &fumble).as_deref(), Some("fumbles"));
}

#[test]
fn adversary_without_actor_key_skips_specific_tier() {
    let entries = vec![
        make_adversary("specific", Some("Actor.x"), TriggerKind::ActionAndReaction),
        make_adversary("wildcard", Some("all"), TriggerKind::ActionAndReaction),
    ];
    let trigger = Trigger::adversary(None, TriggerTag::Action);
    assert_eq!(selected_id(&entries, &trigger).as_deref(), Some("wildcard"));
}

#[test]
fn adversary_wildcard_forms() {
    for stored in [None, Some(""), Some("all")] {
        let entries = vec![make_adversary("w", stored, TriggerKind::OnlyAction)];
        let trigger = Trigger::adversary(Some("Actor.q"), TriggerTag::Action);
        let (_, tier) = select_with_tier(&entries, &trigger).unwrap();
        assert_eq!(tier, MatchTier::Wildcard, "stored {stored:?}");
    }
}

#[test]
fn adversary_reference_containment() {
    let entries = vec![
        make_adversary("wildcard", None, TriggerKind::OnlyAction),
        make_adversary("boss", Some("Actor.abc123"), TriggerKind::OnlyAction),
    ];

    let token_ref = Trigger::adversary(Some("Scene.s1.Token.t9.Actor.abc123"), TriggerTag::Action);
    assert_eq!(selected_id(&entries, &token_ref).as_deref(), Some("boss"));

    let short_ref = Trigger::adversary(Some("abc123"), TriggerTag::Action);
    assert_eq!(selected_id(&entries, &short_ref).as_deref(), Some("boss"));

    let other = Trigger::adversary(Some("Actor.zzz"), TriggerTag::Action);
    assert_eq!(selected_id(&entries, &other).as_deref(), Some("wildcard"));
}

#[test]
fn exact_adversary_match_wins_over_containment() {
    let entries = vec![
        make_adversary("loose", Some("Actor.abc"), TriggerKind::OnlyAction),
        make_adversary("exact", Some("Actor.abc1"), TriggerKind::OnlyAction),
    ];
    let trigger = Trigger::adversary(Some("Actor.abc1"), TriggerTag::Action);
    assert_eq!(selected_id(&entries, &trigger).as_deref(), Some("exact"));
}

#[test]
fn player_ids_require_exact_match() {
    let entries = vec![make_pc("p", "user-4", TriggerKind::OnlyAction)];
    let trigger = Trigger::player("user-42", TriggerTag::Action);
    assert_eq!(select_entry(&entries, &trigger), None);
}

#[test]
fn entity_class_is_respected() {
    let entries = vec![make_adversary("adv", None, TriggerKind::OnlyAction)];
    let trigger = Trigger::player("user-1", TriggerTag::Action);
    assert_eq!(select_entry(&entries, &trigger), None);
}

#[test]
fn empty_actor_key_is_treated_as_absent() {
    let trigger = Trigger::new(EntityType::Adversary, Some(String::new()), TriggerTag::Action);
    assert_eq!(trigger.actor_key, None);
}
