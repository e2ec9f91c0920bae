use std::sync::Arc;

use crit_types::{
    ArtSettings, ConfigurationEntry, DEFAULT_ADVERSARY_ID, DEFAULT_PC_ID, EntityType, FxKind,
    FxOptions, FxSettings, SettingCategory, SoundSettings, TextSettings, TriggerKind,
};
use serde_json::{Value, json};

use super::*;
use crate::store::{MemoryStore, StoreError, register_defaults};
use crate::testing::{ReadOnlyStore, RecordingNotifier, table_roster};

fn repo_with(store: MemoryStore) -> (ConfigRepository, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(store);
    let notifier = Arc::new(RecordingNotifier::default());
    let repo = ConfigRepository::new(store.clone(), notifier.clone());
    (repo, store, notifier)
}

fn repo() -> (ConfigRepository, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    repo_with(MemoryStore::new())
}

fn ids(repo: &ConfigRepository) -> Vec<String> {
    repo.list().into_iter().map(|e| e.id).collect()
}

fn player_entry(name: &str, user: &str) -> ConfigurationEntry {
    let mut entry = ConfigurationEntry::new(name, EntityType::PlayerCharacter, TriggerKind::OnlyAction);
    entry.user_id = Some(user.into());
    entry
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults bootstrap
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn ensure_defaults_creates_both_in_order() {
    let (repo, _, _) = repo();
    let custom = player_entry("Ada", "u1");
    repo.add(custom.clone()).unwrap();

    let report = repo.ensure_defaults().unwrap();
    assert_eq!(
        report.created,
        vec![EntityType::PlayerCharacter, EntityType::Adversary]
    );
    assert_eq!(ids(&repo), vec![DEFAULT_PC_ID, DEFAULT_ADVERSARY_ID, custom.id.as_str()]);

    let pc = repo.find(DEFAULT_PC_ID).unwrap();
    assert!(pc.is_default);
    assert_eq!(pc.name, "Default Player Character");
    assert_eq!(pc.user_id.as_deref(), Some("all"));
}

#[test]
fn ensure_defaults_is_idempotent() {
    let (repo, _, _) = repo();
    repo.ensure_defaults().unwrap();
    let first = repo.list();

    let report = repo.ensure_defaults().unwrap();
    assert!(report.is_noop());
    assert_eq!(repo.list(), first);
}

#[test]
fn missing_adversary_default_goes_after_player_default() {
    let (repo, _, _) = repo();
    let custom = player_entry("Ada", "u1");
    repo.save_all(&[
        custom.clone(),
        ConfigurationEntry::reserved_default(EntityType::PlayerCharacter),
    ])
    .unwrap();

    let report = repo.ensure_defaults().unwrap();
    assert_eq!(report.created, vec![EntityType::Adversary]);
    assert_eq!(ids(&repo), vec![custom.id.as_str(), DEFAULT_PC_ID, DEFAULT_ADVERSARY_ID]);
}

#[test]
fn new_defaults_inherit_legacy_globals() {
    let store = MemoryStore::with_values([
        (keys::FX, json!({"pc": {"type": "shake", "options": {"intensity": "extreme"}}})),
        (keys::SOUND, json!({"duality": {"soundPath": "sfx/old.mp3"}, "adversary": {"soundPath": "sfx/adv.mp3"}})),
    ]);
    let (repo, _, _) = repo_with(store);

    let report = repo.ensure_defaults().unwrap();
    assert!(report.migrated.contains(&(EntityType::PlayerCharacter, SettingCategory::Fx)));
    assert!(report.migrated.contains(&(EntityType::PlayerCharacter, SettingCategory::Sound)));
    assert!(report.migrated.contains(&(EntityType::Adversary, SettingCategory::Sound)));
    assert!(!report.migrated.contains(&(EntityType::Adversary, SettingCategory::Fx)));

    let fx: FxSettings = repo.category_settings(DEFAULT_PC_ID).unwrap();
    assert_eq!(fx.kind, FxKind::Shake);
    let sound: SoundSettings = repo.category_settings(DEFAULT_PC_ID).unwrap();
    assert_eq!(sound.sound_path, "sfx/old.mp3");
    assert!(repo.category_value(DEFAULT_PC_ID, SettingCategory::Text).is_none());
}

#[test]
fn migration_never_overwrites_existing_settings() {
    let store = MemoryStore::with_values([
        (keys::FX, json!({"adversary": {"type": "confetti"}})),
        (
            keys::CONFIG_SETTINGS,
            json!({"default-adversary": {"fx": {"type": "border"}}}),
        ),
    ]);
    let (repo, _, _) = repo_with(store);

    repo.ensure_defaults().unwrap();
    let fx: FxSettings = repo.category_settings(DEFAULT_ADVERSARY_ID).unwrap();
    assert_eq!(fx.kind, FxKind::Border);
}

#[test]
fn registered_store_migrates_hard_defaults() {
    let store = MemoryStore::new();
    register_defaults(&store).unwrap();
    let (repo, _, _) = repo_with(store);

    let report = repo.ensure_defaults().unwrap();
    assert_eq!(report.migrated.len(), 8);
    let text: TextSettings = repo.category_settings(DEFAULT_ADVERSARY_ID).unwrap();
    assert_eq!(text.color.as_deref(), Some("#ff0000"));
}

#[test]
fn ensure_defaults_refuses_a_corrupt_list() {
    let (repo, store, _) = repo_with(MemoryStore::with_values([(
        keys::CONFIGURATIONS,
        json!({"not": "a list"}),
    )]));
    assert!(matches!(repo.ensure_defaults(), Err(RepositoryError::Load(_))));
    assert_eq!(
        store.get(keys::CONFIGURATIONS).unwrap(),
        Some(json!({"not": "a list"}))
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// CRUD
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn corrupt_list_reads_empty_with_error_toast() {
    let (repo, _, notifier) = repo_with(MemoryStore::with_values([(
        keys::CONFIGURATIONS,
        json!("garbage"),
    )]));
    assert!(repo.list().is_empty());
    assert_eq!(notifier.errors(), vec!["Failed to load configurations"]);
}

#[test]
fn mutators_refuse_an_unreadable_list() {
    let (repo, store, _) = repo_with(MemoryStore::with_values([(
        keys::CONFIGURATIONS,
        json!("garbage"),
    )]));

    assert!(matches!(
        repo.add(player_entry("Bob", "u2")),
        Err(RepositoryError::Load(_))
    ));
    assert!(matches!(repo.delete("anything"), Err(RepositoryError::Load(_))));
    assert!(matches!(
        repo.update("anything", EntryPatch::default()),
        Err(RepositoryError::Load(_))
    ));
    assert_eq!(store.get(keys::CONFIGURATIONS).unwrap(), Some(json!("garbage")));
}

fn store_with_broken_entry() -> (
    ConfigRepository,
    Arc<MemoryStore>,
    Arc<RecordingNotifier>,
    String,
) {
    let (repo, store, notifier) = repo();
    repo.ensure_defaults().unwrap();

    // Written by a newer version with a target this one does not know
    let mut broken = serde_json::to_value(player_entry("Old", "u2")).unwrap();
    broken["id"] = json!("broken");
    broken["target"] = json!("Tag Team Close");
    let mut raw = store.get(keys::CONFIGURATIONS).unwrap().unwrap();
    if let Value::Array(items) = &mut raw {
        items.push(broken);
    }
    store.set(keys::CONFIGURATIONS, raw).unwrap();

    let ada = player_entry("Ada", "u1");
    let ada_id = ada.id.clone();
    repo.add(ada).unwrap();
    (repo, store, notifier, ada_id)
}

fn stored_ids(store: &MemoryStore) -> Vec<String> {
    match store.get(keys::CONFIGURATIONS).unwrap() {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| i.get("id").and_then(Value::as_str).map(str::to_string))
            .collect(),
        other => panic!("expected a list, got {other:?}"),
    }
}

#[test]
fn one_unreadable_entry_does_not_hide_the_rest() {
    let (repo, _, notifier, ada_id) = store_with_broken_entry();
    assert_eq!(repo.list().len(), 3);
    assert!(notifier.errors().is_empty());
    assert_eq!(
        ids(&repo),
        vec![DEFAULT_PC_ID.to_string(), DEFAULT_ADVERSARY_ID.to_string(), ada_id]
    );
}

#[test]
fn rewrites_carry_unreadable_entries_through() {
    let (repo, store, _, ada_id) = store_with_broken_entry();

    let bob = player_entry("Bob", "u2");
    let bob_id = bob.id.clone();
    repo.add(bob).unwrap();
    repo.update(&ada_id, EntryPatch {
        name: Some("Ada Prime".into()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        stored_ids(&store),
        vec![
            DEFAULT_PC_ID.to_string(),
            DEFAULT_ADVERSARY_ID.to_string(),
            "broken".to_string(),
            ada_id.clone(),
            bob_id.clone(),
        ]
    );
    assert_eq!(repo.ensure_defaults().unwrap(), DefaultsReport::default());

    // Unreadable entries can still be removed by id
    assert!(repo.delete("broken").unwrap());
    assert_eq!(
        stored_ids(&store),
        vec![
            DEFAULT_PC_ID.to_string(),
            DEFAULT_ADVERSARY_ID.to_string(),
            ada_id,
            bob_id,
        ]
    );
}

#[test]
fn unreadable_reserved_entry_is_recreated() {
    let (repo, store, _) = repo();
    repo.ensure_defaults().unwrap();
    let mut raw = store.get(keys::CONFIGURATIONS).unwrap().unwrap();
    raw[1]["type"] = json!("Minion");
    store.set(keys::CONFIGURATIONS, raw).unwrap();

    let report = repo.ensure_defaults().unwrap();
    assert_eq!(report.created, vec![EntityType::Adversary]);
    assert_eq!(
        stored_ids(&store),
        vec![DEFAULT_PC_ID.to_string(), DEFAULT_ADVERSARY_ID.to_string()]
    );
    assert_eq!(ids(&repo).len(), 2);
}

#[test]
fn write_failure_is_rethrown_and_toasted() {
    let notifier = Arc::new(RecordingNotifier::default());
    let repo = ConfigRepository::new(Arc::new(ReadOnlyStore::new(None)), notifier.clone());

    let err = repo.add(player_entry("Ada", "u1")).unwrap_err();
    assert!(matches!(err, RepositoryError::Save(StoreError::Rejected { .. })));
    assert_eq!(notifier.errors(), vec!["Failed to save configuration"]);
}

#[test]
fn save_all_round_trip_keeps_timestamps() {
    let (repo, _, _) = repo();
    let mut entry = player_entry("Ada", "u1");
    entry.created_at = 1_000;
    entry.updated_at = 2_000;
    repo.save_all(std::slice::from_ref(&entry)).unwrap();

    let loaded = repo.list();
    assert_eq!(loaded, vec![entry.clone()]);

    repo.save_all(&loaded).unwrap();
    assert_eq!(repo.find(&entry.id).unwrap().updated_at, 2_000);
}

#[test]
fn update_merges_and_bumps_updated_at() {
    let (repo, _, _) = repo();
    let mut entry = player_entry("Ada", "u1");
    entry.updated_at = 0;
    let id = entry.id.clone();
    repo.add(entry).unwrap();

    let updated = repo
        .update(
            &id,
            EntryPatch {
                name: Some("Ada Crits".into()),
                trigger: Some(TriggerKind::OnlyReaction),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Ada Crits");
    assert_eq!(updated.trigger, TriggerKind::OnlyReaction);
    assert_eq!(updated.user_id.as_deref(), Some("u1"));
    assert!(updated.updated_at > 0);
    assert_eq!(repo.find(&id).unwrap(), updated);

    assert!(repo.update("missing", EntryPatch::default()).unwrap().is_none());
}

#[test]
fn patch_from_json_can_clear_targets() {
    let patch: EntryPatch =
        serde_json::from_value(json!({"type": "Adversary", "adversaryId": null})).unwrap();
    assert_eq!(patch.entity_type, Some(EntityType::Adversary));
    assert_eq!(patch.adversary_id, Some(None));
    assert_eq!(patch.user_id, None);

    let mut entry = player_entry("Ada", "u1");
    patch.apply(&mut entry);
    assert_eq!(entry.entity_type, EntityType::Adversary);
    assert_eq!(entry.user_id, None);
    assert_eq!(entry.adversary_id, None);
}

#[test]
fn reserved_entries_keep_name_and_class() {
    let (repo, _, _) = repo();
    repo.ensure_defaults().unwrap();

    let updated = repo
        .update(
            DEFAULT_PC_ID,
            EntryPatch {
                name: Some("Renamed".into()),
                entity_type: Some(EntityType::Adversary),
                trigger: Some(TriggerKind::OnlyAction),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Default Player Character");
    assert_eq!(updated.entity_type, EntityType::PlayerCharacter);
    assert_eq!(updated.trigger, TriggerKind::OnlyAction);
}

#[test]
fn set_entity_type_clears_the_other_target() {
    let (repo, _, _) = repo();
    let mut entry = ConfigurationEntry::new("Orc", EntityType::Adversary, TriggerKind::Fumble);
    entry.adversary_id = Some("Actor.orc".into());
    let id = entry.id.clone();
    repo.add(entry).unwrap();

    let switched = repo
        .set_entity_type(&id, EntityType::PlayerCharacter)
        .unwrap()
        .unwrap();
    assert_eq!(switched.adversary_id, None);
    assert_eq!(switched.user_id.as_deref(), Some("all"));
    assert_eq!(switched.trigger, TriggerKind::ActionAndReaction);
}

#[test]
fn delete_removes_entry_and_settings() {
    let (repo, store, _) = repo();
    let entry = player_entry("Ada", "u1");
    let id = entry.id.clone();
    repo.add(entry).unwrap();
    repo.save_category_settings(&id, FxSettings::new(FxKind::Shake, FxOptions::default()))
        .unwrap();

    assert!(repo.delete(&id).unwrap());
    assert!(repo.find(&id).is_none());
    let bundles = store.get(keys::CONFIG_SETTINGS).unwrap().unwrap();
    assert!(bundles.get(&id).is_none());

    assert!(!repo.delete(&id).unwrap());
}

#[test]
fn reserved_entries_cannot_be_deleted() {
    let (repo, _, notifier) = repo();
    repo.ensure_defaults().unwrap();

    assert!(!repo.delete(DEFAULT_ADVERSARY_ID).unwrap());
    assert!(repo.find(DEFAULT_ADVERSARY_ID).is_some());
    assert_eq!(
        notifier.warnings(),
        vec!["Cannot delete default configuration entries"]
    );
}

#[test]
fn adversary_assignment_checks_actor_kind() {
    let (repo, _, notifier) = repo();
    let roster = table_roster();
    let entry = ConfigurationEntry::new("Orc", EntityType::Adversary, TriggerKind::OnlyAction);
    let id = entry.id.clone();
    repo.add(entry).unwrap();

    assert!(repo.assign_adversary(&id, "Actor.orc", &roster).unwrap());
    assert_eq!(repo.find(&id).unwrap().adversary_id.as_deref(), Some("Actor.orc"));

    assert!(!repo.assign_adversary(&id, "Actor.hero", &roster).unwrap());
    assert!(!repo.assign_adversary(&id, "Actor.ghost", &roster).unwrap());
    assert_eq!(
        notifier.warnings(),
        vec!["Only adversary actors can be assigned here", "Actor not found"]
    );
    assert_eq!(repo.find(&id).unwrap().adversary_id.as_deref(), Some("Actor.orc"));

    assert!(repo.clear_adversary(&id).unwrap());
    assert!(repo.find(&id).unwrap().is_wildcard());
}

// ─────────────────────────────────────────────────────────────────────────────
// Batch save
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn validated_save_is_all_or_nothing() {
    let (repo, _, notifier) = repo();
    repo.ensure_defaults().unwrap();
    let before = repo.list();

    let mut batch = before.clone();
    batch.push(player_entry("", "u1"));
    batch.push(player_entry("Ghost", "nobody"));
    batch.push(player_entry("Fine", "u2"));

    let err = repo.save_validated(batch, &table_roster()).unwrap_err();
    let RepositoryError::Validation(failures) = err else {
        panic!("expected validation failure");
    };
    assert_eq!(failures.len(), 2);
    assert_eq!(notifier.errors().len(), 2);
    assert!(notifier.errors()[1].contains("Selected user does not exist"));
    assert_eq!(repo.list(), before);
}

#[test]
fn validated_save_pins_default_names() {
    let (repo, _, notifier) = repo();
    repo.ensure_defaults().unwrap();

    let mut batch = repo.list();
    batch[0].name = "Hacked".into();
    batch[1].is_default = false;
    batch.push(player_entry("Fine", "all"));

    repo.save_validated(batch, &table_roster()).unwrap();
    let saved = repo.list();
    assert_eq!(saved[0].name, "Default Player Character");
    assert!(saved[1].is_default);
    assert_eq!(saved.len(), 3);
    assert_eq!(
        notifier.infos(),
        vec!["Critical configurations saved successfully"]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Category settings
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn category_saves_leave_other_categories_alone() {
    let (repo, _, _) = repo();
    let id = "entry-1";
    repo.save_category_settings(
        id,
        TextSettings {
            content: "BOOM".into(),
            ..Default::default()
        },
    )
    .unwrap();
    repo.save_category_settings(id, FxSettings::new(FxKind::Border, FxOptions::default()))
        .unwrap();

    let bundle = repo.bundle(id);
    assert_eq!(bundle.text.unwrap().content, "BOOM");
    let fx = bundle.fx.unwrap();
    assert_eq!(fx.options.color.as_deref(), Some("#ff0000"));
    assert!(bundle.sound.is_none());

    repo.clear_category_settings(id, SettingCategory::Text).unwrap();
    assert!(!repo.bundle(id).has(SettingCategory::Text));
    assert!(repo.bundle(id).has(SettingCategory::Fx));
}

#[test]
fn art_anchor_is_forced_on_save() {
    let (repo, _, _) = repo();
    repo.save_category_settings(
        "entry-1",
        ArtSettings {
            image_path: "art/orc.png".into(),
            position: "left".into(),
            position_y: "top".into(),
            ..Default::default()
        },
    )
    .unwrap();
    let art: ArtSettings = repo.category_settings("entry-1").unwrap();
    assert_eq!(art.position, "middle");
    assert_eq!(art.position_y, "middle");
}

#[test]
fn null_or_unreadable_category_counts_as_unset() {
    let (repo, _, _) = repo_with(MemoryStore::with_values([(
        keys::CONFIG_SETTINGS,
        json!({"e": {"text": null, "fx": "oops"}}),
    )]));
    assert!(repo.category_value("e", SettingCategory::Text).is_none());
    assert!(repo.category_settings::<FxSettings>("e").is_none());
    assert!(repo.bundle("e").is_empty());
}

#[test]
fn global_layer_reads_and_writes_per_class() {
    let (repo, _, _) = repo();
    repo.save_global(
        EntityType::Adversary,
        FxSettings::new(FxKind::Confetti, FxOptions::default()),
    )
    .unwrap();

    let globals = repo.global_defaults();
    assert_eq!(
        globals.fx.get(EntityType::Adversary).map(|f| f.kind),
        Some(FxKind::Confetti)
    );
    assert!(globals.fx.get(EntityType::PlayerCharacter).is_none());
    assert!(globals.text.get(EntityType::Adversary).is_none());
}
