use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use crit_core::listeners::HostEvent;
use crit_core::store::keys;
use crit_core::{
    DispatchContext, DispatchReport, EntryDraft, EntryPatch, ListenerOutcome, Roster,
    SettingsStore, Trigger, validate_entry,
};
use crit_types::{
    ArtSettings, CategorySettings, EntityType, FxSettings, SettingCategory, SoundSettings,
    TextSettings, TriggerKind, TriggerTag,
};
use serde_json::Value;

use crate::config::CliConfig;
use crate::context::CliContext;

// ─────────────────────────────────────────────────────────────────────────────
// Argument parsing
// ─────────────────────────────────────────────────────────────────────────────

/// `pc`, `adversary`, or a full label.
pub fn parse_entity_type(value: &str) -> Result<EntityType, String> {
    EntityType::ALL
        .into_iter()
        .find(|t| t.class_key().eq_ignore_ascii_case(value) || t.label().eq_ignore_ascii_case(value))
        .ok_or_else(|| format!("unknown type '{value}', expected 'pc' or 'adversary'"))
}

fn compact(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// A target label, matched ignoring case and spacing (`"only action"`, `OnlyAction`).
pub fn parse_trigger_kind(value: &str) -> Result<TriggerKind, String> {
    if let Some(kind) = TriggerKind::from_label(value) {
        return Ok(kind);
    }
    let wanted = compact(value);
    TriggerKind::ALL
        .into_iter()
        .find(|k| compact(k.label()) == wanted)
        .ok_or_else(|| {
            let labels: Vec<_> = TriggerKind::ALL.iter().map(|k| k.label()).collect();
            format!("unknown target '{value}', expected one of: {}", labels.join(", "))
        })
}

pub fn parse_tag(value: &str) -> Result<TriggerTag, String> {
    TriggerTag::parse(value).ok_or_else(|| {
        let tags: Vec<_> = TriggerTag::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown tag '{value}', expected one of: {}", tags.join(", "))
    })
}

pub fn parse_category(value: &str) -> Result<SettingCategory, String> {
    SettingCategory::from_key(&value.to_ascii_lowercase())
        .ok_or_else(|| format!("unknown category '{value}', expected text, fx, sound or art"))
}

fn parse_json(value: &str) -> Result<Value, String> {
    serde_json::from_str(value).map_err(|e| format!("invalid JSON: {e}"))
}

fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────────────────────────────────────

pub fn list_entries(ctx: &CliContext) {
    let entries = ctx.repo.list();
    if entries.is_empty() {
        println!("No configurations");
        return;
    }

    println!(
        "{:<26} {:<30} {:<17} {:<20} {:<18} Updated",
        "Id", "Name", "Type", "Target", "Applies to"
    );
    println!("{}", "-".repeat(130));

    for entry in &entries {
        let applies_to = entry.target().unwrap_or("all");
        let marker = if entry.is_default { "*" } else { "" };
        println!(
            "{:<26} {:<30} {:<17} {:<20} {:<18} {}",
            format!("{}{marker}", entry.id),
            entry.name,
            entry.entity_type.label(),
            entry.trigger.label(),
            applies_to,
            format_millis(entry.updated_at)
        );
    }
    println!("\n{} configuration(s), * = default", entries.len());
}

pub fn add_entry(
    ctx: &CliContext,
    name: &str,
    entity_type: &str,
    target: &str,
    user: Option<&str>,
    adversary: Option<&str>,
) -> Result<(), String> {
    let entity_type = parse_entity_type(entity_type)?;
    let trigger = parse_trigger_kind(target)?;
    let draft = EntryDraft {
        name: name.to_string(),
        entity_type: entity_type.label().to_string(),
        target: trigger.label().to_string(),
        user_id: user.map(str::to_string),
        adversary_id: adversary.map(str::to_string),
        ..Default::default()
    };
    let mut entry = draft.into_entry(None).map_err(|e| e.to_string())?;
    // Only the target field of the chosen class is kept
    match entity_type {
        EntityType::PlayerCharacter => entry.adversary_id = None,
        EntityType::Adversary => entry.user_id = None,
    }

    let errors = validate_entry(&entry, &*ctx.roster);
    if !errors.is_empty() {
        return Err(format!("Validation failed for {}: {}", entry.name, errors.join(", ")));
    }

    let id = entry.id.clone();
    ctx.repo.add(entry).map_err(|e| e.to_string())?;
    println!("Added {id}");
    Ok(())
}

pub fn update_entry(ctx: &CliContext, id: &str, patch_json: &str) -> Result<(), String> {
    let patch: EntryPatch =
        serde_json::from_value(parse_json(patch_json)?).map_err(|e| e.to_string())?;
    if patch.is_empty() {
        return Err("nothing to update".to_string());
    }
    match ctx.repo.update(id, patch).map_err(|e| e.to_string())? {
        Some(entry) => {
            println!(
                "Updated {} ({}, {})",
                entry.id,
                entry.entity_type.label(),
                entry.trigger.label()
            );
            Ok(())
        }
        None => Err(format!("no configuration with id {id}")),
    }
}

pub fn delete_entry(ctx: &CliContext, id: &str) -> Result<(), String> {
    if ctx.repo.delete(id).map_err(|e| e.to_string())? {
        println!("Deleted {id}");
    } else {
        println!("Nothing deleted");
    }
    Ok(())
}

pub fn ensure_defaults(ctx: &CliContext) -> Result<(), String> {
    let report = ctx.repo.ensure_defaults().map_err(|e| e.to_string())?;
    if report.is_noop() {
        println!("Defaults already present");
        return Ok(());
    }
    for entity_type in &report.created {
        println!("Created default for {}", entity_type.label());
    }
    for (entity_type, category) in &report.migrated {
        println!(
            "  inherited global {} settings for {}",
            category.key(),
            entity_type.label()
        );
    }
    Ok(())
}

/// Replace the whole list from a JSON array of form drafts, all-or-nothing.
pub fn import_entries(ctx: &CliContext, path: &Path) -> Result<(), String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let drafts: Vec<EntryDraft> = serde_json::from_str(&contents).map_err(|e| e.to_string())?;

    let existing = ctx.repo.list();
    let mut entries = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let prev = draft
            .id
            .as_deref()
            .and_then(|id| existing.iter().find(|e| e.id == id));
        entries.push(draft.into_entry(prev).map_err(|e| e.to_string())?);
    }

    let count = entries.len();
    ctx.repo
        .save_validated(entries, &*ctx.roster)
        .map_err(|e| e.to_string())?;
    println!("Saved {count} configuration(s)");
    Ok(())
}

pub fn assign_adversary(ctx: &CliContext, id: &str, actor: &str) -> Result<(), String> {
    if ctx
        .repo
        .assign_adversary(id, actor, &*ctx.roster)
        .map_err(|e| e.to_string())?
    {
        println!("{id} now targets {actor}");
    }
    Ok(())
}

pub fn clear_adversary(ctx: &CliContext, id: &str) -> Result<(), String> {
    if ctx.repo.clear_adversary(id).map_err(|e| e.to_string())? {
        println!("{id} now targets any adversary");
    } else {
        println!("no configuration with id {id}");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

pub fn show_entry(ctx: &CliContext, id: &str) -> Result<(), String> {
    let entry = ctx
        .repo
        .find(id)
        .ok_or_else(|| format!("no configuration with id {id}"))?;
    let bundle = ctx.repo.bundle(id);
    let resolved = crit_core::resolve_settings(&entry, &bundle, &ctx.repo.global_defaults());

    println!("{} ({})", entry.name, entry.id);
    println!("  type:    {}", entry.entity_type.label());
    println!("  target:  {}", entry.trigger.label());
    println!("  applies: {}", entry.target().unwrap_or("all"));
    println!("  created: {}", format_millis(entry.created_at));
    println!("  updated: {}", format_millis(entry.updated_at));
    println!(
        "  layers:  text={:?} fx={:?} sound={:?} art={:?}",
        resolved.text.layer, resolved.fx.layer, resolved.sound.layer, resolved.art.layer
    );
    let json = serde_json::to_string_pretty(&resolved).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn decode<T: CategorySettings>(value: Value) -> Result<T, String> {
    serde_json::from_value(value)
        .map_err(|e| format!("invalid {} settings: {e}", T::CATEGORY.key()))
}

pub fn set_category(ctx: &CliContext, id: &str, category: &str, json: &str) -> Result<(), String> {
    if ctx.repo.find(id).is_none() {
        return Err(format!("no configuration with id {id}"));
    }
    let category = parse_category(category)?;
    let value = parse_json(json)?;
    let result = match category {
        SettingCategory::Text => ctx.repo.save_category_settings(id, decode::<TextSettings>(value)?),
        SettingCategory::Fx => ctx.repo.save_category_settings(id, decode::<FxSettings>(value)?),
        SettingCategory::Sound => ctx.repo.save_category_settings(id, decode::<SoundSettings>(value)?),
        SettingCategory::Art => ctx.repo.save_category_settings(id, decode::<ArtSettings>(value)?),
    };
    result.map_err(|e| e.to_string())?;
    println!("Saved {} settings for {id}", category.key());
    Ok(())
}

pub fn clear_category(ctx: &CliContext, id: &str, category: &str) -> Result<(), String> {
    let category = parse_category(category)?;
    ctx.repo
        .clear_category_settings(id, category)
        .map_err(|e| e.to_string())?;
    println!("{id} now inherits {} settings", category.key());
    Ok(())
}

pub fn set_global(
    ctx: &CliContext,
    entity_type: &str,
    category: &str,
    json: &str,
) -> Result<(), String> {
    let entity_type = parse_entity_type(entity_type)?;
    let category = parse_category(category)?;
    let value = parse_json(json)?;
    let result = match category {
        SettingCategory::Text => ctx.repo.save_global(entity_type, decode::<TextSettings>(value)?),
        SettingCategory::Fx => ctx.repo.save_global(entity_type, decode::<FxSettings>(value)?),
        SettingCategory::Sound => ctx.repo.save_global(entity_type, decode::<SoundSettings>(value)?),
        SettingCategory::Art => ctx.repo.save_global(entity_type, decode::<ArtSettings>(value)?),
    };
    result.map_err(|e| e.to_string())?;
    println!(
        "Saved global {} settings for {}",
        category.key(),
        entity_type.label()
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Triggers
// ─────────────────────────────────────────────────────────────────────────────

pub fn build_trigger(entity_type: &str, actor: Option<&str>, tag: &str) -> Result<Trigger, String> {
    Ok(Trigger::new(
        parse_entity_type(entity_type)?,
        actor.map(str::to_string),
        parse_tag(tag)?,
    ))
}

pub fn resolve(ctx: &CliContext, trigger: &Trigger) -> Result<(), String> {
    let Some(resolution) = ctx.engine.resolve(trigger) else {
        println!("No configuration matches {trigger}");
        return Ok(());
    };
    println!(
        "{trigger} -> {} ({}) at {:?} tier",
        resolution.entry.name, resolution.entry.id, resolution.tier
    );
    let json = serde_json::to_string_pretty(&resolution.settings).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn print_report(report: &DispatchReport) {
    println!(
        "Dispatched {} overlay #{}, fx {}, sound {}",
        report.entity_type.label(),
        report.overlay,
        report.fx.as_str(),
        report
            .sound
            .as_ref()
            .map(|s| s.src.as_str())
            .unwrap_or("none")
    );
}

/// Resolve and dispatch as a live event. Player colors come from the roster.
pub fn fire(ctx: &CliContext, trigger: &Trigger) {
    let user_color = match trigger.entity_type {
        EntityType::PlayerCharacter => trigger
            .actor_key
            .as_deref()
            .and_then(|id| ctx.roster.user(id))
            .and_then(|user| user.color),
        EntityType::Adversary => None,
    };
    match ctx
        .engine
        .resolve_and_dispatch(trigger, &DispatchContext::live(user_color))
    {
        Some(report) => print_report(&report),
        None => println!("No configuration matches {trigger}"),
    }
}

pub fn preview(ctx: &CliContext, id: &str) {
    if let Some(report) = ctx.engine.preview(id, &DispatchContext::preview()) {
        print_report(&report);
    }
}

pub fn stop_effects(ctx: &CliContext) {
    ctx.engine.dispatcher().stop_all();
    println!("Stopped all effects");
}

// ─────────────────────────────────────────────────────────────────────────────
// Host events
// ─────────────────────────────────────────────────────────────────────────────

/// Feed one host event (JSON, tagged by `event`) to the listener.
pub fn host_event(ctx: &CliContext, json: &str) -> Result<(), String> {
    let event: HostEvent =
        serde_json::from_value(parse_json(json)?).map_err(|e| format!("invalid event: {e}"))?;
    if let HostEvent::MessageCreated(message) = &event {
        ctx.chat.record(message.clone());
    }
    match ctx.listener.handle(&event) {
        ListenerOutcome::Ignored => println!("Ignored"),
        ListenerOutcome::Deferred => println!(
            "Deferred until animation completes ({} pending)",
            ctx.listener.pending_count()
        ),
        ListenerOutcome::Fired(Some(report)) => print_report(&report),
        ListenerOutcome::Fired(None) => println!("No configuration matched"),
        ListenerOutcome::Discarded(reason) => println!("Discarded: {reason:?}"),
        ListenerOutcome::Debounced => println!("Debounced"),
    }
    Ok(())
}

/// Drop a chat message, as if deleted while its animation played.
pub fn delete_message(ctx: &CliContext, id: &str) {
    if ctx.chat.remove(id) {
        println!("Removed message {id}");
    } else {
        println!("No message {id}");
    }
}

pub fn set_animations(ctx: &CliContext, active: bool) {
    ctx.listener.set_animations_active(active);
    println!(
        "Dice animations {}",
        if active { "active" } else { "inactive" }
    );
}

pub fn set_debug(ctx: &CliContext, enabled: bool) -> Result<(), String> {
    ctx.store
        .set(keys::DEBUG_MODE, Value::Bool(enabled))
        .map_err(|e| e.to_string())?;
    ctx.listener.handle(&HostEvent::SettingChanged {
        key: keys::DEBUG_MODE.to_string(),
        value: Value::Bool(enabled),
    });
    println!("Debug mode {}", if enabled { "on" } else { "off" });
    Ok(())
}

/// Let running timers and effects play out.
pub async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

pub fn show_config(ctx: &CliContext) {
    let path = CliConfig::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("config file:  {path}");
    println!(
        "store:        {}",
        ctx.config
            .resolved_store_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(memory)".to_string())
    );
    println!("asset root:   {}", ctx.config.asset_root.display());
    println!(
        "roster:       {} ({} users, {} actors)",
        ctx.config
            .roster_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string()),
        ctx.roster.users.len(),
        ctx.roster.actors.len()
    );
    println!("debug:        {}", crit_core::debug_log::is_enabled());
}

pub fn set_config(ctx: &mut CliContext, key: &str, value: &str) -> Result<(), String> {
    match key {
        "store" | "store_path" => ctx.config.store_path = Some(value.into()),
        "assets" | "asset_root" => ctx.config.asset_root = value.into(),
        "roster" | "roster_file" => ctx.config.roster_file = Some(value.into()),
        "debug" => {
            ctx.config.debug = value
                .parse()
                .map_err(|_| format!("expected true or false, got '{value}'"))?
        }
        _ => return Err(format!("unknown config key '{key}'")),
    }
    ctx.config.save()?;
    println!("Saved {key}, restart to apply");
    Ok(())
}

pub fn exit() -> Result<(), String> {
    write!(std::io::stdout(), "quitting...").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crit_core::MemoryStore;
    use crit_types::DEFAULT_PC_ID;

    fn ctx() -> CliContext {
        CliContext::with_store(CliConfig::default(), Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn argument_parsers_accept_short_forms() {
        assert_eq!(parse_entity_type("pc"), Ok(EntityType::PlayerCharacter));
        assert_eq!(parse_entity_type("Adversary"), Ok(EntityType::Adversary));
        assert!(parse_entity_type("npc").is_err());

        assert_eq!(parse_trigger_kind("Only Action"), Ok(TriggerKind::OnlyAction));
        assert_eq!(parse_trigger_kind("levelup"), Ok(TriggerKind::LevelUp));
        assert_eq!(parse_trigger_kind("Tag Team Open"), Ok(TriggerKind::TagTeamOpen));
        assert!(parse_trigger_kind("damage").is_err());

        assert_eq!(parse_tag("Reaction"), Ok(TriggerTag::Reaction));
        assert!(parse_category("music").is_err());
    }

    #[test]
    fn add_validates_before_saving() {
        let ctx = ctx();
        let err = add_entry(&ctx, "", "adversary", "fumble", None, None).unwrap_err();
        assert!(err.contains("Name cannot be empty"));
        assert_eq!(ctx.repo.list().len(), 2);

        let err = add_entry(&ctx, "Mine", "pc", "only action", None, None).unwrap_err();
        assert!(err.contains("Please select a user"));

        add_entry(&ctx, "Boss", "adversary", "fumble", Some("u1"), Some("Actor.orc")).unwrap();
        let entries = ctx.repo.list();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].adversary_id.as_deref(), Some("Actor.orc"));
        assert_eq!(entries[2].user_id, None);
    }

    #[test]
    fn category_commands_round_trip_through_repository() {
        let ctx = ctx();
        set_category(&ctx, DEFAULT_PC_ID, "fx", r#"{"type": "shake"}"#).unwrap();
        assert!(ctx.repo.bundle(DEFAULT_PC_ID).fx.is_some());

        clear_category(&ctx, DEFAULT_PC_ID, "FX").unwrap();
        assert!(ctx.repo.bundle(DEFAULT_PC_ID).fx.is_none());

        assert!(set_category(&ctx, "missing", "fx", "{}").is_err());
        assert!(set_category(&ctx, DEFAULT_PC_ID, "fx", "{").is_err());
    }

    #[test]
    fn update_requires_a_change() {
        let ctx = ctx();
        assert!(update_entry(&ctx, DEFAULT_PC_ID, "{}").is_err());
        assert!(update_entry(&ctx, "missing", r#"{"target": "Only Action"}"#).is_err());
        update_entry(&ctx, DEFAULT_PC_ID, r#"{"target": "Only Action"}"#).unwrap();
        assert_eq!(
            ctx.repo.find(DEFAULT_PC_ID).unwrap().trigger,
            TriggerKind::OnlyAction
        );
    }

    #[test]
    fn import_is_all_or_nothing() {
        let ctx = ctx();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "default-player-character", "type": "Player Character", "isDefault": true},
                {"name": "", "type": "Adversary", "target": "Fumble"}
            ]"#,
        )
        .unwrap();
        assert!(import_entries(&ctx, &path).is_err());
        assert_eq!(ctx.repo.list().len(), 2);

        std::fs::write(
            &path,
            r#"[{"id": "default-player-character", "type": "Player Character", "isDefault": true},
                {"name": "Boss", "type": "Adversary", "target": "Fumble"}]"#,
        )
        .unwrap();
        import_entries(&ctx, &path).unwrap();
        let names: Vec<_> = ctx.repo.list().into_iter().map(|e| e.name).collect();
        assert_eq!(names.len(), 2);
        assert_eq!(names[1], "Boss");
    }

    #[test]
    fn trigger_builder_drops_empty_actor() {
        let trigger = build_trigger("pc", Some(""), "action").unwrap();
        assert_eq!(trigger.actor_key, None);
        assert!(build_trigger("pc", None, "damage").is_err());
    }

    #[test]
    fn timestamps_format_or_dash() {
        assert_eq!(format_millis(i64::MAX), "-");
        assert_eq!(format_millis(0).len(), "1970-01-01 00:00".len());
    }
}
