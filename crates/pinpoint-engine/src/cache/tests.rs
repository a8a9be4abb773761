//! Tests for debounced writes, structural commits, retries, and loading.

use std::rc::Rc;
use std::time::Duration;

use pinpoint_common::{
    ConfigMap, Layout, LayoutId, Point, Size, TileDefinition, TileId, TileInstance,
};
use pinpoint_store::{MemoryStore, RecordStore, Stores};
use serde_json::json;

use super::*;
use crate::clock::ManualClock;

struct Fixture {
    cache: TileCache,
    clock: Rc<ManualClock>,
    tiles: Rc<MemoryStore<TileDefinition>>,
    layouts: Rc<MemoryStore<Layout>>,
}

fn fixture() -> Fixture {
    let (stores, tiles, layouts) = Stores::memory();
    let clock = Rc::new(ManualClock::new());
    let cache = TileCache::new(stores, WritePolicy::default(), clock.clone());
    Fixture {
        cache,
        clock,
        tiles,
        layouts,
    }
}

fn note(id: &str, content: &str) -> TileDefinition {
    let config: ConfigMap = json!({ "content": content }).as_object().cloned().unwrap();
    TileDefinition::new(TileId::from(id), "note", config)
}

fn patch(v: serde_json::Value) -> ConfigMap {
    v.as_object().cloned().unwrap()
}

fn edit(f: &mut Fixture, id: &str, content: &str) {
    let id = TileId::from(id);
    f.cache
        .update_tile_with(&id, |t| (t.apply_patch(&patch(json!({ "content": content }))), ()))
        .unwrap();
    assert!(f.cache.schedule(DebounceKey::Tile(id)));
}

#[test]
fn commit_writes_immediately() {
    let mut f = fixture();
    f.cache.insert_tile(note("note-1", "Hello"));
    let report = f.cache.commit(RecordKey::Tile(TileId::from("note-1")));
    assert_eq!(report.written, 1);
    assert_eq!(f.tiles.save_count(), 1);
    assert_eq!(
        f.tiles.get(&TileId::from("note-1")).unwrap().content(),
        Some("Hello")
    );
    assert_eq!(f.cache.pending_writes(), 0);
}

#[test]
fn burst_of_edits_is_one_write_with_final_state() {
    let mut f = fixture();
    f.cache.insert_tile(note("note-1", "Hello"));
    f.cache.commit(RecordKey::Tile(TileId::from("note-1")));

    edit(&mut f, "note-1", "H");
    f.clock.advance_ms(100);
    edit(&mut f, "note-1", "Hi");
    f.clock.advance_ms(100);
    assert_eq!(f.cache.poll().written, 0);

    f.clock.advance_ms(300);
    let report = f.cache.poll();
    assert_eq!(report.written, 1);
    assert_eq!(f.tiles.save_count(), 2);
    assert_eq!(
        f.tiles.get(&TileId::from("note-1")).unwrap().content(),
        Some("Hi")
    );
}

#[test]
fn later_edit_resets_the_timer() {
    let mut f = fixture();
    f.cache.insert_tile(note("note-1", "a"));
    edit(&mut f, "note-1", "b");
    f.clock.advance_ms(250);
    edit(&mut f, "note-1", "c");
    f.clock.advance_ms(250);
    // 500ms after the first edit, but only 250ms after the second.
    assert_eq!(f.cache.poll().written, 0);
    f.clock.advance_ms(50);
    assert_eq!(f.cache.poll().written, 1);
}

#[test]
fn instance_timer_writes_owning_layout_after_geometry_window() {
    let mut f = fixture();
    f.cache.insert_tile(note("t", "x"));
    let layout_id = LayoutId::from("l1");
    f.cache.insert_layout(Layout::new(layout_id.clone(), "Desk", 0));
    let instance = TileInstance::new(TileId::from("t"), Point::new(0, 0), Size::new(250, 150));
    let instance_id = instance.instance_id.clone();
    assert!(f.cache.add_instance(&layout_id, instance));
    f.cache.commit(RecordKey::Layout(layout_id.clone()));
    assert_eq!(f.layouts.save_count(), 1);

    f.cache
        .update_instance_with(&instance_id, |i| {
            i.position = Point::new(40, 40);
            (true, ())
        })
        .unwrap();
    assert!(f.cache.schedule(DebounceKey::Instance(instance_id.clone())));

    f.clock.advance_ms(400);
    assert_eq!(f.cache.poll().written, 0);
    f.clock.advance_ms(100);
    assert_eq!(f.cache.poll().written, 1);

    let stored = f.layouts.get(&layout_id).unwrap();
    assert_eq!(stored.instance(&instance_id).unwrap().position, Point::new(40, 40));
}

#[test]
fn remove_tile_cancels_pending_edit_and_deletes() {
    let mut f = fixture();
    f.cache.insert_tile(note("note-1", "Hello"));
    f.cache.commit(RecordKey::Tile(TileId::from("note-1")));
    edit(&mut f, "note-1", "Hi");

    f.cache.remove_tile(&TileId::from("note-1")).unwrap();
    assert!(!f.cache.is_scheduled(&DebounceKey::Tile(TileId::from("note-1"))));
    f.cache.commit(RecordKey::Tile(TileId::from("note-1")));
    assert!(f.tiles.is_empty());
    assert_eq!(f.tiles.delete_count(), 1);

    f.clock.advance_ms(1000);
    assert_eq!(f.cache.poll().written, 0);
    assert_eq!(f.tiles.save_count(), 1);
}

#[test]
fn failed_write_stays_dirty_and_retries_with_backoff() {
    let mut f = fixture();
    f.tiles.fail_next_writes(2);
    f.cache.insert_tile(note("note-1", "Hello"));
    let record = RecordKey::Tile(TileId::from("note-1"));

    let report = f.cache.commit(record.clone());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].attempts, 1);
    assert!(!report.failures[0].escalated);
    assert!(f.cache.is_dirty(&record));

    // First retry after the base window.
    f.clock.advance_ms(300);
    let report = f.cache.poll();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].attempts, 2);

    // Second retry waits twice as long.
    f.clock.advance_ms(300);
    assert!(f.cache.poll().failures.is_empty());
    assert_eq!(f.tiles.save_count(), 0);
    f.clock.advance_ms(300);
    assert_eq!(f.cache.poll().written, 1);
    assert!(!f.cache.is_dirty(&record));
    assert!(f.tiles.contains(&TileId::from("note-1")));
}

#[test]
fn repeated_failures_escalate_at_threshold() {
    let mut f = fixture();
    f.tiles.fail_next_writes(10);
    f.cache.insert_tile(note("note-1", "Hello"));
    let record = RecordKey::Tile(TileId::from("note-1"));

    let mut escalated = Vec::new();
    for _ in 0..3 {
        let report = f.cache.commit(record.clone());
        escalated.extend(report.failures.iter().map(|fl| fl.escalated));
    }
    assert_eq!(escalated, vec![false, false, true]);
}

#[test]
fn backoff_doubles_and_caps() {
    let policy = WritePolicy::default();
    let base = Duration::from_millis(300);
    assert_eq!(policy.backoff(base, 1), Duration::from_millis(300));
    assert_eq!(policy.backoff(base, 2), Duration::from_millis(600));
    assert_eq!(policy.backoff(base, 3), Duration::from_millis(1200));
    assert_eq!(policy.backoff(base, 40), Duration::from_millis(30_000));
}

#[test]
fn flush_all_writes_everything_pending() {
    let mut f = fixture();
    f.cache.insert_tile(note("a", "1"));
    f.cache.insert_tile(note("b", "2"));
    f.cache.insert_layout(Layout::new(LayoutId::from("l1"), "Desk", 0));
    let report = f.cache.flush_all();
    assert_eq!(report.written, 3);
    assert_eq!(f.cache.pending_writes(), 0);
    assert!(f.cache.next_deadline().is_none());
}

#[test]
fn remove_instances_of_reports_affected_layouts() {
    let mut f = fixture();
    f.cache.insert_tile(note("t", "x"));
    for id in ["l1", "l2", "l3"] {
        f.cache.insert_layout(Layout::new(LayoutId::from(id), id, 0));
    }
    for id in ["l1", "l2"] {
        let inst = TileInstance::new(TileId::from("t"), Point::default(), Size::new(250, 150));
        assert!(f.cache.add_instance(&LayoutId::from(id), inst));
    }
    let affected = f.cache.remove_instances_of(&TileId::from("t"));
    assert_eq!(affected, vec![LayoutId::from("l1"), LayoutId::from("l2")]);
    assert!(f.cache.layouts().all(|l| l.tile_instances.is_empty()));
}

#[test]
fn duplicate_instance_id_is_refused() {
    let mut f = fixture();
    f.cache.insert_tile(note("t", "x"));
    f.cache.insert_layout(Layout::new(LayoutId::from("l1"), "a", 0));
    f.cache.insert_layout(Layout::new(LayoutId::from("l2"), "b", 0));
    let inst = TileInstance::new(TileId::from("t"), Point::default(), Size::new(250, 150));
    assert!(f.cache.add_instance(&LayoutId::from("l1"), inst.clone()));
    assert!(!f.cache.add_instance(&LayoutId::from("l2"), inst));
}

#[test]
fn load_drops_dangling_and_duplicate_instances() {
    let (stores, tiles, layouts) = Stores::memory();
    tiles.save(&note("t", "x")).unwrap();

    let shared = TileInstance::new(TileId::from("t"), Point::default(), Size::new(250, 150));
    let mut l1 = Layout::new(LayoutId::from("l1"), "a", 0);
    l1.tile_instances.push(shared.clone());
    let mut l2 = Layout::new(LayoutId::from("l2"), "b", 0);
    l2.tile_instances.push(shared);
    l2.tile_instances.push(TileInstance::new(
        TileId::from("ghost"),
        Point::default(),
        Size::new(250, 150),
    ));
    layouts.save(&l1).unwrap();
    layouts.save(&l2).unwrap();

    let clock = Rc::new(ManualClock::new());
    let mut cache = TileCache::new(stores, WritePolicy::default(), clock.clone());
    let report = cache.load().unwrap();

    assert_eq!(report.tiles, 1);
    assert_eq!(report.layouts, 2);
    assert_eq!(report.repaired, vec![LayoutId::from("l2")]);
    assert_eq!(cache.layout(&LayoutId::from("l1")).unwrap().tile_instances.len(), 1);
    assert!(cache.layout(&LayoutId::from("l2")).unwrap().tile_instances.is_empty());

    clock.advance_ms(300);
    assert_eq!(cache.poll().written, 1);
    assert!(layouts.get(&LayoutId::from("l2")).unwrap().tile_instances.is_empty());
}
