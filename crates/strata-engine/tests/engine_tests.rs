//! End-to-end tests for the cooperative map engine driver.

use strata_engine::prelude::*;

fn templates() -> MemoryTemplateStore {
    let mut templates = MemoryTemplateStore::new();
    templates
        .insert(
            TemplateId(1),
            TemplateSheet::new()
                .with_layer(LayerKind::Sector, LocalGrid::filled(2, 2, 5))
                .with_names(LayerKind::Sector, [(5u32, "Kitchen")])
                .with_layer(LayerKind::Collision, LocalGrid::filled(2, 2, 1)),
        )
        .unwrap();
    templates
}

fn kitchen(id: u32, origin: (i32, i32)) -> PlacedEntity {
    PlacedEntity {
        id: EntityId(id),
        kind: EntityKind::Structure,
        origin: Some(origin),
        footprint_width: 2,
        footprint_height: 2,
        template: TemplateId(1),
    }
}

fn small_budget() -> SliceBudget {
    SliceBudget {
        entities_per_slice: 1,
        rows_per_slice: 2,
    }
}

#[test]
fn placement_flows_through_to_layers_pool_and_labels() {
    let templates = templates();
    let entities = [kitchen(1, (3, 3))];
    let mut backend = RecordingBackend::new();
    let mut engine = MapEngine::new(MapGeometry::new(10, 10, 16.0), SliceBudget::default());

    engine.set_mode(ViewMode::Layer(LayerKind::Sector));
    engine.mark_dirty(Some(CellRect::from_origin_size(3, 3, 2, 2)));
    engine.pump_to_idle(&entities, &templates, &mut backend);

    // Layers: interned code written across the footprint.
    let code = engine
        .layers()
        .names(LayerKind::Sector)
        .unwrap()
        .code_for("Kitchen")
        .unwrap();
    assert_eq!(engine.layers().layer(LayerKind::Sector).get(3, 3), code);
    assert_eq!(engine.layers().rebuild_stamp(), 1);

    // Pool: exactly the four footprint cells are shown.
    assert_eq!(backend.shown.len(), 4);
    assert_eq!(engine.last_delta().unwrap().shown, 4);

    // Labels: one "Kitchen" at the footprint centroid in pixels.
    assert_eq!(engine.labels().len(), 1);
    let label = &engine.labels()[0];
    assert_eq!(label.text, "Kitchen");
    assert_eq!(label.geometry.center_x, 64.0);
    assert_eq!(label.geometry.center_y, 64.0);
    assert_eq!(backend.labels.len(), 1);
}

#[test]
fn pumping_an_idle_engine_does_nothing() {
    let templates = templates();
    let entities = [kitchen(1, (3, 3))];
    let mut backend = RecordingBackend::new();
    let mut engine = MapEngine::new(MapGeometry::new(10, 10, 16.0), SliceBudget::default());

    engine.set_mode(ViewMode::Layer(LayerKind::Sector));
    engine.mark_dirty(None);
    engine.pump_to_idle(&entities, &templates, &mut backend);

    backend.reset_cells();
    let labels_before = backend.labels.clone();
    assert_eq!(
        engine.pump(&entities, &templates, &mut backend),
        PumpProgress::Idle
    );
    assert_eq!(backend.mutation_count(), 0);
    assert_eq!(backend.labels, labels_before);
}

#[test]
fn removal_reverts_footprint_cells_and_labels() {
    let templates = templates();
    let mut backend = RecordingBackend::new();
    let mut engine = MapEngine::new(MapGeometry::new(10, 10, 16.0), SliceBudget::default());
    engine.set_mode(ViewMode::Layer(LayerKind::Sector));

    let both = [kitchen(1, (0, 0)), kitchen(2, (6, 6))];
    engine.mark_dirty(None);
    engine.pump_to_idle(&both, &templates, &mut backend);
    assert_eq!(engine.labels().len(), 2);
    assert_eq!(engine.layers().rebuild_stamp(), 1);

    // Remove the second entity; its cells revert to empty, no stale values.
    let one = [kitchen(1, (0, 0))];
    engine.mark_dirty(Some(CellRect::from_origin_size(6, 6, 2, 2)));
    backend.reset_cells();
    engine.pump_to_idle(&one, &templates, &mut backend);

    assert_eq!(engine.layers().layer(LayerKind::Sector).get(6, 6), 0);
    assert_ne!(engine.layers().layer(LayerKind::Sector).get(0, 0), 0);
    assert_eq!(engine.layers().rebuild_stamp(), 2);
    // Exactly the vacated cells were hidden; the surviving footprint kept
    // its visuals (same single code before and after).
    assert_eq!(backend.hidden.len(), 4);
    assert_eq!(backend.shown.len(), 0);
    assert_eq!(engine.labels().len(), 1);
}

#[test]
fn rapid_triggers_collapse_into_one_fresh_pass() {
    let templates = templates();
    let mut backend = RecordingBackend::new();
    // One entity per slice so passes stay in flight across pumps.
    let mut engine = MapEngine::new(MapGeometry::new(16, 16, 1.0), small_budget());
    engine.set_mode(ViewMode::Layer(LayerKind::Sector));

    let mut entities = vec![kitchen(1, (0, 0)), kitchen(2, (4, 4)), kitchen(3, (8, 8))];
    engine.mark_dirty(None);
    // Start the rebuild and leave it suspended after one entity.
    assert_eq!(
        engine.pump(&entities, &templates, &mut backend),
        PumpProgress::Rebuilding
    );

    // Two more placements arrive while the pass is suspended.
    entities.push(kitchen(4, (12, 12)));
    engine.mark_dirty(Some(CellRect::from_origin_size(12, 12, 2, 2)));
    entities.push(kitchen(5, (0, 12)));
    engine.mark_dirty(Some(CellRect::from_origin_size(0, 12, 2, 2)));

    engine.pump_to_idle(&entities, &templates, &mut backend);

    // Both triggers collapsed into a single fresh pass: exactly one
    // completed rebuild, and it saw all five entities.
    assert_eq!(engine.layers().rebuild_stamp(), 1);
    assert_eq!(engine.last_report().unwrap().entities_seen, 5);
    for origin in [(0, 0), (4, 4), (8, 8), (12, 12), (0, 12)] {
        assert_ne!(
            engine
                .layers()
                .layer(LayerKind::Sector)
                .get(origin.0, origin.1),
            0,
            "footprint at {origin:?} missing"
        );
    }
}

#[test]
fn abandoned_pass_installs_nothing() {
    let templates = templates();
    let mut backend = RecordingBackend::new();
    let mut engine = MapEngine::new(MapGeometry::new(16, 16, 1.0), small_budget());

    let entities = [kitchen(1, (0, 0)), kitchen(2, (4, 4)), kitchen(3, (8, 8))];
    engine.mark_dirty(None);
    engine.pump(&entities, &templates, &mut backend);
    engine.mark_dirty(None);

    // The abandoning pump discards the suspended pass; the store still
    // holds the pre-rebuild (empty, stamp 0) state.
    engine.pump(&entities, &templates, &mut backend);
    assert_eq!(engine.layers().rebuild_stamp(), 0);
    assert!(!engine.layers().layer(LayerKind::Sector).any_nonzero());

    engine.pump_to_idle(&entities, &templates, &mut backend);
    assert_eq!(engine.layers().rebuild_stamp(), 1);
}

#[test]
fn rebuild_mid_labeling_discards_the_stale_pass() {
    let templates = templates();
    let mut backend = RecordingBackend::new();
    let mut engine = MapEngine::new(MapGeometry::new(16, 16, 1.0), small_budget());
    engine.set_mode(ViewMode::Layer(LayerKind::Sector));

    let one = [kitchen(1, (0, 0))];
    engine.mark_dirty(None);
    // Pump until labeling is underway (2 rows per slice on a 16-row map).
    while engine.pump(&one, &templates, &mut backend) != PumpProgress::Labeling {}

    // A placement arrives mid-labeling.
    let two = [kitchen(1, (0, 0)), kitchen(2, (10, 10))];
    engine.mark_dirty(Some(CellRect::from_origin_size(10, 10, 2, 2)));
    engine.pump_to_idle(&two, &templates, &mut backend);

    // The final labels reflect the new store, not the interrupted scan.
    assert_eq!(engine.labels().len(), 2);
    assert_eq!(engine.layers().rebuild_stamp(), 2);
}

#[test]
fn mode_none_hides_everything_and_clears_labels() {
    let templates = templates();
    let entities = [kitchen(1, (3, 3))];
    let mut backend = RecordingBackend::new();
    let mut engine = MapEngine::new(MapGeometry::new(10, 10, 16.0), SliceBudget::default());

    engine.set_mode(ViewMode::Layer(LayerKind::Sector));
    engine.mark_dirty(None);
    engine.pump_to_idle(&entities, &templates, &mut backend);
    assert_eq!(backend.labels.len(), 1);

    backend.reset_cells();
    engine.set_mode(ViewMode::None);
    engine.pump_to_idle(&entities, &templates, &mut backend);

    assert_eq!(backend.hidden.len(), 4);
    assert!(backend.labels.is_empty());
    assert!(engine.labels().is_empty());
}

#[test]
fn collision_mode_shows_contributions_from_the_shared_layer() {
    let templates = templates();
    let entities = [kitchen(1, (3, 3))];
    let mut backend = RecordingBackend::new();
    let mut engine = MapEngine::new(MapGeometry::new(10, 10, 16.0), SliceBudget::default());

    engine.set_mode(ViewMode::Layer(LayerKind::Collision));
    engine.mark_dirty(None);
    engine.pump_to_idle(&entities, &templates, &mut backend);

    assert_eq!(engine.last_delta().unwrap().shown, 4);
    // Collision has no name table: labels fall back to the raw value.
    assert_eq!(engine.labels().len(), 1);
    assert_eq!(engine.labels()[0].text, "1");
}
