use super::*;

use crate::config::ForgeConfig;
use crate::error::ConfigError;
use crate::forge::{ChunkForge, MeshStore, ResourceId, Task};
use crate::mesh::ChunkMesh;
use crate::quadtree::QuadtreePath;

const ROOT: f64 = 10.0;

fn config(min_depth: u32, max_depth: u32, factor: f64) -> PlanetConfig {
  PlanetConfig {
    min_depth,
    max_depth,
    chunk_length: ROOT,
    base_subdivisions: 2,
    render_distance_factor: factor,
    ..Default::default()
  }
}

fn flat() -> Arc<TerrainSettings> {
  Arc::new(TerrainSettings::flat())
}

/// Drive planet and forge together until both settle.
fn settle(planet: &mut Planet, forge: &mut ChunkForge, store: &mut MeshStore, observer: &Observer) {
  for _ in 0..2000 {
    let stats = planet.update_lod(observer, forge);
    if let Some(applied) = forge.update(store) {
      assert!(planet.record_applied(&applied));
    }
    if stats.is_unchanged() && forge.is_idle() {
      return;
    }
  }
  panic!("planet did not settle");
}

#[test]
fn test_planet_ids_are_unique() {
  let a = PlanetId::new();
  let b = PlanetId::new();
  assert_ne!(a, b);
  assert!(b.raw() > a.raw());
  assert_eq!(format!("{}", a), format!("planet-{}", a.raw()));
}

#[test]
fn test_new_rejects_invalid_config() {
  let mut tasks: Vec<Task> = Vec::new();
  let result = Planet::new(config(4, 2, 1.0), flat(), &mut tasks);
  assert!(matches!(
    result,
    Err(TerrainError::Config(ConfigError::DepthRange { min: 4, max: 2 }))
  ));
  assert!(tasks.is_empty());
}

#[test]
fn test_new_seeds_six_root_builds() {
  let mut tasks: Vec<Task> = Vec::new();
  let planet = Planet::new(config(0, 3, 1.0), flat(), &mut tasks).unwrap();
  assert_eq!(tasks.len(), 6);
  assert!(tasks.iter().all(Task::is_build));
  assert_eq!(planet.leaf_count(), 6);
  assert_eq!(planet.radius(), 5.0);
  for direction in Direction::ALL {
    assert!(planet.side(direction).root().is_leaf());
    assert_eq!(planet.side(direction).direction(), direction);
  }
}

#[test]
fn test_distant_observer_gets_the_floor_everywhere() {
  let mut tasks: Vec<Task> = Vec::new();
  let mut planet = Planet::new(config(1, 3, 3.0), flat(), &mut tasks).unwrap();
  let observer = Observer::looking_at_origin(DVec3::new(0.0, 0.0, -100.0));

  let stats = planet.update_lod(&observer, &mut tasks);
  assert_eq!(stats.splits, 6);
  assert_eq!(planet.leaf_count(), 24);
  assert_eq!(planet.max_leaf_depth(), 1);
  planet.for_each_chunk(|chunk| assert_eq!(chunk.depth(), 1));
}

#[test]
fn test_hovering_observer_reaches_max_depth_below_it() {
  let mut tasks: Vec<Task> = Vec::new();
  let mut planet = Planet::new(config(1, 3, 1.0), flat(), &mut tasks).unwrap();
  let ground = DVec3::new(0.3, -0.4, 1.0).normalize() * planet.radius();
  let observer = Observer::looking_at_origin(ground * 1.02);

  for _ in 0..4 {
    planet.update_lod(&observer, &mut tasks);
  }
  let below = planet.leaf_containing(ground).unwrap();
  assert_eq!(below.direction(), Direction::Backward);
  assert_eq!(below.depth(), 3);

  // The opposite face stays at the floor
  planet
    .side(Direction::Forward)
    .for_each_chunk(|chunk| assert_eq!(chunk.depth(), 1));
}

#[test]
fn test_leaf_containing_picks_the_dominant_face() {
  let mut tasks: Vec<Task> = Vec::new();
  let planet = Planet::new(config(0, 2, 1.0), flat(), &mut tasks).unwrap();

  let cases = [
    (DVec3::new(0.0, 40.0, 1.0), Direction::Up),
    (DVec3::new(2.0, -9.0, 0.0), Direction::Down),
    (DVec3::new(0.1, 0.1, -3.0), Direction::Forward),
    (DVec3::new(0.0, 0.0, 0.5), Direction::Backward),
    (DVec3::new(-7.0, 1.0, 1.0), Direction::Left),
    (DVec3::new(7.0, 1.0, 1.0), Direction::Right),
  ];
  for (point, expected) in cases {
    let leaf = planet.leaf_containing(point).unwrap();
    assert_eq!(leaf.direction(), expected, "{:?}", point);
  }
  assert!(planet.leaf_containing(DVec3::ZERO).is_none());
}

#[test]
fn test_leaf_containing_maps_back_to_the_leaf_path() {
  let mut tasks: Vec<Task> = Vec::new();
  let mut planet = Planet::new(config(2, 2, 1.0), flat(), &mut tasks).unwrap();
  planet.update_lod(&Observer::looking_at_origin(DVec3::splat(1e3)), &mut tasks);

  for direction in Direction::ALL {
    let path = QuadtreePath::from_indices(&[3, 1]).unwrap();
    let center = (direction.rotation() * path.cube_position(ROOT)).normalize() * 5.0;
    let leaf = planet.leaf_containing(center).unwrap();
    assert_eq!(leaf.direction(), direction);
    assert_eq!(leaf.path(), path);
  }
}

#[test]
fn test_transform_applies_to_lookups_and_lod() {
  let mut tasks: Vec<Task> = Vec::new();
  let offset = DVec3::new(500.0, 0.0, 0.0);
  let mut planet = Planet::with_transform(
    config(0, 1, 1.0),
    flat(),
    DAffine3::from_translation(offset),
    &mut tasks,
  )
  .unwrap();

  let leaf = planet.leaf_containing(offset + DVec3::new(0.0, 0.0, -50.0)).unwrap();
  assert_eq!(leaf.direction(), Direction::Forward);

  // Right next to the untransformed surface: nothing happens
  let stats = planet.update_lod(&Observer::looking_at_origin(DVec3::new(0.0, 0.0, -5.2)), &mut tasks);
  assert!(stats.is_unchanged());

  let stats = planet.update_lod(
    &Observer::looking_at_origin(offset + DVec3::new(0.0, 0.0, -5.2)),
    &mut tasks,
  );
  assert!(stats.splits >= 1);
  assert!(!planet.side(Direction::Forward).root().is_leaf());

  planet.set_transform(DAffine3::IDENTITY);
  assert_eq!(planet.transform(), DAffine3::IDENTITY);
}

#[test]
fn test_record_applied_ignores_other_planets() {
  let mut tasks: Vec<Task> = Vec::new();
  let mut a = Planet::new(config(0, 1, 1.0), flat(), &mut tasks).unwrap();
  let mut b = Planet::new(config(0, 1, 1.0), flat(), &mut tasks).unwrap();
  let chunk = a.side(Direction::Up).chunks()[0].id;
  let applied = AppliedChunk {
    id: chunk,
    resource: ResourceId(1),
    average_height: 0.0,
  };

  assert!(!b.record_applied(&applied));
  assert!(a.record_applied(&applied));
  assert_eq!(a.ready_count(), 1);
  assert_eq!(b.ready_count(), 0);
}

#[test]
fn test_forge_round_trip_applies_every_leaf() {
  let mut forge = ChunkForge::new(&ForgeConfig::inline(2)).unwrap();
  let mut store = MeshStore::new();
  let mut planet = Planet::new(config(1, 3, 1.0), flat(), &mut forge).unwrap();
  let observer = Observer::looking_at_origin(DVec3::new(0.2, 0.1, -5.3));

  settle(&mut planet, &mut forge, &mut store, &observer);

  assert!(planet.max_leaf_depth() == 3);
  assert_eq!(planet.ready_count(), planet.leaf_count());
  assert_eq!(forge.live_count(), planet.leaf_count());
  assert_eq!(store.len(), planet.leaf_count());
  planet.for_each_chunk(|chunk| assert!(store.contains_chunk(chunk.id)));
  planet.for_each_chunk(|chunk| {
    let resource = chunk.mesh.resource().unwrap();
    assert_eq!(store.get(resource).map(ChunkMesh::vertex_count), Some(9));
  });
  let per_mesh = store.iter().next().unwrap().1.byte_size();
  assert!(per_mesh > 0);
  assert_eq!(store.byte_size(), per_mesh * store.len());
  assert_eq!(planet.average_height(), Some(0.0));
}

#[test]
fn test_moving_observer_keeps_store_in_step_with_tree() {
  let mut forge = ChunkForge::new(&ForgeConfig::inline(3)).unwrap();
  let mut store = MeshStore::new();
  let mut planet = Planet::new(config(1, 4, 1.5), flat(), &mut forge).unwrap();

  let stops = [
    DVec3::new(0.0, 0.0, -5.2),
    DVec3::new(5.2, 0.0, 0.0),
    DVec3::new(0.0, 40.0, 0.0),
    DVec3::new(-3.0, 3.0, 3.0),
  ];
  for stop in stops {
    settle(&mut planet, &mut forge, &mut store, &Observer::looking_at_origin(stop));
    assert_eq!(store.len(), planet.leaf_count());
    assert_eq!(planet.ready_count(), planet.leaf_count());
  }
  // Every mesh that was applied and then replaced came back out
  assert_eq!((store.applied - store.released) as usize, planet.leaf_count());
}

#[test]
fn test_deferred_deletion_round_trip() {
  let mut forge = ChunkForge::new(&ForgeConfig::inline(2)).unwrap();
  let mut store = MeshStore::new();
  let cfg = PlanetConfig {
    deferred_deletion: true,
    ..config(1, 3, 1.0)
  };
  let mut planet = Planet::new(cfg, flat(), &mut forge).unwrap();

  let near = Observer::looking_at_origin(DVec3::new(0.0, 0.0, -5.2));
  settle(&mut planet, &mut forge, &mut store, &near);
  // Resolved semaphores release on the pass after the last apply
  planet.update_lod(&near, &mut forge);
  settle(&mut planet, &mut forge, &mut store, &near);

  for direction in Direction::ALL {
    assert!(planet.side(direction).pending_semaphores().is_empty());
  }
  assert_eq!(store.len(), planet.leaf_count());
}

#[test]
fn test_reset_rebuilds_with_new_terrain() {
  let mut forge = ChunkForge::new(&ForgeConfig::inline(2)).unwrap();
  let mut store = MeshStore::new();
  let mut planet = Planet::new(config(1, 2, 1.0), flat(), &mut forge).unwrap();
  let observer = Observer::looking_at_origin(DVec3::new(0.0, 0.0, -5.5));
  settle(&mut planet, &mut forge, &mut store, &observer);
  let before = planet.leaf_count();

  let bumpy = Arc::new(TerrainSettings {
    bump_height: 0.5,
    ..TerrainSettings::flat()
  });
  planet.set_terrain(Arc::clone(&bumpy));
  forge.reset();
  let stats = planet.reset(&mut forge);
  assert_eq!(stats.deletions_issued, before);
  assert_eq!(stats.builds_issued, 6);
  assert_eq!(planet.leaf_count(), 6);

  settle(&mut planet, &mut forge, &mut store, &observer);
  assert!(Arc::ptr_eq(planet.terrain(), &bumpy));
  assert_eq!(store.len(), planet.leaf_count());
  assert_eq!(planet.ready_count(), planet.leaf_count());
  assert!(planet.average_height().is_some());
}

#[test]
fn test_dispose_releases_everything() {
  let mut forge = ChunkForge::new(&ForgeConfig::inline(2)).unwrap();
  let mut store = MeshStore::new();
  let mut planet = Planet::new(config(1, 2, 1.0), flat(), &mut forge).unwrap();
  settle(
    &mut planet,
    &mut forge,
    &mut store,
    &Observer::looking_at_origin(DVec3::new(0.0, 5.5, 0.0)),
  );
  let leaves = planet.leaf_count();

  assert_eq!(planet.dispose(&mut forge), leaves);
  for _ in 0..10 {
    forge.update(&mut store);
  }
  assert!(store.is_empty());
  assert_eq!(forge.live_count(), 0);
  assert!(forge.is_idle());
}
