// End-to-end checks from features to buffers, bounds and hit-testing
use approx::assert_abs_diff_eq;
use travel_map::draw::generation::{build_geometry, DEFAULT_BORDER_COLOR};
use travel_map::draw::geometry::{Feature, HitTestMode, BUFFER_FRAME_MAGIC};
use travel_map::draw::projection::to_world;
use travel_map::engine::{MapConfig, MapEngine, NullBackend, ViewState, Viewport};

fn square(min: f64, max: f64) -> Vec<[f64; 2]> {
    vec![[min, min], [min, max], [max, max], [max, min], [min, min]]
}

#[test]
fn test_square_feature_end_to_end() {
    let features = vec![Feature::polygon(1, Some(0.5), vec![square(0.0, 10.0)])];
    let geometry = build_geometry(&features, DEFAULT_BORDER_COLOR);

    // Two triangles, four border segments
    assert_eq!(geometry.buffers.fill_vertex_count(), 6);
    assert_eq!(geometry.buffers.line_vertex_count(), 8);
    for color in geometry.buffers.fill_colors.chunks(4) {
        assert_eq!(color, &[1.0, 0.65, 0.35, 0.95]);
    }

    assert_eq!(geometry.world_polygons.len(), 1);
    assert_eq!(geometry.bboxes.len(), 1);
    let bbox = geometry.bboxes[0];
    let south_west = to_world(0.0, 0.0);
    let north_east = to_world(10.0, 10.0);
    assert_abs_diff_eq!(bbox.min_x, south_west[0], epsilon = 1e-12);
    assert_abs_diff_eq!(bbox.max_x, north_east[0], epsilon = 1e-12);
    // World y grows southward
    assert_abs_diff_eq!(bbox.min_y, north_east[1], epsilon = 1e-12);
    assert_abs_diff_eq!(bbox.max_y, south_west[1], epsilon = 1e-12);

    let mut engine = MapEngine::new(
        NullBackend::default(),
        ViewState {
            longitude: 5.0,
            latitude: 5.0,
            zoom: 5.0,
        },
        MapConfig::default(),
        None,
    )
    .with_viewport(Viewport::new(800.0, 600.0, 1.0));
    engine.initialize().expect("null backend always initializes");
    engine.set_features(features).expect("upload to null backend");

    let inside = engine.project([5.0, 5.0]);
    assert_abs_diff_eq!(inside[0], 400.0, epsilon = 1e-6);
    assert_abs_diff_eq!(inside[1], 300.0, epsilon = 1e-6);
    let hits = engine.query_at(inside);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 1);

    let outside = engine.project([12.0, 5.0]);
    assert!(engine.query_at(outside).is_empty());
}

#[test]
fn test_multipolygon_is_one_hit_entity() {
    let features = vec![
        Feature::polygon(7, None, vec![vec![[0.0, 0.0]]]),
        Feature::multi_polygon(8, Some(1.0), vec![vec![square(0.0, 1.0)], vec![square(2.0, 3.0)]]),
    ];
    let geometry = build_geometry(&features, DEFAULT_BORDER_COLOR);

    // The single-point feature draws nothing and leaves no world polygon behind
    assert_eq!(geometry.world_polygons.len(), 1);
    let polygon = &geometry.world_polygons[0];
    assert_eq!(polygon.id, 8);
    assert_eq!(polygon.feature_index, 1);
    assert_eq!(polygon.rings.len(), 2);
    assert_eq!(geometry.buffers.fill_ranges, vec![(0, 12)]);

    let index = geometry.index();
    let in_second_part = to_world(2.5, 2.5);
    assert_eq!(geometry.hits(&index, HitTestMode::AnyRing, in_second_part), vec![0]);
    let between_parts = to_world(1.5, 1.5);
    assert!(geometry.hits(&index, HitTestMode::AnyRing, between_parts).is_empty());
}

#[test]
fn test_hole_handling_per_mode() {
    let outer = square(0.0, 10.0);
    let hole = vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]];
    let features = vec![Feature::polygon(3, Some(0.0), vec![outer, hole])];
    let geometry = build_geometry(&features, DEFAULT_BORDER_COLOR);
    let index = geometry.index();

    let in_hole = to_world(5.0, 5.0);
    assert_eq!(geometry.hits(&index, HitTestMode::AnyRing, in_hole), vec![0]);
    assert!(geometry.hits(&index, HitTestMode::EvenOdd, in_hole).is_empty());

    let in_body = to_world(2.0, 2.0);
    assert_eq!(geometry.hits(&index, HitTestMode::EvenOdd, in_body), vec![0]);

    // Earcut leaves the hole out of the fill: 8 triangles around it
    assert_eq!(geometry.buffers.fill_vertex_count(), 24);
}

#[test]
fn test_binary_frame_layout() {
    let features = vec![Feature::polygon(1, Some(0.2), vec![square(0.0, 10.0)])];
    let buffers = build_geometry(&features, DEFAULT_BORDER_COLOR).buffers;
    let bytes = buffers.to_bytes();

    assert_eq!(&bytes[..8], BUFFER_FRAME_MAGIC);
    let counts: Vec<u32> = bytes[8..24]
        .chunks(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(counts, vec![12, 24, 16, 32]);
    assert_eq!(bytes.len(), 24 + (12 + 24 + 16 + 32) * 4);
}
