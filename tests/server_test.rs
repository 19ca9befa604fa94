// JSON-RPC round trips through the map server dispatcher
use std::io::{self, BufReader, Read};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use travel_map::draw::geometry::BUFFER_FRAME_MAGIC;
use travel_map::engine::BackendStatus;
use travel_map::server::{drain_notifications, error_codes, handle_line, serve, ServerState};

fn call(state: &mut ServerState, id: u64, method: &str, params: Value) -> Value {
    let line = json!({ "id": id, "method": method, "params": params }).to_string();
    let response = handle_line(state, &line).expect("non-empty line gets a response");
    serde_json::from_str(&response).expect("response is JSON")
}

fn notifications(state: &ServerState) -> Vec<Value> {
    drain_notifications(state)
        .iter()
        .map(|line| serde_json::from_str(line).expect("notification is JSON"))
        .collect()
}

fn event_types(state: &ServerState) -> Vec<String> {
    notifications(state)
        .iter()
        .map(|n| n["result"]["type"].as_str().unwrap_or_default().to_string())
        .collect()
}

fn init(state: &mut ServerState) -> Value {
    call(
        state,
        1,
        "Init",
        json!({
            "width": 800.0,
            "height": 600.0,
            "view": { "longitude": 5.0, "latitude": 5.0, "zoom": 5.0 }
        }),
    )
}

fn square_feature() -> Value {
    json!({
        "id": 1,
        "progress": 0.5,
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0], [0.0, 0.0]]]
        }
    })
}

#[test]
fn test_init_reports_ready_and_load() {
    let mut state = ServerState::new();
    let response = init(&mut state);
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["status"], "ready");
    assert_eq!(response["result"]["zoom"], 5.0);

    let events = notifications(&state);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"], Value::Null);
    assert_eq!(events[0]["method"], "mapEvent");
    assert_eq!(events[0]["result"]["type"], "load");
}

#[test]
fn test_protocol_errors() {
    let mut state = ServerState::new();

    let before_init = call(&mut state, 2, "GetZoom", Value::Null);
    assert_eq!(before_init["error"]["code"], error_codes::NOT_INITIALIZED);

    let unknown = call(&mut state, 3, "Frobnicate", json!({}));
    assert_eq!(unknown["error"]["code"], error_codes::METHOD_NOT_FOUND);

    let garbage = handle_line(&mut state, "{not json").unwrap();
    let garbage: Value = serde_json::from_str(&garbage).unwrap();
    assert_eq!(garbage["error"]["code"], error_codes::PARSE_ERROR);

    let no_method = handle_line(&mut state, r#"{"id": 9, "params": {}}"#).unwrap();
    let no_method: Value = serde_json::from_str(&no_method).unwrap();
    assert_eq!(no_method["error"]["code"], error_codes::INVALID_REQUEST);

    assert!(handle_line(&mut state, "   ").is_none());

    init(&mut state);
    let bad_params = call(&mut state, 4, "Wheel", json!({ "delta_y": "up" }));
    assert_eq!(bad_params["error"]["code"], error_codes::INVALID_PARAMS);
}

#[test]
fn test_set_features_then_query() {
    let mut state = ServerState::new();
    init(&mut state);
    notifications(&state);

    let loaded = call(&mut state, 2, "SetFeatures", json!({ "features": [square_feature()] }));
    assert_eq!(loaded["result"]["feature_count"], 1);
    assert_eq!(loaded["result"]["fill_vertices"], 6);
    assert_eq!(loaded["result"]["line_vertices"], 8);

    let projected = call(&mut state, 3, "Project", json!({ "longitude": 5.0, "latitude": 5.0 }));
    let x = projected["result"]["x"].as_f64().unwrap();
    let y = projected["result"]["y"].as_f64().unwrap();
    assert!((x - 400.0).abs() < 1e-6 && (y - 300.0).abs() < 1e-6);

    let hit = call(&mut state, 4, "QueryAt", json!({ "x": x, "y": y }));
    let features = hit["result"]["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["id"], 1);
    assert_eq!(features[0]["progress"], 0.5);

    let miss = call(&mut state, 5, "QueryAt", json!({ "x": 5.0, "y": 5.0 }));
    assert!(miss["result"]["features"].as_array().unwrap().is_empty());
}

#[test]
fn test_interaction_emits_move_after_response() {
    let mut state = ServerState::new();
    init(&mut state);
    notifications(&state);

    let zoomed = call(&mut state, 2, "Wheel", json!({ "delta_y": -100.0, "x": 400.0, "y": 300.0 }));
    assert!((zoomed["result"]["zoom"].as_f64().unwrap() - 5.1).abs() < 1e-9);
    assert_eq!(event_types(&state), vec!["move"]);

    call(&mut state, 3, "PointerDown", json!({ "x": 100.0, "y": 100.0 }));
    let dragging = call(&mut state, 4, "PointerMove", json!({ "x": 150.0, "y": 100.0 }));
    assert_eq!(dragging["result"]["dragging"], true);
    call(&mut state, 5, "PointerUp", Value::Null);
    assert_eq!(event_types(&state), vec!["move"]);

    call(&mut state, 6, "Click", json!({ "x": 10.0, "y": 20.0 }));
    call(&mut state, 7, "PointerLeave", Value::Null);
    let events = notifications(&state);
    assert_eq!(events[0]["result"]["type"], "click");
    assert_eq!(events[0]["result"]["point"], json!([10.0, 20.0]));
    assert!(events[0]["result"]["lngLat"].is_array());
    assert_eq!(events[1]["result"]["type"], "mouseLeave");

    let camera = call(&mut state, 8, "GetCamera", Value::Null);
    assert_eq!(camera["result"]["safe"]["zoom"], 5.0);
    assert_eq!(camera["result"]["zoom_bounds"], json!([4.0, 10.0]));
}

#[test]
fn test_buffers_json_and_binary() {
    let mut state = ServerState::new();
    init(&mut state);
    call(&mut state, 2, "SetFeatures", json!({ "features": [square_feature()] }));

    let buffers = call(&mut state, 3, "GetBuffers", Value::Null);
    let result = &buffers["result"];
    assert_eq!(result["geometryVersion"], 1);
    assert_eq!(result["buffers"]["fillRanges"], json!([[0, 6]]));
    let fill = BASE64
        .decode(result["buffers"]["fillPositions"].as_str().unwrap())
        .unwrap();
    assert_eq!(fill.len(), 6 * 2 * 4);

    let line = handle_line(&mut state, r#"{"id": 4, "method": "GetBuffersBinary"}"#).unwrap();
    let payload = line.strip_prefix("BINARY:4:").expect("binary prefix");
    let bytes = BASE64.decode(payload).unwrap();
    assert_eq!(&bytes[..8], BUFFER_FRAME_MAGIC);
    // Geometry frame followed by the 32-byte uniform block
    assert_eq!(bytes.len(), 24 + (12 + 24 + 16 + 32) * 4 + 32);
}

#[test]
fn test_deferred_resize_applies_on_frame() {
    let mut state = ServerState::new();
    init(&mut state);
    notifications(&state);

    call(&mut state, 2, "Resize", json!({ "width": 1000.0, "height": 700.0, "deferred": true }));
    call(&mut state, 3, "Resize", json!({ "width": 1200.0, "height": 900.0, "pixel_ratio": 2.0, "deferred": true }));
    assert!(notifications(&state).is_empty());

    let frame = call(&mut state, 4, "AnimationFrame", json!({ "now_ms": 16 }));
    assert_eq!(frame["result"]["keep_running"], false);
    assert_eq!(event_types(&state), vec!["move"]);

    let camera = call(&mut state, 5, "GetCamera", Value::Null);
    assert_eq!(camera["result"]["viewport"]["width"], 1200.0);

    let invalid = call(&mut state, 6, "Resize", json!({ "width": 0.0, "height": 900.0 }));
    assert_eq!(invalid["error"]["code"], error_codes::INVALID_VIEWPORT);
}

#[test]
fn test_device_lost_and_teardown() {
    let mut state = ServerState::new();
    init(&mut state);
    notifications(&state);

    let lost = call(&mut state, 2, "DeviceLost", json!({ "now_ms": 0, "reason": "tab hidden" }));
    assert_eq!(lost["result"]["status"], "lost");
    let frame = call(&mut state, 3, "AnimationFrame", json!({ "now_ms": 1000 }));
    assert_eq!(frame["result"]["status"], "ready");
    assert_eq!(event_types(&state), vec!["load"]);

    let down = call(&mut state, 4, "Teardown", Value::Null);
    assert_eq!(down["result"]["status"], "torn_down");
    let after = call(&mut state, 5, "SetFeatures", json!({ "features": [] }));
    assert_eq!(after["error"]["code"], error_codes::TORN_DOWN);
}

#[test]
fn test_load_geojson_with_progress() {
    let path = std::env::temp_dir().join(format!("travel_map_server_test_{}.geojson", std::process::id()));
    let collection = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "id": 13, "nam_ja": "東京都" },
                "geometry": { "type": "Polygon", "coordinates": [[[139.0, 35.5], [139.9, 35.5], [139.9, 35.9], [139.0, 35.9], [139.0, 35.5]]] }
            },
            {
                "type": "Feature",
                "properties": { "id": 99 },
                "geometry": { "type": "Point", "coordinates": [139.0, 35.0] }
            }
        ]
    });
    std::fs::write(&path, collection.to_string()).unwrap();

    let mut state = ServerState::new();
    call(
        &mut state,
        1,
        "Init",
        json!({ "width": 800.0, "height": 600.0, "view": { "longitude": 139.45, "latitude": 35.7, "zoom": 8.0 } }),
    );
    let loaded = call(
        &mut state,
        2,
        "LoadGeoJson",
        json!({
            "file_path": path.to_string_lossy(),
            "tolerance": 0.0,
            "progress": [{ "id": 13, "name": "Tokyo", "visited": 3, "total": 4 }]
        }),
    );
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded["result"]["feature_count"], 1);
    assert_eq!(state.source_path.as_deref(), path.to_str());

    let hit = call(&mut state, 3, "QueryAt", json!({ "x": 400.0, "y": 300.0 }));
    let features = hit["result"]["features"].as_array().unwrap();
    assert_eq!(features[0]["id"], 13);
    assert_eq!(features[0]["progress"], 0.75);

    let missing = call(&mut state, 4, "LoadGeoJson", json!({ "file_path": "/nonexistent/japan.geojson" }));
    assert_eq!(missing["error"]["code"], error_codes::LOAD_FAILED);
}

/// Hands out one request line, then fails every read
struct BrokenPipe {
    line: Option<Vec<u8>>,
    reads: usize,
}

impl Read for BrokenPipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        match self.line.take() {
            Some(line) => {
                buf[..line.len()].copy_from_slice(&line);
                Ok(line.len())
            }
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")),
        }
    }
}

#[test]
fn test_serve_stops_on_read_error() {
    let request = json!({ "id": 1, "method": "Init", "params": { "width": 800.0, "height": 600.0 } });
    let mut pipe = BrokenPipe {
        line: Some(format!("{}\n", request).into_bytes()),
        reads: 0,
    };
    let mut state = ServerState::new();
    let mut output = Vec::new();

    serve(&mut state, BufReader::new(&mut pipe), &mut output).unwrap();

    assert_eq!(pipe.reads, 2);
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["result"]["status"], "ready");
    assert_eq!(lines[1]["result"]["type"], "load");
    assert_eq!(state.engine.as_ref().map(|e| e.status()), Some(BackendStatus::TornDown));
}
