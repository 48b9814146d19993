//! Built-in converters through the registry.

use chrono::{DateTime, TimeZone, Utc};
use dynbind::{InvokeError, Json, Registry, args};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

fn stamp_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_function(|t: DateTime<Utc>| t.timestamp_millis(), "Time", "millis");
    registry.register_function(|s: String| s, "Text", "echo");
    registry
}

#[test]
fn test_time_layouts_resolve_to_same_instant() {
    let registry = stamp_registry();
    let expected = Utc
        .with_ymd_and_hms(2023, 1, 2, 3, 4, 5)
        .unwrap()
        .timestamp_millis();

    for input in [
        json!("2023-01-02T03:04:05Z"),
        json!("2023-01-02T04:04:05+01:00"),
        json!(expected),
        json!(expected.to_string()),
    ] {
        let result = registry.invoke("Time", "millis", vec![input.clone()]).unwrap();
        assert_eq!(result, json!(expected), "input {input}");
    }
}

#[test]
fn test_date_only_layout() {
    let registry = stamp_registry();
    let midnight = Utc
        .with_ymd_and_hms(2023, 1, 2, 0, 0, 0)
        .unwrap()
        .timestamp_millis();
    assert_eq!(
        registry.invoke("Time", "millis", args!["2023-01-02"]).unwrap(),
        json!(midnight)
    );
}

#[test]
fn test_unparseable_time_is_a_conversion_error() {
    let registry = stamp_registry();
    let err = registry
        .invoke("Time", "millis", args!["next tuesday"])
        .unwrap_err();
    assert!(matches!(err, InvokeError::Conversion { position: 0, .. }));
}

#[test]
fn test_string_converter_formats_scalars() {
    let registry = stamp_registry();

    let float = registry.invoke("Text", "echo", args![4545.65772]).unwrap();
    assert!(float.as_str().unwrap().starts_with("4545.65772"));
    assert_eq!(registry.invoke("Text", "echo", args![12]).unwrap(), json!("12"));
    assert_eq!(registry.invoke("Text", "echo", args![true]).unwrap(), json!("true"));
}

#[test]
fn test_without_default_converters() {
    let mut registry = Registry::builder().with_default_converters(false).build();
    registry.register_function(|s: String| s, "Text", "echo");

    assert!(registry.converters().is_empty());
    assert!(registry.invoke("Text", "echo", args![12]).is_err());
    assert_eq!(
        registry.invoke("Text", "echo", args!["plain"]).unwrap(),
        json!("plain")
    );
}

#[test]
fn test_custom_converter() {
    #[derive(Clone, Debug, PartialEq)]
    struct Celsius(f64);

    impl dynbind::Parameter for Celsius {
        const CLASS: dynbind::TypeClass = dynbind::TypeClass::Float;

        fn decode(value: Value) -> Result<Self, dynbind::ConvertError> {
            <f64 as dynbind::Parameter>::decode(value).map(Celsius)
        }
    }

    let mut registry = Registry::new();
    registry.register_converter(|v: &Value| -> Result<Celsius, String> {
        match v.as_str().and_then(|s| s.strip_suffix('F')) {
            Some(f) => f
                .parse::<f64>()
                .map(|f| Celsius((f - 32.0) * 5.0 / 9.0))
                .map_err(|e| e.to_string()),
            None => Err(String::from("not fahrenheit")),
        }
    });
    registry.register_function(|c: Celsius| c.0.round() as i64, "Temp", "celsius");

    assert_eq!(
        registry.invoke("Temp", "celsius", args!["212F"]).unwrap(),
        json!(100)
    );
    // A failing converter falls back to the type's own decoding.
    assert_eq!(registry.invoke("Temp", "celsius", args![21.6]).unwrap(), json!(22));
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Point {
    x: i64,
    y: i64,
}

#[test]
fn test_structured_parameters() {
    let mut registry = Registry::new();
    registry.register_function(
        |Json(p): Json<Point>| Json(Point { x: p.y, y: p.x }),
        "Geo",
        "swap",
    );

    assert_eq!(registry.signature("Geo", "swap").as_deref(), Some("o"));
    assert_eq!(
        registry.invoke("Geo", "swap", vec![json!({"x": 1, "y": 2})]).unwrap(),
        json!({"x": 2, "y": 1})
    );
    assert!(matches!(
        registry.invoke("Geo", "swap", vec![json!({"x": "a"})]),
        Err(InvokeError::Conversion { .. })
    ));
}
