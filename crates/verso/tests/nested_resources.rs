//! Resources embedded in other resources, two levels deep

use serde::{Deserialize, Serialize};
use serde_json::json;
use verso::{
    AddField, ApiVersion, FnTransform, JsonObject, Resource, ResourceSpec, Versioning,
    VersioningConfig, VersioningError,
};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Part {
    serial: String,
    #[serde(default)]
    weight: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Widget {
    label: String,
    #[serde(default)]
    colour: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Order {
    id: u64,
    #[serde(default)]
    priority: u8,
    widget: Widget,
}

impl Resource for Part {
    const NAME: &'static str = "Part";

    fn spec() -> ResourceSpec {
        ResourceSpec::new(Self::NAME).transform(ApiVersion::new(2, 0, 0), AddField::new("weight"))
    }
}

impl Resource for Widget {
    const NAME: &'static str = "Widget";

    fn spec() -> ResourceSpec {
        ResourceSpec::new(Self::NAME)
            .transform(ApiVersion::new(3, 0, 0), AddField::new("colour"))
            .nested("parts", Part::NAME)
    }
}

impl Resource for Order {
    const NAME: &'static str = "Order";

    fn spec() -> ResourceSpec {
        ResourceSpec::new(Self::NAME)
            .transform(ApiVersion::new(1, 1, 0), AddField::new("priority"))
            .nested("widget", Widget::NAME)
    }
}

fn v(s: &str) -> ApiVersion {
    s.parse().unwrap()
}

fn versioning() -> Versioning {
    Versioning::builder()
        .config(
            VersioningConfig::new()
                .version("1.0.0")
                .version("1.1.0")
                .version("2.0.0")
                .version("3.0.0"),
        )
        .resource_type::<Order>()
        .resource_type::<Widget>()
        .resource_type::<Part>()
        .build()
        .unwrap()
}

fn order() -> Order {
    Order {
        id: 1,
        priority: 5,
        widget: Widget {
            label: "w".into(),
            colour: "red".into(),
            parts: vec![
                Part { serial: "a".into(), weight: 10 },
                Part { serial: "b".into(), weight: 20 },
            ],
        },
    }
}

#[test]
fn each_level_applies_its_own_chain() {
    let versioning = versioning();
    let order = order();

    assert_eq!(
        versioning.represent(&order, Some(&v("1.0.0"))).unwrap(),
        json!({"id": 1, "widget": {"label": "w", "parts": [{"serial": "a"}, {"serial": "b"}]}})
    );
    assert_eq!(
        versioning.represent(&order, Some(&v("1.1.0"))).unwrap(),
        json!({"id": 1, "priority": 5, "widget": {"label": "w", "parts": [{"serial": "a"}, {"serial": "b"}]}})
    );
    assert_eq!(
        versioning.represent(&order, Some(&v("2.0.0"))).unwrap(),
        json!({"id": 1, "priority": 5, "widget": {"label": "w", "parts": [
            {"serial": "a", "weight": 10},
            {"serial": "b", "weight": 20},
        ]}})
    );
    assert_eq!(
        versioning.represent(&order, Some(&v("3.0.0"))).unwrap(),
        serde_json::to_value(&order).unwrap()
    );
}

#[test]
fn inbound_payloads_are_promoted_at_every_level() {
    let versioning = versioning();
    let sent = json!({
        "id": 9,
        "priority": 3,
        "widget": {"label": "x", "colour": "blue", "parts": [{"serial": "s", "weight": 4}]},
    });

    let parsed: Order = versioning.parse(sent.clone(), Some(&v("1.0.0"))).unwrap();
    assert_eq!(parsed.priority, 0);
    assert_eq!(parsed.widget.colour, "");
    assert_eq!(parsed.widget.parts[0].weight, 0);

    let parsed: Order = versioning.parse(sent, Some(&v("2.0.0"))).unwrap();
    assert_eq!(parsed.priority, 3);
    assert_eq!(parsed.widget.colour, "");
    assert_eq!(parsed.widget.parts[0].weight, 4);
}

#[test]
fn null_nested_values_are_left_alone() {
    let versioning = versioning();
    let data = json!({"id": 1, "priority": 1, "widget": null});
    assert_eq!(
        versioning.to_external("Order", data, Some(&v("1.0.0"))).unwrap(),
        json!({"id": 1, "widget": null})
    );
}

#[test]
fn parent_rename_runs_after_children_on_the_way_out() {
    // At 2.0.0 the parent's "widget" key was renamed from "item"; the nested
    // field is declared under its canonical name.
    let rename = FnTransform::new(
        "Renamed Order.item to Order.widget.",
        |data: &mut JsonObject| {
            if let Some(widget) = data.remove("widget") {
                data.insert("item".into(), widget);
            }
        },
        |data: &mut JsonObject| {
            if let Some(item) = data.remove("item") {
                data.insert("widget".into(), item);
            }
        },
    );
    let versioning = Versioning::builder()
        .config(VersioningConfig::new().version("1.0.0").version("2.0.0").version("3.0.0"))
        .resource(
            ResourceSpec::new("Order")
                .transform(v("2.0.0"), rename)
                .nested("widget", "Widget"),
        )
        .resource_type::<Widget>()
        .resource_type::<Part>()
        .build()
        .unwrap();

    let canonical = json!({"widget": {"label": "w", "colour": "red", "parts": [{"serial": "a", "weight": 1}]}});
    let external = versioning
        .to_external("Order", canonical, Some(&v("1.0.0")))
        .unwrap();
    assert_eq!(external, json!({"item": {"label": "w", "parts": [{"serial": "a"}]}}));

    let internal = versioning
        .to_internal(
            "Order",
            json!({"item": {"label": "w", "colour": "sneaky", "parts": [{"serial": "a", "weight": 9}]}}),
            Some(&v("1.0.0")),
        )
        .unwrap();
    assert_eq!(internal, json!({"widget": {"label": "w", "parts": [{"serial": "a"}]}}));
}

#[test]
fn nested_reference_to_an_undeclared_resource_fails_at_startup() {
    let err = Versioning::builder()
        .config(VersioningConfig::new().version("1.0.0").version("3.0.0"))
        .resource_type::<Widget>()
        .build()
        .unwrap_err();
    assert!(matches!(err, VersioningError::UnknownResource(name) if name == "Part"));
}
