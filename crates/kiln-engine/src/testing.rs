//! Small widget set shared by unit tests.

use std::collections::BTreeMap;

use crate::convert::{ConvertContext, Converter};
use crate::registry::{TypeDescriptor, TypeKey, TypeRegistry};
use crate::value::{EnumDescriptor, EnumValue, ObjectId, Value, ValueType};

pub const NS: &str = "urn:kiln:test";

pub fn key(name: &str) -> TypeKey {
    TypeKey::new(NS, name)
}

#[derive(Debug, Default)]
pub struct Root {
    pub title: String,
    pub children: Vec<Value>,
    pub map: BTreeMap<String, Value>,
    pub resources: BTreeMap<String, Value>,
    pub data_context: Value,
}

#[derive(Debug, Default)]
pub struct Panel {
    pub orientation: Option<EnumValue>,
    pub children: Vec<ObjectId>,
    pub margin: Option<ObjectId>,
    pub data_context: Value,
}

#[derive(Debug, Default)]
pub struct Label {
    pub text: Value,
    pub target: Value,
    pub data_context: Value,
}

/// Takes its data context from `Source` instead of `DataContext`.
#[derive(Debug, Default)]
pub struct Card {
    pub source: Value,
    pub children: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct Button {
    pub content: Value,
    pub enabled: bool,
    pub width: Option<i32>,
    pub accelerator: Option<char>,
}

#[derive(Debug, Default)]
pub struct Menu {
    pub items: Vec<ObjectId>,
}

#[derive(Debug, Default)]
pub struct Item {
    pub title: String,
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thickness {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Parses `"4"` or `"1,2,3,4"`.
struct ThicknessConverter;

impl Converter for ThicknessConverter {
    fn can_convert_from(&self, source: &ValueType) -> bool {
        matches!(source, ValueType::String)
    }

    fn convert(&self, value: &Value, _: &ValueType, cx: &mut ConvertContext<'_>) -> Result<Value, String> {
        let text = value.as_str().ok_or("expected text")?;
        let sides = text
            .split(',')
            .map(|s| s.trim().parse::<i32>().map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        let thickness = match sides[..] {
            [all] => Thickness { left: all, top: all, right: all, bottom: all },
            [left, top, right, bottom] => Thickness { left, top, right, bottom },
            _ => return Err(format!("expected 1 or 4 sides, got {}", sides.len())),
        };
        cx.create(&key("Thickness"), thickness)
    }
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

pub fn orientation() -> ValueType {
    ValueType::Enum(EnumDescriptor::new("Orientation", ["Horizontal", "Vertical"]))
}

pub fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    let control = key("Control");

    registry.register(
        TypeDescriptor::builder::<Root>(NS, "Root")
            .default_constructor()
            .scalar("Title", ValueType::String, |r, v| r.title = text(&v))
            .list("Children", |r, v| r.children.push(v))
            .map("Map", ValueType::String, ValueType::Object(key("Item")), |r, k, v| {
                r.map.insert(text(&k), v);
            })
            .map("Resources", ValueType::String, ValueType::Any, |r, k, v| {
                r.resources.insert(text(&k), v);
            })
            .scalar_rw("DataContext", ValueType::Any, |r: &Root| r.data_context.clone(), |r, v| r.data_context = v)
            .content_property("Children")
            .build()
            .unwrap(),
    );

    registry.register(
        TypeDescriptor::builder::<Panel>(NS, "Panel")
            .default_constructor()
            .assignable_to(control.clone())
            .scalar("Orientation", orientation(), |p, v| p.orientation = v.as_enum().cloned())
            .collection("Children", ValueType::Object(control.clone()), |p, v| {
                p.children.extend(v.as_object())
            })
            .scalar("Margin", ValueType::Object(key("Thickness")), |p, v| p.margin = v.as_object())
            .scalar_rw("DataContext", ValueType::Any, |p: &Panel| p.data_context.clone(), |p, v| p.data_context = v)
            .content_property("Children")
            .build()
            .unwrap(),
    );

    registry.register(
        TypeDescriptor::builder::<Label>(NS, "Label")
            .default_constructor()
            .assignable_to(control.clone())
            .scalar_rw("Text", ValueType::Any, |l: &Label| l.text.clone(), |l, v| l.text = v)
            .scalar_rw("Target", ValueType::Any, |l: &Label| l.target.clone(), |l, v| l.target = v)
            .scalar_rw("DataContext", ValueType::Any, |l: &Label| l.data_context.clone(), |l, v| l.data_context = v)
            .content_property("Text")
            .build()
            .unwrap(),
    );

    registry.register(
        TypeDescriptor::builder::<Card>(NS, "Card")
            .default_constructor()
            .scalar_rw("Source", ValueType::Any, |c: &Card| c.source.clone(), |c, v| c.source = v)
            .list("Children", |c, v| c.children.push(v))
            .content_property("Children")
            .data_context_property("Source")
            .build()
            .unwrap(),
    );

    registry.register(
        TypeDescriptor::builder::<Button>(NS, "Button")
            .default_constructor()
            .assignable_to(control)
            .scalar("Content", ValueType::Any, |b, v| b.content = v)
            .scalar("IsEnabled", ValueType::Bool, |b, v| b.enabled = v.as_bool().unwrap_or_default())
            .scalar("Width", ValueType::NullableInt, |b, v| b.width = v.as_int())
            .scalar("Accelerator", ValueType::NullableChar, |b, v| b.accelerator = v.as_char())
            .build()
            .unwrap(),
    );

    registry.register(
        TypeDescriptor::builder::<Menu>(NS, "Menu")
            .default_constructor()
            .collection("Items", ValueType::Object(key("Item")), |m, v| m.items.extend(v.as_object()))
            .content_property("Items")
            .build()
            .unwrap(),
    );

    registry.register(
        TypeDescriptor::builder::<Item>(NS, "Item")
            .default_constructor()
            .scalar_rw("Title", ValueType::String, |i: &Item| Value::from(i.title.as_str()), |i, v| i.title = text(&v))
            .scalar_rw("Value", ValueType::Int, |i: &Item| Value::Int(i.value), |i, v| {
                i.value = v.as_int().unwrap_or_default()
            })
            .content_property("Title")
            .build()
            .unwrap(),
    );

    registry.register(
        TypeDescriptor::builder::<Thickness>(NS, "Thickness")
            .converter(ThicknessConverter)
            .build()
            .unwrap(),
    );

    registry
}
